// ABOUTME: Minimal parser-combinator engine over arbitrary token streams

use std::cell::OnceCell;
use std::rc::Rc;

/// A parse failure. `recoverable` is the only cross-cut error channel:
/// `or` falls through on a recoverable failure and propagates an
/// unrecoverable one, which is how a committed branch's message
/// survives past enclosing alternatives.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub recoverable: bool,
}

impl ParseError {
    pub fn soft(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
            recoverable: true,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
            recoverable: false,
        }
    }
}

/// A parser is a pure function from a stream to a value and the rest
/// of the stream. Streams are cheap to clone (a cursor), and a failing
/// parser never hands back a modified stream.
pub struct Parser<S, A> {
    run: Rc<dyn Fn(S) -> Result<(A, S), ParseError>>,
}

impl<S, A> Clone for Parser<S, A> {
    fn clone(&self) -> Self {
        Parser {
            run: self.run.clone(),
        }
    }
}

impl<S: Clone + 'static, A: 'static> Parser<S, A> {
    pub fn new(run: impl Fn(S) -> Result<(A, S), ParseError> + 'static) -> Self {
        Parser { run: Rc::new(run) }
    }

    pub fn parse(&self, input: S) -> Result<(A, S), ParseError> {
        (self.run)(input)
    }

    pub fn map<B: 'static>(self, f: impl Fn(A) -> B + 'static) -> Parser<S, B> {
        let run = self.run;
        Parser::new(move |input| {
            let (value, rest) = run(input)?;
            Ok((f(value), rest))
        })
    }

    pub fn flat_map<B: 'static>(self, f: impl Fn(A) -> Parser<S, B> + 'static) -> Parser<S, B> {
        let run = self.run;
        Parser::new(move |input| {
            let (value, rest) = run(input)?;
            f(value).parse(rest)
        })
    }

    /// Sequence, keeping only the right result.
    pub fn then<B: 'static>(self, other: Parser<S, B>) -> Parser<S, B> {
        let run = self.run;
        Parser::new(move |input| {
            let (_, rest) = run(input)?;
            other.parse(rest)
        })
    }

    /// Sequence, keeping only the left result (`then` read backwards).
    pub fn neht<B: 'static>(self, other: Parser<S, B>) -> Parser<S, A> {
        let run = self.run;
        Parser::new(move |input| {
            let (value, rest) = run(input)?;
            let (_, rest) = other.parse(rest)?;
            Ok((value, rest))
        })
    }

    /// Try this parser; on a recoverable failure try `other` on the
    /// original stream. Unrecoverable failures propagate immediately.
    pub fn or(self, other: Parser<S, A>) -> Parser<S, A> {
        let run = self.run;
        Parser::new(move |input: S| match run(input.clone()) {
            Ok(done) => Ok(done),
            Err(e) if e.recoverable => other.parse(input),
            Err(e) => Err(e),
        })
    }

    /// Commit: a recoverable failure becomes unrecoverable with a
    /// user-visible message. An already-fatal failure keeps its more
    /// specific text.
    pub fn or_bail(self, message: &str) -> Parser<S, A> {
        let run = self.run;
        let message = message.to_string();
        Parser::new(move |input| match run(input) {
            Ok(done) => Ok(done),
            Err(e) if e.recoverable => Err(ParseError::fatal(message.clone())),
            Err(e) => Err(e),
        })
    }

    /// Succeed (or fail) without consuming input.
    pub fn look_ahead(self) -> Parser<S, A> {
        let run = self.run;
        Parser::new(move |input: S| {
            let (value, _) = run(input.clone())?;
            Ok((value, input))
        })
    }

    /// Zero or more repetitions, stopping on the first recoverable
    /// failure. Fatal failures propagate.
    pub fn many(self) -> Parser<S, Vec<A>> {
        let run = self.run;
        Parser::new(move |mut input: S| {
            let mut items = Vec::new();
            loop {
                match run(input.clone()) {
                    Ok((item, rest)) => {
                        items.push(item);
                        input = rest;
                    }
                    Err(e) if e.recoverable => return Ok((items, input)),
                    Err(e) => return Err(e),
                }
            }
        })
    }

    /// Like `many`, but failing (recoverably) with `message` when
    /// fewer than `n` repetitions matched.
    pub fn many_at_least(self, n: usize, message: &str) -> Parser<S, Vec<A>> {
        let message = message.to_string();
        let many = self.many();
        Parser::new(move |input| {
            let (items, rest) = many.parse(input)?;
            if items.len() < n {
                return Err(ParseError::soft(message.clone()));
            }
            Ok((items, rest))
        })
    }

    pub fn maybe(self) -> Parser<S, Option<A>> {
        let run = self.run;
        Parser::new(move |input: S| match run(input.clone()) {
            Ok((value, rest)) => Ok((Some(value), rest)),
            Err(e) if e.recoverable => Ok((None, input)),
            Err(e) => Err(e),
        })
    }

    pub fn surrounded_by<O: 'static, C: 'static>(
        self,
        open: Parser<S, O>,
        close: Parser<S, C>,
    ) -> Parser<S, A> {
        open.then(self).neht(close)
    }
}

/// Succeeds with `value`, consuming nothing.
pub fn always<S: Clone + 'static, A: Clone + 'static>(value: A) -> Parser<S, A> {
    Parser::new(move |input| Ok((value.clone(), input)))
}

pub fn pair<S: Clone + 'static, A: 'static, B: 'static>(
    first: Parser<S, A>,
    second: Parser<S, B>,
) -> Parser<S, (A, B)> {
    Parser::new(move |input| {
        let (a, rest) = first.parse(input)?;
        let (b, rest) = second.parse(rest)?;
        Ok(((a, b), rest))
    })
}

/// Defers construction until first use, so mutually recursive grammar
/// productions can reference each other. The thunk runs once.
pub fn lazy<S: Clone + 'static, A: 'static>(
    build: impl Fn() -> Parser<S, A> + 'static,
) -> Parser<S, A> {
    let cell: Rc<OnceCell<Parser<S, A>>> = Rc::new(OnceCell::new());
    Parser::new(move |input| cell.get_or_init(&build).parse(input))
}
