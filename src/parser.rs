// ABOUTME: Expression parser over the token stream using the combinator engine

use crate::ast::{Expr, Pattern};
use crate::combinators::{lazy, pair, ParseError, Parser};
use crate::error::LangError;
use crate::lexer::{lex, Token, TokenKind};
use crate::shunting::{self, OpKind, OpList};
use rust_decimal::Decimal;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Priority {
    pub strength: i32,
    pub assoc: Assoc,
}

impl Priority {
    pub const fn new(strength: i32, assoc: Assoc) -> Self {
        Priority { strength, assoc }
    }
}

/// Operator table consulted by shunting-yard on every parse. The host
/// may rebind entries between top-level expressions.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub priorities: HashMap<String, Priority>,
    pub backtick_priority: Priority,
    pub default_priority: Priority,
}

impl ParseOptions {
    pub fn set_priority(&mut self, op: &str, priority: Priority) {
        self.priorities.insert(op.to_string(), priority);
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        let table: &[(&[&str], i32, Assoc)] = &[
            (&["^", "^/"], 8, Assoc::Right),
            (&["*", "/", "%"], 7, Assoc::Left),
            (&["+", "-", "++"], 6, Assoc::Left),
            (&["<", ">", "<=", ">="], 5, Assoc::Left),
            (&["~="], 4, Assoc::Left),
            (&["<<", "|?"], 3, Assoc::Right),
            (&[">>"], 3, Assoc::Left),
            (&["|>"], 2, Assoc::Left),
            (&["$"], 1, Assoc::Right),
            (&[".="], 0, Assoc::Right),
        ];
        let mut priorities = HashMap::new();
        for (names, strength, assoc) in table {
            for name in *names {
                priorities.insert((*name).to_string(), Priority::new(*strength, *assoc));
            }
        }
        ParseOptions {
            priorities,
            backtick_priority: Priority::new(5, Assoc::Left),
            default_priority: Priority::new(5, Assoc::Left),
        }
    }
}

/// Shared interior-mutable handle; the parser dereferences it on each
/// invocation rather than copying it into closures.
pub type ParserRef = Rc<RefCell<ParseOptions>>;

pub fn default_options() -> ParserRef {
    Rc::new(RefCell::new(ParseOptions::default()))
}

/// Cheap-to-clone cursor over a lexed token vector.
#[derive(Clone, Debug)]
pub struct TokenStream {
    tokens: Rc<Vec<Token>>,
    pos: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        TokenStream {
            tokens: Rc::new(tokens),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&self) -> TokenStream {
        TokenStream {
            tokens: self.tokens.clone(),
            pos: self.pos + 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn describe_head(&self) -> String {
        match self.peek() {
            Some(t) => format!("'{}'", t.text),
            None => "end of input".to_string(),
        }
    }
}

type P<A> = Parser<TokenStream, A>;

fn token(kind: TokenKind, what: &'static str) -> P<Token> {
    Parser::new(move |s: TokenStream| match s.peek() {
        Some(t) if t.kind == kind => Ok((t.clone(), s.advance())),
        _ => Err(ParseError::soft(format!(
            "Expected {}, found {}",
            what,
            s.describe_head()
        ))),
    })
}

fn expecting(what: &'static str) -> P<Expr> {
    Parser::new(move |s: TokenStream| {
        Err(ParseError::soft(format!(
            "Expected {}, found {}",
            what,
            s.describe_head()
        )))
    })
}

fn name_tok() -> P<Token> {
    token(TokenKind::Name, "a name")
}

fn op_tok() -> P<Token> {
    token(TokenKind::Op, "an operator")
}

/// A table key: a name or an operator.
fn key_tok() -> P<String> {
    name_tok().or(op_tok()).map(|t| t.text)
}

fn lazy_expr(options: &ParserRef) -> P<Expr> {
    let options = options.clone();
    lazy(move || expr(&options))
}

fn lazy_atomic(options: &ParserRef) -> P<Expr> {
    let options = options.clone();
    lazy(move || atomic(&options))
}

pub(crate) fn parse_decimal(text: &str) -> Result<Decimal, String> {
    let parsed = if text.contains(['e', 'E']) {
        Decimal::from_scientific(text)
    } else {
        Decimal::from_str(text)
    };
    parsed.map_err(|_| format!("Number out of range: {}", text))
}

fn dec_atom() -> P<Expr> {
    Parser::new(|s: TokenStream| match s.peek() {
        Some(t) if t.kind == TokenKind::Dec => {
            let d = parse_decimal(&t.text).map_err(ParseError::fatal)?;
            Ok((Expr::Dec(d), s.advance()))
        }
        _ => Err(ParseError::soft(format!(
            "Expected a number, found {}",
            s.describe_head()
        ))),
    })
}

fn unescape(raw: &str) -> String {
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn str_atom() -> P<Expr> {
    token(TokenKind::Str1, "a string")
        .or(token(TokenKind::Str2, "a string"))
        .map(|t| Expr::Str(unescape(&t.text)))
}

fn symbol_atom() -> P<Expr> {
    token(TokenKind::Colon, "':'")
        .then(key_tok())
        .map(Expr::Symbol)
}

fn name_atom() -> P<Expr> {
    name_tok().map(|t| Expr::Name(t.text))
}

fn cond(options: &ParserRef) -> P<Expr> {
    let test = token(TokenKind::If, "'if'")
        .then(lazy_expr(options).or_bail("Expected condition after 'if'"));
    let then_branch = token(TokenKind::Then, "'then'")
        .or_bail("Expected 'then' after condition")
        .then(lazy_expr(options).or_bail("Expected expression after 'then'"));
    let else_branch = token(TokenKind::Else, "'else'")
        .or_bail("Expected 'else' after 'then' branch")
        .then(lazy_expr(options).or_bail("Expected expression after 'else'"));
    pair(test, pair(then_branch, else_branch)).map(|(test, (then, otherwise))| Expr::Cond {
        test: Box::new(test),
        then: Box::new(then),
        otherwise: Box::new(otherwise),
    })
}

fn table_entry(options: &ParserRef) -> P<(String, Expr)> {
    let value = token(TokenKind::Colon, "':'")
        .then(lazy_expr(options).or_bail("Expected expression after ':' in table"))
        .maybe();
    pair(key_tok(), value).map(|(key, value)| match value {
        Some(v) => (key, v),
        // shorthand: `k` is `k: k`
        None => (key.clone(), Expr::Name(key)),
    })
}

fn table(options: &ParserRef) -> P<Expr> {
    let entry = table_entry(options);
    let entries = pair(
        entry.clone(),
        token(TokenKind::Comma, "','").then(entry).many(),
    )
    .map(|(first, mut rest)| {
        rest.insert(0, first);
        rest
    })
    .maybe()
    .neht(token(TokenKind::Comma, "','").maybe());

    entries
        .surrounded_by(
            token(TokenKind::LBrace, "'{'"),
            token(TokenKind::RBrace, "'}'").or_bail("Unclosed '{' in table literal"),
        )
        .map(|entries| Expr::Table(entries.unwrap_or_default()))
}

fn infix_op(options: &ParserRef) -> P<OpKind> {
    let quoted = lazy_expr(options)
        .or_bail("Expected expression between backticks")
        .surrounded_by(
            token(TokenKind::Backtick, "'`'"),
            token(TokenKind::Backtick, "'`'").or_bail("Unclosed '`' around operator expression"),
        )
        .map(OpKind::Quoted);
    op_tok().map(|t| OpKind::Infix(t.text)).or(quoted)
}

fn op_expr(kind: OpKind) -> Expr {
    match kind {
        OpKind::Infix(name) => Expr::Name(name),
        OpKind::Quoted(expr) => expr,
    }
}

/// `(op e)` — desugars to the synthetic lambda `_. _ op e`.
fn left_section(options: &ParserRef) -> P<Expr> {
    pair(infix_op(options), lazy_atomic(options))
        .surrounded_by(
            token(TokenKind::LParen, "'('"),
            token(TokenKind::RParen, "')'"),
        )
        .map(|(op, arg)| {
            let body = Expr::app(Expr::app(op_expr(op), Expr::name("_")), arg);
            Expr::lam(Pattern::Single("_".to_string()), body)
        })
}

/// `(e op)` — desugars to the partial application `(op) e`.
fn right_section(options: &ParserRef) -> P<Expr> {
    pair(lazy_atomic(options), infix_op(options))
        .surrounded_by(
            token(TokenKind::LParen, "'('"),
            token(TokenKind::RParen, "')'"),
        )
        .map(|(arg, op)| Expr::app(op_expr(op), arg))
}

/// `(op)` — the operator as a plain name.
fn bare_op(options: &ParserRef) -> P<Expr> {
    infix_op(options)
        .surrounded_by(
            token(TokenKind::LParen, "'('"),
            token(TokenKind::RParen, "')'"),
        )
        .map(op_expr)
}

fn paren_expr(options: &ParserRef) -> P<Expr> {
    token(TokenKind::LParen, "'('")
        .then(lazy_expr(options).or_bail("Expected expression after '('"))
        .neht(token(TokenKind::RParen, "')'").or_bail("Unclosed '(' in expression"))
}

fn atomic(options: &ParserRef) -> P<Expr> {
    dec_atom()
        .or(str_atom())
        .or(symbol_atom())
        .or(name_atom())
        .or(cond(options))
        .or(table(options))
        .or(left_section(options))
        .or(right_section(options))
        .or(bare_op(options))
        .or(paren_expr(options))
        .or(expecting("an expression"))
}

/// One or more atomics, folded left: application is left-associative
/// and curried.
fn application(options: &ParserRef) -> P<Expr> {
    let rest = atomic(options).many();
    atomic(options).flat_map(move |first| {
        rest.clone()
            .map(move |args| args.into_iter().fold(first.clone(), Expr::app))
    })
}

fn infix(options: &ParserRef) -> P<Expr> {
    let resolver = options.clone();
    pair(
        application(options),
        pair(
            infix_op(options),
            application(options).or_bail("Expected expression after operator"),
        )
        .many(),
    )
    .map(move |(initial, chunks)| {
        shunting::resolve(OpList { initial, chunks }, &resolver.borrow())
    })
}

fn param(options: &ParserRef) -> P<Pattern> {
    key_tok().map(Pattern::Single).or(table_pattern(options))
}

fn param_entry(options: &ParserRef) -> P<(String, Pattern)> {
    let options = options.clone();
    let sub = token(TokenKind::Colon, "':'")
        .then(lazy(move || param(&options)))
        .maybe();
    pair(key_tok(), sub).map(|(key, sub)| match sub {
        Some(pattern) => (key, pattern),
        None => (key.clone(), Pattern::Single(key)),
    })
}

/// A destructuring parameter. Stays recoverable throughout so that a
/// table literal can be retried when the `{…}` turns out not to be a
/// pattern.
fn table_pattern(options: &ParserRef) -> P<Pattern> {
    let entry = param_entry(options);
    let entries = pair(
        entry.clone(),
        token(TokenKind::Comma, "','").then(entry).many(),
    )
    .map(|(first, mut rest)| {
        rest.insert(0, first);
        rest
    })
    .maybe()
    .neht(token(TokenKind::Comma, "','").maybe());

    entries
        .surrounded_by(
            token(TokenKind::LBrace, "'{'"),
            token(TokenKind::RBrace, "'}'"),
        )
        .map(|entries| Pattern::Table(entries.unwrap_or_default()))
}

/// `a b c. body` — desugars to nested single-parameter lambdas.
fn lambda(options: &ParserRef) -> P<Expr> {
    pair(
        param(options).many_at_least(1, "Expected a parameter"),
        token(TokenKind::Dot, "'.'")
            .then(lazy_expr(options).or_bail("Expected expression after '.'")),
    )
    .map(|(params, body)| {
        params
            .into_iter()
            .rev()
            .fold(body, |acc, p| Expr::lam(p, acc))
    })
}

fn expr(options: &ParserRef) -> P<Expr> {
    lambda(options).or(infix(options))
}

/// A top-level expression with its optional trailing `;`.
fn top_level(options: &ParserRef) -> P<Expr> {
    expr(options).neht(token(TokenKind::Semicolon, "';'").maybe())
}

/// Parse exactly one expression; a non-empty remainder is an error.
pub fn parse_line(source: &str, options: &ParserRef) -> Result<Expr, LangError> {
    let stream = TokenStream::new(lex(source)?);
    let (expr, rest) = top_level(options)
        .parse(stream)
        .map_err(|e| LangError::Parse(e.message))?;
    if !rest.is_empty() {
        return Err(LangError::Parse(format!(
            "Unexpected trailing input at {}",
            rest.describe_head()
        )));
    }
    Ok(expr)
}

/// Parse a whole script: expressions back to back until the stream is
/// exhausted.
pub fn parse_multiline(source: &str, options: &ParserRef) -> Result<Vec<Expr>, LangError> {
    let mut stream = TokenStream::new(lex(source)?);
    let parser = top_level(options);
    let mut exprs = Vec::new();
    while !stream.is_empty() {
        let (expr, rest) = parser
            .parse(stream)
            .map_err(|e| LangError::Parse(e.message))?;
        exprs.push(expr);
        stream = rest;
    }
    Ok(exprs)
}
