// ABOUTME: Lexer turning source text into a token stream using nom

use crate::error::LangError;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, one_of, satisfy},
    combinator::{opt, recognize},
    IResult, Parser,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Name,
    Dec,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Op,
    Backtick,
    Str1,
    Str2,
    If,
    Then,
    Else,
    Dot,
    Semicolon,
    Ws,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
    pub text: String,
}

pub const OP_CHARS: &str = "-+=*/%!|&^$><?.~";

pub fn is_op_char(c: char) -> bool {
    OP_CHARS.contains(c)
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn reject(input: &str) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Alt))
}

type Lexed<'a> = IResult<&'a str, (TokenKind, &'a str)>;

/// `if`, `then`, `else` as whole words only; `ifx` stays a name.
fn keyword(input: &str) -> Lexed<'_> {
    let (rest, word) = alt((tag("if"), tag("then"), tag("else"))).parse(input)?;
    let boundary = rest
        .chars()
        .next()
        .is_none_or(|c| !is_name_char(c) && c != '?' && c != '!');
    if !boundary {
        return Err(reject(input));
    }
    let kind = match word {
        "if" => TokenKind::If,
        "then" => TokenKind::Then,
        _ => TokenKind::Else,
    };
    Ok((rest, (kind, word)))
}

/// A whitespace run, or a `#` comment to end of line.
fn whitespace(input: &str) -> Lexed<'_> {
    let (rest, text) = alt((
        take_while1(|c: char| c.is_whitespace()),
        recognize((char('#'), take_while(|c| c != '\n'))),
    ))
    .parse(input)?;
    Ok((rest, (TokenKind::Ws, text)))
}

fn punct(input: &str) -> Lexed<'_> {
    let kind = match input.chars().next() {
        Some('(') => TokenKind::LParen,
        Some(')') => TokenKind::RParen,
        Some('{') => TokenKind::LBrace,
        Some('}') => TokenKind::RBrace,
        Some(',') => TokenKind::Comma,
        Some(':') => TokenKind::Colon,
        Some(';') => TokenKind::Semicolon,
        _ => return Err(reject(input)),
    };
    Ok((&input[1..], (kind, &input[..1])))
}

/// `[A-Za-z_][A-Za-z0-9_]*([?!]+)?` — predicate suffixes like
/// `upper?` and `not!` are part of the name.
fn name(input: &str) -> Lexed<'_> {
    let (rest, text) = recognize((
        satisfy(is_name_start),
        take_while(is_name_char),
        take_while(|c| c == '?' || c == '!'),
    ))
    .parse(input)?;
    Ok((rest, (TokenKind::Name, text)))
}

/// Decimal literal with optional leading `-`, fraction, and exponent.
/// Only `-` can sign a literal; `+` always lexes as an operator.
fn dec(input: &str) -> Lexed<'_> {
    let (rest, text) = recognize((
        opt(char('-')),
        digit1,
        opt(recognize((char('.'), digit1))),
        opt(recognize((one_of("eE"), opt(one_of("+-")), digit1))),
    ))
    .parse(input)?;
    Ok((rest, (TokenKind::Dec, text)))
}

/// A lone `.` not followed by another operator character; `..` and the
/// like fall through to the `op` rule.
fn dot(input: &str) -> Lexed<'_> {
    let (rest, _) = char('.')(input)?;
    if rest.chars().next().is_some_and(is_op_char) {
        return Err(reject(input));
    }
    Ok((rest, (TokenKind::Dot, &input[..1])))
}

fn op(input: &str) -> Lexed<'_> {
    let (rest, text) = take_while1(is_op_char)(input)?;
    Ok((rest, (TokenKind::Op, text)))
}

fn backtick(input: &str) -> Lexed<'_> {
    let (rest, _) = char('`')(input)?;
    Ok((rest, (TokenKind::Backtick, &input[..1])))
}

/// Quote-delimited string with backslash escapes. The token text keeps
/// the quotes and raw escapes; the parser unescapes.
fn string_lit(input: &str, quote: char, kind: TokenKind) -> Lexed<'_> {
    let mut chars = input.char_indices();
    match chars.next() {
        Some((_, c)) if c == quote => {}
        _ => return Err(reject(input)),
    }
    let mut escaped = false;
    for (i, c) in chars {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if c == quote {
            let end = i + c.len_utf8();
            return Ok((&input[end..], (kind, &input[..end])));
        }
    }
    Err(reject(input))
}

fn string1(input: &str) -> Lexed<'_> {
    string_lit(input, '\'', TokenKind::Str1)
}

fn string2(input: &str) -> Lexed<'_> {
    string_lit(input, '"', TokenKind::Str2)
}

/// One token from the front of `input`. Alternative order matters:
/// keywords before names, `dec` before `op` (so `-1` is a literal),
/// `dot` before `op`.
fn next_token(input: &str) -> Lexed<'_> {
    alt((
        keyword, whitespace, punct, name, dec, dot, op, backtick, string1, string2,
    ))
    .parse(input)
}

/// The first run of characters no matcher can make sense of.
fn unmatched_run(input: &str) -> &str {
    for (i, _) in input.char_indices().skip(1) {
        if next_token(&input[i..]).is_ok() {
            return &input[..i];
        }
    }
    input
}

/// Tokenize, keeping `ws` tokens (syntax highlighting wants them).
/// Concatenating the returned token texts reproduces the source.
pub fn lex_with_ws(source: &str) -> Result<Vec<Token>, LangError> {
    let mut tokens = Vec::new();
    let mut rest = source;
    while !rest.is_empty() {
        match next_token(rest) {
            Ok((remaining, (kind, text))) => {
                tokens.push(Token {
                    kind,
                    offset: source.len() - rest.len(),
                    text: text.to_string(),
                });
                rest = remaining;
            }
            Err(_) => {
                return Err(LangError::Lex(format!(
                    "I don't understand: {}",
                    unmatched_run(rest)
                )));
            }
        }
    }
    Ok(tokens)
}

/// Tokenize and drop `ws`, the form the parser consumes.
pub fn lex(source: &str) -> Result<Vec<Token>, LangError> {
    Ok(lex_with_ws(source)?
        .into_iter()
        .filter(|t| t.kind != TokenKind::Ws)
        .collect())
}
