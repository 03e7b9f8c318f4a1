// ABOUTME: Syntax highlighter for the REPL with color support
// Implements rustyline's Highlighter trait, colorizing by token kind
// from the ws-preserving lexer so every source byte keeps its place.

use crate::lexer::{lex_with_ws, TokenKind};
use rustyline::completion::Completer;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Helper;
use std::borrow::Cow;

// ANSI color codes (3-bit/4-bit for maximum terminal compatibility)
const COLOR_RESET: &str = "\x1b[0m";
const COLOR_PUNCT: &str = "\x1b[1;34m"; // Bold blue
const COLOR_KEYWORD: &str = "\x1b[1;35m"; // Bold magenta
const COLOR_OP: &str = "\x1b[36m"; // Cyan
const COLOR_NUMBER: &str = "\x1b[33m"; // Yellow
const COLOR_STRING: &str = "\x1b[32m"; // Green
const COLOR_COMMENT: &str = "\x1b[90m"; // Bright black (gray)
const COLOR_BACKTICK: &str = "\x1b[1;33m"; // Bold yellow

/// rustyline helper providing syntax-aware coloring for the REPL
pub struct UnitHelper;

impl UnitHelper {
    pub fn new() -> Self {
        UnitHelper
    }
}

impl Default for UnitHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Helper for UnitHelper {}

impl Completer for UnitHelper {
    type Candidate = String;
}

impl Hinter for UnitHelper {
    type Hint = String;
}

impl Validator for UnitHelper {}

fn color_for(kind: TokenKind, text: &str) -> Option<&'static str> {
    match kind {
        TokenKind::If | TokenKind::Then | TokenKind::Else => Some(COLOR_KEYWORD),
        TokenKind::Dec => Some(COLOR_NUMBER),
        TokenKind::Str1 | TokenKind::Str2 => Some(COLOR_STRING),
        TokenKind::Op | TokenKind::Dot => Some(COLOR_OP),
        TokenKind::LParen
        | TokenKind::RParen
        | TokenKind::LBrace
        | TokenKind::RBrace
        | TokenKind::Comma
        | TokenKind::Colon
        | TokenKind::Semicolon => Some(COLOR_PUNCT),
        TokenKind::Backtick => Some(COLOR_BACKTICK),
        TokenKind::Ws if text.starts_with('#') => Some(COLOR_COMMENT),
        TokenKind::Ws | TokenKind::Name => None,
    }
}

/// Colorize a source line token by token. Unlexable input is returned
/// unchanged so typing never breaks mid-edit.
pub fn colorize(line: &str) -> Option<String> {
    let tokens = lex_with_ws(line).ok()?;
    let mut out = String::with_capacity(line.len() * 2);
    for token in &tokens {
        match color_for(token.kind, &token.text) {
            Some(color) => {
                out.push_str(color);
                out.push_str(&token.text);
                out.push_str(COLOR_RESET);
            }
            None => out.push_str(&token.text),
        }
    }
    Some(out)
}

impl Highlighter for UnitHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        match colorize(line) {
            Some(colored) => Cow::Owned(colored),
            None => Cow::Borrowed(line),
        }
    }

    fn highlight_char(&self, line: &str, _pos: usize, _kind: CmdKind) -> bool {
        !line.is_empty()
    }
}
