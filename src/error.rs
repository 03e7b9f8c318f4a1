// ABOUTME: Error types for lexing, parsing, and evaluation failures

use crate::units::Dimension;
use crate::value::Value;
use thiserror::Error;

/// Errors produced while evaluating an expression.
///
/// The `EarlyReturn`/`LoopBreak`/`LoopContinue` variants are not errors
/// in the user-facing sense: they are the control-flow sentinels behind
/// `Imp:early_return` and `Imp:while`, caught by the native frame that
/// installed them. One that escapes to the host renders as the
/// "outside" message below.
#[derive(Error, Debug, Clone)]
pub enum RuntimeError {
    #[error("expected {expected}, got {got}")]
    UnexpectedType { expected: String, got: String },

    #[error("missing key: {0}")]
    MissingKey(String),

    #[error("undefined name: {0}")]
    UndefinedName(String),

    #[error("dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: Dimension, right: Dimension },

    #[error("{value} is not in the domain: {explanation}")]
    NotInDomain { value: Box<Value>, explanation: String },

    #[error("error value: {0}")]
    Other(Box<Value>),

    #[error("return used outside of an early_return block")]
    EarlyReturn(Box<Value>),

    #[error("break used outside of a loop")]
    LoopBreak,

    #[error("continue used outside of a loop")]
    LoopContinue,
}

impl RuntimeError {
    /// Type mismatch with the offending value's type baked into the text
    pub fn unexpected(expected: &str, got: &Value) -> Self {
        RuntimeError::UnexpectedType {
            expected: expected.to_string(),
            got: got.type_name().to_string(),
        }
    }

    pub fn not_in_domain(value: Value, explanation: impl Into<String>) -> Self {
        RuntimeError::NotInDomain {
            value: Box::new(value),
            explanation: explanation.into(),
        }
    }

    /// A short tag for each variant, used by `IO:try` reification.
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeError::UnexpectedType { .. } => "unexpected_type",
            RuntimeError::MissingKey(_) => "missing_key",
            RuntimeError::UndefinedName(_) => "undefined_name",
            RuntimeError::DimensionMismatch { .. } => "dimension_mismatch",
            RuntimeError::NotInDomain { .. } => "not_in_domain",
            RuntimeError::Other(_) => "other",
            RuntimeError::EarlyReturn(_) => "stray_return",
            RuntimeError::LoopBreak => "stray_break",
            RuntimeError::LoopContinue => "stray_continue",
        }
    }
}

/// The host-facing union of everything that can go wrong in the
/// lex → parse → evaluate pipeline.
#[derive(Error, Debug, Clone)]
pub enum LangError {
    #[error("lex error: {0}")]
    Lex(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{BaseUnit, Dimension};

    #[test]
    fn test_dimension_mismatch_message() {
        let err = RuntimeError::DimensionMismatch {
            left: Dimension::base(BaseUnit::Length),
            right: Dimension::base(BaseUnit::Time),
        };
        assert_eq!(format!("{}", err), "dimension mismatch: m vs s");
    }

    #[test]
    fn test_unexpected_reports_type_name() {
        let err = RuntimeError::unexpected("boolean", &Value::Str("hi".to_string()));
        assert_eq!(format!("{}", err), "expected boolean, got string");
    }

    #[test]
    fn test_lang_error_wraps_runtime() {
        let err: LangError = RuntimeError::UndefinedName("x".to_string()).into();
        assert_eq!(format!("{}", err), "runtime error: undefined name: x");
    }
}
