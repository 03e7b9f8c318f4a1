// ABOUTME: Runtime value types produced by the evaluator

use crate::ast::{escape_string, unparse, Expr, Lambda};
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::units::Dimension;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use std::fmt;
use std::rc::Rc;

pub type NativeFn = Rc<dyn Fn(Value, &Rc<Environment>) -> Result<Value, RuntimeError>>;

/// Display name for a native value: either a literal, or a thunk so
/// curried built-ins never format their captured argument eagerly.
#[derive(Clone)]
pub enum LazyName {
    Literal(String),
    Thunk(Rc<dyn Fn() -> String>),
}

impl LazyName {
    pub fn lazy(thunk: impl Fn() -> String + 'static) -> Self {
        LazyName::Thunk(Rc::new(thunk))
    }

    pub fn resolve(&self) -> String {
        match self {
            LazyName::Literal(name) => name.clone(),
            LazyName::Thunk(thunk) => thunk(),
        }
    }
}

impl From<&str> for LazyName {
    fn from(name: &str) -> Self {
        LazyName::Literal(name.to_string())
    }
}

impl From<String> for LazyName {
    fn from(name: String) -> Self {
        LazyName::Literal(name)
    }
}

impl fmt::Display for LazyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resolve())
    }
}

#[derive(Clone)]
pub enum Value {
    Str(String),
    /// A decimal magnitude annotated with an SI dimension vector.
    Unit { magnitude: Decimal, dim: Dimension },
    Symbol(String),
    Bool(bool),
    Table(IndexMap<String, Value>),
    Fun {
        lambda: Rc<Lambda>,
        closure: Rc<Environment>,
    },
    Native {
        name: LazyName,
        fun: NativeFn,
    },
}

impl Value {
    /// A dimensionless number.
    pub fn unit(magnitude: Decimal) -> Value {
        Value::Unit {
            magnitude,
            dim: Dimension::NONE,
        }
    }

    pub fn number(n: i64) -> Value {
        Value::unit(Decimal::from(n))
    }

    pub fn native(
        name: impl Into<LazyName>,
        fun: impl Fn(Value, &Rc<Environment>) -> Result<Value, RuntimeError> + 'static,
    ) -> Value {
        Value::Native {
            name: name.into(),
            fun: Rc::new(fun),
        }
    }

    pub fn empty_table() -> Value {
        Value::Table(IndexMap::new())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Unit { .. } => "number",
            Value::Symbol(_) => "symbol",
            Value::Bool(_) => "boolean",
            Value::Table(_) => "table",
            Value::Fun { .. } => "function",
            Value::Native { .. } => "native",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "\"{}\"", escape_string(s)),
            Value::Unit { magnitude, dim } => {
                write!(f, "{}", magnitude.normalize())?;
                if !dim.is_none() {
                    write!(f, " {}", dim)?;
                }
                Ok(())
            }
            Value::Symbol(s) => write!(f, ":{}", s),
            Value::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Table(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Fun { lambda, .. } => write!(f, "{}", unparse(&Expr::Lam(lambda.clone()))),
            Value::Native { name, .. } => write!(f, "{}", name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
