//! String operations: the `++` operator and the `Str` module
//!
//! `Str` entries take their options first and the string last, so they
//! compose with `|>` and partial application.

use crate::builtins::{as_str, as_table, dimensionless, module, native2};
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::parser;
use crate::value::Value;
use indexmap::IndexMap;
use rust_decimal::prelude::ToPrimitive;
use std::rc::Rc;

fn concat(a: Value, b: Value, _env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    let mut out = as_str(&a)?.to_string();
    out.push_str(as_str(&b)?);
    Ok(Value::Str(out))
}

/// Register the string operators.
pub fn register(env: &Rc<Environment>) {
    env.define("++".to_string(), native2("++", concat));
}

fn char_index(value: &Value) -> Result<usize, RuntimeError> {
    let magnitude = dimensionless(value)?;
    if !magnitude.fract().is_zero() || magnitude.is_sign_negative() {
        return Err(RuntimeError::not_in_domain(
            value.clone(),
            "expected a non-negative integer index",
        ));
    }
    magnitude.to_usize().ok_or_else(|| {
        RuntimeError::not_in_domain(value.clone(), "the index is out of range")
    })
}

/// Keys "0", "1", … in order, the table-as-sequence convention.
fn sequence_table(items: impl IntoIterator<Item = Value>) -> Value {
    let mut entries = IndexMap::new();
    for (i, item) in items.into_iter().enumerate() {
        entries.insert(i.to_string(), item);
    }
    Value::Table(entries)
}

/// The `Str` module.
pub fn module_value() -> Value {
    let mut entries = IndexMap::new();

    entries.insert(
        "len".to_string(),
        Value::native("Str:len", |arg, _env| {
            Ok(Value::number(as_str(&arg)?.chars().count() as i64))
        }),
    );

    entries.insert(
        "upper".to_string(),
        Value::native("Str:upper", |arg, _env| {
            Ok(Value::Str(as_str(&arg)?.to_uppercase()))
        }),
    );

    entries.insert(
        "lower".to_string(),
        Value::native("Str:lower", |arg, _env| {
            Ok(Value::Str(as_str(&arg)?.to_lowercase()))
        }),
    );

    entries.insert(
        "trim".to_string(),
        Value::native("Str:trim", |arg, _env| {
            Ok(Value::Str(as_str(&arg)?.trim().to_string()))
        }),
    );

    // Str:slice {from: 1, to: 3} "abcd" — char positions, clamped
    entries.insert(
        "slice".to_string(),
        native2("Str:slice", |range, s, _env| {
            let range = as_table(&range)?;
            let from = range
                .get("from")
                .ok_or_else(|| RuntimeError::MissingKey("from".to_string()))
                .and_then(char_index)?;
            let to = range
                .get("to")
                .ok_or_else(|| RuntimeError::MissingKey("to".to_string()))
                .and_then(char_index)?;
            let out: String = as_str(&s)?
                .chars()
                .skip(from)
                .take(to.saturating_sub(from))
                .collect();
            Ok(Value::Str(out))
        }),
    );

    entries.insert(
        "split".to_string(),
        native2("Str:split", |sep, s, _env| {
            let sep = as_str(&sep)?;
            let s = as_str(&s)?;
            let parts: Vec<Value> = if sep.is_empty() {
                s.chars().map(|c| Value::Str(c.to_string())).collect()
            } else {
                s.split(sep).map(|p| Value::Str(p.to_string())).collect()
            };
            Ok(sequence_table(parts))
        }),
    );

    entries.insert(
        "contains?".to_string(),
        native2("Str:contains?", |needle, s, _env| {
            Ok(Value::Bool(as_str(&s)?.contains(as_str(&needle)?)))
        }),
    );

    // any value to its printed form; strings come back unquoted
    entries.insert(
        "from".to_string(),
        Value::native("Str:from", |arg, _env| {
            Ok(Value::Str(match arg {
                Value::Str(s) => s,
                other => format!("{}", other),
            }))
        }),
    );

    entries.insert(
        "parse_dec".to_string(),
        Value::native("Str:parse_dec", |arg, _env| {
            let text = as_str(&arg)?.trim().to_string();
            parser::parse_decimal(&text)
                .map(Value::unit)
                .map_err(|_| RuntimeError::not_in_domain(arg.clone(), "not a decimal number"))
        }),
    );

    module("Str", entries)
}
