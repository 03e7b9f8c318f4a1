//! Composition and application operators: `<< >> |> $`, the fallback
//! combinator `|?`, weak structural equality `~=`, and binding `.=`

use crate::builtins::{as_symbol, as_unit, native2};
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::eval::apply;
use crate::value::{LazyName, Value};
use std::rc::Rc;

fn composed(outer: Value, inner: Value, symbol: &'static str) -> Value {
    let shown_outer = outer.clone();
    let shown_inner = inner.clone();
    Value::Native {
        name: LazyName::lazy(move || format!("{} {} {}", shown_outer, symbol, shown_inner)),
        fun: Rc::new(move |arg, env| {
            let mid = apply(&inner, arg, env)?;
            apply(&outer, mid, env)
        }),
    }
}

/// `f << g` — apply `g`, then `f`.
fn compose_right(f: Value, g: Value, _env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    Ok(composed(f, g, "<<"))
}

/// `f >> g` — apply `f`, then `g` (left-to-right reading).
fn compose_left(f: Value, g: Value, _env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    Ok(composed(g, f, ">>"))
}

/// `x |> f` — forward pipe.
fn pipe(x: Value, f: Value, env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    apply(&f, x, env)
}

/// `f $ x` — reverse pipe (plain application, low priority).
fn apply_op(f: Value, x: Value, env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    apply(&f, x, env)
}

/// `a |? b` — a callable that tries `a` and, on `MissingKey` only,
/// falls back to `b`. Any other error propagates.
fn fallback(first: Value, second: Value, _env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    let shown_first = first.clone();
    let shown_second = second.clone();
    Ok(Value::Native {
        name: LazyName::lazy(move || format!("{} |? {}", shown_first, shown_second)),
        fun: Rc::new(move |arg, env| match apply(&first, arg.clone(), env) {
            Err(RuntimeError::MissingKey(_)) => apply(&second, arg, env),
            other => other,
        }),
    })
}

/// Structural weak equality on non-function values. Tables compare as
/// unordered key collections with weakly equal values.
fn weak_eq(a: &Value, b: &Value) -> Result<bool, RuntimeError> {
    match (a, b) {
        (Value::Fun { .. } | Value::Native { .. }, _) => Err(RuntimeError::not_in_domain(
            a.clone(),
            "functions cannot be weakly compared",
        )),
        (_, Value::Fun { .. } | Value::Native { .. }) => Err(RuntimeError::not_in_domain(
            b.clone(),
            "functions cannot be weakly compared",
        )),
        (Value::Str(x), Value::Str(y)) => Ok(x == y),
        (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
        (Value::Symbol(x), Value::Symbol(y)) => Ok(x == y),
        (Value::Unit { .. }, Value::Unit { .. }) => {
            let (ma, da) = as_unit(a)?;
            let (mb, db) = as_unit(b)?;
            Ok(ma == mb && da == db)
        }
        (Value::Table(x), Value::Table(y)) => {
            if x.len() != y.len() {
                return Ok(false);
            }
            for (key, left) in x {
                match y.get(key) {
                    Some(right) => {
                        if !weak_eq(left, right)? {
                            return Ok(false);
                        }
                    }
                    None => return Ok(false),
                }
            }
            Ok(true)
        }
        _ => Ok(false),
    }
}

fn weak_eq_op(a: Value, b: Value, _env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(weak_eq(&a, &b)?))
}

/// `:name .= value` — installs `name` in the environment where the
/// application happens, and yields the value.
fn bind_op(name: Value, value: Value, env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    let key = as_symbol(&name)?.to_string();
    env.define(key, value.clone());
    Ok(value)
}

/// Register the functional operators.
pub fn register(env: &Rc<Environment>) {
    env.define("<<".to_string(), native2("<<", compose_right));
    env.define(">>".to_string(), native2(">>", compose_left));
    env.define("|>".to_string(), native2("|>", pipe));
    env.define("$".to_string(), native2("$", apply_op));
    env.define("|?".to_string(), native2("|?", fallback));
    env.define("fallback".to_string(), native2("fallback", fallback));
    env.define("~=".to_string(), native2("~=", weak_eq_op));
    env.define(".=".to_string(), native2(".=", bind_op));
}
