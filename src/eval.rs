// ABOUTME: Tree-walking evaluator over the expression AST

use crate::ast::{Expr, Pattern};
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::value::Value;
use indexmap::IndexMap;
use std::rc::Rc;

/// Strict recursive evaluation. Every error short-circuits; the only
/// non-local exits are the control-flow sentinels riding the error
/// channel (see `error.rs`).
pub fn interpret(expr: &Expr, env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    match expr {
        Expr::Dec(d) => Ok(Value::unit(*d)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Symbol(s) => Ok(Value::Symbol(s.clone())),
        Expr::Name(name) => env
            .get(name)
            .ok_or_else(|| RuntimeError::UndefinedName(name.clone())),
        Expr::Table(entries) => {
            let mut table = IndexMap::new();
            for (key, value_expr) in entries {
                let value = interpret(value_expr, env)?;
                // later duplicates overwrite earlier ones
                table.insert(key.clone(), value);
            }
            Ok(Value::Table(table))
        }
        Expr::App { fun, arg } => {
            let callee = interpret(fun, env)?;
            let arg = interpret(arg, env)?;
            apply(&callee, arg, env)
        }
        Expr::Cond {
            test,
            then,
            otherwise,
        } => match interpret(test, env)? {
            Value::Bool(true) => interpret(then, env),
            Value::Bool(false) => interpret(otherwise, env),
            other => Err(RuntimeError::unexpected("boolean", &other)),
        },
        Expr::Lam(lambda) => Ok(Value::Fun {
            lambda: lambda.clone(),
            closure: env.clone(),
        }),
    }
}

/// Applies `callee` to `arg`, dispatching on the callee variant.
///
/// `env` is the caller's environment. For a `Fun` it only feeds the
/// destructuring sub-calls in `bind`; the body runs in a fresh child
/// of the *closure* environment.
pub fn apply(callee: &Value, arg: Value, env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    match callee {
        Value::Native { fun, .. } => fun(arg, env),
        Value::Fun { lambda, closure } => {
            let bindings = bind(&lambda.param, &arg, env)?;
            let frame = Environment::with_parent(closure.clone());
            for (name, value) in bindings {
                frame.define(name, value);
            }
            interpret(&lambda.body, &frame)
        }
        Value::Table(entries) => match arg {
            Value::Symbol(key) => entries
                .get(&key)
                .cloned()
                .ok_or(RuntimeError::MissingKey(key)),
            other => Err(RuntimeError::unexpected("symbol", &other)),
        },
        other => Err(RuntimeError::unexpected("table, function, or native", other)),
    }
}

/// Matches `value` against a parameter pattern, producing bindings.
///
/// Table patterns extract each key by *applying* the value to the key
/// symbol, so destructuring works against literal tables, table-like
/// natives, and user functions that answer symbols alike.
pub fn bind(
    pattern: &Pattern,
    value: &Value,
    env: &Rc<Environment>,
) -> Result<Vec<(String, Value)>, RuntimeError> {
    match pattern {
        Pattern::Single(name) => Ok(vec![(name.clone(), value.clone())]),
        Pattern::Table(entries) => {
            let mut bindings = Vec::new();
            for (key, sub) in entries {
                let extracted = apply(value, Value::Symbol(key.clone()), env)?;
                bindings.extend(bind(sub, &extracted, env)?);
            }
            Ok(bindings)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{default_options, parse_line};

    fn eval(source: &str, env: &Rc<Environment>) -> Result<Value, RuntimeError> {
        let expr = parse_line(source, &default_options()).unwrap();
        interpret(&expr, env)
    }

    fn magnitude(value: &Value) -> i64 {
        match value {
            Value::Unit { magnitude, .. } => i64::try_from(magnitude.mantissa()).unwrap(),
            other => panic!("expected a number, got {:?}", other),
        }
    }

    #[test]
    fn test_literals() {
        let env = Environment::new();
        assert_eq!(magnitude(&eval("42", &env).unwrap()), 42);
        assert!(matches!(eval("'hi'", &env).unwrap(), Value::Str(s) if s == "hi"));
        assert!(matches!(eval(":ok", &env).unwrap(), Value::Symbol(s) if s == "ok"));
    }

    #[test]
    fn test_undefined_name() {
        let env = Environment::new();
        match eval("ghost", &env) {
            Err(RuntimeError::UndefinedName(name)) => assert_eq!(name, "ghost"),
            other => panic!("expected undefined name, got {:?}", other),
        }
    }

    #[test]
    fn test_lambda_application() {
        let env = Environment::new();
        // (x y. x) applied to 7 and 9
        let value = eval("(x y. x) 7 9", &env).unwrap();
        assert_eq!(magnitude(&value), 7);
    }

    #[test]
    fn test_closure_captures_definition_env() {
        let env = Environment::new();
        env.define("n".to_string(), Value::number(10));
        let fun = eval("x. n", &env).unwrap();

        // calling from an env that shadows `n` still sees the closure's n
        let other = Environment::new();
        other.define("n".to_string(), Value::number(99));
        let result = apply(&fun, Value::number(0), &other).unwrap();
        assert_eq!(magnitude(&result), 10);
    }

    #[test]
    fn test_table_literal_evaluates_in_order() {
        let env = Environment::new();
        let value = eval("{a: 1, b: 2}", &env).unwrap();
        match value {
            Value::Table(entries) => {
                let keys: Vec<_> = entries.keys().cloned().collect();
                assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_keys_overwrite() {
        let env = Environment::new();
        let value = eval("{a: 1, a: 2}", &env).unwrap();
        match value {
            Value::Table(entries) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(magnitude(&entries["a"]), 2);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_table_application() {
        let env = Environment::new();
        assert_eq!(magnitude(&eval("{x: 1, y: 2} :y", &env).unwrap()), 2);

        match eval("{x: 1} :z", &env) {
            Err(RuntimeError::MissingKey(key)) => assert_eq!(key, "z"),
            other => panic!("expected missing key, got {:?}", other),
        }

        match eval("{x: 1} 2", &env) {
            Err(RuntimeError::UnexpectedType { expected, .. }) => assert_eq!(expected, "symbol"),
            other => panic!("expected type error, got {:?}", other),
        }
    }

    #[test]
    fn test_applying_a_number_fails() {
        let env = Environment::new();
        match eval("1 2", &env) {
            Err(RuntimeError::UnexpectedType { expected, got }) => {
                assert_eq!(expected, "table, function, or native");
                assert_eq!(got, "number");
            }
            other => panic!("expected type error, got {:?}", other),
        }
    }

    #[test]
    fn test_cond_requires_boolean() {
        let env = Environment::new();
        match eval("if 1 then 2 else 3", &env) {
            Err(RuntimeError::UnexpectedType { expected, .. }) => assert_eq!(expected, "boolean"),
            other => panic!("expected type error, got {:?}", other),
        }
    }

    #[test]
    fn test_cond_selects_branch() {
        let env = Environment::new();
        env.define("t".to_string(), Value::Bool(true));
        env.define("f".to_string(), Value::Bool(false));
        assert_eq!(magnitude(&eval("if t then 1 else 2", &env).unwrap()), 1);
        assert_eq!(magnitude(&eval("if f then 1 else 2", &env).unwrap()), 2);
    }

    #[test]
    fn test_destructuring_against_table() {
        let env = Environment::new();
        let value = eval("({x, y}. y) {x: 1, y: 2}", &env).unwrap();
        assert_eq!(magnitude(&value), 2);
    }

    #[test]
    fn test_destructuring_is_duck_typed() {
        // a native that answers any symbol with its length
        let env = Environment::new();
        env.define(
            "oracle".to_string(),
            Value::native("oracle", |arg, _env| match arg {
                Value::Symbol(key) => Ok(Value::number(key.len() as i64)),
                other => Err(RuntimeError::unexpected("symbol", &other)),
            }),
        );
        let value = eval("({abc, z}. abc) oracle", &env).unwrap();
        assert_eq!(magnitude(&value), 3);
    }

    #[test]
    fn test_destructuring_missing_key_fails() {
        let env = Environment::new();
        match eval("({q}. q) {x: 1}", &env) {
            Err(RuntimeError::MissingKey(key)) => assert_eq!(key, "q"),
            other => panic!("expected missing key, got {:?}", other),
        }
    }
}
