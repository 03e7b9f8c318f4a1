//! The `Imp` module: imperative control flow on top of non-local exits
//!
//! `early_return`, `break`, and `continue` are sentinels riding the
//! evaluator's error channel; the natives here are the only frames
//! that catch them. A sentinel escaping all the way out renders as a
//! plain "used outside" runtime error.

use crate::builtins::{as_bool, as_table, module, native2};
use crate::error::RuntimeError;
use crate::eval::apply;
use crate::value::Value;
use indexmap::IndexMap;

fn nothing() -> Value {
    Value::Symbol("nothing".to_string())
}

fn signal_table() -> Value {
    let mut entries = IndexMap::new();
    entries.insert(
        "break".to_string(),
        Value::native("break", |_arg, _env| Err(RuntimeError::LoopBreak)),
    );
    entries.insert(
        "continue".to_string(),
        Value::native("continue", |_arg, _env| Err(RuntimeError::LoopContinue)),
    );
    Value::Table(entries)
}

pub fn module_value() -> Value {
    let mut entries = IndexMap::new();

    // Imp:early_return (return. …) — the body gets a `return` callable
    entries.insert(
        "early_return".to_string(),
        Value::native("Imp:early_return", |body, env| {
            let returner = Value::native("return", |value, _env| {
                Err(RuntimeError::EarlyReturn(Box::new(value)))
            });
            match apply(&body, returner, env) {
                Err(RuntimeError::EarlyReturn(value)) => Ok(*value),
                other => other,
            }
        }),
    );

    // Imp:while (_. cond) ({break, continue}. body)
    entries.insert(
        "while".to_string(),
        native2("Imp:while", |cond, body, env| {
            let signals = signal_table();
            loop {
                match apply(&cond, Value::empty_table(), env)? {
                    Value::Bool(true) => {}
                    Value::Bool(false) => return Ok(Value::Symbol("done".to_string())),
                    other => return Err(RuntimeError::unexpected("boolean", &other)),
                }
                match apply(&body, signals.clone(), env) {
                    Ok(_) => {}
                    Err(RuntimeError::LoopBreak) => {
                        return Ok(Value::Symbol("done".to_string()))
                    }
                    Err(RuntimeError::LoopContinue) => {}
                    Err(e) => return Err(e),
                }
            }
        }),
    );

    // Imp:when cond (_. effect)
    entries.insert(
        "when".to_string(),
        native2("Imp:when", |cond, body, env| {
            if as_bool(&cond)? {
                apply(&body, Value::empty_table(), env)
            } else {
                Ok(nothing())
            }
        }),
    );

    // Imp:chain {a: f, b: g} — threads {} through each callable in
    // insertion order, returning the last result
    entries.insert(
        "chain".to_string(),
        Value::native("Imp:chain", |steps, env| {
            let steps = as_table(&steps)?.clone();
            let mut acc = Value::empty_table();
            for (_key, step) in steps {
                acc = apply(&step, acc, env)?;
            }
            Ok(acc)
        }),
    );

    module("Imp", entries)
}

#[cfg(test)]
mod tests {
    use crate::builtins::register_prelude_for_tests;
    use crate::env::Environment;
    use crate::error::RuntimeError;
    use crate::value::Value;
    use std::rc::Rc;

    fn setup() -> Rc<Environment> {
        register_prelude_for_tests().0
    }

    fn eval_in(env: &Rc<Environment>, source: &str) -> Result<Value, RuntimeError> {
        let expr =
            crate::parser::parse_line(source, &crate::parser::default_options()).unwrap();
        crate::eval::interpret(&expr, env)
    }

    fn shown(env: &Rc<Environment>, source: &str) -> String {
        format!("{}", eval_in(env, source).unwrap())
    }

    #[test]
    fn test_early_return_short_circuits() {
        let env = setup();
        assert_eq!(
            shown(&env, "Imp:early_return (return. (return 1) + 2)"),
            "1"
        );
        // no return call: the body's value stands
        assert_eq!(shown(&env, "Imp:early_return (return. 42)"), "42");
    }

    #[test]
    fn test_stray_return_is_an_error() {
        let env = setup();
        eval_in(&env, ":leak .= Imp:early_return (return. return)").unwrap();
        let err = eval_in(&env, "leak 5").unwrap_err();
        assert!(matches!(err, RuntimeError::EarlyReturn(_)));
        assert!(format!("{}", err).contains("outside"));
    }

    #[test]
    fn test_while_counts() {
        let env = setup();
        eval_in(&env, ":n .= 0").unwrap();
        let done = shown(
            &env,
            "Imp:while (_. n < 5) (ctl. IO:define :n (n + 1))",
        );
        assert_eq!(done, ":done");
        assert_eq!(shown(&env, "n"), "5");
    }

    #[test]
    fn test_while_break_and_continue() {
        let env = setup();
        eval_in(&env, ":n .= 0").unwrap();
        eval_in(&env, ":hits .= 0").unwrap();
        // count odd numbers below 10, stopping early at 7
        let source = "Imp:while (_. true) ({break, continue}. Imp:chain {\
             step: _. IO:define :n (n + 1),\
             stop: _. Imp:when (n > 7) break,\
             skip: _. Imp:when (n % 2 ~= 0) continue,\
             hit: _. IO:define :hits (hits + 1)})";
        assert_eq!(shown(&env, source), ":done");
        // odd values seen: 1 3 5 7
        assert_eq!(shown(&env, "hits"), "4");
    }

    #[test]
    fn test_when() {
        let env = setup();
        assert_eq!(shown(&env, "Imp:when true (_. 1)"), "1");
        assert_eq!(shown(&env, "Imp:when false (_. 1)"), ":nothing");
    }

    #[test]
    fn test_chain_threads_results() {
        let env = setup();
        assert_eq!(
            shown(&env, "Imp:chain {a: _. 1, b: x. x + 1, c: x. x * 10}"),
            "20"
        );
        assert_eq!(shown(&env, "Imp:chain {}"), "{}");
    }

    #[test]
    fn test_while_condition_must_be_boolean() {
        let env = setup();
        let err = eval_in(&env, "Imp:while (_. 1) (ctl. 2)").unwrap_err();
        assert!(matches!(err, RuntimeError::UnexpectedType { .. }));
    }
}
