//! The `Refl` module: runtime reflection over values and closures
//!
//! `captured` leans on the capture lists computed at lambda
//! construction; missing names (possible when a captured name is
//! `IO:forget`-ten later) are simply omitted.

use crate::ast::{unparse, Expr};
use crate::builtins::module;
use crate::error::RuntimeError;
use crate::value::Value;
use indexmap::IndexMap;

pub fn module_value() -> Value {
    let mut entries = IndexMap::new();

    entries.insert(
        "type".to_string(),
        Value::native("Refl:type", |arg, _env| {
            Ok(Value::Symbol(arg.type_name().to_string()))
        }),
    );

    entries.insert(
        "name".to_string(),
        Value::native("Refl:name", |arg, _env| match &arg {
            Value::Native { name, .. } => Ok(Value::Str(name.resolve())),
            Value::Fun { lambda, .. } => {
                Ok(Value::Str(unparse(&Expr::Lam(lambda.clone()))))
            }
            other => Err(RuntimeError::unexpected("function or native", other)),
        }),
    );

    entries.insert(
        "captured".to_string(),
        Value::native("Refl:captured", |arg, _env| match &arg {
            Value::Fun { lambda, closure } => {
                let mut table = IndexMap::new();
                for name in &lambda.captured {
                    if let Some(value) = closure.get(name) {
                        table.insert(name.clone(), value);
                    }
                }
                Ok(Value::Table(table))
            }
            other => Err(RuntimeError::unexpected("function", other)),
        }),
    );

    entries.insert(
        "source".to_string(),
        Value::native("Refl:source", |arg, _env| match &arg {
            Value::Fun { lambda, .. } => {
                Ok(Value::Str(unparse(&Expr::Lam(lambda.clone()))))
            }
            Value::Native { name, .. } => Ok(Value::Str(name.resolve())),
            other => Err(RuntimeError::unexpected("function or native", other)),
        }),
    );

    module("Refl", entries)
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

    #[test]
    fn test_type_tags() {
        let env = setup();
        assert_eq!(format!("{}", eval_in(&env, "Refl:type 1").unwrap()), ":number");
        assert_eq!(format!("{}", eval_in(&env, "Refl:type 'a'").unwrap()), ":string");
        assert_eq!(format!("{}", eval_in(&env, "Refl:type {}").unwrap()), ":table");
        assert_eq!(
            format!("{}", eval_in(&env, "Refl:type (x. x)").unwrap()),
            ":function"
        );
        assert_eq!(
            format!("{}", eval_in(&env, "Refl:type (+)").unwrap()),
            ":native"
        );
    }

    #[test]
    fn test_source_unparses() {
        let env = setup();
        assert_eq!(
            format!("{}", eval_in(&env, "Refl:source (x y. x)").unwrap()),
            "\"x y. x\""
        );
    }

    #[test]
    fn test_captured_reads_through_closure() {
        let env = setup();
        eval_in(&env, ":n .= 10").unwrap();
        assert_eq!(
            format!("{}", eval_in(&env, "Refl:captured (x. x + n)").unwrap()),
            "{+: +, n: 10}"
        );
    }

    #[test]
    fn test_name_of_partially_applied_native() {
        let env = setup();
        assert_eq!(
            format!("{}", eval_in(&env, "Refl:name ((+) 2)").unwrap()),
            "\"+ 2\""
        );
    }
}
