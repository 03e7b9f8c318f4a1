//! The `Sym` module: conversions between symbols and strings

use crate::builtins::{as_str, as_symbol, module};
use crate::value::Value;
use indexmap::IndexMap;

pub fn module_value() -> Value {
    let mut entries = IndexMap::new();

    entries.insert(
        "name".to_string(),
        Value::native("Sym:name", |arg, _env| {
            Ok(Value::Str(as_symbol(&arg)?.to_string()))
        }),
    );

    entries.insert(
        "of".to_string(),
        Value::native("Sym:of", |arg, _env| {
            Ok(Value::Symbol(as_str(&arg)?.to_string()))
        }),
    );

    module("Sym", entries)
}

#[cfg(test)]
mod tests {
    use crate::builtins::register_prelude_for_tests;
    use crate::error::RuntimeError;
    use crate::value::Value;

    fn eval(source: &str) -> Result<Value, RuntimeError> {
        let (env, _handle) = register_prelude_for_tests();
        let expr =
            crate::parser::parse_line(source, &crate::parser::default_options()).unwrap();
        crate::eval::interpret(&expr, &env)
    }

    #[test]
    fn test_name_and_of() {
        assert_eq!(format!("{}", eval("Sym:name :hello").unwrap()), "\"hello\"");
        assert_eq!(format!("{}", eval("Sym:of 'hello'").unwrap()), ":hello");
    }

    #[test]
    fn test_round_trip_through_table_access() {
        // a computed symbol drives table access
        assert_eq!(
            format!("{}", eval("{x: 7} (Sym:of 'x')").unwrap()),
            "7"
        );
    }

    #[test]
    fn test_type_errors() {
        assert!(matches!(
            eval("Sym:name 'already a string'"),
            Err(RuntimeError::UnexpectedType { .. })
        ));
        assert!(matches!(
            eval("Sym:of :already"),
            Err(RuntimeError::UnexpectedType { .. })
        ));
    }
}
