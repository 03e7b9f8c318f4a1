// ABOUTME: Prelude behavior: modules, fallback, control flow, and IO

use std::rc::Rc;
use unitlang::error::{LangError, RuntimeError};
use unitlang::interpreter::{HandleRef, Interpreter, RecordingHandle};
use unitlang::value::Value;

fn session() -> (Interpreter, Rc<RecordingHandle>) {
    let handle = RecordingHandle::new();
    let as_handle: HandleRef = handle.clone();
    let interp = Interpreter::with_parts(as_handle, None, None, Some(handle.modules()), None);
    (interp, handle)
}

fn show(interp: &Interpreter, source: &str) -> String {
    format!("{}", interp.run_line(source).unwrap())
}

fn runtime_err(interp: &Interpreter, source: &str) -> RuntimeError {
    match interp.run_line(source) {
        Err(LangError::Runtime(e)) => e,
        other => panic!("expected runtime error, got {:?}", other),
    }
}

#[test]
fn test_fallback_semantics() {
    let (interp, _) = session();
    assert_eq!(show(&interp, "({x: 1} |? {y: 2}) :y"), "2");
    assert_eq!(show(&interp, "({x: 1} |? {y: 2}) :x"), "1");

    // a non-MissingKey error from the primary propagates untouched
    let err = runtime_err(&interp, "((x. x ++ 1) |? {y: 2}) :y");
    assert!(matches!(err, RuntimeError::UnexpectedType { .. }));
}

#[test]
fn test_fallback_chains_right_associatively() {
    let (interp, _) = session();
    let source = "({a: 1} |? {b: 2} |? {c: 3}) :c";
    assert_eq!(show(&interp, source), "3");
}

#[test]
fn test_modules_answer_table_introspection() {
    let (interp, _) = session();
    assert_eq!(show(&interp, "Sym :__table__ :name :x"), "\"x\"");
    // every advertised module responds to symbols
    for module in ["IO", "Str", "Sym", "Refl", "Imp"] {
        let source = format!("Refl:type ({} :__table__)", module);
        assert_eq!(show(&interp, &source), ":table");
    }
}

#[test]
fn test_missing_module_entry_is_missing_key() {
    let (interp, _) = session();
    let err = runtime_err(&interp, "Str :no_such_thing");
    assert!(matches!(err, RuntimeError::MissingKey(key) if key == "no_such_thing"));
}

#[test]
fn test_str_module_pipeline() {
    let (interp, _) = session();
    assert_eq!(
        show(&interp, "'  Hello  ' |> Str:trim |> Str:upper |> Str:len"),
        "5"
    );
}

#[test]
fn test_sym_bridges_strings_and_tables() {
    let (interp, _) = session();
    let value = interp
        .run_multiline_return_last(
            ":key .= Sym:of ('na' ++ 'me'); {name: 'found'} key",
        )
        .unwrap();
    assert!(matches!(value, Value::Str(s) if s == "found"));
}

#[test]
fn test_refl_captured_lists_free_names_in_order() {
    let (interp, _) = session();
    interp.run_line(":a .= 1").unwrap();
    interp.run_line(":b .= 2").unwrap();
    assert_eq!(
        show(&interp, "Refl:captured (x. b + a)"),
        "{+: +, b: 2, a: 1}"
    );
}

#[test]
fn test_early_return() {
    let (interp, _) = session();
    interp
        .run_line(
            ":find_even .= (n. Imp:early_return (return. Imp:chain {\
                 check: _. Imp:when (n % 2 ~= 0) (_. return n),\
                 fallthrough: _. 0}))",
        )
        .unwrap();
    // even input returns through the non-local exit
    assert_eq!(show(&interp, "find_even 4"), "4");
    // odd input falls through the whole chain
    assert_eq!(show(&interp, "find_even 3"), "0");
}

#[test]
fn test_while_accumulates() {
    let (interp, _) = session();
    let source = ":sum .= 0; :i .= 0; \
         Imp:while (_. i < 5) (ctl. Imp:chain {\
             bump: _. IO:define :i (i + 1),\
             add: _. IO:define :sum (sum + i)}); \
         sum";
    assert_eq!(
        format!("{}", interp.run_multiline_return_last(source).unwrap()),
        "15"
    );
}

#[test]
fn test_try_recovers_from_missing_key() {
    let (interp, _) = session();
    let source = "IO:try ({}. {a: 1} :b) :err :kind";
    assert_eq!(show(&interp, source), ":missing_key");
}

#[test]
fn test_try_passes_values_through() {
    let (interp, _) = session();
    assert_eq!(show(&interp, "IO:try ({}. 6 * 7) :ok"), "42");
}

#[test]
fn test_define_is_visible_to_earlier_closures() {
    let (interp, _) = session();
    let source = ":probe .= ({}. late_binding); \
         IO:define :late_binding 'arrived'; \
         probe {}";
    let value = interp.run_multiline_return_last(source).unwrap();
    assert!(matches!(value, Value::Str(s) if s == "arrived"));
}

#[test]
fn test_io_read_and_print_round_trip() {
    let (interp, handle) = session();
    handle.queue_line("world");
    interp
        .run_line("IO:print ('hello ' ++ IO:read {})")
        .unwrap();
    assert_eq!(handle.written(), vec!["hello world".to_string()]);
}

#[test]
fn test_import_memoisation_shares_state() {
    let (interp, handle) = session();
    handle.add_module("counter", ":state .= {hits: 1}; state");
    interp.run_line(":a .= IO:import 'counter'").unwrap();
    interp.run_line(":b .= IO:import 'counter'").unwrap();
    assert_eq!(handle.resolutions(), 1);
    assert_eq!(show(&interp, "a ~= b"), "true");
}

#[test]
fn test_circular_import_reports() {
    let (interp, handle) = session();
    handle.add_module("ouro", "IO:import 'ouro'");
    let err = runtime_err(&interp, "IO:import 'ouro'");
    assert!(format!("{}", err).contains("circular import"));
}

#[test]
fn test_unit_constructors_check_dimensionless() {
    let (interp, _) = session();
    assert!(matches!(
        runtime_err(&interp, "kilograms (meters 1)"),
        RuntimeError::NotInDomain { .. }
    ));
    assert_eq!(show(&interp, "kilograms 2 * meters 1"), "2 m kg");
}

#[test]
fn test_weak_equality_table_order_independence() {
    let (interp, _) = session();
    assert_eq!(
        show(&interp, "{a: {b: 1}, c: 2} ~= {c: 2, a: {b: 1}}"),
        "true"
    );
}

#[test]
fn test_booleans_are_plain_bindings() {
    let (interp, _) = session();
    assert_eq!(show(&interp, "if true then 1 else 2"), "1");
    assert_eq!(show(&interp, "true ~= false"), "false");
}
