// ABOUTME: Operator precedence, sections, and runtime-rebindable priorities

use unitlang::interpreter::{HandleRef, Interpreter, RecordingHandle};
use unitlang::parser::{Assoc, Priority};

fn session() -> Interpreter {
    let handle = RecordingHandle::new();
    let as_handle: HandleRef = handle.clone();
    Interpreter::with_parts(as_handle, None, None, Some(handle.modules()), None)
}

fn show(interp: &Interpreter, source: &str) -> String {
    format!("{}", interp.run_line(source).unwrap())
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let interp = session();
    assert_eq!(show(&interp, "1 + 2 * 3"), "7");
    assert_eq!(show(&interp, "(1 + 2) * 3"), "9");
}

#[test]
fn test_application_binds_tighter_than_operators() {
    let interp = session();
    interp.run_line(":double .= (* 2)").unwrap();
    assert_eq!(show(&interp, "double 3 + 1"), "7");
}

#[test]
fn test_exponent_is_right_associative() {
    let interp = session();
    assert_eq!(show(&interp, "2 ^ 3 ^ 2"), "512");
}

#[test]
fn test_subtraction_is_left_associative() {
    let interp = session();
    assert_eq!(show(&interp, "10 - 4 - 3"), "3");
}

#[test]
fn test_rebinding_priority_changes_grouping() {
    let interp = session();
    assert_eq!(show(&interp, "10 - 4 - 3"), "3");

    interp
        .options()
        .borrow_mut()
        .set_priority("-", Priority::new(6, Assoc::Right));
    // now 10 - (4 - 3)
    assert_eq!(show(&interp, "10 - 4 - 3"), "9");
}

#[test]
fn test_rebinding_strength_changes_grouping() {
    let interp = session();
    interp
        .options()
        .borrow_mut()
        .set_priority("+", Priority::new(9, Assoc::Left));
    // + now binds tighter than *
    assert_eq!(show(&interp, "2 * 3 + 4"), "14");
}

#[test]
fn test_unknown_operator_uses_default_priority() {
    let interp = session();
    // `&&&` is undefined as a value but parses at the default (5, Left);
    // comparisons also sit at 5, so the chain groups left
    interp
        .run_line(":&&& .= (a b. if a then b else false)")
        .unwrap();
    assert_eq!(show(&interp, "(1 < 2) &&& (2 < 3)"), "true");
}

#[test]
fn test_sections_evaluate() {
    let interp = session();
    assert_eq!(show(&interp, "(+ 2) 5"), "7");
    assert_eq!(show(&interp, "(2 +) 5"), "7");
    assert_eq!(show(&interp, "(- 2) 5"), "3");
    assert_eq!(show(&interp, "(2 -) 5"), "-3");
    assert_eq!(show(&interp, "(+) 2 3"), "5");
}

#[test]
fn test_sections_with_strings() {
    let interp = session();
    assert_eq!(show(&interp, "('a' ++) 'b'"), "\"ab\"");
    assert_eq!(show(&interp, "(++ 'b') 'a'"), "\"ab\"");
}

#[test]
fn test_operators_are_first_class() {
    let interp = session();
    let value = interp
        .run_multiline_return_last(
            ":fold3 .= (op z. op (op z 1) 2); fold3 (+) 0",
        )
        .unwrap();
    assert_eq!(format!("{}", value), "3");
}

#[test]
fn test_backtick_priority_regroups() {
    let interp = session();
    interp.run_line(":snd .= (a b. b)").unwrap();
    // default (5, Left): (2 * 3) snd 10 = 10
    assert_eq!(show(&interp, "2 * 3 `snd` 10"), "10");

    interp.options().borrow_mut().backtick_priority = Priority::new(9, Assoc::Left);
    // strong: 2 * (3 snd 10) = 20
    assert_eq!(show(&interp, "2 * 3 `snd` 10"), "20");
}

#[test]
fn test_operator_redefinition_as_value() {
    let interp = session();
    // rebind `-` to addition; the parser still treats it as infix
    interp.run_line(":- .= (+)").unwrap();
    assert_eq!(show(&interp, "10 - 4"), "14");
}

#[test]
fn test_dollar_avoids_parentheses() {
    let interp = session();
    interp.run_line(":inc .= (+ 1)").unwrap();
    assert_eq!(show(&interp, "inc $ inc $ 1 + 1"), "4");
}
