//! Error kinds, messages, and the breadcrumb trail they collect.

use bb_runtime::{EvalErrorKind, Value};
use pretty_assertions::assert_eq;

use super::{run_err, run_ok};
use crate::load;

#[test]
fn final_violation_names_the_symbol() {
    let (s, err) = run_err(&["BUILTIN x I1", "final # x", "BUILTIN x I2"]);
    assert!(matches!(err.kind, EvalErrorKind::FinalViolation { .. }));
    assert_eq!(err.message, "Cannot overwrite final value: x");
    assert_eq!(s.get("x"), Value::Int(1));
}

#[test]
fn final_list_cannot_be_reassigned_to_itself() {
    let (s, err) = run_err(&["List l", "final # l", "IS l l"]);
    assert!(matches!(err.kind, EvalErrorKind::FinalViolation { .. }));
    assert_eq!(err.message, "Cannot overwrite final value: l");
    assert_eq!(s.get("l").type_name(), "list");
}

#[test]
fn frames_record_instruction_and_line() {
    let (_s, err) = run_err(&["BUILTIN x I1", "final # x", "BUILTIN x I2"]);
    assert_eq!(err.frames.len(), 1);
    assert!(err.frames[0].starts_with("BUILTIN x"), "{}", err.frames[0]);
    assert!(err.frames[0].ends_with("test.bbvm line 3"), "{}", err.frames[0]);
}

#[test]
fn frames_grow_outward_through_nested_blocks() {
    let (_s, err) = run_err(&[
        "BEGIN inner",
        "BUILTIN m \"deep\"",
        "fail # m",
        "END",
        "BEGIN outer",
        "inline # inner",
        "END",
        "inline # outer",
    ]);
    assert_eq!(err.message, "deep");
    let lines: Vec<&str> = err
        .frames
        .iter()
        .map(|frame| frame.rsplit("  ").next().unwrap_or_default())
        .collect();
    assert_eq!(
        lines,
        ["test.bbvm line 3", "test.bbvm line 6", "test.bbvm line 8"]
    );
}

#[test]
fn errors_from_spawned_units_surface_when_read() {
    let (_s, err) = run_err(&[
        "BEGINFINAL boom",
        "BUILTIN m \"unit failed\"",
        "fail # m",
        "END",
        "call r # boom",
        "BUILTIN after I1",
        "IS out r",
    ]);
    assert_eq!(err.message, "unit failed");
    // Thrown inside the unit, then at the call site, then where it was read.
    assert_eq!(err.frames.len(), 3);
    assert!(err.frames[2].ends_with("line 7"), "{}", err.frames[2]);
}

#[test]
fn try_intercepts_failure_of_a_spawned_unit() {
    let s = run_ok(&[
        "BEGINFINAL boom",
        "BUILTIN m \"unit failed\"",
        "fail # m",
        "END",
        "BEGIN block",
        "call r # boom",
        "END",
        "try e block",
    ]);
    match s.get("e") {
        Value::Error(error) => {
            assert!(error.message().starts_with("unit failed"), "{}", error.message());
        }
        other => panic!("expected an error value, got {other:?}"),
    }
}

#[test]
fn undefined_symbol_reports_missing_value() {
    let (_s, err) = run_err(&["BUILTIN a I1", "add b a nowhere"]);
    assert!(matches!(err.kind, EvalErrorKind::UndefinedSymbol { .. }));
    assert_eq!(err.message, "Missing value: nowhere");
}

#[test]
fn temporaries_are_read_locally() {
    let (_s, err) = run_err(&[
        "BUILTIN _bb0 I1",
        "BEGIN block",
        "add x _bb0 _bb0",
        "END",
        "BEGIN ctor",
        "inline # block",
        "END",
        "new obj ctor",
    ]);
    assert_eq!(err.message, "Missing value: _bb0");
}

#[test]
fn finalizing_a_temporary_fails() {
    let (_s, err) = run_err(&["BUILTIN _bb0 I1", "final # _bb0"]);
    assert_eq!(err.message, "Cannot finalize a temporary variable: _bb0");
}

#[test]
fn operator_errors_are_recoverable() {
    let s = run_ok(&[
        "BUILTIN a I1",
        "BUILTIN zero I0",
        "BEGIN block",
        "mod r a zero",
        "END",
        "try e block",
    ]);
    match s.get("e") {
        Value::Error(error) => assert!(error.message().starts_with("Modulo by zero")),
        other => panic!("expected an error value, got {other:?}"),
    }
}

#[test]
fn oversized_vector_is_a_catchable_error() {
    let s = run_ok(&[
        "BUILTIN n I4294967296",
        "BEGIN block",
        "Vector v n n",
        "END",
        "try e block",
    ]);
    match s.get("e") {
        Value::Error(error) => {
            assert!(error.message().contains("too large"), "{}", error.message());
        }
        other => panic!("expected an error value, got {other:?}"),
    }
    assert_eq!(s.get_or_null("v"), None);
}

#[test]
fn unbalanced_block_is_fatal() {
    let (_s, err) = run_err(&["BEGIN f", "BUILTIN x I1"]);
    assert_eq!(err.kind, EvalErrorKind::UnbalancedBlock);
    assert!(!err.is_recoverable());
}

#[test]
fn malformed_listing_fails_to_load() {
    let err = load("BUILTIN x Q1", "bad.bbvm").unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::MalformedInstruction { .. }));
    assert!(err.message.starts_with("bad.bbvm: line 1"), "{}", err.message);

    let err = load("jump x", "bad.bbvm").unwrap_err();
    assert!(err.message.contains("unknown instruction `jump`"), "{}", err.message);
}
