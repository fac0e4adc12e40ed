//! Conditionals, loops, `try`/`catch`, `inline` and `default`.

use bb_runtime::Value;
use pretty_assertions::assert_eq;

use super::{run_err, run_ok};

#[test]
fn while_with_code_condition_runs_body_until_false() {
    let s = run_ok(&[
        "BUILTIN i I0",
        "BUILTIN runs I0",
        "BEGIN check",
        "BUILTIN _bb0 I3",
        "lt _bb1 i _bb0",
        "return # _bb1",
        "END",
        "BEGINFINAL body",
        "BUILTIN _bb2 I1",
        "add i i _bb2",
        "add runs runs _bb2",
        "END",
        "while # check body",
    ]);
    assert_eq!(s.get("i"), Value::Int(3));
    assert_eq!(s.get("runs"), Value::Int(3));
}

#[test]
fn while_rereads_bool_condition_each_iteration() {
    let s = run_ok(&[
        "BUILTIN i I0",
        "BUILTIN one I1",
        "BUILTIN limit I4",
        "lt go i limit",
        "BEGIN body",
        "add i i one",
        "lt go i limit",
        "END",
        "while # go body",
    ]);
    assert_eq!(s.get("i"), Value::Int(4));
    assert_eq!(s.get("go"), Value::Bool(false));
}

#[test]
fn while_with_false_condition_never_runs() {
    let s = run_ok(&[
        "BUILTIN go Bfalse",
        "BEGIN body",
        "BUILTIN touched Btrue",
        "END",
        "while # go body",
    ]);
    assert_eq!(s.get_or_null("touched"), None);
}

#[test]
fn condition_must_be_bool() {
    let (_s, err) = run_err(&[
        "BUILTIN go I1",
        "BEGIN body",
        "END",
        "while # go body",
    ]);
    assert!(err.message.contains("bool"), "{}", err.message);
}

#[test]
fn if_runs_the_matching_branch_in_place() {
    let s = run_ok(&[
        "BUILTIN yes Btrue",
        "BEGIN accept",
        "BUILTIN branch \"accept\"",
        "END",
        "BEGIN reject",
        "BUILTIN branch \"reject\"",
        "END",
        "if # yes accept reject",
        "not no yes",
        "if # no reject accept",
    ]);
    assert_eq!(s.get("branch"), Value::string("accept"));
}

#[test]
fn if_with_value_branches_yields_the_value() {
    let s = run_ok(&[
        "BUILTIN cond Bfalse",
        "BUILTIN a I1",
        "BUILTIN b I2",
        "if picked cond a b",
    ]);
    assert_eq!(s.get("picked"), Value::Int(2));
}

#[test]
fn if_without_reject_branch_unbinds_destination() {
    let s = run_ok(&[
        "BUILTIN cond Bfalse",
        "BUILTIN a I1",
        "BUILTIN picked I9",
        "if picked cond a",
    ]);
    assert_eq!(s.get_or_null("picked"), None);
}

#[test]
fn try_intercepts_return() {
    let s = run_ok(&[
        "BEGIN block",
        "BUILTIN _bb0 I5",
        "return # _bb0",
        "BUILTIN after Btrue",
        "END",
        "try result block",
    ]);
    assert_eq!(s.get("result"), Value::Int(5));
    assert_eq!(s.get_or_null("after"), None);
}

#[test]
fn try_without_signal_yields_consumed_error() {
    let s = run_ok(&[
        "BEGIN block",
        "BUILTIN a I1",
        "add b a a",
        "END",
        "try result block",
    ]);
    assert_eq!(s.get("b"), Value::Int(2));
    match s.get("result") {
        Value::Error(error) => {
            assert!(error.message().starts_with("No return or fail signal"));
            assert!(error.is_consumed());
        }
        other => panic!("expected an error value, got {other:?}"),
    }
}

#[test]
fn try_turns_failure_into_error_value() {
    let s = run_ok(&[
        "BEGIN block",
        "BUILTIN msg \"boom\"",
        "fail # msg",
        "END",
        "try result block",
    ]);
    match s.get("result") {
        Value::Error(error) => {
            assert!(error.message().starts_with("boom"), "{}", error.message());
            assert!(!error.is_consumed());
        }
        other => panic!("expected an error value, got {other:?}"),
    }
}

#[test]
fn return_inside_try_does_not_leave_the_program() {
    let s = run_ok(&[
        "BEGIN block",
        "BUILTIN _bb0 I1",
        "return # _bb0",
        "END",
        "try result block",
        "BUILTIN after Btrue",
    ]);
    assert_eq!(s.get("after"), Value::Bool(true));
}

#[test]
fn catch_runs_accept_and_consumes_error() {
    let s = run_ok(&[
        "BEGIN block",
        "BUILTIN msg \"bad input\"",
        "fail # msg",
        "END",
        "try result block",
        "BEGIN handled",
        "BUILTIN caught Btrue",
        "END",
        "BEGIN fine",
        "BUILTIN caught Bfalse",
        "END",
        "catch # result handled fine",
    ]);
    assert_eq!(s.get("caught"), Value::Bool(true));
    match s.get("result") {
        Value::Error(error) => assert!(error.is_consumed()),
        other => panic!("expected an error value, got {other:?}"),
    }
}

#[test]
fn catch_runs_reject_for_plain_values() {
    let s = run_ok(&[
        "BUILTIN v I1",
        "BEGIN yes",
        "BUILTIN r \"error\"",
        "END",
        "BEGIN no",
        "BUILTIN r \"fine\"",
        "END",
        "catch # v yes no",
        "catch # never_bound yes",
    ]);
    assert_eq!(s.get("r"), Value::string("fine"));
}

#[test]
fn as_consumes_and_is_reraises() {
    let s = run_ok(&[
        "BEGIN block",
        "BUILTIN m \"bad\"",
        "fail # m",
        "END",
        "try e block",
        "exists had_value e",
        "AS copy e",
        "BUILTIN one I1",
        "exists ok one",
        "exists missing nowhere",
    ]);
    assert_eq!(s.get("had_value"), Value::Bool(false));
    assert_eq!(s.get("ok"), Value::Bool(true));
    assert_eq!(s.get("missing"), Value::Bool(false));
    match s.get("copy") {
        Value::Error(error) => assert!(error.is_consumed()),
        other => panic!("expected an error value, got {other:?}"),
    }

    let (_s, err) = run_err(&[
        "BEGIN block",
        "BUILTIN m \"bad\"",
        "fail # m",
        "END",
        "try e block",
        "IS again e",
    ]);
    assert!(err.message.starts_with("bad"), "{}", err.message);
}

#[test]
fn inline_runs_block_in_current_scope() {
    let s = run_ok(&[
        "BEGIN block",
        "BUILTIN z I3",
        "END",
        "inline # block",
    ]);
    assert_eq!(s.get("z"), Value::Int(3));
}

#[test]
fn inline_pulls_struct_fields_except_this() {
    let s = run_ok(&[
        "BEGIN ctor",
        "BUILTIN x I10",
        "END",
        "new obj ctor",
        "inline # obj",
    ]);
    assert_eq!(s.get("x"), Value::Int(10));
    assert_eq!(s.scope.get_local_or_null(bb_ir::Symbol::THIS).unwrap(), None);
}

#[test]
fn default_only_fills_missing_names() {
    let s = run_ok(&[
        "BUILTIN x I1",
        "BEGIN defaults",
        "BUILTIN x I100",
        "BUILTIN y I2",
        "END",
        "default # defaults",
    ]);
    assert_eq!(s.get("x"), Value::Int(1));
    assert_eq!(s.get("y"), Value::Int(2));
}

#[test]
fn default_rejects_return() {
    let (_s, err) = run_err(&[
        "BEGIN defaults",
        "BUILTIN y I2",
        "return # y",
        "END",
        "default # defaults",
    ]);
    assert!(
        err.message.contains("Cannot return from within a `default` statement"),
        "{}",
        err.message
    );
}

#[test]
fn return_unwinds_nested_if_and_while() {
    let s = run_ok(&[
        "BEGINFINAL count_to_three",
        "BUILTIN i I0",
        "BUILTIN one I1",
        "BUILTIN go Btrue",
        "BEGIN leave",
        "return # i",
        "END",
        "BEGIN body",
        "add i i one",
        "BUILTIN three I3",
        "eq stop i three",
        "if # stop leave",
        "END",
        "while # go body",
        "END",
        "call r # count_to_three",
        "IS out r",
    ]);
    assert_eq!(s.get("out"), Value::Int(3));
}
