use super::*;
use pretty_assertions::assert_eq;

#[test]
fn unsupported_operator_names_types() {
    let err = unsupported_operator(Operator::Add, &["int", "str"]);
    assert_eq!(err.message, "No builtin implementation for add(int, str)");
    assert!(err.is_recoverable());
}

#[test]
fn symbol_kinds_resolve_names() {
    let table = SymbolTable::new();
    let counter = table.intern("counter");

    let err = final_violation(counter);
    assert_eq!(err.message, format!("Cannot overwrite final value: {counter}"));

    let err = err.resolve_symbols(&table);
    assert_eq!(err.message, "Cannot overwrite final value: counter");
    assert_eq!(err.kind, EvalErrorKind::FinalViolation { symbol: counter });
}

#[test]
fn resolve_leaves_plain_messages_alone() {
    let table = SymbolTable::new();
    let err = failed("boom").resolve_symbols(&table);
    assert_eq!(err.message, "boom");
}

#[test]
fn frames_render_as_breadcrumbs() {
    let err = EvalError::new("outer failure")
        .with_frame("add x y z   main.bbvm line 3")
        .with_frame("call # f g   main.bbvm line 9");
    assert_eq!(
        err.to_string(),
        "outer failure\n   \u{2192} add x y z   main.bbvm line 3\n   \u{2192} call # f g   main.bbvm line 9"
    );
}

#[test]
fn malformed_bytecode_is_unrecoverable() {
    assert!(!unbalanced_block().is_recoverable());
    assert!(!malformed_instruction("bad").is_recoverable());
    assert!(undefined_symbol(Symbol::THIS).is_recoverable());
    assert!(mutable_from_nested_block(Symbol::ARGS).is_recoverable());
}

#[test]
fn index_message_shows_range() {
    assert_eq!(index_out_of_range(5, 2).message, "Index 5 out of range [0,2)");
    assert_eq!(
        shape_mismatch(&[2, 3], &[3]).message,
        "Vector shapes do not match: [2, 3] vs [3]"
    );
}
