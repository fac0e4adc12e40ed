use super::*;
use crate::errors::EvalErrorKind;
use pretty_assertions::assert_eq;

fn run(op: Operator, args: &[Value]) -> Value {
    dispatch(op, args).unwrap().unwrap()
}

// Arithmetic

#[test]
fn int_arithmetic_stays_int() {
    assert_eq!(run(Operator::Add, &[Value::Int(2), Value::Int(3)]), Value::Int(5));
    assert_eq!(run(Operator::Sub, &[Value::Int(2), Value::Int(3)]), Value::Int(-1));
    assert_eq!(run(Operator::Mul, &[Value::Int(4), Value::Int(3)]), Value::Int(12));
    assert_eq!(run(Operator::Mod, &[Value::Int(7), Value::Int(3)]), Value::Int(1));
    assert_eq!(run(Operator::Pow, &[Value::Int(2), Value::Int(10)]), Value::Int(1024));
}

#[test]
fn int_division_is_float() {
    assert_eq!(run(Operator::Div, &[Value::Int(1), Value::Int(2)]), Value::Float(0.5));
}

#[test]
fn mixed_arithmetic_promotes() {
    assert_eq!(run(Operator::Add, &[Value::Int(1), Value::Float(0.5)]), Value::Float(1.5));
    assert_eq!(run(Operator::Mul, &[Value::Float(2.0), Value::Int(3)]), Value::Float(6.0));
}

#[test]
fn arithmetic_errors() {
    let err = dispatch(Operator::Mod, &[Value::Int(1), Value::Int(0)]).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::ModuloByZero);

    let err = dispatch(Operator::Add, &[Value::Int(i64::MAX), Value::Int(1)]).unwrap_err();
    assert!(err.message.contains("overflow"));
}

#[test]
fn string_concatenation() {
    assert_eq!(
        run(Operator::Add, &[Value::from("ab"), Value::from("cd")]),
        Value::from("abcd")
    );
}

#[test]
fn unsupported_combination_names_types() {
    let err = dispatch(Operator::Add, &[Value::Int(1), Value::from("x")]).unwrap_err();
    assert_eq!(err.message, "No builtin implementation for add(int, str)");
    let err = dispatch(Operator::Not, &[Value::Int(1)]).unwrap_err();
    assert_eq!(err.message, "No builtin implementation for not(int)");
}

#[test]
fn error_operands_reraise() {
    let err = dispatch(Operator::Add, &[Value::Int(1), Value::error("bad input")]).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::Failed { message: "bad input".into() });
}

// Comparison and logic

#[test]
fn comparisons() {
    assert_eq!(run(Operator::Lt, &[Value::Int(1), Value::Int(2)]), Value::Bool(true));
    assert_eq!(run(Operator::Ge, &[Value::Int(1), Value::Float(1.0)]), Value::Bool(true));
    assert_eq!(run(Operator::Gt, &[Value::from("b"), Value::from("a")]), Value::Bool(true));
    assert_eq!(run(Operator::Eq, &[Value::Int(2), Value::Float(2.0)]), Value::Bool(true));
    assert_eq!(run(Operator::Neq, &[Value::from("a"), Value::from("a")]), Value::Bool(false));
    assert!(dispatch(Operator::Eq, &[Value::Int(1), Value::from("1")]).is_err());
}

#[test]
fn logic_requires_bools() {
    assert_eq!(run(Operator::And, &[Value::Bool(true), Value::Bool(false)]), Value::Bool(false));
    assert_eq!(run(Operator::Or, &[Value::Bool(true), Value::Bool(false)]), Value::Bool(true));
    assert!(dispatch(Operator::And, &[Value::Int(1), Value::Bool(true)]).is_err());
}

// Conversions

#[test]
fn conversions() {
    assert_eq!(run(Operator::ToInt, &[Value::Float(3.9)]), Value::Int(3));
    assert_eq!(run(Operator::ToInt, &[Value::from(" 42 ")]), Value::Int(42));
    assert_eq!(run(Operator::ToFloat, &[Value::Int(2)]), Value::Float(2.0));
    assert_eq!(run(Operator::ToStr, &[Value::Float(0.5)]), Value::from("0.500000"));
    assert_eq!(run(Operator::ToBool, &[Value::Int(0)]), Value::Bool(false));
    assert!(dispatch(Operator::ToInt, &[Value::from("abc")]).is_err());
}

// Lists

#[test]
fn list_operations() {
    let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
    assert_eq!(dispatch(Operator::Push, &[list.clone(), Value::Int(3)]).unwrap(), None);
    assert_eq!(run(Operator::Len, &[list.clone()]), Value::Int(3));
    assert_eq!(run(Operator::At, &[list.clone(), Value::Int(2)]), Value::Int(3));
    assert_eq!(run(Operator::Next, &[list.clone()]), Value::Int(1));
    assert_eq!(run(Operator::Pop, &[list.clone()]), Value::Int(3));
    assert_eq!(list.to_string(), "[2]");

    dispatch(Operator::Put, &[list.clone(), Value::Int(0), Value::from("x")]).unwrap();
    assert_eq!(list.to_string(), "[x]");

    let err = dispatch(Operator::At, &[list.clone(), Value::Int(5)]).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::IndexOutOfRange { index: 5, len: 1 });
}

#[test]
fn empty_list_pop_is_none() {
    let list = Value::list(vec![]);
    assert_eq!(dispatch(Operator::Pop, &[list.clone()]).unwrap(), None);
    assert_eq!(dispatch(Operator::Next, &[list]).unwrap(), None);
}

#[test]
fn copy_unshares_lists() {
    let list = Value::list(vec![Value::Int(1)]);
    let copy = run(Operator::Copy, &[list.clone()]);
    dispatch(Operator::Push, &[copy.clone(), Value::Int(2)]).unwrap();
    assert_eq!(run(Operator::Len, &[list]), Value::Int(1));
    assert_eq!(run(Operator::Len, &[copy]), Value::Int(2));
}

#[test]
fn list_reductions() {
    let ints = Value::list(vec![Value::Int(3), Value::Int(1), Value::Int(2)]);
    assert_eq!(run(Operator::Sum, &[ints.clone()]), Value::Int(6));
    assert_eq!(run(Operator::Max, &[ints.clone()]), Value::Int(3));
    assert_eq!(run(Operator::Min, &[ints]), Value::Int(1));

    let mixed = Value::list(vec![Value::Int(1), Value::Float(0.5)]);
    assert_eq!(run(Operator::Sum, &[mixed]), Value::Float(1.5));
}

// Vectors

fn vector(data: &[f64]) -> Value {
    Value::Vector(NumVector::from_vec(data.to_vec()))
}

fn floats(value: &Value) -> Vec<f64> {
    match value {
        Value::Vector(v) => v.to_vec(),
        other => panic!("expected a vector, got {other:?}"),
    }
}

#[test]
fn vector_elementwise() {
    let a = vector(&[1.0, 2.0]);
    let b = vector(&[3.0, 4.0]);
    assert_eq!(floats(&run(Operator::Add, &[a.clone(), b])), vec![4.0, 6.0]);
    assert_eq!(floats(&run(Operator::Mul, &[a.clone(), Value::Int(2)])), vec![2.0, 4.0]);
    assert_eq!(floats(&run(Operator::Sub, &[Value::Int(1), a])), vec![0.0, -1.0]);
}

#[test]
fn vector_shape_mismatch() {
    let err = dispatch(Operator::Add, &[vector(&[1.0]), vector(&[1.0, 2.0])]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::ShapeMismatch { .. }));
}

#[test]
fn vector_views_share_storage() {
    let matrix = run(Operator::ToVector, &[Value::Int(2), Value::Int(3)]);
    assert_eq!(
        run(Operator::Shape, &[matrix.clone()]).to_string(),
        "[2, 3]"
    );
    let row = run(Operator::At, &[matrix.clone(), Value::Int(1)]);
    dispatch(Operator::Put, &[row.clone(), Value::Int(2), Value::Float(5.0)]).unwrap();

    assert_eq!(floats(&matrix), vec![0.0, 0.0, 0.0, 0.0, 0.0, 5.0]);
    assert_eq!(run(Operator::At, &[row, Value::Int(2)]), Value::Float(5.0));
    assert_eq!(run(Operator::Sum, &[matrix.clone()]), Value::Float(5.0));
    assert!(dispatch(Operator::Put, &[matrix, Value::Int(0), Value::Float(1.0)]).is_err());
}

#[test]
fn oversized_vectors_fail_instead_of_panicking() {
    let huge = Value::Int(1 << 32);
    let err = dispatch(Operator::ToVector, &[huge.clone(), huge]).unwrap_err();
    assert!(err.message.contains("too large"), "{}", err.message);

    // Element count fits, byte count does not.
    let err = dispatch(Operator::ToVector, &[Value::Int(1 << 62)]).unwrap_err();
    assert!(err.message.contains("too large"), "{}", err.message);

    let empty = run(Operator::ToVector, &[Value::Int(0), Value::Int(1 << 40)]);
    assert_eq!(run(Operator::Len, &[empty]), Value::Int(0));
}

#[test]
fn list_to_vector_requires_numbers() {
    let list = Value::list(vec![Value::Int(1), Value::Float(2.5)]);
    assert_eq!(floats(&run(Operator::ToVector, &[list])), vec![1.0, 2.5]);
    let bad = Value::list(vec![Value::from("x")]);
    assert!(dispatch(Operator::ToVector, &[bad]).is_err());
}

// Files

#[test]
fn file_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.txt");
    std::fs::write(&path, "first\nsecond\n").unwrap();

    let file = run(Operator::ToFile, &[Value::from(&*path.to_string_lossy())]);
    assert_eq!(run(Operator::Len, &[file.clone()]), Value::Int(2));
    assert_eq!(run(Operator::At, &[file.clone(), Value::Int(1)]), Value::from("second"));
    assert_eq!(run(Operator::ToStr, &[file]), Value::from("first\nsecond"));
}

#[test]
fn directory_lists_entries() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("b.txt"), "").unwrap();
    std::fs::write(dir.path().join("a.txt"), "").unwrap();

    let file = run(Operator::ToFile, &[Value::from(&*dir.path().to_string_lossy())]);
    assert_eq!(run(Operator::Len, &[file.clone()]), Value::Int(2));
    let first = run(Operator::At, &[file, Value::Int(0)]).to_string();
    assert!(first.ends_with("a.txt"), "{first}");
}

#[test]
fn missing_file_fails_on_use() {
    let file = run(Operator::ToFile, &[Value::from("/definitely/not/here.txt")]);
    let err = dispatch(Operator::Len, &[file]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::Io { .. }));
    assert!(dispatch(Operator::ToFile, &[Value::from("http://example.com/x")]).is_err());
}
