use super::*;
use crate::program::Program;
use crate::scope::Scope;
use bb_ir::{Symbol, SymbolTable};
use pretty_assertions::assert_eq;

#[test]
fn type_names() {
    let cases = [
        (Value::Bool(true), "bool"),
        (Value::Int(1), "int"),
        (Value::Float(1.0), "float"),
        (Value::from("s"), "str"),
        (Value::list(vec![]), "list"),
        (Value::error("e"), "error"),
    ];
    for (value, name) in cases {
        assert_eq!(value.type_name(), name);
    }
}

#[test]
fn only_booleans_are_conditions() {
    assert!(Value::Bool(true).is_true().unwrap());
    assert!(!Value::Bool(false).is_true().unwrap());
    let err = Value::Int(1).is_true().unwrap_err();
    assert_eq!(err.message, "Expected bool but got int");
}

#[test]
fn display_forms() {
    assert_eq!(Value::Float(2.5).to_string(), "2.500000");
    assert_eq!(Value::Int(-3).to_string(), "-3");
    let nested = Value::list(vec![Value::Int(1), Value::list(vec![Value::from("a")])]);
    assert_eq!(nested.to_string(), "[1, [a]]");
    let long = Value::Vector(NumVector::from_vec((0..12).map(f64::from).collect()));
    assert!(long.to_string().ends_with(", ...]"));
}

#[test]
fn identity_versus_equality() {
    let a = Value::list(vec![]);
    let b = Value::list(vec![]);
    assert!(a.ptr_eq(&a.clone()));
    assert!(!a.ptr_eq(&b));
    assert_eq!(Value::Int(3), Value::Int(3));
    assert!(!Value::Int(3).ptr_eq(&Value::Int(3)));
}

#[test]
fn error_consumption() {
    let error = ErrorValue::new("boom");
    assert!(!error.is_consumed());
    let shared = error.clone();
    shared.consume();
    assert!(error.is_consumed());
    assert!(ErrorValue::consumed("x").is_consumed());
}

#[test]
fn closure_metadata_is_write_once_and_shared() {
    let symbols = SymbolTable::shared();
    let key = symbols.intern("doc");
    let program = Program::new(Vec::new(), symbols);
    let closure = Closure::new(program, 1, 4, Declaration::Detached);

    closure.metadata().set(key, Value::from("adds")).unwrap();
    assert!(closure.metadata().set(key, Value::from("again")).is_err());

    let rebound = closure.rebind(Declaration::Strong(Scope::new_root()));
    assert_eq!(rebound.metadata().get(key).unwrap(), Value::from("adds"));
    assert!(!rebound.ptr_eq(&closure));
    assert!(rebound.metadata().get(Symbol::ARGS).is_err());
    assert_eq!(closure.to_string(), "code block in lines 1 to 4");
}

#[test]
fn weak_declarations_expire() {
    let program = Program::new(Vec::new(), SymbolTable::shared());
    let scope = Scope::new_root();
    let closure = Closure::new(program, 0, 0, Declaration::Weak(scope.downgrade()));
    assert!(closure.declaration_scope().is_some());
    drop(scope);
    assert!(closure.declaration_scope().is_none());
    assert!(closure.detached().declaration_scope().is_none());
}

#[test]
fn struct_copy_has_its_own_fields() {
    let fields = Scope::new_root();
    let object = StructValue::construct(fields.clone()).unwrap();
    let x = Symbol::from_raw(Symbol::RESERVED);
    fields.set(x, Value::Int(1)).unwrap();

    let copy = Value::Struct(object.clone()).shallow_copy().unwrap();
    let Value::Struct(copy) = copy else {
        panic!("copy of a struct is a struct");
    };
    let copy_fields = copy.scope().unwrap();
    copy_fields.set(x, Value::Int(2)).unwrap();

    assert_eq!(fields.get(x).unwrap(), Value::Int(1));
    assert!(!copy.ptr_eq(&object));
    let this = copy_fields.get(Symbol::THIS).unwrap();
    assert!(this.ptr_eq(&Value::Struct(copy)));
}
