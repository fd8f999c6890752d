/// Tests for `COMPARE_OP` and truthiness.
use std::rc::Rc;

use bytepy::{
    Capability, CodeBuilder, CompareOp, Dispatch, NoLimitTracker, NoPrint, Opcode, PyObject, RunError, RunResult,
    Runner, Value, types::Complex,
};
use pretty_assertions::assert_eq;

fn compare(lhs: Value, op: CompareOp, rhs: Value) -> RunResult<Value> {
    let mut b = CodeBuilder::new("<module>");
    b.load_const(lhs);
    b.load_const(rhs);
    b.compare(op);
    b.emit(Opcode::ReturnValue);
    Runner::new(b.build()).run(NoLimitTracker, &mut NoPrint)
}

/// Branches on `value` with `POP_JUMP_IF_FALSE` and reports which way it went.
fn truthy(value: Value) -> bool {
    let mut b = CodeBuilder::new("<module>");
    b.load_const(value);
    let falsy = b.emit_jump(Opcode::PopJumpIfFalse);
    b.load_const(Value::Bool(true));
    b.emit(Opcode::ReturnValue);
    b.patch_jump(falsy);
    b.load_const(Value::Bool(false));
    b.emit(Opcode::ReturnValue);
    Runner::new(b.build()).run(NoLimitTracker, &mut NoPrint).unwrap() == Value::Bool(true)
}

#[test]
fn numeric_ordering() {
    assert_eq!(compare(Value::Int(1), CompareOp::Lt, Value::Float(2.5)).unwrap(), Value::Bool(true));
    assert_eq!(compare(Value::Int(2), CompareOp::Ge, Value::Int(2)).unwrap(), Value::Bool(true));
    assert_eq!(compare(Value::Float(2.0), CompareOp::Eq, Value::Int(2)).unwrap(), Value::Bool(true));
    assert_eq!(compare(Value::Int(3), CompareOp::Ne, Value::Int(3)).unwrap(), Value::Bool(false));
    assert_eq!(compare(Value::Int(3), CompareOp::Le, Value::Int(2)).unwrap(), Value::Bool(false));
}

/// Booleans are normalized to 0 and 1 before comparison.
#[test]
fn true_is_greater_than_false() {
    assert_eq!(compare(Value::Bool(true), CompareOp::Gt, Value::Bool(false)).unwrap(), Value::Bool(true));
    assert_eq!(compare(Value::Bool(true), CompareOp::Eq, Value::Int(1)).unwrap(), Value::Bool(true));
    assert_eq!(compare(Value::Bool(false), CompareOp::Lt, Value::Float(0.5)).unwrap(), Value::Bool(true));
}

#[test]
fn strings_order_lexicographically() {
    assert_eq!(compare(Value::from("abc"), CompareOp::Lt, Value::from("abd")).unwrap(), Value::Bool(true));
    assert_eq!(compare(Value::from("b"), CompareOp::Gt, Value::from("abc")).unwrap(), Value::Bool(true));
    assert_eq!(compare(Value::from("x"), CompareOp::Eq, Value::from("x")).unwrap(), Value::Bool(true));
}

#[test]
fn equality_across_kinds_is_false() {
    assert_eq!(compare(Value::Int(1), CompareOp::Eq, Value::from("1")).unwrap(), Value::Bool(false));
    assert_eq!(compare(Value::from("1"), CompareOp::Ne, Value::Int(1)).unwrap(), Value::Bool(true));
    assert_eq!(compare(Value::None, CompareOp::Eq, Value::None).unwrap(), Value::Bool(true));
    assert_eq!(compare(Value::None, CompareOp::Eq, Value::Int(0)).unwrap(), Value::Bool(false));
}

#[test]
fn lists_compare_element_wise() {
    let list = |items: &[i64]| Value::from(items.iter().copied().map(Value::Int).collect::<Vec<_>>());
    assert_eq!(compare(list(&[1, 2]), CompareOp::Eq, list(&[1, 2])).unwrap(), Value::Bool(true));
    assert_eq!(compare(list(&[1, 2]), CompareOp::Eq, list(&[1, 3])).unwrap(), Value::Bool(false));
}

#[test]
fn ordering_across_kinds_fails() {
    let err = compare(Value::Int(1), CompareOp::Lt, Value::from("a")).unwrap_err();
    assert_eq!(err.kind(), "UnsupportedComparison");
    let err = compare(Value::None, CompareOp::Gt, Value::None).unwrap_err();
    assert_eq!(err.kind(), "UnsupportedComparison");
}

#[test]
fn complex_numbers_have_no_ordering() {
    let z = || Value::Complex(Complex::new(1.0, 1.0));
    assert_eq!(compare(z(), CompareOp::Eq, z()).unwrap(), Value::Bool(true));
    let err = compare(z(), CompareOp::Lt, z()).unwrap_err();
    assert_eq!(err.kind(), "UnsupportedComparison");
}

/// Membership, identity and exception matching have no semantics in the core.
#[test]
fn non_rich_comparisons_fail() {
    for op in [CompareOp::In, CompareOp::NotIn, CompareOp::Is, CompareOp::IsNot, CompareOp::ExceptionMatch] {
        let err = compare(Value::Int(1), op, Value::Int(1)).unwrap_err();
        assert_eq!(err.kind(), "UnsupportedComparison", "{op}");
    }
}

#[test]
fn comparison_index_outside_the_table_fails() {
    let mut b = CodeBuilder::new("<module>");
    b.load_const(Value::Int(1));
    b.load_const(Value::Int(1));
    b.emit_arg(Opcode::CompareOp, 11);
    b.emit(Opcode::ReturnValue);
    let err = Runner::new(b.build()).run(NoLimitTracker, &mut NoPrint).unwrap_err();
    assert!(matches!(err, RunError::UnknownComparison { index: 11 }), "{err}");
}

/// Knows only how to be greater than things.
#[derive(Debug)]
struct Huge;

impl PyObject for Huge {
    fn type_name(&self) -> &'static str {
        "Huge"
    }

    fn implements(&self, capability: Capability) -> bool {
        capability == Capability::Compare(CompareOp::Gt)
    }

    fn compare(&self, _op: CompareOp, _other: &Value) -> RunResult<Dispatch> {
        Ok(Dispatch::Resolved(Value::Bool(true)))
    }
}

/// `1 < huge` falls back to `huge > 1`.
#[test]
fn reflected_comparison_uses_the_paired_operator() {
    let huge = || Value::Object(Rc::new(Huge));
    assert_eq!(compare(Value::Int(1), CompareOp::Lt, huge()).unwrap(), Value::Bool(true));
    assert_eq!(compare(huge(), CompareOp::Gt, Value::Int(1)).unwrap(), Value::Bool(true));
    let err = compare(Value::Int(1), CompareOp::Gt, huge()).unwrap_err();
    assert_eq!(err.kind(), "UnsupportedComparison");
}

#[test]
fn truthiness_table() {
    let empty_list = Value::from(Vec::<Value>::new());
    let falsy = [
        Value::None,
        Value::Bool(false),
        Value::Int(0),
        Value::Float(0.0),
        Value::Complex(Complex::new(0.0, 0.0)),
        Value::from(""),
        empty_list,
    ];
    for value in falsy {
        assert!(!truthy(value.clone()), "{value:?} should be false");
    }

    let truthy_values = [
        Value::Bool(true),
        Value::Int(-1),
        Value::Float(0.1),
        Value::Complex(Complex::new(0.0, 1.0)),
        Value::from("0"),
        Value::from(vec![Value::None]),
    ];
    for value in truthy_values {
        assert!(truthy(value.clone()), "{value:?} should be true");
    }
}
