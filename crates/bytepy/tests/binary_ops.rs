/// Tests for the binary, in-place and unary operator protocol.
///
/// Operators resolve through the operands' own capabilities: the left operand's
/// forward implementation first, then the right operand's reflected one. No other
/// coercion happens, so `1 + 'a'` fails instead of producing something.
use std::{cell::RefCell, rc::Rc};

use bytepy::{
    BinaryOp, Capability, CodeBuilder, CompareOp, Dispatch, MAX_RESULT_BYTES, NoLimitTracker, NoPrint, Opcode,
    PyObject, ResourceError, RunError, RunResult, Runner, Side, UnaryOp, Value,
};
use pretty_assertions::assert_eq;

/// Runs `lhs op rhs` as `LOAD_CONST; LOAD_CONST; <op>; RETURN_VALUE`.
fn eval(lhs: Value, op: Opcode, rhs: Value) -> RunResult<Value> {
    let mut b = CodeBuilder::new("<module>");
    b.load_const(lhs);
    b.load_const(rhs);
    b.emit(op);
    b.emit(Opcode::ReturnValue);
    Runner::new(b.build()).run(NoLimitTracker, &mut NoPrint)
}

fn eval_unary(operand: Value, op: Opcode) -> RunResult<Value> {
    let mut b = CodeBuilder::new("<module>");
    b.load_const(operand);
    b.emit(op);
    b.emit(Opcode::ReturnValue);
    Runner::new(b.build()).run(NoLimitTracker, &mut NoPrint)
}

/// The end-to-end smoke test: `3 + 4 == 7`.
#[test]
fn three_plus_four_equals_seven() {
    let mut b = CodeBuilder::new("<module>");
    b.load_const(Value::Int(3));
    b.load_const(Value::Int(4));
    b.emit(Opcode::BinaryAdd);
    b.load_const(Value::Int(7));
    b.compare(CompareOp::Eq);
    b.emit(Opcode::ReturnValue);
    let result = Runner::new(b.build()).run(NoLimitTracker, &mut NoPrint).unwrap();
    assert_eq!(result, Value::Bool(true));
}

#[test]
fn int_arithmetic() {
    assert_eq!(eval(Value::Int(7), Opcode::BinarySubtract, Value::Int(10)).unwrap(), Value::Int(-3));
    assert_eq!(eval(Value::Int(6), Opcode::BinaryMultiply, Value::Int(7)).unwrap(), Value::Int(42));
    assert_eq!(eval(Value::Int(2), Opcode::BinaryPower, Value::Int(10)).unwrap(), Value::Int(1024));
    assert_eq!(eval(Value::Int(-7), Opcode::BinaryFloorDivide, Value::Int(2)).unwrap(), Value::Int(-4));
    assert_eq!(eval(Value::Int(-7), Opcode::BinaryModulo, Value::Int(3)).unwrap(), Value::Int(2));
    assert_eq!(eval(Value::Int(1), Opcode::BinaryLshift, Value::Int(4)).unwrap(), Value::Int(16));
    assert_eq!(eval(Value::Int(0b1100), Opcode::BinaryAnd, Value::Int(0b1010)).unwrap(), Value::Int(0b1000));
    assert_eq!(eval(Value::Int(0b1100), Opcode::BinaryXor, Value::Int(0b1010)).unwrap(), Value::Int(0b0110));
    assert_eq!(eval(Value::Int(0b1100), Opcode::BinaryOr, Value::Int(0b1010)).unwrap(), Value::Int(0b1110));
}

/// `BINARY_DIVIDE` is true division, like `BINARY_TRUE_DIVIDE`.
#[test]
fn divide_is_true_division() {
    assert_eq!(eval(Value::Int(7), Opcode::BinaryDivide, Value::Int(2)).unwrap(), Value::Float(3.5));
    assert_eq!(eval(Value::Int(7), Opcode::BinaryTrueDivide, Value::Int(2)).unwrap(), Value::Float(3.5));
}

#[test]
fn division_by_zero_fails() {
    let err = eval(Value::Int(1), Opcode::BinaryDivide, Value::Int(0)).unwrap_err();
    assert_eq!(err.kind(), "ZeroDivision");
    let err = eval(Value::Int(1), Opcode::BinaryModulo, Value::Int(0)).unwrap_err();
    assert_eq!(err.kind(), "ZeroDivision");
}

/// Int results that overflow 64 bits continue as longs.
#[test]
fn int_overflow_promotes_to_long() {
    let result = eval(Value::Int(i64::MAX), Opcode::BinaryAdd, Value::Int(1)).unwrap();
    assert_eq!(result.type_name(), "long");
    assert_eq!(result.py_repr(), "9223372036854775808L");
    assert_eq!(result.py_str(), "9223372036854775808");
}

#[test]
fn mixed_numbers_promote() {
    assert_eq!(eval(Value::Int(1), Opcode::BinaryAdd, Value::Float(0.5)).unwrap(), Value::Float(1.5));
    assert_eq!(eval(Value::Float(0.5), Opcode::BinaryAdd, Value::Int(1)).unwrap(), Value::Float(1.5));
}

/// Only `COMPARE_OP` treats booleans as numbers; arithmetic on them is unsupported.
#[test]
fn booleans_have_no_arithmetic() {
    let err = eval(Value::Bool(true), Opcode::BinaryAdd, Value::Int(1)).unwrap_err();
    assert_eq!(err.kind(), "UnsupportedOperation");
}

/// Strings have no `+` capability; `str + str` concatenates through a dedicated path.
#[test]
fn string_concatenation_bypass() {
    assert_eq!(eval(Value::from("ab"), Opcode::BinaryAdd, Value::from("cd")).unwrap(), Value::from("abcd"));
    assert_eq!(eval(Value::from("ab"), Opcode::BinaryMultiply, Value::Int(3)).unwrap(), Value::from("ababab"));
    assert_eq!(eval(Value::Int(2), Opcode::BinaryMultiply, Value::from("ab")).unwrap(), Value::from("abab"));
}

#[test]
fn unsupported_operands_are_never_coerced() {
    let err = eval(Value::Int(1), Opcode::BinaryAdd, Value::from("a")).unwrap_err();
    assert_eq!(err.kind(), "UnsupportedOperation");
    let err = eval(Value::from("a"), Opcode::BinaryAdd, Value::Int(1)).unwrap_err();
    assert_eq!(err.kind(), "UnsupportedOperation");
    let err = eval(Value::None, Opcode::BinarySubtract, Value::None).unwrap_err();
    assert_eq!(err.kind(), "UnsupportedOperation");
    let err = eval(Value::Float(1.0), Opcode::BinaryLshift, Value::Int(1)).unwrap_err();
    assert_eq!(err.kind(), "UnsupportedOperation");
}

/// The error carries the operand values themselves.
#[test]
fn unsupported_operation_carries_operands() {
    let err = eval(Value::Int(1), Opcode::BinaryAdd, Value::from("a")).unwrap_err();
    match err {
        RunError::UnsupportedOperation { op, left, right } => {
            assert_eq!(op, BinaryOp::Add);
            assert_eq!(left, Value::Int(1));
            assert_eq!(right, Value::from("a"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unary_operators() {
    assert_eq!(eval_unary(Value::Int(5), Opcode::UnaryNegative).unwrap(), Value::Int(-5));
    assert_eq!(eval_unary(Value::Int(5), Opcode::UnaryPositive).unwrap(), Value::Int(5));
    assert_eq!(eval_unary(Value::Int(5), Opcode::UnaryInvert).unwrap(), Value::Int(-6));
    assert_eq!(eval_unary(Value::Int(0), Opcode::UnaryNot).unwrap(), Value::Bool(true));
    assert_eq!(eval_unary(Value::from("x"), Opcode::UnaryNot).unwrap(), Value::Bool(false));
    assert_eq!(eval_unary(Value::from("x"), Opcode::UnaryConvert).unwrap(), Value::from("'x'"));

    let err = eval_unary(Value::from("x"), Opcode::UnaryNegative).unwrap_err();
    assert_eq!(err.kind(), "UnsupportedUnary");
    let err = eval_unary(Value::Float(1.5), Opcode::UnaryInvert).unwrap_err();
    assert_eq!(err.kind(), "UnsupportedUnary");
}

// === Host objects ===

type CallLog = Rc<RefCell<Vec<&'static str>>>;

/// Implements forward `+` but declines every operand.
#[derive(Debug)]
struct Declines(CallLog);

impl PyObject for Declines {
    fn type_name(&self) -> &'static str {
        "Declines"
    }

    fn implements(&self, capability: Capability) -> bool {
        capability == Capability::Binary(BinaryOp::Add, Side::Forward)
    }

    fn binary_op(&self, _op: BinaryOp, _side: Side, _other: &Value) -> RunResult<Dispatch> {
        self.0.borrow_mut().push("forward");
        Ok(Dispatch::NotImplemented)
    }
}

/// Implements only reflected `+`.
#[derive(Debug)]
struct ReverseOnly(CallLog);

impl PyObject for ReverseOnly {
    fn type_name(&self) -> &'static str {
        "ReverseOnly"
    }

    fn implements(&self, capability: Capability) -> bool {
        capability == Capability::Binary(BinaryOp::Add, Side::Reflected)
    }

    fn binary_op(&self, _op: BinaryOp, side: Side, other: &Value) -> RunResult<Dispatch> {
        assert_eq!(side, Side::Reflected);
        self.0.borrow_mut().push("reflected");
        Ok(Dispatch::Resolved(Value::from(format!("radd({})", other.type_name()))))
    }
}

#[test]
fn forward_is_tried_before_reflected() {
    let log = CallLog::default();
    let lhs = Value::Object(Rc::new(Declines(Rc::clone(&log))));
    let rhs = Value::Object(Rc::new(ReverseOnly(Rc::clone(&log))));
    let result = eval(lhs, Opcode::BinaryAdd, rhs).unwrap();
    assert_eq!(result, Value::from("radd(Declines)"));
    assert_eq!(*log.borrow(), vec!["forward", "reflected"]);
}

/// An int left operand declines the host object; the object's reflected `+` runs.
#[test]
fn reflected_runs_when_builtin_left_declines() {
    let log = CallLog::default();
    let rhs = Value::Object(Rc::new(ReverseOnly(Rc::clone(&log))));
    let result = eval(Value::Int(1), Opcode::BinaryAdd, rhs).unwrap();
    assert_eq!(result, Value::from("radd(int)"));
    assert_eq!(*log.borrow(), vec!["reflected"]);
}

/// A reverse-only object on the left is never asked to act forward.
#[test]
fn reverse_only_on_the_left_fails() {
    let log = CallLog::default();
    let lhs = Value::Object(Rc::new(ReverseOnly(Rc::clone(&log))));
    let err = eval(lhs, Opcode::BinaryAdd, Value::Int(1)).unwrap_err();
    assert_eq!(err.kind(), "UnsupportedOperation");
    assert!(log.borrow().is_empty());
}

/// Host objects can opt into unary operators.
#[derive(Debug)]
struct Negatable;

impl PyObject for Negatable {
    fn type_name(&self) -> &'static str {
        "Negatable"
    }

    fn implements(&self, capability: Capability) -> bool {
        capability == Capability::Unary(UnaryOp::Negative)
    }

    fn unary_op(&self, _op: UnaryOp) -> RunResult<Dispatch> {
        Ok(Dispatch::Resolved(Value::from("negated")))
    }
}

#[test]
fn host_object_unary() {
    let obj = Value::Object(Rc::new(Negatable));
    assert_eq!(eval_unary(obj.clone(), Opcode::UnaryNegative).unwrap(), Value::from("negated"));
    assert_eq!(eval_unary(obj, Opcode::UnaryInvert).unwrap_err().kind(), "UnsupportedUnary");
}

// === In-place ===

/// `x = [1]; y = x; x += [2]; return y` sees the mutation through the alias.
#[test]
fn inplace_add_on_list_mutates_the_shared_list() {
    let mut b = CodeBuilder::new("<module>");
    b.load_const(Value::Int(1));
    b.emit_arg(Opcode::BuildList, 1);
    b.emit(Opcode::DupTop);
    b.emit_name(Opcode::StoreName, "x");
    b.emit_name(Opcode::StoreName, "y");
    b.emit_name(Opcode::LoadName, "x");
    b.load_const(Value::Int(2));
    b.emit_arg(Opcode::BuildList, 1);
    b.emit(Opcode::InplaceAdd);
    b.emit_name(Opcode::StoreName, "x");
    b.emit_name(Opcode::LoadName, "y");
    b.emit(Opcode::ReturnValue);
    let result = Runner::new(b.build()).run(NoLimitTracker, &mut NoPrint).unwrap();
    assert_eq!(result, Value::from(vec![Value::Int(1), Value::Int(2)]));
}

/// `x = [1]; y = x; x = x + [2]; return y` leaves the alias untouched.
#[test]
fn binary_add_on_list_copies() {
    let mut b = CodeBuilder::new("<module>");
    b.load_const(Value::Int(1));
    b.emit_arg(Opcode::BuildList, 1);
    b.emit(Opcode::DupTop);
    b.emit_name(Opcode::StoreName, "x");
    b.emit_name(Opcode::StoreName, "y");
    b.emit_name(Opcode::LoadName, "x");
    b.load_const(Value::Int(2));
    b.emit_arg(Opcode::BuildList, 1);
    b.emit(Opcode::BinaryAdd);
    b.emit_name(Opcode::StoreName, "x");
    b.emit_name(Opcode::LoadName, "y");
    b.emit(Opcode::ReturnValue);
    let result = Runner::new(b.build()).run(NoLimitTracker, &mut NoPrint).unwrap();
    assert_eq!(result, Value::from(vec![Value::Int(1)]));
}

/// Immutable values fall back to the binary operator.
#[test]
fn inplace_on_immutables_rebinds() {
    assert_eq!(eval(Value::Int(3), Opcode::InplaceAdd, Value::Int(4)).unwrap(), Value::Int(7));
    assert_eq!(eval(Value::from("a"), Opcode::InplaceAdd, Value::from("b")).unwrap(), Value::from("ab"));
    assert_eq!(eval(Value::Int(9), Opcode::InplaceFloorDivide, Value::Int(2)).unwrap(), Value::Int(4));
    let err = eval(Value::None, Opcode::InplaceAdd, Value::Int(1)).unwrap_err();
    assert_eq!(err.kind(), "UnsupportedOperation");
}

fn is_oversized(err: &RunError) -> bool {
    matches!(
        err,
        RunError::Resource(ResourceError::Memory {
            limit: MAX_RESULT_BYTES,
            ..
        })
    )
}

/// Repetitions too large to build fail with an error instead of allocating.
#[test]
fn oversized_repetition_is_rejected() {
    let huge = || Value::Int(1 << 62);
    let pair = || Value::from(vec![Value::Int(1), Value::Int(2)]);

    let err = eval(pair(), Opcode::BinaryMultiply, huge()).unwrap_err();
    assert!(is_oversized(&err), "{err}");
    let err = eval(huge(), Opcode::BinaryMultiply, pair()).unwrap_err();
    assert!(is_oversized(&err), "{err}");
    let err = eval(pair(), Opcode::InplaceMultiply, huge()).unwrap_err();
    assert!(is_oversized(&err), "{err}");
    let err = eval(Value::from("ab"), Opcode::BinaryMultiply, huge()).unwrap_err();
    assert!(is_oversized(&err), "{err}");
    assert!(err.to_string().starts_with("memory limit exceeded: "), "{err}");

    // empty sequences stay empty
    let empty = eval(Value::from(Vec::<Value>::new()), Opcode::BinaryMultiply, huge()).unwrap();
    assert_eq!(empty, Value::from(Vec::<Value>::new()));
    assert_eq!(eval(Value::from(""), Opcode::BinaryMultiply, huge()).unwrap(), Value::from(""));
    assert_eq!(
        eval(Value::from("ab"), Opcode::BinaryMultiply, Value::Int(3)).unwrap(),
        Value::from("ababab")
    );
}

/// `2 ** 4000000000` would need about 500 MB and is refused up front.
#[test]
fn oversized_power_is_rejected() {
    let err = eval(Value::Int(2), Opcode::BinaryPower, Value::Int(4_000_000_000)).unwrap_err();
    assert!(is_oversized(&err), "{err}");

    // bases that cannot grow are fine with any exponent
    assert_eq!(eval(Value::Int(1), Opcode::BinaryPower, Value::Int(4_000_000_000)).unwrap(), Value::Int(1));
    assert_eq!(
        eval(Value::Int(2), Opcode::BinaryPower, Value::Int(100)).unwrap().py_repr(),
        "1267650600228229401496703205376L"
    );
}
