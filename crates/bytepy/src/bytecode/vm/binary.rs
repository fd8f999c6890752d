//! Binary, in-place and unary operator helpers for the VM.
//!
//! Binary operations follow the forward/reflected protocol:
//! 1. The left operand must implement the forward capability
//! 2. The forward operation runs; a resolved value is the result
//! 3. On `NotImplemented` the right operand must implement the reflected capability
//! 4. The reflected operation runs; `NotImplemented` again is an error
//!
//! No coercion happens outside the operands' own implementations.

use super::Frame;
use crate::{
    capability::{BinaryOp, Capability, Dispatch, Side, UnaryOp},
    exception::{RunError, RunResult},
    value::Value,
};

/// `BINARY_*`: pops `b` then `a`, pushes `a op b`.
pub(super) fn binary(frame: &mut Frame, op: BinaryOp) -> RunResult<()> {
    let rhs = frame.pop()?;
    let lhs = frame.pop()?;
    frame.push(resolve_binary(op, &lhs, &rhs)?);
    Ok(())
}

/// `INPLACE_*`: the in-place capability of `a` first, which mutates `a` and
/// pushes `a` itself, else the binary protocol.
pub(super) fn inplace(frame: &mut Frame, op: BinaryOp) -> RunResult<()> {
    let rhs = frame.pop()?;
    let lhs = frame.pop()?;
    if lhs.implements(Capability::InPlace(op))
        && let Dispatch::Resolved(value) = lhs.inplace_op(op, &rhs)?
    {
        frame.push(value);
        return Ok(());
    }
    frame.push(resolve_binary(op, &lhs, &rhs)?);
    Ok(())
}

/// `UNARY_POSITIVE`, `UNARY_NEGATIVE` and `UNARY_INVERT`.
pub(super) fn unary(frame: &mut Frame, op: UnaryOp) -> RunResult<()> {
    let operand = frame.pop()?;
    let unsupported = || RunError::UnsupportedUnary {
        op,
        operand: operand.clone(),
    };
    if !operand.implements(Capability::Unary(op)) {
        return Err(unsupported());
    }
    match operand.unary_op(op)? {
        Dispatch::Resolved(value) => {
            frame.push(value);
            Ok(())
        }
        Dispatch::NotImplemented => Err(unsupported()),
    }
}

/// Applies `lhs op rhs` through the capability protocol.
///
/// `str + str` concatenates directly; strings have no `+` capability.
pub(crate) fn resolve_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> RunResult<Value> {
    if op == BinaryOp::Add
        && let (Value::Str(a), Value::Str(b)) = (lhs, rhs)
    {
        return Ok(Value::from(format!("{a}{b}")));
    }

    let unsupported = || RunError::UnsupportedOperation {
        op,
        left: lhs.clone(),
        right: rhs.clone(),
    };

    if !lhs.implements(Capability::Binary(op, Side::Forward)) {
        return Err(unsupported());
    }
    if let Dispatch::Resolved(value) = lhs.binary_op(op, Side::Forward, rhs)? {
        return Ok(value);
    }

    if !rhs.implements(Capability::Binary(op, Side::Reflected)) {
        return Err(unsupported());
    }
    match rhs.binary_op(op, Side::Reflected, lhs)? {
        Dispatch::Resolved(value) => Ok(value),
        Dispatch::NotImplemented => Err(unsupported()),
    }
}
