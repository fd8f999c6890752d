//! Comparison helpers for the VM.
//!
//! `COMPARE_OP` uses the same forward/reflected resolution as binary operators,
//! with `<`/`>` and `<=`/`>=` as each other's reflection and `==`/`!=` their own.

use super::Frame;
use crate::{
    capability::{Capability, CompareOp, Dispatch},
    exception::{RunError, RunResult},
    value::Value,
};

/// `COMPARE_OP kind`: pops `b` then `a`, pushes `a kind b`.
pub(super) fn compare_op(frame: &mut Frame) -> RunResult<()> {
    let index = frame.read_arg()?;
    let op = CompareOp::from_index(index).ok_or(RunError::UnknownComparison { index })?;
    let rhs = normalize_bool(frame.pop()?);
    let lhs = normalize_bool(frame.pop()?);
    frame.push(resolve_compare(op, &lhs, &rhs)?);
    Ok(())
}

/// Booleans compare as the integers 0 and 1.
fn normalize_bool(value: Value) -> Value {
    match value {
        Value::Bool(b) => Value::Int(i64::from(b)),
        other => other,
    }
}

/// Evaluates `lhs op rhs` through the capability protocol.
///
/// Membership, identity and exception-match kinds have no semantics here and
/// always fail.
pub(crate) fn resolve_compare(op: CompareOp, lhs: &Value, rhs: &Value) -> RunResult<Value> {
    let unsupported = || RunError::UnsupportedComparison {
        op,
        left: lhs.clone(),
        right: rhs.clone(),
    };
    let Some(reflected) = op.reflected() else {
        return Err(unsupported());
    };

    if !lhs.implements(Capability::Compare(op)) {
        return Err(unsupported());
    }
    if let Dispatch::Resolved(value) = lhs.compare(op, rhs)? {
        return Ok(value);
    }

    if !rhs.implements(Capability::Compare(reflected)) {
        return Err(unsupported());
    }
    match rhs.compare(reflected, lhs)? {
        Dispatch::Resolved(value) => Ok(value),
        Dispatch::NotImplemented => Err(unsupported()),
    }
}
