//! Implementation of the sum() builtin function.

use crate::{
    args::ArgValues,
    bytecode::resolve_binary,
    capability::BinaryOp,
    exception::{RunError, RunResult},
    value::Value,
};

/// Implementation of the sum() builtin function.
///
/// Adds the items of an iterable from left to right onto `start` (default 0)
/// through the binary `+` protocol. String start values are rejected.
pub fn builtin_sum(args: ArgValues) -> RunResult<Value> {
    let (iterable, start) = args.get_one_two_args("sum")?;
    let start = start.unwrap_or(Value::Int(0));
    if matches!(start, Value::Str(_)) {
        return Err(RunError::type_mismatch("sum() can't sum strings [use ''.join(seq) instead]"));
    }
    iterable
        .iter_values()?
        .iter()
        .try_fold(start, |acc, item| resolve_binary(BinaryOp::Add, &acc, item))
}
