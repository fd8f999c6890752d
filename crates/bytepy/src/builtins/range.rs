//! Implementation of the range() builtin function.

use crate::{
    args::ArgValues,
    exception::{RunError, RunResult},
    value::Value,
};

/// Largest list `range()` will materialize.
const MAX_RANGE_LEN: usize = 10_000_000;

/// `range(stop)`, `range(start, stop)` or `range(start, stop, step)`.
///
/// Returns a list, as the language's classic `range` does.
pub fn builtin_range(args: ArgValues) -> RunResult<Value> {
    let (first, second, third) = args.get_one_to_three_args("range")?;
    let (start, stop) = match second {
        Some(stop) => (int_arg(&first)?, int_arg(&stop)?),
        None => (0, int_arg(&first)?),
    };
    let step = third.as_ref().map(int_arg).transpose()?.unwrap_or(1);
    if step == 0 {
        return Err(RunError::invalid_value("range() step argument must not be zero"));
    }

    let span = if step > 0 {
        i128::from(stop) - i128::from(start)
    } else {
        i128::from(start) - i128::from(stop)
    };
    let step_abs = i128::from(step).abs();
    let len = if span <= 0 { 0 } else { (span + step_abs - 1) / step_abs };
    let len = usize::try_from(len)
        .ok()
        .filter(|len| *len <= MAX_RANGE_LEN)
        .ok_or_else(|| RunError::invalid_value("range() result has too many items"))?;

    let items = std::iter::successors(Some(start), |v| v.checked_add(step))
        .take(len)
        .map(Value::Int)
        .collect::<Vec<_>>();
    Ok(Value::from(items))
}

fn int_arg(value: &Value) -> RunResult<i64> {
    match value {
        Value::Int(i) => Ok(*i),
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(RunError::type_mismatch(format!(
            "range() integer argument expected, got {}",
            other.type_name()
        ))),
    }
}
