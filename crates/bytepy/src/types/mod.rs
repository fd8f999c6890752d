//! Type definitions for the built-in value kinds.
//!
//! This module contains the numeric tower and the container types stored in
//! [`Value`], together with the per-kind operator tables the capability
//! protocol consults.

pub mod complex;
pub mod dict;
pub mod float;
pub mod iter;
pub mod list;
pub mod long_int;
pub(crate) mod number;
pub mod string;

use std::ops::Range;

pub use complex::Complex;
pub use dict::{Dict, DictKey};
pub use iter::SeqIter;
pub use list::List;
pub use long_int::LongInt;

use crate::{
    exception::{RunError, RunResult},
    resource::check_result_size,
    value::Value,
};

/// Resolves a possibly negative index against `len`.
pub(crate) fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let i = if index < 0 { index + len } else { index };
    if (0..len).contains(&i) { usize::try_from(i).ok() } else { None }
}

/// Python slice clamping for `seq[lo:hi]`.
pub(crate) fn slice_range(len: usize, lo: Option<i64>, hi: Option<i64>) -> Range<usize> {
    let ilen = i64::try_from(len).unwrap_or(i64::MAX);
    let clamp = |bound: i64| {
        let b = if bound < 0 { bound.saturating_add(ilen) } else { bound };
        usize::try_from(b.clamp(0, ilen)).unwrap_or(len)
    };
    let start = lo.map_or(0, clamp);
    let end = hi.map_or(len, clamp);
    start..end.max(start)
}

/// Integer operand used as a sequence index (`bool` counts as an int).
pub(crate) fn index_of(value: &Value, container: &str) -> RunResult<i64> {
    match value {
        Value::Int(i) => Ok(*i),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Long(l) => Ok(l.to_i64().unwrap_or(if l.is_negative() { i64::MIN } else { i64::MAX })),
        _ => Err(RunError::type_mismatch(format!(
            "{container} indices must be integers, not {}",
            value.type_name()
        ))),
    }
}

/// Slice bound from the operand stack; `None` means "from the start / to the end".
pub(crate) fn slice_bound(value: &Value) -> RunResult<Option<i64>> {
    match value {
        Value::None => Ok(None),
        _ => index_of(value, "slice").map(Some),
    }
}

/// Repetition count for `seq * n`: `Ok(None)` if `value` is not an integer,
/// negative counts repeat zero times.
pub(crate) fn repeat_count(value: &Value) -> RunResult<Option<usize>> {
    match value {
        Value::Int(i) => Ok(Some(usize::try_from(*i).unwrap_or(0))),
        Value::Long(l) if l.is_negative() => Ok(Some(0)),
        Value::Long(l) => l
            .to_i64()
            .and_then(|i| usize::try_from(i).ok())
            .map(Some)
            .ok_or_else(|| RunError::invalid_value("repetition count too large")),
        _ => Ok(None),
    }
}

/// Element count of `len` elements repeated `count` times, checked against the
/// result size limit before the caller allocates.
pub(crate) fn repeated_len(len: usize, count: usize, element_size: usize) -> RunResult<usize> {
    let total = len
        .checked_mul(count)
        .ok_or_else(|| RunError::invalid_value("repetition count too large"))?;
    check_result_size(total.saturating_mul(element_size))?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_indices_count_from_the_end() {
        assert_eq!(normalize_index(-1, 3), Some(2));
        assert_eq!(normalize_index(3, 3), None);
        assert_eq!(normalize_index(-4, 3), None);
    }

    #[test]
    fn slices_clamp_to_bounds() {
        assert_eq!(slice_range(5, None, None), 0..5);
        assert_eq!(slice_range(5, Some(-2), None), 3..5);
        assert_eq!(slice_range(5, Some(10), Some(20)), 5..5);
        assert_eq!(slice_range(5, Some(3), Some(1)), 3..3);
    }
}
