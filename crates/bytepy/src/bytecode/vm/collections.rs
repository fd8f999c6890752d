//! List construction, subscripts and slices.

use super::{Frame, to_usize};
use crate::{
    exception::{RunError, RunResult},
    types::{index_of, slice_bound, string},
    value::Value,
};

/// `BUILD_LIST count`: the list holds the popped values in push order.
pub(super) fn build_list(frame: &mut Frame) -> RunResult<()> {
    let count = frame.read_arg()?;
    let items = frame.pop_n(to_usize(count))?;
    frame.push(Value::from(items));
    Ok(())
}

/// `LIST_APPEND i`: pops a value and appends it to the list `i` slots down.
pub(super) fn list_append(frame: &mut Frame) -> RunResult<()> {
    let distance = to_usize(frame.read_arg()?);
    let value = frame.pop()?;
    let target = frame.top_mut(distance)?.first().cloned().ok_or(RunError::StackUnderflow)?;
    match target {
        Value::List(list) => {
            list.push(value);
            Ok(())
        }
        other => Err(RunError::type_mismatch(format!(
            "LIST_APPEND expected a list, found '{}'",
            other.type_name()
        ))),
    }
}

/// `BINARY_SUBSCR`: `TOS1[TOS]`.
pub(super) fn binary_subscr(frame: &mut Frame) -> RunResult<()> {
    let key = frame.pop()?;
    let container = frame.pop()?;
    let value = match &container {
        Value::List(list) => list.get(index_of(&key, "list")?)?,
        Value::Str(s) => string::index(s, index_of(&key, "string")?)?,
        Value::Dict(dict) => dict.get_item(&key)?,
        other => return Err(RunError::NotSubscriptable { value: other.clone() }),
    };
    frame.push(value);
    Ok(())
}

/// `STORE_SUBSCR`: `TOS1[TOS] = TOS2`.
pub(super) fn store_subscr(frame: &mut Frame) -> RunResult<()> {
    let key = frame.pop()?;
    let container = frame.pop()?;
    let value = frame.pop()?;
    match &container {
        Value::List(list) => list.set(index_of(&key, "list")?, value),
        Value::Dict(dict) => dict.set(key, value),
        Value::Str(_) => Err(RunError::type_mismatch("'str' object does not support item assignment")),
        other => Err(RunError::NotSubscriptable { value: other.clone() }),
    }
}

/// `DELETE_SUBSCR`: `del TOS1[TOS]`. Pushes nothing.
pub(super) fn delete_subscr(frame: &mut Frame) -> RunResult<()> {
    let key = frame.pop()?;
    let container = frame.pop()?;
    match &container {
        Value::List(list) => list.delete(index_of(&key, "list")?),
        Value::Dict(dict) => dict.remove(&key).map(drop),
        Value::Str(_) => Err(RunError::type_mismatch("'str' object doesn't support item deletion")),
        other => Err(RunError::NotSubscriptable { value: other.clone() }),
    }
}

/// `SLICE+0` .. `SLICE+3`. The upper bound is on top when present, then the
/// lower bound, then the sequence.
pub(super) fn slice(frame: &mut Frame, has_lower: bool, has_upper: bool) -> RunResult<()> {
    let upper = if has_upper { slice_bound(&frame.pop()?)? } else { None };
    let lower = if has_lower { slice_bound(&frame.pop()?)? } else { None };
    let container = frame.pop()?;
    let value = match &container {
        Value::List(list) => Value::List(list.slice(lower, upper)),
        Value::Str(s) => string::slice(s, lower, upper),
        other => return Err(RunError::NotSubscriptable { value: other.clone() }),
    };
    frame.push(value);
    Ok(())
}
