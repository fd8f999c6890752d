//! Implementation of the len() builtin function.

use crate::{
    args::ArgValues,
    exception::{RunError, RunResult},
    value::Value,
};

/// Number of characters, elements or keys.
pub fn builtin_len(args: ArgValues) -> RunResult<Value> {
    let value = args.get_one_arg("len")?;
    let len = match &value {
        Value::Str(s) => s.chars().count(),
        Value::List(list) => list.len(),
        Value::Dict(dict) => dict.len(),
        other => {
            return Err(RunError::type_mismatch(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )));
        }
    };
    i64::try_from(len)
        .map(Value::Int)
        .map_err(|_| RunError::invalid_value("length does not fit in an int"))
}
