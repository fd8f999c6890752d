//! Implementation of the abs() builtin function.

use crate::{
    args::ArgValues,
    exception::{RunError, RunResult},
    types::number::Number,
    value::Value,
};

/// Implementation of the abs() builtin function.
///
/// Works on every kind in the numeric tower; `abs(i64::MIN)` promotes to long
/// and the absolute value of a complex is its float magnitude.
pub fn builtin_abs(args: ArgValues) -> RunResult<Value> {
    let value = args.get_one_arg("abs")?;
    let number = match &value {
        Value::Bool(b) => Some(Number::Int(i64::from(*b))),
        other => Number::from_value(other),
    };
    number.map(Number::abs).ok_or_else(|| {
        RunError::type_mismatch(format!("bad operand type for abs(): '{}'", value.type_name()))
    })
}
