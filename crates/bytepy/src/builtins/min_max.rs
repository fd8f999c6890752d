//! Implementation of the min() and max() builtin functions.

use crate::{
    args::ArgValues,
    bytecode::resolve_compare,
    capability::CompareOp,
    exception::{RunError, RunResult},
    value::Value,
};

/// Implementation of the min() builtin function.
///
/// Supports two forms:
/// - `min(iterable)` - returns smallest item from iterable
/// - `min(arg1, arg2, ...)` - returns smallest of the arguments
pub fn builtin_min(args: ArgValues) -> RunResult<Value> {
    builtin_min_max(args, "min", CompareOp::Lt)
}

/// Implementation of the max() builtin function; the mirror of [`builtin_min`].
pub fn builtin_max(args: ArgValues) -> RunResult<Value> {
    builtin_min_max(args, "max", CompareOp::Gt)
}

/// Keeps the first item that no later item beats under `better`, using the
/// same comparison protocol as `COMPARE_OP`.
fn builtin_min_max(args: ArgValues, name: &str, better: CompareOp) -> RunResult<Value> {
    let items = match args.len() {
        0 => return Err(RunError::type_mismatch(format!("{name} expected at least 1 argument, got 0"))),
        1 => args.get_one_arg(name)?.iter_values()?,
        _ => args.into_vec(),
    };

    let mut items = items.into_iter();
    let mut best = items
        .next()
        .ok_or_else(|| RunError::invalid_value(format!("{name}() arg is an empty sequence")))?;
    for item in items {
        if resolve_compare(better, &item, &best)?.py_bool() {
            best = item;
        }
    }
    Ok(best)
}
