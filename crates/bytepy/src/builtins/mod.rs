//! Host builtin functions.
//!
//! Builtins are stored in a [`Scope`] handed to the outermost frame and looked
//! up by `LOAD_NAME` / `LOAD_GLOBAL` after locals and globals. Each non-trivial
//! builtin has its own submodule.

mod abs;
mod len;
mod min_max; // min and max share implementation
mod range;
mod sum;

use strum::{Display, EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::{
    args::ArgValues,
    exception::RunResult,
    namespace::{Namespace, Scope},
    value::Value,
};

/// Enumerates every builtin function.
///
/// All variants display as their lowercase Python name (e.g. `Len` -> "len").
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIter,
    IntoStaticStr,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum Builtins {
    Abs,
    Bool,
    Len,
    Max,
    Min,
    Range,
    Repr,
    Str,
    Sum,
}

impl Builtins {
    /// Calls this builtin with positional arguments.
    pub(crate) fn call(self, args: ArgValues) -> RunResult<Value> {
        match self {
            Self::Abs => abs::builtin_abs(args),
            Self::Bool => Ok(Value::Bool(args.get_one_arg("bool")?.py_bool())),
            Self::Len => len::builtin_len(args),
            Self::Max => min_max::builtin_max(args),
            Self::Min => min_max::builtin_min(args),
            Self::Range => range::builtin_range(args),
            Self::Repr => Ok(Value::from(args.get_one_arg("repr")?.py_repr())),
            Self::Str => Ok(Value::from(args.get_one_arg("str")?.py_str())),
            Self::Sum => sum::builtin_sum(args),
        }
    }
}

/// A fresh builtins scope binding every [`Builtins`] variant under its name.
#[must_use]
pub fn default_builtins() -> Scope {
    Builtins::iter()
        .map(|b| (<&'static str>::from(b), Value::Builtin(b)))
        .collect::<Namespace>()
        .into_scope()
}
