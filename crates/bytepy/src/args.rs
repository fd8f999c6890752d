use smallvec::SmallVec;

use crate::{
    exception::{RunError, RunResult},
    value::Value,
};

/// Positional arguments passed to a builtin.
///
/// Builtins accept no keyword arguments (the call handler rejects them before
/// the builtin runs), so the arguments are a plain sequence in call order.
#[derive(Debug, Clone, Default)]
pub(crate) struct ArgValues(SmallVec<[Value; 4]>);

impl ArgValues {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.0.into_vec()
    }

    /// Checks that exactly one positional argument was passed, returning it.
    pub fn get_one_arg(self, name: &str) -> RunResult<Value> {
        match <[Value; 1]>::try_from(self.into_vec()) {
            Ok([a]) => Ok(a),
            Err(args) => Err(arg_count_error(name, "exactly", 1, args.len())),
        }
    }

    /// Checks that one or two positional arguments were passed.
    pub fn get_one_two_args(self, name: &str) -> RunResult<(Value, Option<Value>)> {
        let count = self.len();
        let mut args = self.0.into_iter();
        match (args.next(), args.next(), args.next()) {
            (Some(a), b, None) => Ok((a, b)),
            (None, ..) => Err(arg_count_error(name, "at least", 1, count)),
            _ => Err(arg_count_error(name, "at most", 2, count)),
        }
    }

    /// Checks that between one and three positional arguments were passed.
    pub fn get_one_to_three_args(self, name: &str) -> RunResult<(Value, Option<Value>, Option<Value>)> {
        let count = self.len();
        let mut args = self.0.into_iter();
        match (args.next(), args.next(), args.next(), args.next()) {
            (Some(a), b, c, None) => Ok((a, b, c)),
            (None, ..) => Err(arg_count_error(name, "at least", 1, count)),
            _ => Err(arg_count_error(name, "at most", 3, count)),
        }
    }
}

impl From<Vec<Value>> for ArgValues {
    fn from(args: Vec<Value>) -> Self {
        Self(SmallVec::from_vec(args))
    }
}

impl FromIterator<Value> for ArgValues {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn arg_count_error(name: &str, bound: &str, expected: usize, given: usize) -> RunError {
    let plural = if expected == 1 { "argument" } else { "arguments" };
    RunError::type_mismatch(format!("{name}() takes {bound} {expected} {plural} ({given} given)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_errors_name_the_builtin() {
        let err = ArgValues::from(vec![]).get_one_arg("len").unwrap_err();
        assert_eq!(err.to_string(), "len() takes exactly 1 argument (0 given)");

        let args: ArgValues = [Value::Int(1), Value::Int(2), Value::Int(3)].into_iter().collect();
        let err = args.get_one_two_args("sum").unwrap_err();
        assert_eq!(err.to_string(), "sum() takes at most 2 arguments (3 given)");
    }

    #[test]
    fn optional_arguments_are_none_when_absent() {
        let args = ArgValues::from(vec![Value::Int(5)]);
        let (a, b, c) = args.get_one_to_three_args("range").unwrap();
        assert_eq!(a, Value::Int(5));
        assert!(b.is_none() && c.is_none());
    }
}
