//! String operators: repetition, ordering, indexing and slicing.
//!
//! Strings deliberately have no `+` capability; `BINARY_ADD` and `INPLACE_ADD`
//! concatenate two strings directly before consulting the protocol.

use std::rc::Rc;

use crate::{
    capability::{BinaryOp, CompareOp, Dispatch},
    exception::{RunError, RunResult},
    types::{normalize_index, repeat_count, repeated_len, slice_range},
    value::Value,
};

/// Python 2 `repr()` of a string: single quotes unless the text contains a
/// single quote and no double quote.
pub fn repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// `s * n` and `n * s`.
pub(crate) fn multiply(s: &str, other: &Value) -> RunResult<Dispatch> {
    let Some(count) = repeat_count(other)? else {
        return Ok(Dispatch::NotImplemented);
    };
    repeated_len(s.len(), count, 1)?;
    Ok(Dispatch::Resolved(Value::from(s.repeat(count))))
}

pub(crate) fn binary_op(s: &str, op: BinaryOp, other: &Value) -> RunResult<Dispatch> {
    match op {
        BinaryOp::Multiply => multiply(s, other),
        _ => Ok(Dispatch::NotImplemented),
    }
}

/// Ordering against another string; equality against any other kind is false.
pub(crate) fn compare(s: &str, op: CompareOp, other: &Value) -> Dispatch {
    match other {
        Value::Str(o) => op
            .matches(s.cmp(o))
            .map_or(Dispatch::NotImplemented, |b| Dispatch::Resolved(Value::Bool(b))),
        _ => match op {
            CompareOp::Eq => Dispatch::Resolved(Value::Bool(false)),
            CompareOp::Ne => Dispatch::Resolved(Value::Bool(true)),
            _ => Dispatch::NotImplemented,
        },
    }
}

/// `s[index]`, a one-character string.
pub(crate) fn index(s: &str, index: i64) -> RunResult<Value> {
    let chars: Vec<char> = s.chars().collect();
    let i = normalize_index(index, chars.len()).ok_or(RunError::IndexOutOfRange {
        container: "string",
        index,
    })?;
    Ok(Value::Str(Rc::from(chars[i].to_string())))
}

/// `s[lo:hi]` with Python clamping.
pub(crate) fn slice(s: &str, lo: Option<i64>, hi: Option<i64>) -> Value {
    let chars: Vec<char> = s.chars().collect();
    let range = slice_range(chars.len(), lo, hi);
    Value::from(chars[range].iter().collect::<String>())
}
