use std::{
    cell::RefCell,
    rc::Rc,
};

use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::FromPrimitive;

use crate::{
    capability::{CompareOp, Dispatch},
    exception::{RunError, RunResult},
    value::Value,
};

/// Hashable projection of a [`Value`] used to key dicts.
///
/// Keys that compare equal map to the same `DictKey`: `True`, `1`, `1L` and
/// `1.0` are all `Int(1)`. Functions, code objects and host objects hash by
/// identity; lists, dicts and iterators are unhashable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DictKey {
    None,
    Int(i64),
    Long(BigInt),
    /// Bit pattern of a non-integral float.
    Float(u64),
    /// Bit patterns of a complex with a non-zero imaginary part.
    Complex(u64, u64),
    Str(Rc<str>),
    Builtin(&'static str),
    Identity(usize),
}

impl DictKey {
    pub fn from_value(value: &Value) -> RunResult<Self> {
        Ok(match value {
            Value::None => Self::None,
            Value::Bool(b) => Self::Int(i64::from(*b)),
            Value::Int(i) => Self::Int(*i),
            Value::Long(l) => l.to_i64().map_or_else(|| Self::Long(l.inner().clone()), Self::Int),
            Value::Float(f) => Self::from_float(*f),
            Value::Complex(c) if c.im == 0.0 => Self::from_float(c.re),
            Value::Complex(c) => Self::Complex(c.re.to_bits(), c.im.to_bits()),
            Value::Str(s) => Self::Str(s.clone()),
            Value::Builtin(b) => Self::Builtin((*b).into()),
            Value::Function(f) => Self::Identity(Rc::as_ptr(f) as usize),
            Value::Code(c) => Self::Identity(Rc::as_ptr(c) as usize),
            Value::Object(o) => Self::Identity(Rc::as_ptr(o).cast::<()>() as usize),
            Value::List(_) | Value::Dict(_) | Value::Iter(_) => {
                return Err(RunError::Unhashable { value: value.clone() });
            }
        })
    }

    fn from_float(f: f64) -> Self {
        if f.is_finite() && f.fract() == 0.0 {
            match BigInt::from_f64(f) {
                Some(bi) => match i64::try_from(&bi) {
                    Ok(i) => Self::Int(i),
                    Err(_) => Self::Long(bi),
                },
                None => Self::Float(f.to_bits()),
            }
        } else {
            Self::Float(f.to_bits())
        }
    }
}

type DictMap = IndexMap<DictKey, (Value, Value), ahash::RandomState>;

/// A shared, mutable, insertion-ordered dict.
///
/// Each entry keeps the original key value next to the stored value so that
/// iteration yields keys as they were inserted (`1.0` stays a float).
#[derive(Debug, Clone, Default)]
pub struct Dict(Rc<RefCell<DictMap>>);

impl Dict {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Looks up `key`, failing only when the key is unhashable.
    pub fn get(&self, key: &Value) -> RunResult<Option<Value>> {
        let key = DictKey::from_value(key)?;
        Ok(self.0.borrow().get(&key).map(|(_, v)| v.clone()))
    }

    /// `d[key]`.
    pub fn get_item(&self, key: &Value) -> RunResult<Value> {
        self.get(key)?.ok_or_else(|| RunError::KeyNotFound { key: key.clone() })
    }

    /// Inserts or replaces; an existing entry keeps its position and original key.
    pub fn set(&self, key: Value, value: Value) -> RunResult<()> {
        let hashed = DictKey::from_value(&key)?;
        let mut map = self.0.borrow_mut();
        match map.get_mut(&hashed) {
            Some(entry) => entry.1 = value,
            None => {
                map.insert(hashed, (key, value));
            }
        }
        Ok(())
    }

    /// `del d[key]`.
    pub fn remove(&self, key: &Value) -> RunResult<Value> {
        let hashed = DictKey::from_value(key)?;
        self.0
            .borrow_mut()
            .shift_remove(&hashed)
            .map(|(_, v)| v)
            .ok_or_else(|| RunError::KeyNotFound { key: key.clone() })
    }

    /// Keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<Value> {
        self.0.borrow().values().map(|(k, _)| k.clone()).collect()
    }

    /// `(key, value)` pairs in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<(Value, Value)> {
        self.0.borrow().values().cloned().collect()
    }

    pub(crate) fn compare(&self, op: CompareOp, other: &Value) -> Dispatch {
        let equal = match other {
            Value::Dict(other) => Value::Dict(self.clone()).py_eq(&Value::Dict(other.clone())),
            _ => false,
        };
        match op {
            CompareOp::Eq => Dispatch::Resolved(Value::Bool(equal)),
            CompareOp::Ne => Dispatch::Resolved(Value::Bool(!equal)),
            _ => Dispatch::NotImplemented,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_numbers_share_a_slot() {
        let d = Dict::new();
        d.set(Value::Int(1), Value::from("int")).unwrap();
        d.set(Value::Float(1.0), Value::from("float")).unwrap();
        d.set(Value::Bool(true), Value::from("bool")).unwrap();
        assert_eq!(d.len(), 1);
        assert_eq!(d.keys(), vec![Value::Int(1)]);
        assert_eq!(d.get_item(&Value::Int(1)).unwrap(), Value::from("bool"));
    }

    #[test]
    fn lists_are_unhashable() {
        let d = Dict::new();
        let err = d.set(Value::from(vec![Value::Int(1)]), Value::None).unwrap_err();
        assert_eq!(err.kind(), "Unhashable");
    }

    #[test]
    fn remove_missing_key_fails() {
        let d = Dict::new();
        assert_eq!(d.remove(&Value::from("x")).unwrap_err().kind(), "KeyNotFound");
    }
}
