use std::{
    cell::{Ref, RefCell},
    rc::Rc,
};

use crate::{
    capability::{BinaryOp, CompareOp, Dispatch, Side},
    exception::{RunError, RunResult},
    types::{normalize_index, repeat_count, repeated_len, slice_range},
    value::Value,
};

/// A shared, mutable list.
///
/// Cloning a `List` clones the reference, not the elements: every clone sees
/// the same storage, which is what gives `INPLACE_ADD` its aliasing semantics.
#[derive(Debug, Clone, Default)]
pub struct List(Rc<RefCell<Vec<Value>>>);

impl List {
    #[must_use]
    pub fn new(items: Vec<Value>) -> Self {
        Self(Rc::new(RefCell::new(items)))
    }

    /// Borrows the elements.
    ///
    /// # Panics
    /// Panics if the list is currently mutably borrowed.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, Vec<Value>> {
        self.0.borrow()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// A copy of the current elements.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    pub fn push(&self, value: Value) {
        self.0.borrow_mut().push(value);
    }

    /// Identity comparison.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Element at `index`, counting from the end when negative.
    pub fn get(&self, index: i64) -> RunResult<Value> {
        let items = self.0.borrow();
        let i = normalize_index(index, items.len()).ok_or(out_of_range(index))?;
        Ok(items[i].clone())
    }

    pub fn set(&self, index: i64, value: Value) -> RunResult<()> {
        let mut items = self.0.borrow_mut();
        let i = normalize_index(index, items.len()).ok_or(out_of_range(index))?;
        items[i] = value;
        Ok(())
    }

    pub fn delete(&self, index: i64) -> RunResult<()> {
        let mut items = self.0.borrow_mut();
        let i = normalize_index(index, items.len()).ok_or(out_of_range(index))?;
        items.remove(i);
        Ok(())
    }

    /// `list[lo:hi]`, a new list.
    #[must_use]
    pub fn slice(&self, lo: Option<i64>, hi: Option<i64>) -> Self {
        let items = self.0.borrow();
        let range = slice_range(items.len(), lo, hi);
        Self::new(items[range].to_vec())
    }

    /// `+` with another list and `*` with an int, on either side.
    pub(crate) fn binary_op(&self, op: BinaryOp, side: Side, other: &Value) -> RunResult<Dispatch> {
        match (op, other) {
            (BinaryOp::Add, Value::List(other)) => {
                let (left, right) = match side {
                    Side::Forward => (self, other),
                    Side::Reflected => (other, self),
                };
                let mut items = left.to_vec();
                items.extend(right.borrow().iter().cloned());
                Ok(Dispatch::Resolved(Value::List(Self::new(items))))
            }
            (BinaryOp::Multiply, _) => {
                let Some(count) = repeat_count(other)? else {
                    return Ok(Dispatch::NotImplemented);
                };
                Ok(Dispatch::Resolved(Value::List(Self::new(self.repeated(count)?))))
            }
            _ => Ok(Dispatch::NotImplemented),
        }
    }

    /// `+=` extends with any iterable, `*=` repeats; both mutate this list.
    pub(crate) fn inplace_op(&self, op: BinaryOp, other: &Value) -> RunResult<Dispatch> {
        match op {
            BinaryOp::Add => {
                // collect first: `xs += xs` reads the list being extended
                let extra = other.iter_values()?;
                self.0.borrow_mut().extend(extra);
            }
            BinaryOp::Multiply => {
                let Some(count) = repeat_count(other)? else {
                    return Ok(Dispatch::NotImplemented);
                };
                let repeated = self.repeated(count)?;
                *self.0.borrow_mut() = repeated;
            }
            _ => return Ok(Dispatch::NotImplemented),
        }
        Ok(Dispatch::Resolved(Value::List(self.clone())))
    }

    /// `==`/`!=` element-wise against another list, unequal to anything else.
    pub(crate) fn compare(&self, op: CompareOp, other: &Value) -> Dispatch {
        let equal = match other {
            Value::List(other) => Value::List(self.clone()).py_eq(&Value::List(other.clone())),
            _ => false,
        };
        match op {
            CompareOp::Eq => Dispatch::Resolved(Value::Bool(equal)),
            CompareOp::Ne => Dispatch::Resolved(Value::Bool(!equal)),
            _ => Dispatch::NotImplemented,
        }
    }

    fn repeated(&self, count: usize) -> RunResult<Vec<Value>> {
        let items = self.0.borrow();
        let mut out = Vec::with_capacity(repeated_len(items.len(), count, size_of::<Value>())?);
        // an empty list repeats to nothing however large the count
        if !items.is_empty() {
            for _ in 0..count {
                out.extend(items.iter().cloned());
            }
        }
        Ok(out)
    }
}

fn out_of_range(index: i64) -> RunError {
    RunError::IndexOutOfRange {
        container: "list",
        index,
    }
}
