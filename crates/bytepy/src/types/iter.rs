use crate::{
    exception::{RunError, RunResult},
    types::List,
    value::Value,
};

/// Cursor over a sequence, produced by `GET_ITER` and advanced by `FOR_ITER`.
///
/// A list source is a live view: elements appended while iterating are
/// visited, and mutating the list during iteration is unspecified (not guarded).
/// Strings and dicts are iterated from a snapshot of their characters / keys.
#[derive(Debug)]
pub struct SeqIter {
    source: IterSource,
    pos: usize,
}

#[derive(Debug)]
enum IterSource {
    List(List),
    Snapshot(Vec<Value>),
}

impl SeqIter {
    /// Starts iterating `value` at position 0.
    pub fn new(value: &Value) -> RunResult<Self> {
        let source = match value {
            Value::List(list) => IterSource::List(list.clone()),
            Value::Str(s) => IterSource::Snapshot(s.chars().map(|c| Value::from(c.to_string())).collect()),
            Value::Dict(dict) => IterSource::Snapshot(dict.keys()),
            _ => return Err(RunError::NotIterable { value: value.clone() }),
        };
        Ok(Self { source, pos: 0 })
    }

    /// Returns the element at the cursor and advances, or `None` once exhausted.
    pub fn next_value(&mut self) -> Option<Value> {
        let item = match &self.source {
            IterSource::List(list) => list.borrow().get(self.pos).cloned(),
            IterSource::Snapshot(items) => items.get(self.pos).cloned(),
        }?;
        self.pos += 1;
        Some(item)
    }

    /// Number of elements already yielded.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self.source {
            IterSource::List(_) => "listiterator",
            IterSource::Snapshot(_) => "iterator",
        }
    }

    /// Drains the remaining elements.
    pub fn remaining(&mut self) -> Vec<Value> {
        let mut out = Vec::new();
        while let Some(item) = self.next_value() {
            out.push(item);
        }
        out
    }
}
