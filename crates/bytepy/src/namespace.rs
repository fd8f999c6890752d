use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;

use crate::value::Value;

/// A name → value mapping backing one scope (locals, globals or builtins).
///
/// Insertion ordered so that debugging output and host inspection see names in
/// the order the program bound them.
#[derive(Debug, Clone, Default)]
pub struct Namespace(IndexMap<String, Value, ahash::RandomState>);

/// A namespace shared between frames.
///
/// Globals and builtins are shared by every frame of a program; a frame's
/// locals are its own. Execution is single-threaded, so sharing needs no lock.
pub type Scope = Rc<RefCell<Namespace>>;

impl Namespace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps the namespace for sharing between frames.
    #[must_use]
    pub fn into_scope(self) -> Scope {
        Rc::new(RefCell::new(self))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    /// Removes a binding, preserving the order of the remaining names.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.shift_remove(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for Namespace {
    fn from_iter<I: IntoIterator<Item = (S, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Looks `name` up in each scope in turn.
pub(crate) fn lookup(scopes: &[&Scope], name: &str) -> Option<Value> {
    scopes.iter().find_map(|scope| scope.borrow().get(name).cloned())
}
