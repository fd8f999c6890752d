use std::rc::Rc;

use indexmap::IndexMap;

use crate::{bytecode::CodeObject, namespace::Scope, value::Value};

/// A function created by `MAKE_FUNCTION`.
///
/// Immutable once created and shared by every invocation: each call binds its
/// arguments into a fresh locals scope and runs `code` against the globals the
/// function was defined in.
#[derive(Debug)]
pub struct FunctionObject {
    name: String,
    code: Rc<CodeObject>,
    globals: Scope,
    /// Parameter name → default value, captured at definition time.
    defaults: IndexMap<String, Value, ahash::RandomState>,
}

impl FunctionObject {
    #[must_use]
    pub fn new(
        code: Rc<CodeObject>,
        globals: Scope,
        defaults: IndexMap<String, Value, ahash::RandomState>,
    ) -> Self {
        Self {
            name: code.name().to_owned(),
            code,
            globals,
            defaults,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn code(&self) -> &Rc<CodeObject> {
        &self.code
    }

    #[must_use]
    pub fn globals(&self) -> &Scope {
        &self.globals
    }

    #[must_use]
    pub fn default_for(&self, name: &str) -> Option<&Value> {
        self.defaults.get(name)
    }

    #[must_use]
    pub fn defaults(&self) -> &IndexMap<String, Value, ahash::RandomState> {
        &self.defaults
    }
}
