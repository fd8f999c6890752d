use crate::value::Value;

/// An immutable unit of compiled instructions.
///
/// `bytecode` is the flat instruction stream; `consts`, `names` and `varnames`
/// are the tables its immediates index into (`LOAD_CONST`, `*_NAME`/`*_GLOBAL`
/// and `*_FAST` respectively). Code objects are shared via `Rc` by the functions
/// created from them and are never modified after construction.
#[derive(Debug, Clone)]
pub struct CodeObject {
    name: String,
    bytecode: Vec<u8>,
    consts: Vec<Value>,
    names: Vec<String>,
    varnames: Vec<String>,
}

impl CodeObject {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        bytecode: Vec<u8>,
        consts: Vec<Value>,
        names: Vec<String>,
        varnames: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            bytecode,
            consts,
            names,
            varnames,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    #[must_use]
    pub fn consts(&self) -> &[Value] {
        &self.consts
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn varnames(&self) -> &[String] {
        &self.varnames
    }
}
