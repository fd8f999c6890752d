use std::{cell::RefCell, fmt, rc::Rc};

use crate::{
    builtins::Builtins,
    bytecode::CodeObject,
    capability::{BinaryOp, Capability, CompareOp, Dispatch, PyObject, Side, UnaryOp},
    exception::RunResult,
    function::FunctionObject,
    resource::MAX_DATA_RECURSION_DEPTH,
    types::{
        Complex, Dict, List, LongInt, SeqIter, float,
        number::{self, Number},
        string,
    },
};

/// Primary value type representing objects at runtime.
///
/// Scalars are stored inline; strings, code and functions are immutable and
/// shared via `Rc`; lists, dicts and iterators are shared *and* mutable, so
/// cloning a `Value` never copies their contents.
///
/// `PartialEq` is structural identity for hosts and tests (`Int(1) != Float(1.0)`);
/// language-level equality is [`Value::py_eq`] and the comparison protocol.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Long(LongInt),
    Float(f64),
    Complex(Complex),
    Str(Rc<str>),
    List(List),
    Dict(Dict),
    Function(Rc<FunctionObject>),
    Builtin(Builtins),
    Code(Rc<CodeObject>),
    Iter(Rc<RefCell<SeqIter>>),
    /// A host-defined object implementing the capability protocol.
    Object(Rc<dyn PyObject>),
}

impl Value {
    /// Type name used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Complex(_) => "complex",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Dict(_) => "dict",
            Self::Function(_) => "function",
            Self::Builtin(_) => "builtin_function_or_method",
            Self::Code(_) => "code",
            Self::Iter(it) => it.borrow().type_name(),
            Self::Object(obj) => obj.type_name(),
        }
    }

    /// Truthiness. Total: every value is either true or false.
    #[must_use]
    pub fn py_bool(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Long(l) => !l.is_zero(),
            Self::Float(f) => *f != 0.0,
            Self::Complex(c) => !c.is_zero(),
            Self::Str(s) => !s.is_empty(),
            Self::List(list) => !list.is_empty(),
            Self::Dict(dict) => !dict.is_empty(),
            Self::Object(obj) => obj.truthy(),
            Self::Function(_) | Self::Builtin(_) | Self::Code(_) | Self::Iter(_) => true,
        }
    }

    /// `repr()` form.
    #[must_use]
    pub fn py_repr(&self) -> String {
        let mut out = String::new();
        self.repr_into(&mut out, MAX_DATA_RECURSION_DEPTH);
        out
    }

    /// `str()` form, what `PRINT_ITEM` writes.
    #[must_use]
    pub fn py_str(&self) -> String {
        match self {
            Self::Str(s) => s.to_string(),
            Self::Long(l) => l.to_string(),
            Self::Float(f) => float::str(*f),
            Self::Object(obj) => obj.str(),
            _ => self.py_repr(),
        }
    }

    fn repr_into(&self, out: &mut String, depth: u16) {
        match self {
            Self::None => out.push_str("None"),
            Self::Bool(true) => out.push_str("True"),
            Self::Bool(false) => out.push_str("False"),
            Self::Int(i) => out.push_str(&i.to_string()),
            Self::Long(l) => {
                out.push_str(&l.to_string());
                out.push('L');
            }
            Self::Float(f) => out.push_str(&float::repr(*f)),
            Self::Complex(c) => out.push_str(&c.repr()),
            Self::Str(s) => out.push_str(&string::repr(s)),
            Self::List(list) => {
                if depth == 0 {
                    out.push_str("[...]");
                    return;
                }
                out.push('[');
                for (i, item) in list.to_vec().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.repr_into(out, depth - 1);
                }
                out.push(']');
            }
            Self::Dict(dict) => {
                if depth == 0 {
                    out.push_str("{...}");
                    return;
                }
                out.push('{');
                for (i, (k, v)) in dict.items().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    k.repr_into(out, depth - 1);
                    out.push_str(": ");
                    v.repr_into(out, depth - 1);
                }
                out.push('}');
            }
            Self::Function(func) => out.push_str(&format!("<function {}>", func.name())),
            Self::Builtin(b) => out.push_str(&format!("<built-in function {b}>")),
            Self::Code(code) => out.push_str(&format!("<code object {}>", code.name())),
            Self::Iter(it) => out.push_str(&format!("<{} object>", it.borrow().type_name())),
            Self::Object(obj) => out.push_str(&obj.repr()),
        }
    }

    /// Language-level equality used inside containers: numbers compare by value
    /// across the tower (`True == 1 == 1.0`), containers element-wise, and
    /// everything else by identity.
    #[must_use]
    pub fn py_eq(&self, other: &Self) -> bool {
        self.eq_depth(other, MAX_DATA_RECURSION_DEPTH)
    }

    fn eq_depth(&self, other: &Self, depth: u16) -> bool {
        if depth == 0 {
            return false;
        }
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return number::numbers_equal(&a, &b);
        }
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                let (a, b) = (a.to_vec(), b.to_vec());
                a.len() == b.len() && a.iter().zip(&b).all(|(x, y)| x.eq_depth(y, depth - 1))
            }
            (Self::Dict(a), Self::Dict(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                if a.len() != b.len() {
                    return false;
                }
                a.items().iter().all(|(k, v)| match b.get(k) {
                    Ok(Some(other)) => v.eq_depth(&other, depth - 1),
                    _ => false,
                })
            }
            _ => self.is_identical(other),
        }
    }

    /// Kind-for-kind equality behind `PartialEq`: no numeric coercion, and the
    /// same nesting cap as [`py_eq`](Self::py_eq).
    fn structural_eq(&self, other: &Self, depth: u16) -> bool {
        if depth == 0 {
            return false;
        }
        let same = |a: &Self, b: &Self| a.structural_eq(b, depth - 1);
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Long(a), Self::Long(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Complex(a), Self::Complex(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| same(x, y))
            }
            (Self::Dict(a), Self::Dict(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                let (a, b) = (a.items(), b.items());
                a.len() == b.len()
                    && a.iter()
                        .zip(&b)
                        .all(|((ka, va), (kb, vb))| same(ka, kb) && same(va, vb))
            }
            (Self::Builtin(a), Self::Builtin(b)) => a == b,
            _ => self.is_identical(other),
        }
    }

    /// Identity for reference kinds, structural equality for scalars.
    #[must_use]
    pub fn is_identical(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::List(a), Self::List(b)) => a.ptr_eq(b),
            (Self::Dict(a), Self::Dict(b)) => a.ptr_eq(b),
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            (Self::Code(a), Self::Code(b)) => Rc::ptr_eq(a, b),
            (Self::Iter(a), Self::Iter(b)) => Rc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            _ => self == other,
        }
    }

    /// Numeric view, with `bool` promoted to `int`.
    fn as_number(&self) -> Option<Number> {
        match self {
            Self::Bool(b) => Some(Number::Int(i64::from(*b))),
            _ => Number::from_value(self),
        }
    }

    /// All elements of an iterable value, as a new vector.
    pub fn iter_values(&self) -> RunResult<Vec<Self>> {
        match self {
            Self::Iter(it) => Ok(it.borrow_mut().remaining()),
            _ => Ok(SeqIter::new(self)?.remaining()),
        }
    }

    // === Capability protocol ===

    /// Whether this value implements `capability`.
    #[must_use]
    pub fn implements(&self, capability: Capability) -> bool {
        if let Self::Object(obj) = self {
            return obj.implements(capability);
        }
        if let Some(n) = Number::from_value(self) {
            return match capability {
                Capability::Binary(op, _) => number::implements_binary(n.rank(), op),
                Capability::Unary(op) => number::implements_unary(n.rank(), op),
                Capability::Compare(op) => number::implements_compare(n.rank(), op),
                Capability::InPlace(_) => false,
            };
        }
        let rich = |op: CompareOp| op.reflected().is_some();
        let equality = |op: CompareOp| matches!(op, CompareOp::Eq | CompareOp::Ne);
        match (self, capability) {
            (Self::Bool(_) | Self::Str(_), Capability::Compare(op)) => rich(op),
            (Self::Str(_), Capability::Binary(BinaryOp::Multiply, _)) => true,
            (Self::List(_), Capability::Binary(BinaryOp::Add | BinaryOp::Multiply, _)) => true,
            (Self::List(_), Capability::InPlace(BinaryOp::Add | BinaryOp::Multiply)) => true,
            (
                Self::None
                | Self::List(_)
                | Self::Dict(_)
                | Self::Function(_)
                | Self::Builtin(_)
                | Self::Code(_)
                | Self::Iter(_),
                Capability::Compare(op),
            ) => equality(op),
            _ => false,
        }
    }

    /// Invokes a binary operator with `self` as the operand named by `side`.
    ///
    /// Callers must check [`implements`](Self::implements) first.
    pub fn binary_op(&self, op: BinaryOp, side: Side, other: &Self) -> RunResult<Dispatch> {
        match self {
            Self::Object(obj) => obj.binary_op(op, side, other),
            Self::Str(s) => string::binary_op(s, op, other),
            Self::List(list) => list.binary_op(op, side, other),
            _ => match Number::from_value(self) {
                Some(n) => number::binary_op(n, op, side, other),
                None => Ok(Dispatch::NotImplemented),
            },
        }
    }

    /// Mutates `self` in place. Only lists and host objects have in-place capabilities.
    pub fn inplace_op(&self, op: BinaryOp, other: &Self) -> RunResult<Dispatch> {
        match self {
            Self::Object(obj) => obj.inplace_op(op, other),
            Self::List(list) => list.inplace_op(op, other),
            _ => Ok(Dispatch::NotImplemented),
        }
    }

    pub fn unary_op(&self, op: UnaryOp) -> RunResult<Dispatch> {
        match self {
            Self::Object(obj) => obj.unary_op(op),
            _ => match Number::from_value(self) {
                Some(n) => number::unary_op(n, op),
                None => Ok(Dispatch::NotImplemented),
            },
        }
    }

    /// Rich comparison with `self` on the left.
    pub fn compare(&self, op: CompareOp, other: &Self) -> RunResult<Dispatch> {
        let by_identity = |identical: bool| match op {
            CompareOp::Eq => Dispatch::Resolved(Self::Bool(identical)),
            CompareOp::Ne => Dispatch::Resolved(Self::Bool(!identical)),
            _ => Dispatch::NotImplemented,
        };
        match self {
            Self::Object(obj) => obj.compare(op, other),
            Self::Bool(b) => number::compare(Number::Int(i64::from(*b)), op, other),
            Self::Str(s) => Ok(string::compare(s, op, other)),
            Self::List(list) => Ok(list.compare(op, other)),
            Self::Dict(dict) => Ok(dict.compare(op, other)),
            Self::None => Ok(by_identity(matches!(other, Self::None))),
            Self::Function(_) | Self::Builtin(_) | Self::Code(_) | Self::Iter(_) => {
                Ok(by_identity(self.is_identical(other)))
            }
            Self::Int(_) | Self::Long(_) | Self::Float(_) | Self::Complex(_) => match Number::from_value(self) {
                Some(n) => number::compare(n, op, other),
                None => Ok(Dispatch::NotImplemented),
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.structural_eq(other, MAX_DATA_RECURSION_DEPTH)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.py_str())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(Rc::from(s))
    }
}

impl From<Vec<Self>> for Value {
    fn from(items: Vec<Self>) -> Self {
        Self::List(List::new(items))
    }
}

impl From<LongInt> for Value {
    fn from(l: LongInt) -> Self {
        Self::Long(l)
    }
}

impl From<Complex> for Value {
    fn from(c: Complex) -> Self {
        Self::Complex(c)
    }
}

impl From<Rc<CodeObject>> for Value {
    fn from(code: Rc<CodeObject>) -> Self {
        Self::Code(code)
    }
}
