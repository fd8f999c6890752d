//! Operator capabilities and the object protocol.
//!
//! Every operator the VM applies to a value is first *queried*: a value either
//! implements a [`Capability`] or it does not. Implemented capabilities are then
//! *invoked* and answer with a [`Dispatch`], whose `NotImplemented` case is the
//! "not supported for this operand" sentinel that makes the VM try the reflected
//! operation on the other operand.
//!
//! Built-in value kinds answer from static tables (see [`Value::implements`]);
//! host-defined objects implement [`PyObject`] and are stored in `Value::Object`.

use std::fmt;

use strum::{Display, FromRepr, IntoStaticStr};

use crate::{exception::RunResult, value::Value};

/// A binary operator shared by the `BINARY_*` and `INPLACE_*` opcode families.
///
/// The `Display` form is the operator symbol.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, serde::Serialize, serde::Deserialize,
)]
pub enum BinaryOp {
    #[strum(serialize = "**")]
    Power,
    #[strum(serialize = "*")]
    Multiply,
    /// Classic `/`. The numeric library treats it as true division.
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "//")]
    FloorDivide,
    #[strum(serialize = "/")]
    TrueDivide,
    #[strum(serialize = "%")]
    Modulo,
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Subtract,
    #[strum(serialize = "<<")]
    LeftShift,
    #[strum(serialize = ">>")]
    RightShift,
    #[strum(serialize = "&")]
    And,
    #[strum(serialize = "^")]
    Xor,
    #[strum(serialize = "|")]
    Or,
}

impl BinaryOp {
    /// Dunder method name for the given side, e.g. `__add__` / `__radd__`.
    #[must_use]
    pub fn method_name(self, side: Side) -> &'static str {
        match (self, side) {
            (Self::Power, Side::Forward) => "__pow__",
            (Self::Power, Side::Reflected) => "__rpow__",
            (Self::Multiply, Side::Forward) => "__mul__",
            (Self::Multiply, Side::Reflected) => "__rmul__",
            (Self::Divide, Side::Forward) => "__div__",
            (Self::Divide, Side::Reflected) => "__rdiv__",
            (Self::FloorDivide, Side::Forward) => "__floordiv__",
            (Self::FloorDivide, Side::Reflected) => "__rfloordiv__",
            (Self::TrueDivide, Side::Forward) => "__truediv__",
            (Self::TrueDivide, Side::Reflected) => "__rtruediv__",
            (Self::Modulo, Side::Forward) => "__mod__",
            (Self::Modulo, Side::Reflected) => "__rmod__",
            (Self::Add, Side::Forward) => "__add__",
            (Self::Add, Side::Reflected) => "__radd__",
            (Self::Subtract, Side::Forward) => "__sub__",
            (Self::Subtract, Side::Reflected) => "__rsub__",
            (Self::LeftShift, Side::Forward) => "__lshift__",
            (Self::LeftShift, Side::Reflected) => "__rlshift__",
            (Self::RightShift, Side::Forward) => "__rshift__",
            (Self::RightShift, Side::Reflected) => "__rrshift__",
            (Self::And, Side::Forward) => "__and__",
            (Self::And, Side::Reflected) => "__rand__",
            (Self::Xor, Side::Forward) => "__xor__",
            (Self::Xor, Side::Reflected) => "__rxor__",
            (Self::Or, Side::Forward) => "__or__",
            (Self::Or, Side::Reflected) => "__ror__",
        }
    }

    /// Human readable failure message naming the operator and both operands.
    #[must_use]
    pub fn describe_failure(self, left: &Value, right: &Value) -> String {
        let (a, b) = (left.py_repr(), right.py_repr());
        let action = match self {
            Self::Power => format!("raise {a} to the power of {b}"),
            Self::Multiply => format!("multiply {a} and {b}"),
            Self::Divide | Self::TrueDivide => format!("divide {a} by {b}"),
            Self::FloorDivide => format!("floor-divide {a} by {b}"),
            Self::Modulo => format!("compute {a} modulo {b}"),
            Self::Add => format!("add {a} and {b}"),
            Self::Subtract => format!("subtract {b} from {a}"),
            Self::LeftShift => format!("left-shift {a} by {b}"),
            Self::RightShift => format!("right-shift {a} by {b}"),
            Self::And => format!("bitwise-and {a} and {b}"),
            Self::Xor => format!("bitwise-xor {a} and {b}"),
            Self::Or => format!("bitwise-or {a} and {b}"),
        };
        format!(
            "cannot {action}: unsupported operand type(s) for {self}: '{}' and '{}'",
            left.type_name(),
            right.type_name()
        )
    }
}

/// A unary operator. `UNARY_NOT` and `UNARY_CONVERT` need no capability and are
/// not listed here.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, serde::Serialize, serde::Deserialize,
)]
pub enum UnaryOp {
    #[strum(serialize = "+")]
    Positive,
    #[strum(serialize = "-")]
    Negative,
    #[strum(serialize = "~")]
    Invert,
}

/// Comparison kinds in `COMPARE_OP` immediate order.
///
/// Only the six rich comparisons have semantics in this core; the others are
/// recognised so that their failures can be reported by name.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    FromRepr,
    IntoStaticStr,
    serde::Serialize,
    serde::Deserialize,
)]
#[repr(u8)]
pub enum CompareOp {
    #[strum(serialize = "<")]
    Lt = 0,
    #[strum(serialize = "<=")]
    Le = 1,
    #[strum(serialize = "==")]
    Eq = 2,
    #[strum(serialize = "!=")]
    Ne = 3,
    #[strum(serialize = ">")]
    Gt = 4,
    #[strum(serialize = ">=")]
    Ge = 5,
    #[strum(serialize = "in")]
    In = 6,
    #[strum(serialize = "not in")]
    NotIn = 7,
    #[strum(serialize = "is")]
    Is = 8,
    #[strum(serialize = "is not")]
    IsNot = 9,
    #[strum(serialize = "exception match")]
    ExceptionMatch = 10,
}

impl CompareOp {
    /// Decodes a `COMPARE_OP` immediate.
    #[must_use]
    pub fn from_index(index: u32) -> Option<Self> {
        u8::try_from(index).ok().and_then(Self::from_repr)
    }

    /// The comparison tried on the right operand when the left one declines:
    /// `<` and `>` swap, `<=` and `>=` swap, `==` and `!=` are their own mirror.
    ///
    /// Returns `None` for the comparison kinds without semantics.
    #[must_use]
    pub fn reflected(self) -> Option<Self> {
        match self {
            Self::Lt => Some(Self::Gt),
            Self::Le => Some(Self::Ge),
            Self::Eq => Some(Self::Eq),
            Self::Ne => Some(Self::Ne),
            Self::Gt => Some(Self::Lt),
            Self::Ge => Some(Self::Le),
            Self::In | Self::NotIn | Self::Is | Self::IsNot | Self::ExceptionMatch => None,
        }
    }

    /// Applies this rich comparison to an ordering.
    ///
    /// Returns `None` for the comparison kinds without semantics.
    #[must_use]
    pub fn matches(self, ordering: std::cmp::Ordering) -> Option<bool> {
        use std::cmp::Ordering::{Equal, Greater, Less};
        match self {
            Self::Lt => Some(ordering == Less),
            Self::Le => Some(ordering != Greater),
            Self::Eq => Some(ordering == Equal),
            Self::Ne => Some(ordering != Equal),
            Self::Gt => Some(ordering == Greater),
            Self::Ge => Some(ordering != Less),
            Self::In | Self::NotIn | Self::Is | Self::IsNot | Self::ExceptionMatch => None,
        }
    }

    /// Human readable failure message naming the comparison and both operands.
    #[must_use]
    pub fn describe_failure(self, left: &Value, right: &Value) -> String {
        format!(
            "cannot compare {} {self} {}: unsupported between '{}' and '{}'",
            left.py_repr(),
            right.py_repr(),
            left.type_name(),
            right.type_name()
        )
    }
}

/// Which operand a binary capability is invoked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, serde::Serialize, serde::Deserialize)]
pub enum Side {
    /// `a.op(b)`, the left operand acting.
    Forward,
    /// `b.rop(a)`, the right operand acting after the left one declined.
    Reflected,
}

/// One queryable operator capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Binary(BinaryOp, Side),
    InPlace(BinaryOp),
    Unary(UnaryOp),
    Compare(CompareOp),
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary(op, side) => f.write_str(op.method_name(*side)),
            Self::InPlace(op) => write!(f, "{op}="),
            Self::Unary(op) => write!(f, "unary {op}"),
            Self::Compare(op) => write!(f, "compare {op}"),
        }
    }
}

/// Result of invoking an implemented capability.
#[derive(Debug, Clone)]
pub enum Dispatch {
    /// The operation produced this value.
    Resolved(Value),
    /// The operation is not supported for this particular other operand.
    NotImplemented,
}

impl From<Value> for Dispatch {
    fn from(value: Value) -> Self {
        Self::Resolved(value)
    }
}

/// Protocol implemented by host-defined objects stored in `Value::Object`.
///
/// Every method has a default, so an implementor only overrides what it supports.
/// `implements` must agree with the other methods: the VM only invokes an
/// operation after `implements` returned `true` for it.
pub trait PyObject: fmt::Debug {
    /// Type name used in diagnostics.
    fn type_name(&self) -> &'static str;

    /// `repr()` form.
    fn repr(&self) -> String {
        format!("<{} object>", self.type_name())
    }

    /// `str()` form, used by `PRINT_ITEM`.
    fn str(&self) -> String {
        self.repr()
    }

    /// Whether the object implements the given capability.
    fn implements(&self, _capability: Capability) -> bool {
        false
    }

    /// Invokes a binary operator, `self` being the operand named by `side`.
    fn binary_op(&self, _op: BinaryOp, _side: Side, _other: &Value) -> RunResult<Dispatch> {
        Ok(Dispatch::NotImplemented)
    }

    /// Mutates `self` in place with the operator and `other`.
    fn inplace_op(&self, _op: BinaryOp, _other: &Value) -> RunResult<Dispatch> {
        Ok(Dispatch::NotImplemented)
    }

    /// Invokes a unary operator.
    fn unary_op(&self, _op: UnaryOp) -> RunResult<Dispatch> {
        Ok(Dispatch::NotImplemented)
    }

    /// Invokes a rich comparison with `self` on the left.
    fn compare(&self, _op: CompareOp, _other: &Value) -> RunResult<Dispatch> {
        Ok(Dispatch::NotImplemented)
    }

    /// Truthiness; objects are true unless they say otherwise.
    fn truthy(&self) -> bool {
        true
    }
}
