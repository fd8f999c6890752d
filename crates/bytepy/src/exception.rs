use std::fmt::{self, Display};

use crate::{
    bytecode::Opcode,
    capability::{BinaryOp, CompareOp, UnaryOp},
    resource::ResourceError,
    value::Value,
};

/// Result type alias for operations that can produce a runtime error.
pub type RunResult<T> = Result<T, RunError>;

/// Every failure the opcode core can surface to the embedding driver.
///
/// Nothing inside the core catches a `RunError`: a failure aborts the current
/// instruction, unwinds every frame between it and the driver, and is returned
/// from [`VM::exec`](crate::VM::exec) unchanged.
///
/// Operator failures carry the operand values themselves so diagnostics can
/// show exactly what was combined.
#[derive(Debug, Clone)]
pub enum RunError {
    /// `pop`/`peek` on an empty operand stack.
    StackUnderflow,
    /// `POP_BLOCK` or `BREAK_LOOP` with no loop block on the block stack.
    BlockStackUnderflow,
    /// Neither operand implements the binary operator in either direction.
    UnsupportedOperation { op: BinaryOp, left: Value, right: Value },
    /// The operand does not implement the unary operator.
    UnsupportedUnary { op: UnaryOp, operand: Value },
    /// Neither operand implements the comparison in either direction, or the
    /// comparison kind has no semantics in this core (`in`, `is`, ...).
    UnsupportedComparison { op: CompareOp, left: Value, right: Value },
    /// `COMPARE_OP` immediate outside the comparison table.
    UnknownComparison { index: u32 },
    /// A name has no binding in any scope searched by the opcode.
    UndefinedName { name: String },
    /// A known opcode that deliberately has no semantics in this core.
    Unimplemented { opcode: Opcode },
    /// A byte that is not an opcode at all.
    UnknownOpcode { byte: u8 },
    /// The instruction cursor ran past the end of the bytecode.
    CodeOverrun { offset: usize },
    /// An immediate indexes past the end of one of the code object's tables.
    BadOperand { opcode: Opcode, index: u32 },
    /// Division or modulo by zero in the numeric library.
    ZeroDivision { msg: &'static str },
    /// A value-level failure in the numeric library or a builtin (negative
    /// shift count, zero `range` step, ...).
    InvalidValue { msg: String },
    /// A wrongly typed operand to a subscript, builtin or container opcode.
    TypeMismatch { msg: String },
    /// Sequence index outside the sequence.
    IndexOutOfRange { container: &'static str, index: i64 },
    /// Dict lookup or deletion of an absent key.
    KeyNotFound { key: Value },
    /// Subscript on a value that does not support it.
    NotSubscriptable { value: Value },
    /// A mutable container used as a dict key.
    Unhashable { value: Value },
    /// `GET_ITER` (or an iterating builtin) on a value with no iteration.
    NotIterable { value: Value },
    /// `CALL_FUNCTION` on a value that cannot be called.
    NotCallable { value: Value },
    /// More positional arguments than the callee can bind.
    ArgumentCount { function: String, expected: usize, given: usize },
    /// A keyword argument whose name is not a string, or a keyword passed to
    /// a callee that accepts none.
    InvalidKeyword { function: String, name: Value },
    /// A resource limit from the configured [`ResourceTracker`](crate::ResourceTracker) was hit.
    Resource(ResourceError),
    /// The output sink failed to accept text.
    Output { msg: String },
}

impl RunError {
    /// Short category name, useful for matching in hosts and tests.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StackUnderflow => "StackUnderflow",
            Self::BlockStackUnderflow => "BlockStackUnderflow",
            Self::UnsupportedOperation { .. } => "UnsupportedOperation",
            Self::UnsupportedUnary { .. } => "UnsupportedUnary",
            Self::UnsupportedComparison { .. } => "UnsupportedComparison",
            Self::UnknownComparison { .. } => "UnknownComparison",
            Self::UndefinedName { .. } => "UndefinedName",
            Self::Unimplemented { .. } => "Unimplemented",
            Self::UnknownOpcode { .. } => "UnknownOpcode",
            Self::CodeOverrun { .. } => "CodeOverrun",
            Self::BadOperand { .. } => "BadOperand",
            Self::ZeroDivision { .. } => "ZeroDivision",
            Self::InvalidValue { .. } => "InvalidValue",
            Self::TypeMismatch { .. } => "TypeMismatch",
            Self::IndexOutOfRange { .. } => "IndexOutOfRange",
            Self::KeyNotFound { .. } => "KeyNotFound",
            Self::NotSubscriptable { .. } => "NotSubscriptable",
            Self::Unhashable { .. } => "Unhashable",
            Self::NotIterable { .. } => "NotIterable",
            Self::NotCallable { .. } => "NotCallable",
            Self::ArgumentCount { .. } => "ArgumentCount",
            Self::InvalidKeyword { .. } => "InvalidKeyword",
            Self::Resource(_) => "Resource",
            Self::Output { .. } => "Output",
        }
    }

    pub(crate) fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::TypeMismatch { msg: msg.into() }
    }

    pub(crate) fn invalid_value(msg: impl Into<String>) -> Self {
        Self::InvalidValue { msg: msg.into() }
    }
}

impl Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StackUnderflow => f.write_str("stack underflow: pop from an empty operand stack"),
            Self::BlockStackUnderflow => f.write_str("block stack underflow: no enclosing loop block"),
            Self::UnsupportedOperation { op, left, right } => f.write_str(&op.describe_failure(left, right)),
            Self::UnsupportedUnary { op, operand } => {
                write!(f, "bad operand for unary {op}: {}", operand.py_repr())
            }
            Self::UnsupportedComparison { op, left, right } => f.write_str(&op.describe_failure(left, right)),
            Self::UnknownComparison { index } => write!(f, "unknown comparison operator index {index}"),
            Self::UndefinedName { name } => write!(f, "undefined name: {name}"),
            Self::Unimplemented { opcode } => write!(f, "opcode {opcode} is not implemented"),
            Self::UnknownOpcode { byte } => write!(f, "unknown opcode byte {byte}"),
            Self::CodeOverrun { offset } => write!(f, "instruction cursor {offset} is past the end of the bytecode"),
            Self::BadOperand { opcode, index } => write!(f, "{opcode} operand {index} is out of range"),
            Self::ZeroDivision { msg } => f.write_str(msg),
            Self::InvalidValue { msg } | Self::TypeMismatch { msg } => f.write_str(msg),
            Self::IndexOutOfRange { container, index } => write!(f, "{container} index {index} out of range"),
            Self::KeyNotFound { key } => write!(f, "key not found: {}", key.py_repr()),
            Self::NotSubscriptable { value } => {
                write!(f, "'{}' object is not subscriptable", value.type_name())
            }
            Self::Unhashable { value } => write!(f, "unhashable type: '{}'", value.type_name()),
            Self::NotIterable { value } => write!(f, "'{}' object is not iterable", value.type_name()),
            Self::NotCallable { value } => write!(f, "'{}' object is not callable", value.type_name()),
            Self::ArgumentCount {
                function,
                expected,
                given,
            } => write!(f, "{function}() takes at most {expected} arguments ({given} given)"),
            Self::InvalidKeyword { function, name } => {
                write!(f, "{function}() got an invalid keyword argument {}", name.py_repr())
            }
            Self::Resource(err) => write!(f, "{err}"),
            Self::Output { msg } => write!(f, "output error: {msg}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Resource(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for RunError {
    fn from(err: ResourceError) -> Self {
        Self::Resource(err)
    }
}
