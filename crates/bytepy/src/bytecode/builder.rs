//! Builder for assembling code objects.
//!
//! `CodeBuilder` encodes opcodes and immediates into raw bytes, interns the
//! constant/name/varname tables, and patches forward jumps once their target
//! is known. It stands in for a compiler when hosts and tests need bytecode.

use super::{code::CodeObject, op::Opcode};
use crate::{capability::CompareOp, value::Value};

/// Builder for assembling bytecode.
///
/// # Usage
///
/// ```ignore
/// let mut builder = CodeBuilder::new("<module>");
/// builder.load_const(Value::Int(3));
/// builder.load_const(Value::Int(4));
/// builder.emit(Opcode::BinaryAdd);
/// builder.emit(Opcode::ReturnValue);
/// let code = builder.build();
/// ```
#[derive(Debug, Default)]
pub struct CodeBuilder {
    name: String,
    bytecode: Vec<u8>,
    consts: Vec<Value>,
    names: Vec<String>,
    varnames: Vec<String>,
}

/// A jump whose immediate still has to be patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "an unpatched jump targets offset 0"]
pub struct JumpLabel {
    /// Offset of the jump's opcode byte.
    at: usize,
    op: Opcode,
}

impl CodeBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Emits an instruction without an immediate.
    ///
    /// # Panics
    /// Panics if `op` takes an immediate.
    pub fn emit(&mut self, op: Opcode) {
        assert!(!op.has_arg(), "{op} requires an immediate");
        self.bytecode.push(op as u8);
    }

    /// Emits an instruction with an immediate, prefixing `EXTENDED_ARG` when
    /// the value does not fit in 16 bits.
    ///
    /// # Panics
    /// Panics if `op` takes no immediate.
    pub fn emit_arg(&mut self, op: Opcode, arg: u32) {
        assert!(op.has_arg(), "{op} takes no immediate");
        let [lo0, lo1, hi0, hi1] = arg.to_le_bytes();
        if arg > u32::from(u16::MAX) {
            self.bytecode.extend_from_slice(&[Opcode::ExtendedArg as u8, hi0, hi1]);
        }
        self.bytecode.extend_from_slice(&[op as u8, lo0, lo1]);
    }

    /// Emits a raw byte, for hand-assembling malformed streams in tests.
    pub fn emit_raw(&mut self, byte: u8) {
        self.bytecode.push(byte);
    }

    /// Emits a jump with a placeholder target, to be fixed with [`patch_jump`](Self::patch_jump).
    ///
    /// The placeholder is a plain 16-bit immediate with no `EXTENDED_ARG`
    /// slot, so a patched jump reaches at most 64 KiB: the distance for a
    /// relative jump, the target offset for an absolute one. Backward jumps
    /// emitted with [`emit_jump_to`](Self::emit_jump_to) have no such limit.
    ///
    /// # Panics
    /// Panics if `op` is not a jump.
    pub fn emit_jump(&mut self, op: Opcode) -> JumpLabel {
        assert!(op.is_relative_jump() || op.is_absolute_jump(), "{op} is not a jump");
        let label = JumpLabel {
            at: self.bytecode.len(),
            op,
        };
        self.bytecode.extend_from_slice(&[op as u8, 0, 0]);
        label
    }

    /// Points a previously emitted jump at the current offset.
    ///
    /// Relative jumps store the distance from the end of the jump instruction;
    /// absolute jumps store the offset itself.
    ///
    /// # Panics
    /// Panics if the encoded target exceeds 16 bits (see [`emit_jump`](Self::emit_jump)).
    pub fn patch_jump(&mut self, label: JumpLabel) {
        let target = self.bytecode.len();
        let value = if label.op.is_relative_jump() {
            target - (label.at + 3)
        } else {
            target
        };
        let value = u16::try_from(value).expect("jump target exceeds u16 range; code object too large");
        let [lo, hi] = value.to_le_bytes();
        self.bytecode[label.at + 1] = lo;
        self.bytecode[label.at + 2] = hi;
    }

    /// Emits a jump to an already known absolute offset (backward jumps).
    ///
    /// # Panics
    /// Panics if `op` is not an absolute jump.
    pub fn emit_jump_to(&mut self, op: Opcode, target: usize) {
        assert!(op.is_absolute_jump(), "{op} is not an absolute jump");
        let target = u32::try_from(target).expect("jump target exceeds u32 range");
        self.emit_arg(op, target);
    }

    /// Returns the current bytecode offset.
    ///
    /// Use this to record loop start positions for backward jumps.
    #[must_use]
    pub fn current_offset(&self) -> usize {
        self.bytecode.len()
    }

    /// Appends a constant and returns its index. Constants are not deduplicated.
    pub fn add_const(&mut self, value: Value) -> u32 {
        let idx = u32::try_from(self.consts.len()).expect("constant table exceeds u32 range");
        self.consts.push(value);
        idx
    }

    /// Interns a name in the `names` table.
    pub fn add_name(&mut self, name: &str) -> u32 {
        intern(&mut self.names, name)
    }

    /// Interns a name in the `varnames` table.
    pub fn add_varname(&mut self, name: &str) -> u32 {
        intern(&mut self.varnames, name)
    }

    /// `LOAD_CONST value`.
    pub fn load_const(&mut self, value: impl Into<Value>) {
        let idx = self.add_const(value.into());
        self.emit_arg(Opcode::LoadConst, idx);
    }

    /// Emits one of the `*_NAME`/`*_GLOBAL`/`*_ATTR` opcodes with an interned name.
    pub fn emit_name(&mut self, op: Opcode, name: &str) {
        let idx = self.add_name(name);
        self.emit_arg(op, idx);
    }

    /// Emits one of the `*_FAST` opcodes with an interned varname.
    pub fn emit_fast(&mut self, op: Opcode, name: &str) {
        let idx = self.add_varname(name);
        self.emit_arg(op, idx);
    }

    /// `COMPARE_OP` with the given comparison.
    pub fn compare(&mut self, op: CompareOp) {
        self.emit_arg(Opcode::CompareOp, u32::from(op as u8));
    }

    /// `CALL_FUNCTION` with positional and keyword counts packed into the immediate.
    pub fn call_function(&mut self, positional: u8, keyword: u8) {
        self.emit_arg(Opcode::CallFunction, u32::from(u16::from_le_bytes([positional, keyword])));
    }

    /// Consumes the builder and returns the code object.
    #[must_use]
    pub fn build(self) -> CodeObject {
        CodeObject::new(self.name, self.bytecode, self.consts, self.names, self.varnames)
    }
}

fn intern(table: &mut Vec<String>, name: &str) -> u32 {
    let idx = table.iter().position(|n| n == name).unwrap_or_else(|| {
        table.push(name.to_owned());
        table.len() - 1
    });
    u32::try_from(idx).expect("name table exceeds u32 range")
}
