use std::rc::Rc;

use crate::{
    bytecode::CodeObject,
    exception::{RunError, RunResult},
    namespace::Scope,
    value::Value,
};

/// Loop bookkeeping pushed by `SETUP_LOOP` and popped by `POP_BLOCK`/`BREAK_LOOP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    /// Operand stack depth when the loop was entered; `BREAK_LOOP` truncates to it.
    pub stack_size_at_entry: usize,
    /// Offset of the first instruction of the loop body.
    pub loop_start: usize,
    /// Offset of the first instruction after the loop.
    pub loop_end: usize,
}

/// Activation record of one code object.
///
/// A frame exclusively owns its operand stack and block stack. Its locals are
/// its own scope; globals and builtins are shared with the frame that created
/// it. `depth` is 0 for the outermost frame and grows by one per call.
#[derive(Debug)]
pub struct Frame {
    code: Rc<CodeObject>,
    stack: Vec<Value>,
    locals: Scope,
    globals: Scope,
    builtins: Scope,
    blocks: Vec<Block>,
    cursor: usize,
    /// High 16 bits supplied by a preceding `EXTENDED_ARG`.
    extended_arg: u32,
    depth: usize,
}

impl Frame {
    #[must_use]
    pub fn new(code: Rc<CodeObject>, locals: Scope, globals: Scope, builtins: Scope, depth: usize) -> Self {
        Self {
            code,
            stack: Vec::new(),
            locals,
            globals,
            builtins,
            blocks: Vec::new(),
            cursor: 0,
            extended_arg: 0,
            depth,
        }
    }

    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub fn pop(&mut self) -> RunResult<Value> {
        self.stack.pop().ok_or(RunError::StackUnderflow)
    }

    pub fn peek(&self) -> RunResult<&Value> {
        self.stack.last().ok_or(RunError::StackUnderflow)
    }

    /// Pops `n` values, returned in push order.
    pub(crate) fn pop_n(&mut self, n: usize) -> RunResult<Vec<Value>> {
        let at = self.stack.len().checked_sub(n).ok_or(RunError::StackUnderflow)?;
        Ok(self.stack.split_off(at))
    }

    /// Mutable access to the top `n` slots, bottom first.
    pub(crate) fn top_mut(&mut self, n: usize) -> RunResult<&mut [Value]> {
        let at = self.stack.len().checked_sub(n).ok_or(RunError::StackUnderflow)?;
        Ok(&mut self.stack[at..])
    }

    pub(crate) fn truncate_stack(&mut self, len: usize) {
        self.stack.truncate(len);
    }

    /// Reads the opcode byte at the cursor and advances past it.
    pub(crate) fn read_byte(&mut self) -> RunResult<u8> {
        let byte = *self
            .code
            .bytecode()
            .get(self.cursor)
            .ok_or(RunError::CodeOverrun { offset: self.cursor })?;
        self.cursor += 1;
        Ok(byte)
    }

    /// Consumes the 16-bit little-endian immediate at the cursor, combined with
    /// any pending `EXTENDED_ARG` prefix.
    pub fn read_arg(&mut self) -> RunResult<u32> {
        let bytes = self
            .code
            .bytecode()
            .get(self.cursor..self.cursor + 2)
            .ok_or(RunError::CodeOverrun { offset: self.cursor })?;
        let low = u32::from(u16::from_le_bytes([bytes[0], bytes[1]]));
        self.cursor += 2;
        Ok((std::mem::take(&mut self.extended_arg) << 16) | low)
    }

    pub(crate) fn set_extended_arg(&mut self, high: u32) {
        self.extended_arg = high;
    }

    pub(crate) fn jump_to(&mut self, target: usize) {
        self.cursor = target;
    }

    pub(crate) fn jump_by(&mut self, delta: usize) {
        self.cursor += delta;
    }

    pub(crate) fn push_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub(crate) fn pop_block(&mut self) -> RunResult<Block> {
        self.blocks.pop().ok_or(RunError::BlockStackUnderflow)
    }

    #[must_use]
    pub fn code(&self) -> &Rc<CodeObject> {
        &self.code
    }

    /// The operand stack, bottom first.
    #[must_use]
    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    #[must_use]
    pub fn locals(&self) -> &Scope {
        &self.locals
    }

    #[must_use]
    pub fn globals(&self) -> &Scope {
        &self.globals
    }

    #[must_use]
    pub fn builtins(&self) -> &Scope {
        &self.builtins
    }

    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Offset of the next byte to be read.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }
}
