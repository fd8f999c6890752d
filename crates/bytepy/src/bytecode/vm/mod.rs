//! Bytecode virtual machine.
//!
//! The VM executes one code object per [`Frame`]. Each frame owns its operand
//! stack, block stack and instruction cursor; calls run the callee's frame to
//! completion on the host stack and push its return value onto the caller.
//!
//! Handlers live in submodules grouped by concern. Most are plain functions
//! over a frame; those that call back into the tracer or the resource tracker
//! are methods on `VM`:
//!
//! - `binary` - the binary, in-place and unary operator protocol
//! - `compare` - `COMPARE_OP`
//! - `flow` - jumps, loop blocks and iteration
//! - `call` - `CALL_FUNCTION` and `MAKE_FUNCTION`
//! - `collections` - list building, subscripts and slices
//! - `names` - constants and name bindings

mod binary;
mod call;
mod collections;
mod compare;
mod flow;
mod frame;
mod names;

use std::{borrow::Cow, rc::Rc};

pub(crate) use binary::resolve_binary;
pub(crate) use compare::resolve_compare;
pub use frame::{Block, Frame};

use crate::{
    bytecode::{CodeObject, Opcode},
    capability::{BinaryOp, UnaryOp},
    exception::{RunError, RunResult},
    io::PrintWriter,
    namespace::Scope,
    resource::ResourceTracker,
    tracer::{NoopTracer, VmTracer},
    value::Value,
};

/// What the run loop does after an instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Fetch the next instruction.
    Continue,
    /// `RETURN_VALUE` finished the frame with this value.
    Return(Value),
}

/// The opcode execution engine.
///
/// Generic over the resource tracker, the output sink and the tracer so that
/// the no-limit, no-trace configuration compiles to a plain dispatch loop.
#[derive(Debug)]
pub struct VM<'a, T: ResourceTracker, P: PrintWriter, Tr: VmTracer = NoopTracer> {
    tracker: T,
    print_writer: &'a mut P,
    tracer: Tr,
}

impl<'a, T: ResourceTracker, P: PrintWriter, Tr: VmTracer> VM<'a, T, P, Tr> {
    pub fn new(tracker: T, print_writer: &'a mut P, tracer: Tr) -> Self {
        Self {
            tracker,
            print_writer,
            tracer,
        }
    }

    /// Creates the outermost frame (depth 0) for `code`.
    #[must_use]
    pub fn create_frame(&self, code: Rc<CodeObject>, locals: Scope, globals: Scope, builtins: Scope) -> Frame {
        Frame::new(code, locals, globals, builtins, 0)
    }

    /// Runs `frame` until `RETURN_VALUE` and returns the popped value.
    ///
    /// The first error aborts execution; nothing inside the VM catches it.
    pub fn exec(&mut self, frame: &mut Frame) -> RunResult<Value> {
        loop {
            if let Flow::Return(value) = self.step(frame)? {
                return Ok(value);
            }
        }
    }

    /// Decodes and executes the instruction at the cursor.
    pub fn step(&mut self, frame: &mut Frame) -> RunResult<Flow> {
        self.tracker.check_time()?;
        let ip = frame.cursor();
        let byte = frame.read_byte()?;
        let opcode = Opcode::try_from(byte).map_err(|byte| RunError::UnknownOpcode { byte })?;
        self.tracer.on_instruction(ip, opcode, frame.stack().len(), frame.depth() + 1);
        // calls recurse through `exec`; keep `dispatch`'s frame off that path
        if opcode == Opcode::CallFunction {
            self.call_function(frame)?;
            return Ok(Flow::Continue);
        }
        self.dispatch(frame, opcode)
    }

    /// The dispatch table: runs the handler for `opcode`, which has already
    /// been read from the instruction stream. Handlers read their own immediates.
    #[inline(never)]
    pub fn dispatch(&mut self, frame: &mut Frame, opcode: Opcode) -> RunResult<Flow> {
        match opcode {
            // Stack manipulation
            Opcode::PopTop => {
                frame.pop()?;
            }
            Opcode::RotTwo => frame.top_mut(2)?.swap(0, 1),
            Opcode::RotThree => frame.top_mut(3)?.rotate_right(1),
            Opcode::RotFour => frame.top_mut(4)?.rotate_right(1),
            Opcode::DupTop => {
                let top = frame.peek()?.clone();
                frame.push(top);
            }
            Opcode::Nop => {}
            Opcode::ExtendedArg => {
                let high = frame.read_arg()?;
                frame.set_extended_arg(high);
            }

            // Unary
            Opcode::UnaryPositive => binary::unary(frame, UnaryOp::Positive)?,
            Opcode::UnaryNegative => binary::unary(frame, UnaryOp::Negative)?,
            Opcode::UnaryInvert => binary::unary(frame, UnaryOp::Invert)?,
            Opcode::UnaryNot => {
                let value = frame.pop()?;
                frame.push(Value::Bool(!value.py_bool()));
            }
            Opcode::UnaryConvert => {
                let value = frame.pop()?;
                frame.push(Value::from(value.py_repr()));
            }

            // Binary
            Opcode::BinaryPower => binary::binary(frame, BinaryOp::Power)?,
            Opcode::BinaryMultiply => binary::binary(frame, BinaryOp::Multiply)?,
            Opcode::BinaryDivide => binary::binary(frame, BinaryOp::Divide)?,
            Opcode::BinaryModulo => binary::binary(frame, BinaryOp::Modulo)?,
            Opcode::BinaryAdd => binary::binary(frame, BinaryOp::Add)?,
            Opcode::BinarySubtract => binary::binary(frame, BinaryOp::Subtract)?,
            Opcode::BinaryFloorDivide => binary::binary(frame, BinaryOp::FloorDivide)?,
            Opcode::BinaryTrueDivide => binary::binary(frame, BinaryOp::TrueDivide)?,
            Opcode::BinaryLshift => binary::binary(frame, BinaryOp::LeftShift)?,
            Opcode::BinaryRshift => binary::binary(frame, BinaryOp::RightShift)?,
            Opcode::BinaryAnd => binary::binary(frame, BinaryOp::And)?,
            Opcode::BinaryXor => binary::binary(frame, BinaryOp::Xor)?,
            Opcode::BinaryOr => binary::binary(frame, BinaryOp::Or)?,

            // In-place
            Opcode::InplacePower => binary::inplace(frame, BinaryOp::Power)?,
            Opcode::InplaceMultiply => binary::inplace(frame, BinaryOp::Multiply)?,
            Opcode::InplaceDivide => binary::inplace(frame, BinaryOp::Divide)?,
            Opcode::InplaceModulo => binary::inplace(frame, BinaryOp::Modulo)?,
            Opcode::InplaceAdd => binary::inplace(frame, BinaryOp::Add)?,
            Opcode::InplaceSubtract => binary::inplace(frame, BinaryOp::Subtract)?,
            Opcode::InplaceFloorDivide => binary::inplace(frame, BinaryOp::FloorDivide)?,
            Opcode::InplaceTrueDivide => binary::inplace(frame, BinaryOp::TrueDivide)?,
            Opcode::InplaceLshift => binary::inplace(frame, BinaryOp::LeftShift)?,
            Opcode::InplaceRshift => binary::inplace(frame, BinaryOp::RightShift)?,
            Opcode::InplaceAnd => binary::inplace(frame, BinaryOp::And)?,
            Opcode::InplaceXor => binary::inplace(frame, BinaryOp::Xor)?,
            Opcode::InplaceOr => binary::inplace(frame, BinaryOp::Or)?,

            Opcode::CompareOp => compare::compare_op(frame)?,

            // Containers
            Opcode::BuildList => collections::build_list(frame)?,
            Opcode::ListAppend => collections::list_append(frame)?,
            Opcode::BinarySubscr => collections::binary_subscr(frame)?,
            Opcode::StoreSubscr => collections::store_subscr(frame)?,
            Opcode::DeleteSubscr => collections::delete_subscr(frame)?,
            Opcode::Slice0 => collections::slice(frame, false, false)?,
            Opcode::Slice1 => collections::slice(frame, true, false)?,
            Opcode::Slice2 => collections::slice(frame, false, true)?,
            Opcode::Slice3 => collections::slice(frame, true, true)?,

            // Names
            Opcode::LoadConst => names::load_const(frame)?,
            Opcode::LoadName => names::load_name(frame)?,
            Opcode::StoreName => names::store_name(frame)?,
            Opcode::DeleteName => names::delete_name(frame)?,
            Opcode::LoadGlobal => names::load_global(frame)?,
            Opcode::StoreGlobal => names::store_global(frame)?,
            Opcode::DeleteGlobal => names::delete_global(frame)?,
            Opcode::LoadFast => names::load_fast(frame)?,
            Opcode::StoreFast => names::store_fast(frame)?,
            Opcode::DeleteFast => names::delete_fast(frame)?,

            // Control flow
            Opcode::JumpForward => flow::jump_forward(frame)?,
            Opcode::JumpAbsolute => flow::jump_absolute(frame)?,
            Opcode::JumpIfFalseOrPop => flow::jump_if_or_pop(frame, false)?,
            Opcode::JumpIfTrueOrPop => flow::jump_if_or_pop(frame, true)?,
            Opcode::PopJumpIfFalse => flow::pop_jump_if(frame, false)?,
            Opcode::PopJumpIfTrue => flow::pop_jump_if(frame, true)?,
            Opcode::SetupLoop => self.setup_loop(frame)?,
            Opcode::PopBlock => self.pop_block(frame)?,
            Opcode::BreakLoop => self.break_loop(frame)?,
            Opcode::ContinueLoop => flow::continue_loop(frame)?,
            Opcode::GetIter => flow::get_iter(frame)?,
            Opcode::ForIter => flow::for_iter(frame)?,

            // Functions
            Opcode::CallFunction => self.call_function(frame)?,
            Opcode::MakeFunction => self.make_function(frame)?,
            Opcode::ReturnValue => return Ok(Flow::Return(frame.pop()?)),

            // Output
            Opcode::PrintItem => {
                let value = frame.pop()?;
                self.print_writer.write(Cow::Owned(value.py_str()))?;
            }
            Opcode::PrintNewline => self.print_writer.write(Cow::Borrowed("\n"))?,

            // Known opcodes without semantics in this core: tuples, maps, slice
            // stores, exceptions, generators, classes, attributes, imports.
            Opcode::StopCode
            | Opcode::BuildTuple
            | Opcode::BuildMap
            | Opcode::StoreMap
            | Opcode::BuildSet
            | Opcode::BuildSlice
            | Opcode::StoreSlice0
            | Opcode::StoreSlice1
            | Opcode::StoreSlice2
            | Opcode::StoreSlice3
            | Opcode::DeleteSlice0
            | Opcode::DeleteSlice1
            | Opcode::DeleteSlice2
            | Opcode::DeleteSlice3
            | Opcode::PrintExpr
            | Opcode::PrintItemTo
            | Opcode::PrintNewlineTo
            | Opcode::WithCleanup
            | Opcode::LoadLocals
            | Opcode::ImportStar
            | Opcode::ExecStmt
            | Opcode::YieldValue
            | Opcode::EndFinally
            | Opcode::BuildClass
            | Opcode::UnpackSequence
            | Opcode::StoreAttr
            | Opcode::DeleteAttr
            | Opcode::LoadAttr
            | Opcode::DupTopx
            | Opcode::ImportName
            | Opcode::ImportFrom
            | Opcode::SetupExcept
            | Opcode::SetupFinally
            | Opcode::SetupWith
            | Opcode::RaiseVarargs
            | Opcode::MakeClosure
            | Opcode::LoadClosure
            | Opcode::LoadDeref
            | Opcode::StoreDeref
            | Opcode::CallFunctionVar
            | Opcode::CallFunctionKw
            | Opcode::CallFunctionVarKw
            | Opcode::SetAdd
            | Opcode::MapAdd => return Err(RunError::Unimplemented { opcode }),
        }
        Ok(Flow::Continue)
    }

    /// Returns a reference to the tracer.
    #[must_use]
    pub fn tracer(&self) -> &Tr {
        &self.tracer
    }

    /// Consumes the VM and returns the tracer, e.g. to collect a recording.
    #[must_use]
    pub fn into_tracer(self) -> Tr {
        self.tracer
    }

    #[must_use]
    pub fn tracker(&self) -> &T {
        &self.tracker
    }
}

/// Immediates are at most 32 bits wide, which `usize` holds on every supported target.
#[inline]
fn to_usize(arg: u32) -> usize {
    arg as usize
}
