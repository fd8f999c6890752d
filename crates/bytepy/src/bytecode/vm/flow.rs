//! Jumps, loop blocks and the iteration protocol.
//!
//! `JUMP_FORWARD`, `SETUP_LOOP` and `FOR_ITER` carry a delta counted from the end
//! of their own instruction; every other jump carries an absolute offset.

use std::{cell::RefCell, rc::Rc};

use super::{Block, Frame, VM, to_usize};
use crate::{
    exception::{RunError, RunResult},
    io::PrintWriter,
    resource::ResourceTracker,
    tracer::VmTracer,
    types::SeqIter,
    value::Value,
};

pub(super) fn jump_forward(frame: &mut Frame) -> RunResult<()> {
    let delta = frame.read_arg()?;
    frame.jump_by(to_usize(delta));
    Ok(())
}

pub(super) fn jump_absolute(frame: &mut Frame) -> RunResult<()> {
    let target = frame.read_arg()?;
    frame.jump_to(to_usize(target));
    Ok(())
}

/// `JUMP_IF_FALSE_OR_POP` / `JUMP_IF_TRUE_OR_POP`: jumps and keeps the
/// condition when its truthiness equals `when`, otherwise pops it.
pub(super) fn jump_if_or_pop(frame: &mut Frame, when: bool) -> RunResult<()> {
    let target = frame.read_arg()?;
    if frame.peek()?.py_bool() == when {
        frame.jump_to(to_usize(target));
    } else {
        frame.pop()?;
    }
    Ok(())
}

/// `POP_JUMP_IF_FALSE` / `POP_JUMP_IF_TRUE`.
pub(super) fn pop_jump_if(frame: &mut Frame, when: bool) -> RunResult<()> {
    let target = frame.read_arg()?;
    if frame.pop()?.py_bool() == when {
        frame.jump_to(to_usize(target));
    }
    Ok(())
}

pub(super) fn continue_loop(frame: &mut Frame) -> RunResult<()> {
    let target = frame.read_arg()?;
    if frame.blocks().is_empty() {
        return Err(RunError::BlockStackUnderflow);
    }
    frame.jump_to(to_usize(target));
    Ok(())
}

/// Replaces TOS with an iterator over it. Iterators iterate themselves.
pub(super) fn get_iter(frame: &mut Frame) -> RunResult<()> {
    let value = frame.pop()?;
    let iter = match value {
        Value::Iter(_) => value,
        _ => Value::Iter(Rc::new(RefCell::new(SeqIter::new(&value)?))),
    };
    frame.push(iter);
    Ok(())
}

/// Pushes the next element above the iterator, or pops the exhausted
/// iterator and jumps forward by the delta.
pub(super) fn for_iter(frame: &mut Frame) -> RunResult<()> {
    let delta = frame.read_arg()?;
    let next = match frame.peek()? {
        Value::Iter(iter) => iter.borrow_mut().next_value(),
        other => {
            return Err(RunError::type_mismatch(format!(
                "FOR_ITER expected an iterator, found '{}'",
                other.type_name()
            )));
        }
    };
    match next {
        Some(item) => frame.push(item),
        None => {
            frame.pop()?;
            frame.jump_by(to_usize(delta));
        }
    }
    Ok(())
}

impl<T: ResourceTracker, P: PrintWriter, Tr: VmTracer> VM<'_, T, P, Tr> {
    pub(super) fn setup_loop(&mut self, frame: &mut Frame) -> RunResult<()> {
        let delta = frame.read_arg()?;
        let start = frame.cursor();
        frame.push_block(Block {
            stack_size_at_entry: frame.stack().len(),
            loop_start: start,
            loop_end: start + to_usize(delta),
        });
        self.tracer.on_block_push(frame.blocks().len());
        Ok(())
    }

    pub(super) fn pop_block(&mut self, frame: &mut Frame) -> RunResult<()> {
        frame.pop_block()?;
        self.tracer.on_block_pop(frame.blocks().len());
        Ok(())
    }

    /// Leaves the innermost loop: drops whatever the body left on the stack
    /// (including a `FOR_ITER` iterator) and jumps past the loop.
    pub(super) fn break_loop(&mut self, frame: &mut Frame) -> RunResult<()> {
        let block = frame.pop_block()?;
        frame.truncate_stack(block.stack_size_at_entry);
        frame.jump_to(block.loop_end);
        self.tracer.on_block_pop(frame.blocks().len());
        Ok(())
    }
}
