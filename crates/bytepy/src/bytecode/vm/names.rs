//! Constants and name bindings.
//!
//! `*_NAME` opcodes index the code object's `names` table and bind in the
//! frame's locals; `*_GLOBAL` bind in its globals; `*_FAST` index `varnames`
//! and bind in locals.

use super::{Frame, to_usize};
use crate::{
    bytecode::Opcode,
    exception::{RunError, RunResult},
    namespace::lookup,
};

/// Reads the immediate of `opcode` and resolves it against `names`.
fn name_operand(frame: &mut Frame, opcode: Opcode) -> RunResult<String> {
    let index = frame.read_arg()?;
    frame
        .code()
        .names()
        .get(to_usize(index))
        .cloned()
        .ok_or(RunError::BadOperand { opcode, index })
}

/// Reads the immediate of `opcode` and resolves it against `varnames`.
fn varname_operand(frame: &mut Frame, opcode: Opcode) -> RunResult<String> {
    let index = frame.read_arg()?;
    frame
        .code()
        .varnames()
        .get(to_usize(index))
        .cloned()
        .ok_or(RunError::BadOperand { opcode, index })
}

fn undefined(name: String) -> RunError {
    RunError::UndefinedName { name }
}

pub(super) fn load_const(frame: &mut Frame) -> RunResult<()> {
    let index = frame.read_arg()?;
    let value = frame
        .code()
        .consts()
        .get(to_usize(index))
        .cloned()
        .ok_or(RunError::BadOperand {
            opcode: Opcode::LoadConst,
            index,
        })?;
    frame.push(value);
    Ok(())
}

/// Searches locals, then globals, then builtins.
pub(super) fn load_name(frame: &mut Frame) -> RunResult<()> {
    let name = name_operand(frame, Opcode::LoadName)?;
    let value = lookup(&[frame.locals(), frame.globals(), frame.builtins()], &name).ok_or_else(|| undefined(name))?;
    frame.push(value);
    Ok(())
}

pub(super) fn store_name(frame: &mut Frame) -> RunResult<()> {
    let name = name_operand(frame, Opcode::StoreName)?;
    let value = frame.pop()?;
    frame.locals().borrow_mut().insert(name, value);
    Ok(())
}

pub(super) fn delete_name(frame: &mut Frame) -> RunResult<()> {
    let name = name_operand(frame, Opcode::DeleteName)?;
    let removed = frame.locals().borrow_mut().remove(&name);
    removed.map(drop).ok_or_else(|| undefined(name))
}

/// Searches globals, then builtins.
pub(super) fn load_global(frame: &mut Frame) -> RunResult<()> {
    let name = name_operand(frame, Opcode::LoadGlobal)?;
    let value = lookup(&[frame.globals(), frame.builtins()], &name).ok_or_else(|| undefined(name))?;
    frame.push(value);
    Ok(())
}

pub(super) fn store_global(frame: &mut Frame) -> RunResult<()> {
    let name = name_operand(frame, Opcode::StoreGlobal)?;
    let value = frame.pop()?;
    frame.globals().borrow_mut().insert(name, value);
    Ok(())
}

pub(super) fn delete_global(frame: &mut Frame) -> RunResult<()> {
    let name = name_operand(frame, Opcode::DeleteGlobal)?;
    let removed = frame.globals().borrow_mut().remove(&name);
    removed.map(drop).ok_or_else(|| undefined(name))
}

/// Locals only; an unbound parameter is an `UndefinedName`.
pub(super) fn load_fast(frame: &mut Frame) -> RunResult<()> {
    let name = varname_operand(frame, Opcode::LoadFast)?;
    let value = frame.locals().borrow().get(&name).cloned();
    frame.push(value.ok_or_else(|| undefined(name))?);
    Ok(())
}

pub(super) fn store_fast(frame: &mut Frame) -> RunResult<()> {
    let name = varname_operand(frame, Opcode::StoreFast)?;
    let value = frame.pop()?;
    frame.locals().borrow_mut().insert(name, value);
    Ok(())
}

pub(super) fn delete_fast(frame: &mut Frame) -> RunResult<()> {
    let name = varname_operand(frame, Opcode::DeleteFast)?;
    let removed = frame.locals().borrow_mut().remove(&name);
    removed.map(drop).ok_or_else(|| undefined(name))
}
