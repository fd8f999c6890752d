//! Bytecode representation and the opcode execution core.
//!
//! # Module Structure
//!
//! - `op` - Opcode enum and immediate encoding
//! - `code` - Immutable code objects
//! - `builder` - `CodeBuilder` for assembling code objects by hand
//! - `vm` - Frames, the dispatch table and the opcode handlers

pub use builder::{CodeBuilder, JumpLabel};
pub use code::CodeObject;
pub use op::{HAVE_ARGUMENT, Opcode};
pub use vm::{Block, Flow, Frame, VM};
pub(crate) use vm::{resolve_binary, resolve_compare};

mod builder;
mod code;
mod op;
mod vm;
