#![doc = include_str!("../../../README.md")]

mod args;
mod builtins;
mod bytecode;
pub mod capability;
mod exception;
mod function;
mod io;
mod namespace;
mod resource;
mod run;
pub mod tracer;
pub mod types;
mod value;

pub use crate::{
    builtins::{Builtins, default_builtins},
    bytecode::{Block, CodeBuilder, CodeObject, Flow, Frame, HAVE_ARGUMENT, JumpLabel, Opcode, VM},
    capability::{BinaryOp, Capability, CompareOp, Dispatch, PyObject, Side, UnaryOp},
    exception::{RunError, RunResult},
    function::FunctionObject,
    io::{CollectStringPrint, NoPrint, PrintWriter, StdPrint},
    namespace::{Namespace, Scope},
    resource::{
        DEFAULT_MAX_RECURSION_DEPTH, LimitedTracker, MAX_DATA_RECURSION_DEPTH, MAX_RESULT_BYTES, NoLimitTracker,
        ResourceError, ResourceLimits, ResourceTracker,
    },
    run::Runner,
    tracer::{NoopTracer, ProfilingReport, ProfilingTracer, RecordingTracer, StderrTracer, TraceEvent, VmTracer},
    value::Value,
};
