//! Public interface for running code objects.

use std::rc::Rc;

use crate::{
    builtins::default_builtins,
    bytecode::{CodeObject, VM},
    exception::RunResult,
    io::{PrintWriter, StdPrint},
    namespace::{Namespace, Scope},
    resource::{NoLimitTracker, ResourceTracker},
    tracer::{NoopTracer, VmTracer},
    value::Value,
};

/// Primary interface for running bytepy code.
///
/// A `Runner` owns a code object and the builtins scope it resolves against.
/// Each run starts from a fresh module scope (locals and globals are the same
/// namespace at module level), so a runner can be executed any number of times.
///
/// # Example
/// ```
/// use bytepy::{CodeBuilder, Opcode, Runner, Value};
///
/// let mut builder = CodeBuilder::new("<module>");
/// builder.load_const(Value::Int(3));
/// builder.load_const(Value::Int(4));
/// builder.emit(Opcode::BinaryAdd);
/// builder.emit(Opcode::ReturnValue);
///
/// let runner = Runner::new(builder.build());
/// assert_eq!(runner.run_no_limits().unwrap(), Value::Int(7));
/// ```
#[derive(Debug, Clone)]
pub struct Runner {
    code: Rc<CodeObject>,
    builtins: Scope,
}

impl Runner {
    /// Creates a runner for `code` with the default builtins.
    #[must_use]
    pub fn new(code: CodeObject) -> Self {
        Self {
            code: Rc::new(code),
            builtins: default_builtins(),
        }
    }

    /// Replaces the builtins scope, e.g. to add host functions or remove defaults.
    #[must_use]
    pub fn with_builtins(mut self, builtins: Scope) -> Self {
        self.builtins = builtins;
        self
    }

    /// Returns the code object this runner executes.
    #[must_use]
    pub fn code(&self) -> &Rc<CodeObject> {
        &self.code
    }

    /// Returns the builtins scope shared by every run.
    #[must_use]
    pub fn builtins(&self) -> &Scope {
        &self.builtins
    }

    /// Executes the code to completion and returns the value of its final
    /// `RETURN_VALUE`.
    ///
    /// # Arguments
    /// * `resource_tracker` - Custom resource tracker implementation
    /// * `print` - Output sink for `PRINT_ITEM`/`PRINT_NEWLINE`
    pub fn run(&self, resource_tracker: impl ResourceTracker, print: &mut impl PrintWriter) -> RunResult<Value> {
        let (result, NoopTracer) = self.run_traced(resource_tracker, print, NoopTracer);
        result
    }

    /// Like [`run`](Self::run), but drives a tracer and hands it back together
    /// with the result so reports survive failed runs.
    pub fn run_traced<Tr: VmTracer>(
        &self,
        resource_tracker: impl ResourceTracker,
        print: &mut impl PrintWriter,
        tracer: Tr,
    ) -> (RunResult<Value>, Tr) {
        let module = Namespace::new().into_scope();
        let mut vm = VM::new(resource_tracker, print, tracer);
        let mut frame = vm.create_frame(Rc::clone(&self.code), Rc::clone(&module), module, Rc::clone(&self.builtins));
        let result = vm.exec(&mut frame);
        (result, vm.into_tracer())
    }

    /// Executes the code with no resource limits, printing to stdout.
    pub fn run_no_limits(&self) -> RunResult<Value> {
        let mut print = StdPrint::new();
        let result = self.run(NoLimitTracker, &mut print);
        print.flush()?;
        result
    }
}
