//! VM execution tracing infrastructure.
//!
//! The VM is parameterized as `VM<'a, T: ResourceTracker, P: PrintWriter, Tr: VmTracer>`,
//! so a [`NoopTracer`] compiles every hook away, the same way
//! [`NoLimitTracker`](crate::resource::NoLimitTracker) removes limit checks.
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | Zero-cost no-op (default) |
//! | [`StderrTracer`] | Human-readable execution log to stderr |
//! | [`ProfilingTracer`] | Opcode frequency counters and call depth tracking |
//! | [`RecordingTracer`] | Full event recording for post-mortem analysis |
//!
//! ```ignore
//! let mut vm = VM::new(NoLimitTracker, &mut print, ProfilingTracer::new());
//! let mut frame = vm.create_frame(code, locals, globals, builtins);
//! vm.exec(&mut frame)?;
//! println!("{}", vm.tracer().report());
//! ```

use std::collections::HashMap;

use crate::bytecode::Opcode;

/// Trace event captured by [`RecordingTracer`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TraceEvent {
    /// An opcode was dispatched at the given offset.
    Instruction {
        /// Byte offset of the opcode in its code object.
        ip: usize,
        opcode: Opcode,
        /// Operand stack depth at the time of dispatch.
        stack_depth: usize,
    },
    /// A function call created a child frame.
    Call {
        func_name: Option<String>,
        /// Number of live frames including the new one.
        depth: usize,
    },
    /// A child frame returned to its caller.
    Return {
        /// Number of live frames after the return.
        depth: usize,
    },
    /// `SETUP_LOOP` pushed a block.
    BlockPush {
        /// Block stack depth after the push.
        depth: usize,
    },
    /// `POP_BLOCK` or `BREAK_LOOP` popped a block.
    BlockPop {
        /// Block stack depth after the pop.
        depth: usize,
    },
    /// `MAKE_FUNCTION` created a function object.
    MakeFunction {
        func_name: String,
        defaults_count: usize,
    },
}

/// Trait for VM execution tracing.
///
/// All methods have default no-op implementations; implementations override
/// only the hooks they care about.
pub trait VmTracer: std::fmt::Debug {
    /// Called before each opcode dispatch. This is the hottest hook.
    ///
    /// # Arguments
    /// * `ip` - Byte offset of the opcode in the code object's bytecode
    /// * `opcode` - The opcode about to be executed
    /// * `stack_depth` - Number of values on the operand stack
    /// * `frame_depth` - Number of live frames
    #[inline(always)]
    fn on_instruction(&mut self, _ip: usize, _opcode: Opcode, _stack_depth: usize, _frame_depth: usize) {}

    /// Called when `CALL_FUNCTION` creates a child frame.
    ///
    /// `depth` is the number of live frames including the new one.
    #[inline(always)]
    fn on_call(&mut self, _func_name: Option<&str>, _depth: usize) {}

    /// Called when a child frame has returned; `depth` counts the frames still live.
    #[inline(always)]
    fn on_return(&mut self, _depth: usize) {}

    #[inline(always)]
    fn on_block_push(&mut self, _depth: usize) {}

    #[inline(always)]
    fn on_block_pop(&mut self, _depth: usize) {}

    #[inline(always)]
    fn on_make_function(&mut self, _func_name: &str, _defaults_count: usize) {}
}

// ============================================================================
// NoopTracer
// ============================================================================

/// A tracer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl VmTracer for NoopTracer {}

// ============================================================================
// StderrTracer
// ============================================================================

/// Tracer that prints a human-readable execution log to stderr.
///
/// ```text
/// [    0] LOAD_CONST            stack=0  frames=1
/// [    3] CALL_FUNCTION         stack=2  frames=1
///   >>> CALL f                    depth=2
/// [    0] LOAD_FAST             stack=0  frames=2
///   <<< RETURN                    depth=1
/// ```
#[derive(Debug, Default)]
pub struct StderrTracer {
    /// Maximum number of instructions to trace. None = unlimited.
    limit: Option<usize>,
    count: usize,
    stopped: bool,
}

impl StderrTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracer that goes quiet after `limit` instructions.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }
}

impl VmTracer for StderrTracer {
    #[inline]
    fn on_instruction(&mut self, ip: usize, opcode: Opcode, stack_depth: usize, frame_depth: usize) {
        if self.stopped {
            return;
        }
        let name: &'static str = opcode.into();
        eprintln!("[{ip:>5}] {name:<20}  stack={stack_depth}  frames={frame_depth}");
        self.count += 1;
        if let Some(limit) = self.limit
            && self.count >= limit
        {
            eprintln!("--- trace limit reached ({limit} instructions) ---");
            self.stopped = true;
        }
    }

    fn on_call(&mut self, func_name: Option<&str>, depth: usize) {
        if self.stopped {
            return;
        }
        let name = func_name.unwrap_or("<anonymous>");
        eprintln!("  >>> CALL {name:<20} depth={depth}");
    }

    fn on_return(&mut self, depth: usize) {
        if self.stopped {
            return;
        }
        eprintln!("  <<< RETURN                    depth={depth}");
    }

    fn on_block_push(&mut self, depth: usize) {
        if self.stopped {
            return;
        }
        eprintln!("  ... SETUP BLOCK  blocks={depth}");
    }

    fn on_block_pop(&mut self, depth: usize) {
        if self.stopped {
            return;
        }
        eprintln!("  ... POP BLOCK    blocks={depth}");
    }

    fn on_make_function(&mut self, func_name: &str, defaults_count: usize) {
        if self.stopped {
            return;
        }
        eprintln!("  +++ MAKE FUNCTION {func_name} defaults={defaults_count}");
    }
}

// ============================================================================
// ProfilingTracer
// ============================================================================

/// Tracer that collects execution statistics.
///
/// Retrieve results via [`ProfilingTracer::report`] after execution.
#[derive(Debug, Default)]
pub struct ProfilingTracer {
    opcode_counts: HashMap<Opcode, u64>,
    total_instructions: u64,
    max_depth: usize,
    total_calls: u64,
    max_block_depth: usize,
}

/// Summary report from a profiling trace.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProfilingReport {
    /// Per-opcode execution counts, most executed first.
    pub opcode_counts: Vec<(Opcode, u64)>,
    pub total_instructions: u64,
    /// Deepest frame count observed.
    pub max_depth: usize,
    pub total_calls: u64,
    /// Deepest block stack observed in any frame.
    pub max_block_depth: usize,
}

impl ProfilingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a report from the collected counters.
    ///
    /// Ties in opcode frequency are broken by opcode number so reports are
    /// deterministic.
    #[must_use]
    pub fn report(&self) -> ProfilingReport {
        let mut opcode_counts: Vec<_> = self.opcode_counts.iter().map(|(&k, &v)| (k, v)).collect();
        opcode_counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ProfilingReport {
            opcode_counts,
            total_instructions: self.total_instructions,
            max_depth: self.max_depth,
            total_calls: self.total_calls,
            max_block_depth: self.max_block_depth,
        }
    }
}

impl VmTracer for ProfilingTracer {
    #[inline]
    fn on_instruction(&mut self, _ip: usize, opcode: Opcode, _stack_depth: usize, frame_depth: usize) {
        *self.opcode_counts.entry(opcode).or_insert(0) += 1;
        self.total_instructions += 1;
        self.max_depth = self.max_depth.max(frame_depth);
    }

    #[inline]
    fn on_call(&mut self, _func_name: Option<&str>, depth: usize) {
        self.total_calls += 1;
        self.max_depth = self.max_depth.max(depth);
    }

    fn on_block_push(&mut self, depth: usize) {
        self.max_block_depth = self.max_block_depth.max(depth);
    }
}

impl ProfilingReport {
    /// Serializes the report as JSON for external tooling.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl std::fmt::Display for ProfilingReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== VM Profiling Report ===")?;
        writeln!(f, "Total instructions: {}", self.total_instructions)?;
        writeln!(f, "Total calls:        {}", self.total_calls)?;
        writeln!(f, "Max call depth:     {}", self.max_depth)?;
        writeln!(f, "Max block depth:    {}", self.max_block_depth)?;
        writeln!(f)?;
        writeln!(f, "--- Opcode Frequency ---")?;
        for (opcode, count) in &self.opcode_counts {
            let pct = (*count as f64 / self.total_instructions as f64) * 100.0;
            let name: &'static str = (*opcode).into();
            writeln!(f, "  {name:<20} {count:>10}  ({pct:>5.1}%)")?;
        }
        Ok(())
    }
}

// ============================================================================
// RecordingTracer
// ============================================================================

/// Tracer that records every event in order.
///
/// The most expensive tracer (allocates per event); use it for short runs or
/// when two executions need to be compared event by event.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: Vec<TraceEvent>,
    limit: Option<usize>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recording tracer that stops recording after `limit` events.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            events: Vec::with_capacity(limit.min(1024)),
            limit: Some(limit),
        }
    }

    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    #[must_use]
    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }

    fn record(&mut self, event: TraceEvent) {
        if self.limit.is_some_and(|l| self.events.len() >= l) {
            return;
        }
        self.events.push(event);
    }
}

impl VmTracer for RecordingTracer {
    #[inline]
    fn on_instruction(&mut self, ip: usize, opcode: Opcode, stack_depth: usize, _frame_depth: usize) {
        self.record(TraceEvent::Instruction {
            ip,
            opcode,
            stack_depth,
        });
    }

    fn on_call(&mut self, func_name: Option<&str>, depth: usize) {
        self.record(TraceEvent::Call {
            func_name: func_name.map(String::from),
            depth,
        });
    }

    fn on_return(&mut self, depth: usize) {
        self.record(TraceEvent::Return { depth });
    }

    fn on_block_push(&mut self, depth: usize) {
        self.record(TraceEvent::BlockPush { depth });
    }

    fn on_block_pop(&mut self, depth: usize) {
        self.record(TraceEvent::BlockPop { depth });
    }

    fn on_make_function(&mut self, func_name: &str, defaults_count: usize) {
        self.record(TraceEvent::MakeFunction {
            func_name: func_name.to_owned(),
            defaults_count,
        });
    }
}
