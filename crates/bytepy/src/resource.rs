use std::{
    fmt,
    time::{Duration, Instant},
};

/// Error returned when a resource limit is exceeded during execution.
///
/// This allows hosts to bound untrusted bytecode by instruction count,
/// wall-clock time and call depth.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ResourceError {
    /// Maximum instruction operations exceeded.
    Operation { limit: usize, count: usize },
    /// Maximum execution time exceeded.
    Time { limit: Duration, elapsed: Duration },
    /// A single result would be larger than [`MAX_RESULT_BYTES`].
    Memory { limit: usize, used: usize },
    /// Maximum recursion depth exceeded.
    Recursion { limit: usize, depth: usize },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operation { limit, count } => {
                write!(f, "operation limit exceeded: {count} > {limit}")
            }
            Self::Time { limit, elapsed } => {
                write!(f, "time limit exceeded: {elapsed:?} > {limit:?}")
            }
            Self::Memory { limit, used } => {
                write!(f, "memory limit exceeded: {used} bytes > {limit} bytes")
            }
            Self::Recursion { limit, depth } => {
                write!(f, "maximum recursion depth exceeded: {depth} > {limit}")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

/// Trait for tracking resource usage while the VM runs.
///
/// The VM calls [`check_time`](Self::check_time) before every instruction and
/// [`check_recursion_depth`](Self::check_recursion_depth) before every child
/// frame, so implementations should keep both cheap.
pub trait ResourceTracker: fmt::Debug {
    /// Called before each instruction is dispatched.
    ///
    /// Returns `Ok(())` if within configured execution limits, or a
    /// `ResourceError` if a limit is exceeded (for example `Time` or `Operation`).
    fn check_time(&mut self) -> Result<(), ResourceError>;

    /// Called before a child frame is created to check recursion depth.
    ///
    /// # Arguments
    /// * `current_depth` - Number of frames already live (before the new frame is pushed)
    fn check_recursion_depth(&self, current_depth: usize) -> Result<(), ResourceError>;

    /// Returns the number of instructions counted so far, if this tracker records them.
    fn operation_count(&self) -> Option<usize> {
        None
    }
}

/// Configuration for resource limits.
///
/// All limits are optional - set to `None` to disable a specific limit.
/// Use `ResourceLimits::default()` for no limits, or build custom limits
/// with the builder pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResourceLimits {
    /// Maximum number of VM operations (instructions) per execution.
    pub max_operations: Option<usize>,
    /// Maximum execution time.
    pub max_duration: Option<Duration>,
    /// Maximum recursion depth (number of live frames).
    pub max_recursion_depth: Option<usize>,
}

/// Recommended maximum recursion depth if not otherwise specified.
///
/// Calls recurse on the host stack, and debug builds spend far more stack per
/// frame, so the debug default is lower.
#[cfg(debug_assertions)]
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 200;

/// Recommended maximum recursion depth if not otherwise specified.
#[cfg(not(debug_assertions))]
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 1000;

/// Largest result, in bytes, that one sequence repetition or integer power may build.
///
/// Sizes are estimated before anything is allocated.
pub const MAX_RESULT_BYTES: usize = 64 * 1024 * 1024;

/// Rejects a result whose estimated size exceeds [`MAX_RESULT_BYTES`].
pub(crate) fn check_result_size(estimated_bytes: usize) -> Result<(), ResourceError> {
    if estimated_bytes > MAX_RESULT_BYTES {
        Err(ResourceError::Memory {
            limit: MAX_RESULT_BYTES,
            used: estimated_bytes,
        })
    } else {
        Ok(())
    }
}

/// Maximum nesting depth for data structure traversals (repr, equality).
///
/// Separate from the function call stack limit. This protects against stack overflow
/// when walking self-referential or deeply nested lists and dicts.
///
/// Lower in debug mode to avoid stack overflow (debug builds use more stack space
/// per call frame).
#[cfg(debug_assertions)]
pub const MAX_DATA_RECURSION_DEPTH: u16 = 100;

/// Maximum nesting depth for data structure traversals (repr, equality).
#[cfg(not(debug_assertions))]
pub const MAX_DATA_RECURSION_DEPTH: u16 = 500;

impl ResourceLimits {
    /// Creates a new ResourceLimits with all limits disabled, except max recursion which is set to
    /// [`DEFAULT_MAX_RECURSION_DEPTH`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_recursion_depth: Some(DEFAULT_MAX_RECURSION_DEPTH),
            ..Default::default()
        }
    }

    /// Sets the maximum number of VM operations (instructions).
    #[must_use]
    pub fn max_operations(mut self, limit: usize) -> Self {
        self.max_operations = Some(limit);
        self
    }

    /// Sets the maximum execution duration.
    #[must_use]
    pub fn max_duration(mut self, limit: Duration) -> Self {
        self.max_duration = Some(limit);
        self
    }

    /// Sets the maximum recursion depth (function call stack depth).
    #[must_use]
    pub fn max_recursion_depth(mut self, limit: Option<usize>) -> Self {
        self.max_recursion_depth = limit;
        self
    }
}

/// A tracker that imposes no limits except the default recursion depth.
///
/// Calls recurse on the host stack, so even an "unlimited" run keeps the
/// depth of [`DEFAULT_MAX_RECURSION_DEPTH`].
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct NoLimitTracker;

impl ResourceTracker for NoLimitTracker {
    #[inline]
    fn check_time(&mut self) -> Result<(), ResourceError> {
        Ok(())
    }

    #[inline]
    fn check_recursion_depth(&self, current_depth: usize) -> Result<(), ResourceError> {
        if current_depth >= DEFAULT_MAX_RECURSION_DEPTH {
            Err(ResourceError::Recursion {
                limit: DEFAULT_MAX_RECURSION_DEPTH,
                depth: current_depth + 1,
            })
        } else {
            Ok(())
        }
    }
}

/// A resource tracker that enforces configurable limits.
///
/// When serialized/deserialized, the `start_time` is reset to `Instant::now()`.
/// This means time limits restart from zero after deserialization.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct LimitedTracker {
    limits: ResourceLimits,
    /// When execution started (for time limit checking).
    #[serde(skip, default = "Instant::now")]
    start_time: Instant,
    /// Number of VM operations executed.
    #[serde(default)]
    operation_count: usize,
}

impl LimitedTracker {
    /// Creates a new LimitedTracker with the given limits.
    ///
    /// The start time is recorded when the tracker is created, so create
    /// it immediately before starting execution.
    #[must_use]
    pub fn new(limits: ResourceLimits) -> Self {
        Self {
            limits,
            start_time: Instant::now(),
            operation_count: 0,
        }
    }

    /// Returns the configured limits.
    #[must_use]
    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// Returns the elapsed time since tracker creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl ResourceTracker for LimitedTracker {
    fn check_time(&mut self) -> Result<(), ResourceError> {
        if let Some(max) = self.limits.max_operations {
            self.operation_count += 1;
            if self.operation_count > max {
                return Err(ResourceError::Operation {
                    limit: max,
                    count: self.operation_count,
                });
            }
        }

        if let Some(max) = self.limits.max_duration {
            let elapsed = self.start_time.elapsed();
            if elapsed > max {
                return Err(ResourceError::Time { limit: max, elapsed });
            }
        }
        Ok(())
    }

    fn check_recursion_depth(&self, current_depth: usize) -> Result<(), ResourceError> {
        if let Some(max) = self.limits.max_recursion_depth
            && current_depth >= max
        {
            return Err(ResourceError::Recursion {
                limit: max,
                depth: current_depth + 1,
            });
        }
        Ok(())
    }

    fn operation_count(&self) -> Option<usize> {
        Some(self.operation_count)
    }
}
