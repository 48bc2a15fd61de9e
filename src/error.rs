//! Error types for target construction and dependency execution.

use std::sync::Arc;

use thiserror::Error;

/// Result type returned by task functions.
///
/// Task bodies report failure through `anyhow`, so any error type can be
/// propagated with the `?` operator.
pub type TaskResult = Result<(), anyhow::Error>;

/// Errors raised by the dependency execution engine.
///
/// The enum is `Clone` because execution outcomes are memoized and shared
/// between every caller of the same target id; the underlying task error is
/// kept behind an `Arc` for that reason.
#[derive(Debug, Clone, Error)]
pub enum TaskError {
    /// The value passed as a target could not be turned into one.
    ///
    /// Raised at construction time, before anything runs. The typed builder
    /// rules out wrong argument counts and unsupported argument types at
    /// compile time; what remains is a callable without a stable structural
    /// identity, such as a closure.
    #[error("invalid target: {reason}")]
    Construction {
        /// Why the value was rejected.
        reason: String,
    },

    /// A target's id reappeared in its own active dependency chain.
    ///
    /// Raised before any execution unit for the offending batch is spawned.
    #[error("dependency cycle calling {target}! chain: {}", .chain.join(","))]
    Cycle {
        /// Name of the target that closed the cycle.
        target: String,
        /// Names on the chain from the root call down to the repeat.
        chain: Vec<String>,
    },

    /// The underlying task function failed.
    ///
    /// Captured once per target id by the run-once registry and returned
    /// identically to every caller of that id thereafter.
    #[error("task failed: {0}")]
    Execution(Arc<anyhow::Error>),

    /// One or more targets of a `deps` batch failed.
    ///
    /// Succeeding siblings ran to completion; their work is not rolled back.
    #[error("{}/{total} dependencies failed: {}", .failed.len(), .failed.join(", "))]
    Aggregate {
        /// Names of the targets that ended in an execution error.
        failed: Vec<String>,
        /// Size of the whole batch.
        total: usize,
    },
}

impl From<anyhow::Error> for TaskError {
    fn from(err: anyhow::Error) -> Self {
        TaskError::Execution(Arc::new(err))
    }
}

impl TaskError {
    /// Returns a reference to the inner task error if this is an
    /// `Execution` variant.
    pub fn execution_error(&self) -> Option<&Arc<anyhow::Error>> {
        match self {
            TaskError::Execution(e) => Some(e),
            _ => None,
        }
    }
}
