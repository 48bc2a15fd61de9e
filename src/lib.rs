//! Task-Flow: a dependency execution engine for build tasks.
//!
//! User code defines tasks as plain functions; a task declares what it needs
//! by calling [`deps`] with the functions (or argument-carrying [`Target`]s)
//! it depends on. The engine fans the batch out to concurrent execution
//! units, runs each target id's body at most once per [`TaskRuntime`], and
//! detects dependency cycles before scheduling anything.
//!
//! # Key Features
//!
//! - **Run-once memoization**: each target id executes at most once per
//!   runtime; every caller shares the recorded outcome, errors included.
//! - **Structural identity**: a target is identified by its function path
//!   plus serialized arguments, so the same function with different arguments
//!   forms distinct dependencies.
//! - **Cycle detection**: an immutable per-branch dependency chain catches
//!   cycles before any unit of the offending batch is spawned.
//! - **Fork-join fan-out**: one scoped thread per requested target, joined
//!   before `deps` returns; no persistent pool, no work queue.
//! - **Fail-slow aggregation**: a failing sibling never cancels the others;
//!   the batch settles and fails with one aggregate naming every failure.
//!
//! # Example
//!
//! ```ignore
//! use task_flow::{cmd, deps, TaskContext, TaskResult, TaskRuntime};
//!
//! fn generate(ctx: &TaskContext) -> TaskResult {
//!     cmd::run(ctx, "protoc", &["--rust_out=src", "api.proto"])
//! }
//!
//! fn lint(ctx: &TaskContext) -> TaskResult {
//!     cmd::run(ctx, "cargo", &["clippy"])
//! }
//!
//! fn build(ctx: &TaskContext) -> TaskResult {
//!     deps(ctx, (generate, lint))?;
//!     cmd::run(ctx, "cargo", &["build"])
//! }
//!
//! let runtime = TaskRuntime::new();
//! runtime.run(build)?;
//! ```
//!
//! Setting the [`SERIAL_DEPS_ENV`] environment variable to `true`/`1`/`yes`/
//! `on` forces every `deps` batch to run one target at a time on the calling
//! thread, which makes interleaved failures easier to read while debugging.

mod chain;
pub mod cmd;
mod context;
mod deps;
mod error;
mod registry;
mod target;

pub use chain::DependencyChain;
pub use context::{TaskContext, TaskRuntime};
pub use deps::{deps, serial_deps, DepList, SERIAL_DEPS_ENV};
pub use error::{TaskError, TaskResult};
pub use target::{
    ArgValue, IntoTarget, IsFn, IsTarget, Target, TargetId, TaskArg, TaskArgs, TaskFn,
};
