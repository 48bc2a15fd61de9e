//! Concurrent dependency execution with memoization and cycle detection.
//!
//! [`deps`] is the fan-out primitive: one scoped thread per requested target,
//! joined before the call returns. There is no persistent pool or work queue;
//! the depth of nested `deps` calls bounds total concurrency, not an external
//! configuration knob. [`serial_deps`] drives the same machinery one target
//! at a time, in caller-given order.

use std::thread;

use tracing::error;

use crate::context::TaskContext;
use crate::error::TaskError;
use crate::registry::Outcome;
use crate::target::{IntoTarget, IsFn, IsTarget, Target, TaskFn};

/// Environment variable forcing strictly serial, non-concurrent execution
/// inside [`deps`], for debugging. Case-insensitive `true`, `1`, `yes` and
/// `on` enable it; anything else (or unset) leaves fan-out on.
pub const SERIAL_DEPS_ENV: &str = "TASK_FLOW_SERIAL_DEPS";

/// A batch of dependencies accepted by [`deps`] and [`serial_deps`].
///
/// Implemented for tuples of mixed [`IntoTarget`] values (bare task fns and
/// built [`Target`]s) up to arity 8, for single values, and for slices,
/// arrays and vectors of targets. Normalization happens once, at the top of
/// the call, before anything is scheduled.
pub trait DepList<Marker> {
    /// Normalize the batch into targets.
    fn into_targets(self) -> Result<Vec<Target>, TaskError>;
}

impl DepList<IsTarget> for Target {
    fn into_targets(self) -> Result<Vec<Target>, TaskError> {
        Ok(vec![self])
    }
}

impl DepList<IsTarget> for &Target {
    fn into_targets(self) -> Result<Vec<Target>, TaskError> {
        Ok(vec![self.clone()])
    }
}

impl DepList<IsTarget> for Vec<Target> {
    fn into_targets(self) -> Result<Vec<Target>, TaskError> {
        Ok(self)
    }
}

impl<const N: usize> DepList<IsTarget> for [Target; N] {
    fn into_targets(self) -> Result<Vec<Target>, TaskError> {
        Ok(self.into())
    }
}

impl DepList<IsTarget> for &[Target] {
    fn into_targets(self) -> Result<Vec<Target>, TaskError> {
        Ok(self.to_vec())
    }
}

impl<F> DepList<IsFn> for F
where
    F: TaskFn<()>,
{
    fn into_targets(self) -> Result<Vec<Target>, TaskError> {
        Ok(vec![Target::new(self)?])
    }
}

macro_rules! impl_dep_list_tuple {
    ($(($ty:ident, $marker:ident)),+) => {
        impl<$($ty, $marker),+> DepList<($($marker,)+)> for ($($ty,)+)
        where
            $($ty: IntoTarget<$marker>),+
        {
            fn into_targets(self) -> Result<Vec<Target>, TaskError> {
                #[allow(non_snake_case)]
                let ($($ty,)+) = self;
                Ok(vec![$($ty.into_target()?),+])
            }
        }
    };
}

impl_dep_list_tuple!((T1, M1));
impl_dep_list_tuple!((T1, M1), (T2, M2));
impl_dep_list_tuple!((T1, M1), (T2, M2), (T3, M3));
impl_dep_list_tuple!((T1, M1), (T2, M2), (T3, M3), (T4, M4));
impl_dep_list_tuple!((T1, M1), (T2, M2), (T3, M3), (T4, M4), (T5, M5));
impl_dep_list_tuple!((T1, M1), (T2, M2), (T3, M3), (T4, M4), (T5, M5), (T6, M6));
impl_dep_list_tuple!(
    (T1, M1),
    (T2, M2),
    (T3, M3),
    (T4, M4),
    (T5, M5),
    (T6, M6),
    (T7, M7)
);
impl_dep_list_tuple!(
    (T1, M1),
    (T2, M2),
    (T3, M3),
    (T4, M4),
    (T5, M5),
    (T6, M6),
    (T7, M7),
    (T8, M8)
);

/// Run every entry of `list` as a dependency of the calling task.
///
/// Targets run concurrently, one scoped thread each, after the whole batch
/// has passed normalization and cycle checks; the call blocks until every
/// unit has settled. Each target id's body executes at most once per
/// runtime, and every caller of an id observes the identical outcome.
///
/// Fail-slow: a failing sibling never cancels the others. After the join,
/// every failure is logged through its target span and the call returns
/// [`TaskError::Aggregate`] naming each failed target.
///
/// # Example
///
/// ```ignore
/// fn build(ctx: &TaskContext) -> TaskResult {
///     deps(ctx, (generate, lint))?;
///     cmd::run(ctx, "cargo", &["build"])
/// }
/// ```
pub fn deps<M, L>(ctx: &TaskContext, list: L) -> Result<(), TaskError>
where
    L: DepList<M>,
{
    run_batch(ctx, list.into_targets()?)
}

/// Sequential variant of [`deps`].
///
/// Equivalent to one `deps` call per target, strictly in the given order:
/// each target, including any nested fan-out it triggers, fully completes
/// before the next one starts. Cycle detection and memoization apply
/// unchanged; an error stops the remaining targets from starting.
pub fn serial_deps<M, L>(ctx: &TaskContext, list: L) -> Result<(), TaskError>
where
    L: DepList<M>,
{
    for target in list.into_targets()? {
        run_batch(ctx, vec![target])?;
    }
    Ok(())
}

fn run_batch(ctx: &TaskContext, targets: Vec<Target>) -> Result<(), TaskError> {
    // The whole batch is cycle-checked against the calling chain before any
    // thread is spawned, so one bad dependency cannot start partial work.
    // Duplicates within the batch are not cycles; they collapse in the
    // registry.
    for target in &targets {
        if ctx.chain().contains(target.id()) {
            return Err(TaskError::Cycle {
                target: target.name().to_string(),
                chain: ctx.chain().names(),
            });
        }
    }

    let outcomes: Vec<Outcome> = if serial_override() {
        targets.iter().map(|target| run_target(ctx, target)).collect()
    } else {
        thread::scope(|scope| {
            let handles: Vec<_> = targets
                .iter()
                .map(|target| scope.spawn(move || run_target(ctx, target)))
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(outcome) => outcome,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    };

    let total = targets.len();
    let mut failed = Vec::new();
    for (target, outcome) in targets.iter().zip(&outcomes) {
        if let Err(err) = outcome {
            error!(task = %target.label(), "{err}");
            failed.push(target.name().to_string());
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(TaskError::Aggregate { failed, total })
    }
}

/// One concurrent execution unit: a private context copy with the extended
/// chain and derived span, funneled through the run-once registry.
fn run_target(ctx: &TaskContext, target: &Target) -> Outcome {
    let child = ctx.for_target(target);
    child.registry().run_once(target.id(), || {
        let _guard = child.span().enter();
        target.run(&child).map_err(TaskError::from)
    })
}

/// Read the serial override; consulted once per `deps` call.
fn serial_override() -> bool {
    std::env::var(SERIAL_DEPS_ENV)
        .map(|value| is_enabled(&value))
        .unwrap_or(false)
}

fn is_enabled(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}
