//! Execution context and the runtime owning the run-once registry.

use std::sync::Arc;

use crate::chain::DependencyChain;
use crate::deps::{deps, DepList};
use crate::error::TaskError;
use crate::registry::OnceRegistry;
use crate::target::Target;

/// Service object with process-run lifetime, owning the run-once registry.
///
/// Every test or embedding creates its own runtime and gets a fresh,
/// isolated registry; nothing lives in global state. The registry is
/// discarded with the runtime, there is no persistence.
///
/// # Example
///
/// ```ignore
/// let runtime = TaskRuntime::new();
/// runtime.run(build)?;
/// ```
#[derive(Default)]
pub struct TaskRuntime {
    registry: Arc<OnceRegistry>,
}

impl TaskRuntime {
    /// Create a runtime with an empty registry.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(OnceRegistry::new()),
        }
    }

    /// A root context with an empty dependency chain.
    pub fn context(&self) -> TaskContext {
        TaskContext {
            registry: Arc::clone(&self.registry),
            chain: DependencyChain::new(),
            span: tracing::Span::current(),
            env: Vec::new(),
        }
    }

    /// Run `list` as a fresh top-level `deps` call.
    pub fn run<M, L>(&self, list: L) -> Result<(), TaskError>
    where
        L: DepList<M>,
    {
        deps(&self.context(), list)
    }
}

/// Context handed to every task function.
///
/// Carries the registry handle, this branch's dependency chain, the logger
/// span scoped to the executing target, and extra environment for spawned
/// commands. Contexts are values: each spawned unit receives its own private
/// copy, so nothing here needs locking.
#[derive(Clone)]
pub struct TaskContext {
    registry: Arc<OnceRegistry>,
    chain: DependencyChain,
    span: tracing::Span,
    env: Vec<(String, String)>,
}

impl TaskContext {
    pub(crate) fn registry(&self) -> &OnceRegistry {
        &self.registry
    }

    pub(crate) fn chain(&self) -> &DependencyChain {
        &self.chain
    }

    /// Logger span scoped to the currently executing target.
    ///
    /// Entered for the duration of the target body; task code can also enter
    /// it explicitly when logging from spawned helpers.
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    /// Extra environment variables applied to commands built through
    /// [`cmd`](crate::cmd).
    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    /// A copy of this context with extra `KEY=VALUE` pairs appended for
    /// spawned commands. Entries without `=` are ignored.
    pub fn with_env<I, S>(&self, vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ctx = self.clone();
        for var in vars {
            if let Some((key, value)) = var.as_ref().split_once('=') {
                ctx.env.push((key.to_string(), value.to_string()));
            }
        }
        ctx
    }

    /// Private copy for one spawned unit: extended chain plus derived span.
    pub(crate) fn for_target(&self, target: &Target) -> Self {
        let mut ctx = self.clone();
        ctx.chain = self.chain.extended(target);
        ctx.span = tracing::info_span!("task", task = %target.label());
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskResult;

    fn noop(_ctx: &TaskContext) -> TaskResult {
        Ok(())
    }

    #[test]
    fn root_context_has_empty_chain() {
        let runtime = TaskRuntime::new();
        assert!(runtime.context().chain().is_empty());
    }

    #[test]
    fn for_target_extends_chain_per_branch() {
        let runtime = TaskRuntime::new();
        let root = runtime.context();
        let target = Target::new(noop).unwrap();

        let child = root.for_target(&target);
        assert!(child.chain().contains(target.id()));
        assert!(root.chain().is_empty());
    }

    #[test]
    fn with_env_appends_pairs_without_touching_original() {
        let runtime = TaskRuntime::new();
        let root = runtime.context();

        let ctx = root.with_env(["FOO=bar", "malformed", "BAZ=qux=1"]);
        assert_eq!(
            ctx.env(),
            &[
                ("FOO".to_string(), "bar".to_string()),
                ("BAZ".to_string(), "qux=1".to_string()),
            ]
        );
        assert!(root.env().is_empty());
    }
}
