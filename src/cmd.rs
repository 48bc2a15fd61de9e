//! Helpers for running external commands from task bodies.
//!
//! Thin wrappers over [`std::process::Command`] that apply the context's
//! extra environment (see [`TaskContext::with_env`]) and route command output
//! through the target's log span.

use std::process::{Command, Stdio};

use anyhow::{bail, Context as _};
use tracing::{info, warn};

use crate::context::TaskContext;
use crate::error::TaskResult;

/// Build a command for `program` with the context's extra environment
/// applied. The caller decides how to run it.
pub fn command(ctx: &TaskContext, program: &str, args: &[&str]) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args);
    for (key, value) in ctx.env() {
        cmd.env(key, value);
    }
    cmd
}

/// Run `program` and return its trimmed stdout.
///
/// A nonzero exit becomes an error carrying the command's stderr.
pub fn output(ctx: &TaskContext, program: &str, args: &[&str]) -> anyhow::Result<String> {
    let out = command(ctx, program, args)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("failed to spawn {program}"))?;
    if !out.status.success() {
        bail!(
            "{program} failed: {}",
            String::from_utf8_lossy(&out.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
}

/// Run `program`, logging stdout lines at info and stderr lines at warn
/// through the context's task span, and fail on nonzero exit.
pub fn run(ctx: &TaskContext, program: &str, args: &[&str]) -> TaskResult {
    let _guard = ctx.span().enter();
    let out = command(ctx, program, args)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("failed to spawn {program}"))?;

    for line in String::from_utf8_lossy(&out.stdout).lines() {
        let line = line.trim();
        if !line.is_empty() {
            info!("{line}");
        }
    }
    for line in String::from_utf8_lossy(&out.stderr).lines() {
        let line = line.trim();
        if !line.is_empty() {
            warn!("{line}");
        }
    }

    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        let stderr = stderr.trim();
        if stderr.is_empty() {
            bail!("{program} failed with {}", out.status);
        }
        bail!("{stderr}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TaskRuntime;

    #[test]
    fn output_returns_trimmed_stdout() {
        let runtime = TaskRuntime::new();
        let ctx = runtime.context();
        assert_eq!(output(&ctx, "echo", &["hello"]).unwrap(), "hello");
    }

    #[test]
    fn nonzero_exit_is_an_error_naming_the_program() {
        let runtime = TaskRuntime::new();
        let ctx = runtime.context();
        let err = output(&ctx, "false", &[]).unwrap_err();
        assert!(err.to_string().contains("false failed"));
    }

    #[test]
    fn missing_program_reports_spawn_failure() {
        let runtime = TaskRuntime::new();
        let ctx = runtime.context();
        let err = output(&ctx, "task-flow-no-such-program", &[]).unwrap_err();
        assert!(err.to_string().contains("failed to spawn"));
    }

    #[test]
    fn context_env_reaches_the_command() {
        let runtime = TaskRuntime::new();
        let ctx = runtime.context().with_env(["TASK_FLOW_CMD_PROBE=probed"]);
        let value = output(&ctx, "sh", &["-c", "echo $TASK_FLOW_CMD_PROBE"]).unwrap();
        assert_eq!(value, "probed");
    }

    #[test]
    fn run_fails_on_nonzero_exit() {
        let runtime = TaskRuntime::new();
        let ctx = runtime.context();
        assert!(run(&ctx, "sh", &["-c", "echo oops >&2; exit 3"]).is_err());
        assert!(run(&ctx, "true", &[]).is_ok());
    }
}
