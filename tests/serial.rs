//! Ordering guarantees of `serial_deps`.

use std::sync::Mutex;

use task_flow::{deps, serial_deps, TaskContext, TaskError, TaskResult, TaskRuntime};

#[test]
fn targets_run_strictly_in_caller_order() {
    static LOG: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

    fn x_inner_one(_ctx: &TaskContext) -> TaskResult {
        LOG.lock().unwrap().push("x1");
        Ok(())
    }

    fn x_inner_two(_ctx: &TaskContext) -> TaskResult {
        LOG.lock().unwrap().push("x2");
        Ok(())
    }

    fn x(ctx: &TaskContext) -> TaskResult {
        // Nested fan-out must settle before y starts.
        deps(ctx, (x_inner_one, x_inner_two))?;
        LOG.lock().unwrap().push("x");
        Ok(())
    }

    fn y(_ctx: &TaskContext) -> TaskResult {
        LOG.lock().unwrap().push("y");
        Ok(())
    }

    fn z(_ctx: &TaskContext) -> TaskResult {
        LOG.lock().unwrap().push("z");
        Ok(())
    }

    let runtime = TaskRuntime::new();
    serial_deps(&runtime.context(), (x, y, z)).unwrap();

    let log = LOG.lock().unwrap();
    assert_eq!(log.len(), 5);
    // x1 and x2 may interleave with each other, but nothing else.
    assert_eq!(&log[2..], ["x", "y", "z"]);
    assert!(log[..2].contains(&"x1"));
    assert!(log[..2].contains(&"x2"));
}

#[test]
fn an_error_stops_the_remaining_targets() {
    static LOG: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

    fn ok_first(_ctx: &TaskContext) -> TaskResult {
        LOG.lock().unwrap().push("first");
        Ok(())
    }

    fn then_fails(_ctx: &TaskContext) -> TaskResult {
        LOG.lock().unwrap().push("failing");
        anyhow::bail!("stop here")
    }

    fn never_runs(_ctx: &TaskContext) -> TaskResult {
        LOG.lock().unwrap().push("never");
        Ok(())
    }

    let runtime = TaskRuntime::new();
    let err = serial_deps(&runtime.context(), (ok_first, then_fails, never_runs)).unwrap_err();

    match err {
        TaskError::Aggregate { failed, total } => {
            assert_eq!(failed, vec!["then_fails"]);
            assert_eq!(total, 1);
        }
        other => panic!("expected aggregate, got {other}"),
    }
    assert_eq!(*LOG.lock().unwrap(), ["first", "failing"]);
}

#[test]
fn serial_deps_still_memoizes() {
    static LOG: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

    fn shared(_ctx: &TaskContext) -> TaskResult {
        LOG.lock().unwrap().push("shared");
        Ok(())
    }

    let runtime = TaskRuntime::new();
    serial_deps(&runtime.context(), (shared, shared)).unwrap();

    assert_eq!(*LOG.lock().unwrap(), ["shared"]);
}
