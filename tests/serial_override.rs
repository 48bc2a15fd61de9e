//! The process-wide serial override.
//!
//! Lives in its own test binary because it mutates the process environment;
//! both phases run inside a single test to keep that mutation ordered.

use std::sync::Mutex;
use std::thread::{self, ThreadId};

use task_flow::{TaskContext, TaskResult, TaskRuntime, SERIAL_DEPS_ENV};

static THREADS: Mutex<Vec<(&'static str, ThreadId)>> = Mutex::new(Vec::new());

fn record(entry: &'static str) {
    THREADS.lock().unwrap().push((entry, thread::current().id()));
}

fn one(_ctx: &TaskContext) -> TaskResult {
    record("one");
    Ok(())
}

fn two(_ctx: &TaskContext) -> TaskResult {
    record("two");
    Ok(())
}

fn three(_ctx: &TaskContext) -> TaskResult {
    record("three");
    Ok(())
}

#[test]
fn override_degenerates_fan_out_to_the_calling_thread() {
    let caller = thread::current().id();

    std::env::set_var(SERIAL_DEPS_ENV, "yes");
    TaskRuntime::new().run((one, two, three)).unwrap();

    {
        let mut log = THREADS.lock().unwrap();
        let entries: Vec<_> = log.drain(..).collect();
        // Serial: caller's thread, declaration order.
        assert_eq!(
            entries.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
            ["one", "two", "three"]
        );
        assert!(entries.iter().all(|(_, id)| *id == caller));
    }

    std::env::set_var(SERIAL_DEPS_ENV, "0");
    TaskRuntime::new().run((one, two, three)).unwrap();

    let log = THREADS.lock().unwrap();
    assert_eq!(log.len(), 3);
    // Fan-out: every unit got its own spawned thread.
    assert!(log.iter().all(|(_, id)| *id != caller));
}
