//! Run-once memoization, one registry per runtime.
//!
//! The registry guarantees that for a given target id the underlying function
//! body executes at most once per registry, no matter how many threads
//! request it, and that every caller observes the identical outcome. A
//! recorded error poisons its id: there is no retry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::TaskError;
use crate::target::TargetId;

/// Outcome memoized per target id.
pub type Outcome = Result<(), TaskError>;

/// One memoized slot per target id.
///
/// The slot mutex doubles as the first-run latch: the first caller holds it
/// for the duration of the body, later callers block on it and then read the
/// stored outcome.
#[derive(Default)]
struct OnceEntry {
    slot: Mutex<Option<Outcome>>,
}

/// Map from target id to its memoized outcome.
///
/// Owned by the runtime and passed around by `Arc`, so tests get fresh,
/// isolated instances instead of hidden global state. Entries are created
/// lazily and live as long as the runtime; nothing expires.
#[derive(Default)]
pub(crate) struct OnceRegistry {
    entries: Mutex<HashMap<TargetId, Arc<OnceEntry>>>,
}

impl OnceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` at most once for `id` and return the recorded outcome.
    ///
    /// Entry creation is decoupled from entry execution: the map lock covers
    /// only the lookup-or-insert, never the body, so unrelated ids never
    /// contend with each other.
    pub fn run_once(&self, id: &TargetId, f: impl FnOnce() -> Outcome) -> Outcome {
        let entry = {
            let mut entries = self.entries.lock();
            entries.entry(id.clone()).or_default().clone()
        };

        let mut slot = entry.slot.lock();
        if let Some(outcome) = slot.as_ref() {
            return outcome.clone();
        }
        let outcome = f();
        *slot = Some(outcome.clone());
        outcome
    }
}
