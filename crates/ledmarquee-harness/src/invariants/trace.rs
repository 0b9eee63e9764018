//! Recorded queue activity.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One observable queue event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// Operation handed to the queue. `key` is set for idempotent submissions.
    Submitted {
        /// Test-assigned operation id
        id: u64,
        /// Coalescing key, if any
        key: Option<String>,
    },
    /// Operation body began executing.
    Started {
        /// Operation id
        id: u64,
    },
    /// Operation body returned.
    Finished {
        /// Operation id
        id: u64,
    },
}

/// Shared, append-only event log.
///
/// Clones append to the same log, so an operation moved into the queue can
/// record into the trace the test inspects.
#[derive(Clone, Default)]
pub struct ExecutionTrace {
    events: Arc<Mutex<Vec<TraceEvent>>>,
}

impl ExecutionTrace {
    /// Empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a plain submission.
    pub fn submitted(&self, id: u64) {
        self.push(TraceEvent::Submitted { id, key: None });
    }

    /// Record a keyed submission.
    pub fn submitted_keyed(&self, id: u64, key: &str) {
        self.push(TraceEvent::Submitted { id, key: Some(key.to_owned()) });
    }

    /// Record that `id` began executing.
    pub fn started(&self, id: u64) {
        self.push(TraceEvent::Started { id });
    }

    /// Record that `id` finished executing.
    pub fn finished(&self, id: u64) {
        self.push(TraceEvent::Finished { id });
    }

    /// Copy of every event so far.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.lock().clone()
    }

    /// Ids in the order they started.
    pub fn start_order(&self) -> Vec<u64> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                TraceEvent::Started { id } => Some(*id),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: TraceEvent) {
        self.lock().push(event);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TraceEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
