//! Per-port transaction queue.
//!
//! A [`PortMutex`] serializes every transaction against one transport
//! through a single worker task fed by an unbounded channel. Operations run
//! strictly in submission order, one at a time, each with exclusive use of
//! the port's [`PortOperations`].
//!
//! # Idempotent coalescing
//!
//! Draw calls arrive on a fast animation tick but a transaction can take
//! much longer than a tick. [`PortMutex::acquire_idempotent`] registers the
//! operation under a key, replacing any registered operation that has not
//! started yet, and enqueues a slot. When a slot reaches the head of the
//! queue it runs whatever is registered under its key at that moment, or
//! nothing if an earlier slot already took it. Only the freshest pending
//! frame is ever transmitted.
//!
//! # Failure containment
//!
//! An operation that returns `Err` or panics is logged with the call site
//! that submitted it and the queue moves on. One bad transaction never
//! stalls the port.

use std::{
    collections::HashMap,
    fmt::Display,
    future::Future,
    panic::{AssertUnwindSafe, Location},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use futures::{FutureExt, future::BoxFuture};
use tokio::sync::{mpsc, oneshot};

use crate::transport::{PortOperations, Transport};

/// A unit of work ready to run on the worker.
type Job = BoxFuture<'static, ()>;

/// Registered-but-not-started idempotent operations, by key.
type Pending = Arc<Mutex<HashMap<String, Job>>>;

enum Slot {
    /// Run this job as-is.
    Plain(Job),
    /// Run whatever is registered under `key` when this slot is reached.
    Keyed { key: String, done: oneshot::Sender<()> },
}

/// FIFO work queue guarding one transport.
///
/// Cheap to clone: clones share the same queue, worker, and port. The worker
/// exits once every clone is dropped and the queue has drained, so dropping
/// a session mid-transaction lets already-queued operations finish.
///
/// # Invariants
///
/// - At most one operation executes at any instant.
/// - Plain operations execute in submission order, interleaved with keyed
///   slots in the order the slots were enqueued.
/// - Of several keyed submissions under one key made before a slot for that
///   key is reached, only the last executes.
///
/// # Deadlock
///
/// An operation must not submit to its own `PortMutex` and await the result;
/// the worker would wait on itself.
#[derive(Clone)]
pub struct PortMutex {
    queue: mpsc::UnboundedSender<Slot>,
    pending: Pending,
    port: Arc<PortOperations>,
    label: Arc<str>,
}

impl PortMutex {
    /// Take ownership of `port` and spawn its worker.
    ///
    /// `label` identifies the port in logs.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(port: PortOperations, label: impl Into<Arc<str>>) -> Self {
        let (queue, rx) = mpsc::unbounded_channel();
        let pending: Pending = Arc::default();
        let label = label.into();

        tokio::spawn(run_queue(rx, Arc::clone(&pending), Arc::clone(&label)));

        Self { queue, pending, port: Arc::new(port), label }
    }

    /// Convenience: wrap a transport with the given read timeout.
    pub fn from_transport(
        transport: impl Transport,
        read_timeout: std::time::Duration,
        label: impl Into<Arc<str>>,
    ) -> Self {
        Self::new(PortOperations::new(transport, read_timeout), label)
    }

    /// Label used in log output.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Enqueue `op` to run with exclusive access to the port.
    ///
    /// The operation is enqueued when this method is called, not when the
    /// returned future is first polled, so call order is queue order. The
    /// returned future resolves once the operation has run.
    ///
    /// Returns `Some(value)` on success. If the operation fails or panics,
    /// the failure is logged with this call site and `None` is returned;
    /// the queue carries on with the next operation.
    #[track_caller]
    pub fn acquire<F, Fut, R, E>(
        &self,
        op: F,
    ) -> impl Future<Output = Option<R>> + Send + use<F, Fut, R, E>
    where
        F: FnOnce(Arc<PortOperations>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: Send + 'static,
        E: Display + Send + 'static,
    {
        let location = Location::caller();
        let (done_tx, done_rx) = oneshot::channel();
        let port = Arc::clone(&self.port);
        let label = Arc::clone(&self.label);

        let job = async move {
            let outcome = contain(op(port), location, &label).await;
            let _ = done_tx.send(outcome);
        }
        .boxed();

        let queued = self.queue.send(Slot::Plain(job)).is_ok();

        async move {
            if !queued {
                return None;
            }
            done_rx.await.ok().flatten()
        }
    }

    /// Register `op` under `key`, superseding any not-yet-started operation
    /// under the same key, and enqueue a slot for that key.
    ///
    /// The returned future resolves once the slot has been reached, whether
    /// it ran this operation, a newer one, or nothing.
    #[track_caller]
    pub fn acquire_idempotent<F, Fut, E>(
        &self,
        key: &str,
        op: F,
    ) -> impl Future<Output = ()> + Send + use<F, Fut, E>
    where
        F: FnOnce(Arc<PortOperations>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let location = Location::caller();
        let port = Arc::clone(&self.port);
        let label = Arc::clone(&self.label);

        let job = async move {
            let _ = contain(op(port), location, &label).await;
        }
        .boxed();

        if lock(&self.pending).insert(key.to_owned(), job).is_some() {
            tracing::debug!(port = %self.label, key, "request coalesced");
        }

        let (done_tx, done_rx) = oneshot::channel();
        let queued = self.queue.send(Slot::Keyed { key: key.to_owned(), done: done_tx }).is_ok();
        if !queued {
            lock(&self.pending).remove(key);
        }

        async move {
            if queued {
                let _ = done_rx.await;
            }
        }
    }
}

/// Worker loop: run slots one at a time until every sender is gone.
async fn run_queue(mut rx: mpsc::UnboundedReceiver<Slot>, pending: Pending, label: Arc<str>) {
    while let Some(slot) = rx.recv().await {
        match slot {
            Slot::Plain(job) => job.await,
            Slot::Keyed { key, done } => {
                let job = lock(&pending).remove(&key);
                if let Some(job) = job {
                    job.await;
                }
                let _ = done.send(());
            },
        }
    }

    tracing::debug!(port = %label, "port queue drained");
}

/// Run one operation, turning errors and panics into a logged `None`.
async fn contain<R, E: Display>(
    op: impl Future<Output = Result<R, E>>,
    location: &'static Location<'static>,
    label: &str,
) -> Option<R> {
    match AssertUnwindSafe(op).catch_unwind().await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            tracing::error!(port = %label, %location, error = %e, "queued operation failed");
            None
        },
        Err(_) => {
            tracing::error!(port = %label, %location, "queued operation panicked");
            None
        },
    }
}

fn lock(pending: &Pending) -> MutexGuard<'_, HashMap<String, Job>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}
