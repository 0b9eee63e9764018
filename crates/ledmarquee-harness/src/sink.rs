//! Frame sinks that record or refuse.

use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use ledmarquee_app::Sink;
use ledmarquee_core::{FirmwareError, PixelGrid};

/// Sink that keeps every frame it is handed.
///
/// Clones share one recording.
#[derive(Clone, Default)]
pub struct RecordingSink {
    frames: Arc<Mutex<Vec<PixelGrid>>>,
    latency: Duration,
}

impl RecordingSink {
    /// Instant sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that takes `latency` to accept each frame.
    pub fn with_latency(latency: Duration) -> Self {
        Self { latency, ..Self::default() }
    }

    /// Every frame received, in order.
    pub fn frames(&self) -> Vec<PixelGrid> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of frames received.
    pub fn count(&self) -> usize {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Most recent frame.
    pub fn last(&self) -> Option<PixelGrid> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner).last().cloned()
    }
}

#[async_trait]
impl Sink for RecordingSink {
    async fn draw(&self, grid: &PixelGrid) -> Result<(), FirmwareError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.frames.lock().unwrap_or_else(PoisonError::into_inner).push(grid.clone());
        Ok(())
    }

    fn label(&self) -> &str {
        "recording"
    }
}

/// Sink whose every draw fails.
#[derive(Clone, Default)]
pub struct FailingSink {
    attempts: Arc<AtomicUsize>,
}

impl FailingSink {
    /// New failing sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws attempted so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Sink for FailingSink {
    async fn draw(&self, _grid: &PixelGrid) -> Result<(), FirmwareError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        Err(FirmwareError::NoReply)
    }

    fn label(&self) -> &str {
        "failing"
    }
}
