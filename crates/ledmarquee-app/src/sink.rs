//! Frame consumers.

use std::sync::Arc;

use async_trait::async_trait;
use ledmarquee_core::{DeviceSession, FirmwareError, PixelGrid};

/// Something a [`FrameBuffer`](crate::FrameBuffer) can flush into.
///
/// Sinks receive a read-only view of the buffer's grid and must not keep
/// it past the call.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Display `grid`.
    async fn draw(&self, grid: &PixelGrid) -> Result<(), FirmwareError>;

    /// Name used in logs.
    fn label(&self) -> &str {
        "sink"
    }
}

/// Sinks are shared between a buffer and whoever attached them.
pub type SharedSink = Arc<dyn Sink>;

#[async_trait]
impl Sink for DeviceSession {
    async fn draw(&self, grid: &PixelGrid) -> Result<(), FirmwareError> {
        DeviceSession::draw(self, grid).await
    }

    fn label(&self) -> &str {
        DeviceSession::label(self)
    }
}
