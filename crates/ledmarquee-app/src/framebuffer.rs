//! Dirty-tracked pixel buffer with concurrent fan-out.

use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::future::join_all;
use ledmarquee_core::PixelGrid;
use ledmarquee_proto::{MODULE_HEIGHT, MODULE_WIDTH};

use crate::{FlushError, SharedSink};

struct State {
    grid: PixelGrid,
    dirty: bool,
    optimization_enabled: bool,
    sinks: Vec<SharedSink>,
}

/// One rectangular grid and the sinks it is shown on.
///
/// All methods take `&self`; pixel writes may land while a flush is in
/// flight and are picked up by the next flush.
///
/// # Invariants
///
/// - `dirty` is set only by a write that changes a value, by `clear`, and by
///   `force_tx`
/// - `flush` clears `dirty` before any sink sees the frame
/// - `force_tx` leaves `dirty` and the optimization flag as it found them
pub struct FrameBuffer {
    state: Mutex<State>,
}

impl FrameBuffer {
    /// Dark buffer of the given size with no sinks.
    ///
    /// Starts dirty so the first flush always transmits.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            state: Mutex::new(State {
                grid: PixelGrid::new(rows, cols),
                dirty: true,
                optimization_enabled: true,
                sinks: Vec::new(),
            }),
        }
    }

    /// Buffer the size of one module.
    pub fn module() -> Self {
        Self::new(MODULE_HEIGHT, MODULE_WIDTH)
    }

    /// Grid height.
    pub fn rows(&self) -> usize {
        self.lock().grid.rows()
    }

    /// Grid width.
    pub fn cols(&self) -> usize {
        self.lock().grid.cols()
    }

    /// Write one pixel. Returns true if the value changed.
    ///
    /// Out-of-range coordinates are ignored.
    pub fn set_pixel(&self, row: usize, col: usize, value: f32) -> bool {
        let mut state = self.lock();
        match state.grid.get(row, col) {
            Some(current) if current != value => {
                state.grid.set(row, col, value);
                state.dirty = true;
                true
            },
            _ => false,
        }
    }

    /// Current value of one pixel, 0 when out of range.
    pub fn pixel(&self, row: usize, col: usize) -> f32 {
        self.lock().grid.value(row, col)
    }

    /// Copy of the current grid.
    pub fn snapshot(&self) -> PixelGrid {
        self.lock().grid.clone()
    }

    /// True if the content changed since the last flush.
    pub fn is_dirty(&self) -> bool {
        self.lock().dirty
    }

    /// Whether clean flushes are skipped.
    pub fn optimization_enabled(&self) -> bool {
        self.lock().optimization_enabled
    }

    /// Turn clean-flush skipping on or off.
    pub fn set_optimization(&self, enabled: bool) {
        self.lock().optimization_enabled = enabled;
    }

    /// Replace every sink.
    pub fn set_sinks(&self, sinks: Vec<SharedSink>) {
        self.lock().sinks = sinks;
    }

    /// Add one sink.
    pub fn add_sink(&self, sink: SharedSink) {
        self.lock().sinks.push(sink);
    }

    /// Remove and return every sink.
    pub fn take_sinks(&self) -> Vec<SharedSink> {
        std::mem::take(&mut self.lock().sinks)
    }

    /// Number of attached sinks.
    pub fn sink_count(&self) -> usize {
        self.lock().sinks.len()
    }

    /// Blank every pixel and flush.
    pub async fn clear(&self) -> Result<(), FlushError> {
        {
            let mut state = self.lock();
            state.grid.fill(0.0);
            state.dirty = true;
        }
        self.flush().await
    }

    /// Push the grid to every sink if it changed (or always, with
    /// optimization off).
    ///
    /// Sinks are driven concurrently and all are awaited. A failing sink is
    /// logged and reported, but the others still get the frame.
    pub async fn flush(&self) -> Result<(), FlushError> {
        let (grid, sinks) = {
            let mut state = self.lock();
            if state.optimization_enabled && !state.dirty {
                return Ok(());
            }
            state.dirty = false;
            (state.grid.clone(), state.sinks.clone())
        };

        let results = join_all(sinks.iter().map(|sink| sink.draw(&grid))).await;

        let mut failed = 0;
        let mut first = None;
        for (sink, result) in sinks.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(sink = sink.label(), error = %e, "flush rejected");
                failed += 1;
                first.get_or_insert(e);
            }
        }

        match first {
            None => Ok(()),
            Some(first) => Err(FlushError::Rejected { failed, total: sinks.len(), first }),
        }
    }

    /// Flush unconditionally, then restore the dirty and optimization flags
    /// to what they were before the call.
    pub async fn force_tx(&self) -> Result<(), FlushError> {
        let (optimization_enabled, dirty) = {
            let mut state = self.lock();
            let saved = (state.optimization_enabled, state.dirty);
            state.optimization_enabled = false;
            state.dirty = true;
            saved
        };

        let result = self.flush().await;

        let mut state = self.lock();
        state.optimization_enabled = optimization_enabled;
        state.dirty = dirty;
        result
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn starts_dirty_and_dark() {
        let buffer = FrameBuffer::module();
        assert!(buffer.is_dirty());
        assert_eq!(buffer.snapshot(), PixelGrid::module());
        assert_eq!((buffer.rows(), buffer.cols()), (34, 9));
    }

    #[test]
    fn unchanged_write_is_not_a_change() {
        let buffer = FrameBuffer::new(2, 2);
        assert!(!buffer.set_pixel(0, 0, 0.0));
        assert!(buffer.set_pixel(0, 0, 0.5));
        assert!(!buffer.set_pixel(0, 0, 0.5));
    }

    #[test]
    fn out_of_range_write_ignored() {
        let buffer = FrameBuffer::new(2, 2);
        assert!(!buffer.set_pixel(2, 0, 1.0));
        assert!(!buffer.set_pixel(0, 2, 1.0));
        assert_eq!(buffer.pixel(2, 0), 0.0);
    }

    #[tokio::test]
    async fn flush_without_sinks_clears_dirty() {
        let buffer = FrameBuffer::new(2, 2);
        buffer.flush().await.unwrap();
        assert!(!buffer.is_dirty());

        buffer.set_pixel(1, 1, 1.0);
        assert!(buffer.is_dirty());
    }

    #[tokio::test]
    async fn force_tx_restores_flags() {
        let buffer = FrameBuffer::new(2, 2);
        buffer.flush().await.unwrap();
        buffer.set_optimization(true);

        buffer.force_tx().await.unwrap();

        assert!(!buffer.is_dirty());
        assert!(buffer.optimization_enabled());
    }
}
