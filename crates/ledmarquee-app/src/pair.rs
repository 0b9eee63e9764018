//! Two buffers as one wide canvas.

use std::fmt;

use ledmarquee_core::PixelGrid;

use crate::{FlushError, FrameBuffer, SharedSink};

/// Which half of a [`FrameBufferPair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Columns `0..W`
    Left,
    /// Columns `W..2W`
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

/// Left and right buffers of equal height, addressed as one canvas.
///
/// Column `c` belongs to the left buffer if `c < left.cols()`, otherwise to
/// the right buffer at `c - left.cols()`.
pub struct FrameBufferPair {
    left: FrameBuffer,
    right: FrameBuffer,
}

impl FrameBufferPair {
    /// Two dark buffers of `rows` x `cols_each`.
    pub fn new(rows: usize, cols_each: usize) -> Self {
        Self { left: FrameBuffer::new(rows, cols_each), right: FrameBuffer::new(rows, cols_each) }
    }

    /// Two side-by-side modules.
    pub fn modules() -> Self {
        Self { left: FrameBuffer::module(), right: FrameBuffer::module() }
    }

    /// Canvas height.
    pub fn rows(&self) -> usize {
        self.left.rows()
    }

    /// Canvas width: both buffers together.
    pub fn cols(&self) -> usize {
        self.left.cols() + self.right.cols()
    }

    /// One half.
    pub fn side(&self, side: Side) -> &FrameBuffer {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Left half.
    pub fn left(&self) -> &FrameBuffer {
        &self.left
    }

    /// Right half.
    pub fn right(&self) -> &FrameBuffer {
        &self.right
    }

    /// Write one canvas pixel into whichever half holds it.
    ///
    /// Returns true if the value changed.
    pub fn set_pixel(&self, row: usize, col: usize, value: f32) -> bool {
        let width = self.left.cols();
        if col < width {
            self.left.set_pixel(row, col, value)
        } else {
            self.right.set_pixel(row, col - width, value)
        }
    }

    /// Current value of one canvas pixel.
    pub fn pixel(&self, row: usize, col: usize) -> f32 {
        let width = self.left.cols();
        if col < width { self.left.pixel(row, col) } else { self.right.pixel(row, col - width) }
    }

    /// Both halves stitched into one grid.
    pub fn snapshot(&self) -> PixelGrid {
        let width = self.left.cols();
        let (left, right) = (self.left.snapshot(), self.right.snapshot());
        PixelGrid::from_fn(self.rows(), self.cols(), |r, c| {
            if c < width { left.value(r, c) } else { right.value(r, c - width) }
        })
    }

    /// Replace one half's sinks and blank that half.
    pub async fn attach(&self, side: Side, sinks: Vec<SharedSink>) -> Result<(), FlushError> {
        let buffer = self.side(side);
        buffer.set_sinks(sinks);
        buffer.clear().await
    }

    /// Blank both halves and flush them.
    pub async fn clear(&self) -> Result<(), FlushError> {
        let (left, right) = futures::join!(self.left.clear(), self.right.clear());
        left.and(right)
    }

    /// Flush both halves concurrently.
    pub async fn flush(&self) -> Result<(), FlushError> {
        let (left, right) = futures::join!(self.left.flush(), self.right.flush());
        left.and(right)
    }

    /// Force both halves to transmit concurrently.
    pub async fn force_tx(&self) -> Result<(), FlushError> {
        let (left, right) = futures::join!(self.left.force_tx(), self.right.force_tx());
        left.and(right)
    }

    /// Exchange the halves' sinks, then re-render both so each device shows
    /// its new half straight away.
    pub async fn swap(&self) -> Result<(), FlushError> {
        let left = self.left.take_sinks();
        let right = self.right.take_sinks();
        self.left.set_sinks(right);
        self.right.set_sinks(left);
        self.force_tx().await
    }
}
