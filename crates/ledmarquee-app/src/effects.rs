//! Time-driven pixel samplers.
//!
//! An effect holds nothing but its start instant and options. Every pixel it
//! writes is a pure function of the source grid and the time elapsed since
//! construction, so two calls at the same instant write identical frames.

use std::time::Duration;

use ledmarquee_core::{Environment, PixelGrid};

use crate::{FrameBuffer, FrameBufferPair};

/// Readable pixel grid.
pub trait PixelSource {
    /// Height.
    fn rows(&self) -> usize;
    /// Width.
    fn cols(&self) -> usize;
    /// Value at `(row, col)`, 0 when out of range.
    fn value(&self, row: usize, col: usize) -> f32;
}

impl PixelSource for PixelGrid {
    fn rows(&self) -> usize {
        PixelGrid::rows(self)
    }

    fn cols(&self) -> usize {
        PixelGrid::cols(self)
    }

    fn value(&self, row: usize, col: usize) -> f32 {
        PixelGrid::value(self, row, col)
    }
}

/// Writable pixel grid with interior mutability.
pub trait PixelTarget {
    /// Height.
    fn rows(&self) -> usize;
    /// Width.
    fn cols(&self) -> usize;
    /// Write one pixel.
    fn set_pixel(&self, row: usize, col: usize, value: f32);
}

impl PixelTarget for FrameBuffer {
    fn rows(&self) -> usize {
        FrameBuffer::rows(self)
    }

    fn cols(&self) -> usize {
        FrameBuffer::cols(self)
    }

    fn set_pixel(&self, row: usize, col: usize, value: f32) {
        FrameBuffer::set_pixel(self, row, col, value);
    }
}

impl PixelTarget for FrameBufferPair {
    fn rows(&self) -> usize {
        FrameBufferPair::rows(self)
    }

    fn cols(&self) -> usize {
        FrameBufferPair::cols(self)
    }

    fn set_pixel(&self, row: usize, col: usize, value: f32) {
        FrameBufferPair::set_pixel(self, row, col, value);
    }
}

/// A target viewed from an offset: `(r, c)` lands on `(r + row, c + col)`.
///
/// The visible size shrinks by the offset so writes never fall off the edge.
pub struct Offset<'a, T: ?Sized> {
    inner: &'a T,
    row: usize,
    col: usize,
}

impl<'a, T: PixelTarget + ?Sized> Offset<'a, T> {
    /// View `inner` shifted down by `row` and right by `col`.
    pub fn new(inner: &'a T, row: usize, col: usize) -> Self {
        Self { inner, row, col }
    }
}

impl<T: PixelTarget + ?Sized> PixelTarget for Offset<'_, T> {
    fn rows(&self) -> usize {
        self.inner.rows().saturating_sub(self.row)
    }

    fn cols(&self) -> usize {
        self.inner.cols().saturating_sub(self.col)
    }

    fn set_pixel(&self, row: usize, col: usize, value: f32) {
        self.inner.set_pixel(row + self.row, col + self.col, value);
    }
}

/// Scroll speed and blank gaps, per axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOptions {
    /// Rows advanced per second. Negative scrolls the other way.
    pub rows_per_sec: f32,
    /// Columns advanced per second.
    pub cols_per_sec: f32,
    /// Blank rows between vertical repeats.
    pub row_gap: usize,
    /// Blank columns between horizontal repeats.
    pub col_gap: usize,
}

/// Wrap-around marquee scroll.
///
/// Destination pixel `(r, c)` samples source pixel
/// `((r + round(rows_per_sec * dt)) mod (rows + row_gap), ...)` and is blank
/// when that lands in the gap.
pub struct ScrollEffect<E: Environment> {
    env: E,
    start: E::Instant,
    options: ScrollOptions,
}

impl<E: Environment> ScrollEffect<E> {
    /// Start scrolling now.
    pub fn new(env: E, options: ScrollOptions) -> Self {
        let start = env.now();
        Self { env, start, options }
    }

    /// Configured options.
    pub fn options(&self) -> ScrollOptions {
        self.options
    }

    /// Time since construction.
    pub fn elapsed(&self) -> Duration {
        self.env.now() - self.start
    }

    /// Write every destination pixel for the current instant.
    pub fn apply<S, T>(&self, source: &S, target: &T)
    where
        S: PixelSource + ?Sized,
        T: PixelTarget + ?Sized,
    {
        self.apply_at(self.elapsed(), source, target);
    }

    /// Write every destination pixel as of `elapsed`.
    pub fn apply_at<S, T>(&self, elapsed: Duration, source: &S, target: &T)
    where
        S: PixelSource + ?Sized,
        T: PixelTarget + ?Sized,
    {
        let dt = elapsed.as_secs_f64();
        let row_shift = round_half_up(f64::from(self.options.rows_per_sec) * dt);
        let col_shift = round_half_up(f64::from(self.options.cols_per_sec) * dt);

        for r in 0..target.rows() {
            let src_r = wrap(r, row_shift, source.rows(), self.options.row_gap);
            for c in 0..target.cols() {
                let src_c = wrap(c, col_shift, source.cols(), self.options.col_gap);
                let value = match (src_r, src_c) {
                    (Some(sr), Some(sc)) => source.value(sr, sc),
                    _ => 0.0,
                };
                target.set_pixel(r, c, value);
            }
        }
    }
}

/// Round to nearest, halves toward positive infinity.
fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

/// Source index for destination index `dst`, or `None` in the gap.
fn wrap(dst: usize, shift: i64, len: usize, gap: usize) -> Option<usize> {
    let period = (len + gap) as i64;
    if period == 0 {
        return None;
    }
    let src = (dst as i64 + shift).rem_euclid(period) as usize;
    (src < len).then_some(src)
}

/// Strobe timing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrobeOptions {
    /// Time shown as-is in each cycle.
    pub on: Duration,
    /// Time shown inverted in each cycle.
    pub off: Duration,
}

impl Default for StrobeOptions {
    fn default() -> Self {
        Self { on: Duration::from_millis(500), off: Duration::from_millis(500) }
    }
}

/// Alternates between the source and its inverse.
pub struct StrobeEffect<E: Environment> {
    env: E,
    start: E::Instant,
    options: StrobeOptions,
}

impl<E: Environment> StrobeEffect<E> {
    /// Start strobing now.
    pub fn new(env: E, options: StrobeOptions) -> Self {
        let start = env.now();
        Self { env, start, options }
    }

    /// Time since construction.
    pub fn elapsed(&self) -> Duration {
        self.env.now() - self.start
    }

    /// True if the frame at `elapsed` is inverted.
    pub fn inverted_at(&self, elapsed: Duration) -> bool {
        let cycle = self.options.on + self.options.off;
        if cycle.is_zero() {
            return false;
        }
        let phase = elapsed.as_nanos() % cycle.as_nanos();
        phase > self.options.on.as_nanos()
    }

    /// Write the current frame.
    pub fn apply<S, T>(&self, source: &S, target: &T)
    where
        S: PixelSource + ?Sized,
        T: PixelTarget + ?Sized,
    {
        self.apply_at(self.elapsed(), source, target);
    }

    /// Write the frame as of `elapsed`.
    pub fn apply_at<S, T>(&self, elapsed: Duration, source: &S, target: &T)
    where
        S: PixelSource + ?Sized,
        T: PixelTarget + ?Sized,
    {
        let inverted = self.inverted_at(elapsed);
        for r in 0..target.rows() {
            for c in 0..target.cols() {
                let value = source.value(r, c);
                target.set_pixel(r, c, if inverted { 1.0 - value } else { value });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_half_up_matches_expectations() {
        assert_eq!(round_half_up(0.49), 0);
        assert_eq!(round_half_up(0.5), 1);
        assert_eq!(round_half_up(-0.5), 0);
        assert_eq!(round_half_up(-0.51), -1);
    }

    #[test]
    fn wrap_blanks_gap() {
        assert_eq!(wrap(0, 0, 3, 2), Some(0));
        assert_eq!(wrap(3, 0, 3, 2), None);
        assert_eq!(wrap(4, 0, 3, 2), None);
        assert_eq!(wrap(5, 0, 3, 2), Some(0));
        assert_eq!(wrap(0, -1, 3, 2), None);
        assert_eq!(wrap(0, -2, 3, 2), None);
        assert_eq!(wrap(0, -3, 3, 2), Some(2));
    }

    #[test]
    fn empty_period_is_blank() {
        assert_eq!(wrap(0, 7, 0, 0), None);
    }
}
