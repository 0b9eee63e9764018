//! Scrolling text on the canvas.

use ledmarquee_core::{Environment, PixelGrid};

use crate::{Offset, PixelTarget, ScrollEffect, ScrollOptions};

/// How a text raster is fitted to the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarqueeOptions {
    /// Rows per glyph in the raster.
    pub pitch: usize,
    /// Scroll speed when the raster is taller than the canvas.
    pub rows_per_sec: f32,
    /// Blank rows between repeats when scrolling.
    pub row_gap: usize,
    /// Raster values above this are lit, everything else is dark.
    pub threshold: f32,
    /// Columns left blank on the canvas's left edge.
    pub col_offset: usize,
}

impl Default for MarqueeOptions {
    fn default() -> Self {
        Self { pitch: 17, rows_per_sec: 16.0, row_gap: 10, threshold: 0.75, col_offset: 1 }
    }
}

struct Loaded<E: Environment> {
    raster: PixelGrid,
    scroll: ScrollEffect<E>,
}

/// A vertically laid-out text raster shown on a canvas.
///
/// Rasters taller than the canvas scroll upward with a gap between
/// repeats; shorter ones sit still at the top with the rest blank.
pub struct MarqueeText<E: Environment> {
    env: E,
    options: MarqueeOptions,
    loaded: Option<Loaded<E>>,
}

impl<E: Environment> MarqueeText<E> {
    /// Nothing loaded yet.
    pub fn new(env: E, options: MarqueeOptions) -> Self {
        Self { env, options, loaded: None }
    }

    /// Fitting options.
    pub fn options(&self) -> MarqueeOptions {
        self.options
    }

    /// True once a raster has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Whether the loaded raster scrolls.
    pub fn is_scrolling(&self) -> bool {
        self.loaded.as_ref().is_some_and(|l| l.scroll.options().rows_per_sec != 0.0)
    }

    /// Glyph rows the loaded raster holds, by pitch.
    pub fn glyphs(&self) -> usize {
        match (&self.loaded, self.options.pitch) {
            (Some(loaded), pitch) if pitch > 0 => loaded.raster.rows().div_ceil(pitch),
            _ => 0,
        }
    }

    /// Threshold `raster` and start showing it on a canvas `display_rows`
    /// tall. Restarts the scroll clock.
    pub fn load(&mut self, raster: &PixelGrid, display_rows: usize) {
        let threshold = self.options.threshold;
        let raster = PixelGrid::from_fn(raster.rows(), raster.cols(), |r, c| {
            if raster.value(r, c) > threshold { 1.0 } else { 0.0 }
        });

        let scroll = if raster.rows() > display_rows {
            ScrollOptions {
                rows_per_sec: self.options.rows_per_sec,
                row_gap: self.options.row_gap,
                ..ScrollOptions::default()
            }
        } else {
            ScrollOptions { row_gap: display_rows - raster.rows(), ..ScrollOptions::default() }
        };

        let scrolling = scroll.rows_per_sec != 0.0;
        let loaded = Loaded { raster, scroll: ScrollEffect::new(self.env.clone(), scroll) };
        self.loaded = Some(loaded);
        tracing::debug!(glyphs = self.glyphs(), scrolling, "marquee loaded");
    }

    /// Drop the raster. Later frames are no-ops.
    pub fn unload(&mut self) {
        self.loaded = None;
    }

    /// Write the current frame into `target`. No-op before the first load.
    pub fn next_frame<T: PixelTarget + ?Sized>(&self, target: &T) {
        if let Some(loaded) = &self.loaded {
            let view = Offset::new(target, 0, self.options.col_offset);
            loaded.scroll.apply(&loaded.raster, &view);
        }
    }
}
