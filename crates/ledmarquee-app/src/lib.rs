//! Composition layer for LED matrix marquees
//!
//! Everything between a rasterized pixel grid and the device sessions that
//! display it: buffers that remember what changed, effects that resample a
//! grid over time, and the loop that ties them to a fixed tick.
//!
//! # Components
//!
//! - [`Sink`]: anything that can take a frame (a [`DeviceSession`], a test
//!   recorder)
//! - [`FrameBuffer`]: one grid with dirty tracking and concurrent fan-out
//! - [`FrameBufferPair`]: two buffers side by side as one wide canvas
//! - [`ScrollEffect`] / [`StrobeEffect`]: time-driven samplers
//! - [`MarqueeText`]: fits a text raster to the canvas and scrolls it
//! - [`Runtime`]: tick loop driven by [`RuntimeCommand`]s
//!
//! [`DeviceSession`]: ledmarquee_core::DeviceSession

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod effects;
mod error;
mod framebuffer;
mod marquee;
mod pair;
mod runtime;
mod sink;

pub use effects::{
    Offset, PixelSource, PixelTarget, ScrollEffect, ScrollOptions, StrobeEffect, StrobeOptions,
};
pub use error::FlushError;
pub use framebuffer::FrameBuffer;
pub use marquee::{MarqueeOptions, MarqueeText};
pub use pair::{FrameBufferPair, Side};
pub use runtime::{Runtime, RuntimeCommand, RuntimeConfig, RuntimeHandle};
pub use sink::{SharedSink, Sink};
