//! Wire layer for LED matrix input modules.
//!
//! Pure encoding and decoding for the two firmware dialects spoken by the
//! 34x9 LED matrix module. Nothing in this crate performs I/O: callers hand
//! it a [`PixelGrid`] and get back the exact bytes to put on the wire, or hand
//! it raw reply bytes and get back a typed [`VersionInfo`].
//!
//! # Dialects
//!
//! - [`official`]: vendor firmware. Binary opcodes behind a two byte vendor
//!   prefix, fixed 32-byte replies, 1-bit and 8-bit draw paths.
//! - [`sigroot`]: community firmware. ASCII mnemonic opcodes, a 25-byte ASCII
//!   identification reply, PWM draw.
//!
//! Both dialects share the [`gamma`] lookup table for perceptual brightness
//! correction.

#![warn(missing_docs)]

pub mod errors;
pub mod gamma;
pub mod grid;
pub mod official;
pub mod sigroot;
mod version;

pub use errors::{ProtocolError, Result};
pub use gamma::{GAMMA, gamma};
pub use grid::{MODULE_HEIGHT, MODULE_WIDTH, PixelGrid};
pub use version::VersionInfo;
