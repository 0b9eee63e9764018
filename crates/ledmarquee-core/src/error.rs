//! Error types for the device layer.
//!
//! Strongly-typed errors per boundary: raw port I/O ([`PortError`]), port
//! selection ([`PickError`]), connection setup ([`ConnectError`]), and
//! firmware requests ([`FirmwareError`]). A dialect probe that does not match
//! is not an error at all; it is a `false` from `verify_firmware`.

use std::io;

use ledmarquee_proto::ProtocolError;
use thiserror::Error;

/// Errors from raw port I/O.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortError {
    /// Read attempted while another read holds the read direction.
    ///
    /// Indicates a bug: all I/O must go through the port's `PortMutex`.
    #[error("attempted RX while port locked")]
    ReadLocked,

    /// Write attempted while another write holds the write direction.
    ///
    /// Indicates a bug: all I/O must go through the port's `PortMutex`.
    #[error("attempted TX while port locked")]
    WriteLocked,

    /// Underlying stream failed.
    #[error("port I/O error: {0}")]
    Io(String),
}

impl PortError {
    /// True for lock-discipline violations, which indicate a bug rather than
    /// a device or cable problem.
    pub fn is_lock_violation(&self) -> bool {
        matches!(self, Self::ReadLocked | Self::WriteLocked)
    }
}

impl From<io::Error> for PortError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Errors from host port selection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PickError {
    /// The user dismissed port selection without choosing.
    #[error("user cancelled port selection")]
    Cancelled,

    /// The chosen port is held by another process or session.
    #[error("selected port already in use")]
    Unavailable,

    /// Any other failure opening the port.
    #[error("failed to open port: {0}")]
    Io(String),
}

/// Errors establishing a [`DeviceSession`](crate::DeviceSession).
///
/// Each variant is a distinct user-facing outcome: cancelled, busy,
/// unrecognized device, or a generic failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// The user dismissed port selection.
    #[error("user cancelled port selection")]
    Cancelled,

    /// The port is already in use.
    #[error("selected port already in use")]
    Unavailable,

    /// Neither dialect identified itself on the port.
    #[error("unrecognized firmware")]
    UnrecognizedFirmware,

    /// Opening the port failed for another reason.
    #[error("connection failed: {0}")]
    Transport(String),
}

impl ConnectError {
    /// Returns true if retrying the same port may succeed.
    ///
    /// A busy port may be released. A cancelled selection or an unrecognized
    /// device needs user action first.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

impl From<PickError> for ConnectError {
    fn from(err: PickError) -> Self {
        match err {
            PickError::Cancelled => Self::Cancelled,
            PickError::Unavailable => Self::Unavailable,
            PickError::Io(msg) => Self::Transport(msg),
        }
    }
}

/// Errors from firmware requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FirmwareError {
    /// The queued transaction failed and produced no reply.
    ///
    /// The underlying cause was logged at the queue boundary.
    #[error("no reply from device")]
    NoReply,

    /// The request could not be encoded or the reply could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}
