//! Firmware dialects behind one interface.
//!
//! Both dialects expose the same three operations through [`Firmware`]. A
//! session holds a [`Dialect`], chosen at connect time either explicitly or
//! by [`detect`].

mod official;
mod sigroot;

use std::{fmt, future::Future};

use ledmarquee_proto::{PixelGrid, VersionInfo, official::BitDepth};
pub use official::OfficialFirmware;
pub use sigroot::SigrootFirmware;

use crate::{
    PortMutex,
    error::{ConnectError, FirmwareError},
};

/// Coalescing key shared by every draw path.
pub const DRAW_KEY: &str = "drawMatrix";

/// Dialect-neutral module operations.
pub trait Firmware: Send + Sync {
    /// Probe whether the device speaks this dialect.
    ///
    /// A mismatch, a short reply, or a failed transaction is `false`, never
    /// an error.
    fn verify_firmware(&self) -> impl Future<Output = bool> + Send;

    /// Query the firmware version.
    fn version(&self) -> impl Future<Output = Result<VersionInfo, FirmwareError>> + Send;

    /// Show `grid` on the module.
    ///
    /// Grids are validated and encoded before anything is queued; an invalid
    /// grid is an error. Once queued, the draw is coalesced with other draws
    /// and its transmission failures are logged, not returned.
    fn draw(&self, grid: &PixelGrid) -> impl Future<Output = Result<(), FirmwareError>> + Send;
}

/// Which dialect a session speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectKind {
    /// Vendor firmware (Dialect A)
    Official,
    /// Sigroot community firmware (Dialect B)
    Sigroot,
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Official => f.write_str("framework-official"),
            Self::Sigroot => f.write_str("sigroot"),
        }
    }
}

/// A concrete dialect bound to a port.
pub enum Dialect {
    /// Vendor firmware
    Official(OfficialFirmware),
    /// Sigroot firmware
    Sigroot(SigrootFirmware),
}

impl Dialect {
    /// Dialect tag.
    pub fn kind(&self) -> DialectKind {
        match self {
            Self::Official(_) => DialectKind::Official,
            Self::Sigroot(_) => DialectKind::Sigroot,
        }
    }
}

impl Firmware for Dialect {
    async fn verify_firmware(&self) -> bool {
        match self {
            Self::Official(fw) => fw.verify_firmware().await,
            Self::Sigroot(fw) => fw.verify_firmware().await,
        }
    }

    async fn version(&self) -> Result<VersionInfo, FirmwareError> {
        match self {
            Self::Official(fw) => fw.version().await,
            Self::Sigroot(fw) => fw.version().await,
        }
    }

    async fn draw(&self, grid: &PixelGrid) -> Result<(), FirmwareError> {
        match self {
            Self::Official(fw) => fw.draw(grid).await,
            Self::Sigroot(fw) => fw.draw(grid).await,
        }
    }
}

/// Probe `port` for a known dialect.
///
/// Tries the official dialect first, then sigroot, one after the other on
/// the same queue. `bit_depth` applies if the official dialect is adopted.
///
/// # Errors
///
/// - `ConnectError::UnrecognizedFirmware` if neither dialect identifies
pub async fn detect(port: &PortMutex, bit_depth: BitDepth) -> Result<Dialect, ConnectError> {
    let official = OfficialFirmware::new(port.clone(), bit_depth);
    if official.verify_firmware().await {
        return Ok(Dialect::Official(official));
    }
    tracing::debug!(port = %port.label(), "official firmware probe did not match");

    let sigroot = SigrootFirmware::new(port.clone());
    if sigroot.verify_firmware().await {
        return Ok(Dialect::Sigroot(sigroot));
    }
    tracing::debug!(port = %port.label(), "sigroot firmware probe did not match");

    Err(ConnectError::UnrecognizedFirmware)
}
