//! Device layer for LED matrix modules.
//!
//! Everything that touches a module's byte stream goes through this crate.
//! A [`DeviceSession`] owns one [`PortMutex`], which owns the only
//! [`PortOperations`] for that stream, so every transaction on a port is
//! serialized through a single FIFO queue.
//!
//! # Components
//!
//! - [`PortOperations`]: raw `rx`/`tx` with direction locks, read timeout,
//!   and write teardown
//! - [`PortMutex`]: per-port work queue with idempotent coalescing
//! - [`Firmware`]: dialect-neutral `verify_firmware`/`version`/`draw`,
//!   implemented by [`OfficialFirmware`] and [`SigrootFirmware`]
//! - [`detect`]: sequential dialect probing
//! - [`PortPicker`]: boundary to the host's port selection
//! - [`connect`]: pick, open, detect, and return a [`DeviceSession`]
//!
//! # Runtime
//!
//! [`PortMutex::new`] spawns its worker with `tokio::spawn`, so sessions must
//! be created from within a Tokio runtime.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod env;
mod error;
pub mod firmware;
mod picker;
mod port_mutex;
mod session;
mod transport;

pub use env::{Environment, SystemEnv};
pub use error::{ConnectError, FirmwareError, PickError, PortError};
pub use firmware::{
    DRAW_KEY, Dialect, DialectKind, Firmware, OfficialFirmware, SigrootFirmware, detect,
};
pub use ledmarquee_proto::{PixelGrid, VersionInfo, official::BitDepth};
pub use picker::{PickedPort, PortInfo, PortPicker};
pub use port_mutex::PortMutex;
pub use session::{DEFAULT_READ_TIMEOUT, DeviceSession, DialectChoice, SessionConfig, connect};
pub use transport::{PortOperations, Transport};
