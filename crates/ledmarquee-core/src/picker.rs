//! Boundary to the host's port selection.

use std::{fmt, future::Future};

use crate::{error::PickError, transport::Transport};

/// Identifying details of a picked port.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortInfo {
    /// Human-readable name, e.g. a device path.
    pub label: String,
    /// USB vendor id, if the host reports one.
    pub vendor_id: Option<u16>,
    /// USB product id, if the host reports one.
    pub product_id: Option<u16>,
}

impl PortInfo {
    /// Info with only a label.
    pub fn labelled(label: impl Into<String>) -> Self {
        Self { label: label.into(), ..Self::default() }
    }
}

impl fmt::Display for PortInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)?;
        if let (Some(vid), Some(pid)) = (self.vendor_id, self.product_id) {
            write!(f, " ({vid:04x}:{pid:04x})")?;
        }
        Ok(())
    }
}

/// An opened port, ready to be handed to a session.
pub struct PickedPort {
    /// Byte stream to the device.
    pub transport: Box<dyn Transport>,
    /// What was picked.
    pub info: PortInfo,
}

impl PickedPort {
    /// Bundle an opened transport with its info.
    pub fn new(transport: impl Transport, info: PortInfo) -> Self {
        Self { transport: Box::new(transport), info }
    }
}

impl fmt::Debug for PickedPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PickedPort").field("info", &self.info).finish_non_exhaustive()
    }
}

/// Host-provided port selection.
///
/// Implementations decide how a port is chosen (a device path, a chooser
/// dialog, a test double) and open it.
pub trait PortPicker: Send + Sync {
    /// Let the user pick a port and open it.
    ///
    /// # Errors
    ///
    /// - `PickError::Cancelled` if the user declined to choose
    /// - `PickError::Unavailable` if the port is held elsewhere
    /// - `PickError::Io` for any other open failure
    fn pick(&self) -> impl Future<Output = Result<PickedPort, PickError>> + Send;
}
