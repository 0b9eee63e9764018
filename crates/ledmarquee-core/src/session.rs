//! Connected device sessions.

use std::{fmt, str::FromStr, time::Duration};

use ledmarquee_proto::{PixelGrid, VersionInfo, official::BitDepth};

use crate::{
    PortMutex,
    error::{ConnectError, FirmwareError},
    firmware::{Dialect, DialectKind, Firmware, OfficialFirmware, SigrootFirmware, detect},
    picker::{PickedPort, PortInfo, PortPicker},
};

/// Read timeout applied to every `rx` unless configured otherwise.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(3);

/// How a session chooses its dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DialectChoice {
    /// Probe the device.
    #[default]
    Auto,
    /// Assume vendor firmware without probing.
    Official,
    /// Assume sigroot firmware without probing.
    Sigroot,
}

impl fmt::Display for DialectChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Official => f.write_str("official"),
            Self::Sigroot => f.write_str("sigroot"),
        }
    }
}

impl FromStr for DialectChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "official" | "framework-official" => Ok(Self::Official),
            "sigroot" => Ok(Self::Sigroot),
            other => Err(format!("unknown dialect '{other}' (expected auto, official, or sigroot)")),
        }
    }
}

/// Session parameters.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Dialect selection.
    pub dialect: DialectChoice,
    /// Draw path used if the official dialect is chosen.
    pub bit_depth: BitDepth,
    /// Timeout for each read.
    pub read_timeout: Duration,
    /// Log label override. Defaults to the picked port's label.
    pub label: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dialect: DialectChoice::Auto,
            bit_depth: BitDepth::default(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            label: None,
        }
    }
}

/// A connected module: one port, one queue, one dialect.
///
/// All operations are forwarded to the dialect, so every byte on the wire
/// passes through the session's [`PortMutex`].
pub struct DeviceSession {
    info: PortInfo,
    dialect: Dialect,
    port: PortMutex,
}

impl DeviceSession {
    /// Build a session on an already-opened port.
    ///
    /// Probes the device unless `config` names a dialect.
    ///
    /// # Errors
    ///
    /// - `ConnectError::UnrecognizedFirmware` if probing finds no dialect
    pub async fn open(picked: PickedPort, config: &SessionConfig) -> Result<Self, ConnectError> {
        let PickedPort { transport, info } = picked;
        let label = config.label.clone().unwrap_or_else(|| info.label.clone());
        let port = PortMutex::from_transport(transport, config.read_timeout, label);

        let dialect = match config.dialect {
            DialectChoice::Auto => detect(&port, config.bit_depth).await?,
            DialectChoice::Official => {
                Dialect::Official(OfficialFirmware::new(port.clone(), config.bit_depth))
            },
            DialectChoice::Sigroot => Dialect::Sigroot(SigrootFirmware::new(port.clone())),
        };

        tracing::info!(port = %port.label(), dialect = %dialect.kind(), "connected");
        Ok(Self { info, dialect, port })
    }

    /// What was picked.
    pub fn info(&self) -> &PortInfo {
        &self.info
    }

    /// Dialect in use.
    pub fn dialect_kind(&self) -> DialectKind {
        self.dialect.kind()
    }

    /// Log label of the port.
    pub fn label(&self) -> &str {
        self.port.label()
    }

    /// The session's queue. Useful for sharing the port with raw operations.
    pub fn port(&self) -> &PortMutex {
        &self.port
    }

    /// Re-run the dialect probe on the live port.
    pub async fn verify_firmware(&self) -> bool {
        self.dialect.verify_firmware().await
    }

    /// Query the firmware version.
    pub async fn version(&self) -> Result<VersionInfo, FirmwareError> {
        self.dialect.version().await
    }

    /// Show `grid` on the module.
    pub async fn draw(&self, grid: &PixelGrid) -> Result<(), FirmwareError> {
        self.dialect.draw(grid).await
    }
}

impl fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSession")
            .field("info", &self.info)
            .field("dialect", &self.dialect.kind())
            .finish_non_exhaustive()
    }
}

/// Pick a port through `picker`, open it, and establish a session.
///
/// # Errors
///
/// - `ConnectError::Cancelled` if the user declined to pick
/// - `ConnectError::Unavailable` if the port is busy
/// - `ConnectError::Transport` for other open failures
/// - `ConnectError::UnrecognizedFirmware` if probing finds no dialect
pub async fn connect<P: PortPicker>(
    picker: &P,
    config: &SessionConfig,
) -> Result<DeviceSession, ConnectError> {
    let picked = picker.pick().await?;
    DeviceSession::open(picked, config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_choice_parses_case_insensitively() {
        assert_eq!("AUTO".parse::<DialectChoice>(), Ok(DialectChoice::Auto));
        assert_eq!("Official".parse::<DialectChoice>(), Ok(DialectChoice::Official));
        assert_eq!("framework-official".parse::<DialectChoice>(), Ok(DialectChoice::Official));
        assert_eq!("sigroot".parse::<DialectChoice>(), Ok(DialectChoice::Sigroot));
        assert!("qmk".parse::<DialectChoice>().is_err());
    }

    #[test]
    fn dialect_choice_display_roundtrips() {
        for choice in [DialectChoice::Auto, DialectChoice::Official, DialectChoice::Sigroot] {
            assert_eq!(choice.to_string().parse::<DialectChoice>(), Ok(choice));
        }
    }

    #[test]
    fn default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.dialect, DialectChoice::Auto);
        assert_eq!(config.bit_depth, BitDepth::Mono1);
        assert_eq!(config.read_timeout, DEFAULT_READ_TIMEOUT);
        assert!(config.label.is_none());
    }
}
