//! Binary-level errors.

use std::{io, path::PathBuf};

use ledmarquee_core::{ConnectError, FirmwareError};
use ledmarquee_proto::ProtocolError;
use thiserror::Error;

/// Anything that ends a command early.
#[derive(Error, Debug)]
pub enum CliError {
    /// Grid file could not be read.
    #[error("failed to read grid file {path}: {source}")]
    GridRead {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Grid file holds something other than numbers.
    #[error("grid file line {line}: '{token}' is not a number")]
    GridParse {
        /// 1-based line number
        line: usize,
        /// Offending token
        token: String,
    },

    /// Grid file rows are ragged or empty.
    #[error("grid file: {0}")]
    GridShape(#[from] ProtocolError),

    /// Could not establish a session.
    #[error("{port}: {source}")]
    Connect {
        /// Port that failed
        port: String,
        /// Why
        source: ConnectError,
    },

    /// The device did not do what was asked.
    #[error(transparent)]
    Firmware(#[from] FirmwareError),

    /// Waiting for Ctrl-C failed.
    #[error("signal handling failed: {0}")]
    Signal(io::Error),

    /// The marquee runtime went away before it was set up.
    #[error("marquee runtime stopped before setup finished")]
    RuntimeStopped,
}
