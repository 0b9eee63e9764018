//! Error types for the composition layer.

use ledmarquee_core::FirmwareError;
use thiserror::Error;

/// A flush reached its sinks but at least one rejected the frame.
///
/// The other sinks still received it; failures never cancel the fan-out.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlushError {
    /// One or more sinks returned an error.
    #[error("{failed} of {total} sinks rejected the frame: {first}")]
    Rejected {
        /// Sinks that failed
        failed: usize,
        /// Sinks the frame was sent to
        total: usize,
        /// First failure, in sink order
        first: FirmwareError,
    },
}
