//! Error types for wire encoding and reply decoding.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding commands or decoding replies.
///
/// None of these indicate a transport failure. A short or garbled reply
/// means the device on the other end did not answer in this dialect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Grid does not match the module's pixel dimensions.
    #[error("grid is {actual_rows}x{actual_cols}, expected {rows}x{cols}")]
    GridDimensions {
        /// Required row count
        rows: usize,
        /// Required column count
        cols: usize,
        /// Row count of the supplied grid
        actual_rows: usize,
        /// Column count of the supplied grid
        actual_cols: usize,
    },

    /// Nested row data had rows of differing lengths.
    #[error("ragged grid: row {row} has {len} columns, expected {expected}")]
    RaggedGrid {
        /// Offending row index
        row: usize,
        /// Length of that row
        len: usize,
        /// Length of row 0
        expected: usize,
    },

    /// Reply length differs from the dialect's fixed reply size.
    #[error("reply length mismatch: expected {expected} bytes, got {actual}")]
    ReplyLength {
        /// Fixed reply size of the dialect
        expected: usize,
        /// Bytes actually received before the read completed or timed out
        actual: usize,
    },

    /// Identification reply did not match the expected pattern.
    #[error("identification mismatch: {0:?}")]
    IdentMismatch(String),
}
