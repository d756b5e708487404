//! Error type used by the crate.

use thiserror::Error;

/// Error returned when a tile cannot be decoded.
#[derive(Debug, Clone, Error)]
pub enum MvtError {
    /// Tile bytes are not a valid protobuf message.
    #[error("proto error: {0}")]
    Proto(String),

    /// Message is valid protobuf but breaks the vector tile format.
    #[error("{0}")]
    Generic(String),
}
