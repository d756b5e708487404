//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    /// Tile extent is zero, so tile-local coordinates cannot be scaled.
    #[error("tile extent must be a positive integer")]
    InvalidExtent,

    /// Tile id string is not in the `zoom-col-row` form.
    #[error("invalid tile id: {0}")]
    InvalidTileId(String),
}
