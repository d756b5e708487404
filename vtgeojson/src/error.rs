//! Error types used by the crate.

use thiserror::Error;
use vtgeojson_mvt::error::MvtError;
use vtgeojson_types::TypesError;

/// Conversion error.
#[derive(Debug, Error)]
pub enum VtGeoJsonError {
    /// Layer extent is zero. Aborts the conversion.
    #[error("tile extent must be a positive integer")]
    InvalidExtent,

    /// Tile id is not in the `zoom-col-row` form. Aborts the conversion.
    #[error("invalid tile id: {0}")]
    InvalidTileId(String),

    /// Feature geometry type cannot be classified. Only the feature is skipped.
    #[error("unsupported geometry type: {0:?}")]
    UnsupportedGeometryType(Option<i32>),

    /// Property value is not a string, number or boolean.
    #[error("malformed properties: {0}")]
    MalformedProperties(String),

    /// Tile bytes cannot be decoded.
    #[error("failed to decode tile: {0}")]
    Decoding(#[from] MvtError),

    /// Output cannot be serialized.
    #[error("failed to serialize GeoJSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<TypesError> for VtGeoJsonError {
    fn from(value: TypesError) -> Self {
        match value {
            TypesError::InvalidExtent => Self::InvalidExtent,
            TypesError::InvalidTileId(s) => Self::InvalidTileId(s),
        }
    }
}
