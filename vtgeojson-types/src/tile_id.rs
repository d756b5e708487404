use std::fmt::{Display, Formatter};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypesError;
use crate::lat_lng::LatLngBounds;
use crate::projection::TileProjection;
use crate::TilePoint;

/// Address of a tile in the OSM slippy-map scheme: rows are counted from the north.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileId {
    /// Zoom level.
    pub zoom: u32,
    /// Column (x index) of the tile.
    pub column: u64,
    /// Row (y index) of the tile.
    pub row: u64,
}

impl TileId {
    /// Creates a new tile id.
    pub const fn new(zoom: u32, column: u64, row: u64) -> Self {
        Self { zoom, column, row }
    }

    /// Reads tile id from a file name like `14-8192-5461.mvt` or `/tiles/14-8192-5461.pbf.gz`.
    ///
    /// Only the part of the file name before the first `.` is considered.
    pub fn from_file_name(path: impl AsRef<Path>) -> Result<Self, TypesError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| TypesError::InvalidTileId(path.display().to_string()))?;

        let stem = file_name
            .split('.')
            .find(|segment| !segment.is_empty())
            .ok_or_else(|| TypesError::InvalidTileId(file_name.to_string()))?;

        stem.parse()
    }

    /// Geographic bounds of the tile.
    pub fn bounds(&self) -> LatLngBounds {
        // Extent of 1 is always valid.
        let projection = TileProjection::unit(*self);
        LatLngBounds {
            north_west: projection.project(TilePoint::new(0, 0)),
            south_east: projection.project(TilePoint::new(1, 1)),
        }
    }
}

impl FromStr for TileId {
    type Err = TypesError;

    /// Parses `zoom-col-row`. Empty tokens produced by repeated separators are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split('-').filter(|t| !t.is_empty()).collect();
        let [zoom, column, row] = tokens.as_slice() else {
            return Err(TypesError::InvalidTileId(format!(
                "expected zoom-col-row, got '{s}'"
            )));
        };

        let zoom = zoom
            .parse::<u32>()
            .map_err(|_| TypesError::InvalidTileId(format!("could not parse zoom: {zoom}")))?;
        let column = column
            .parse::<u64>()
            .map_err(|_| TypesError::InvalidTileId(format!("could not parse column: {column}")))?;
        let row = row
            .parse::<u64>()
            .map_err(|_| TypesError::InvalidTileId(format!("could not parse row: {row}")))?;

        Ok(Self { zoom, column, row })
    }
}

impl Display for TileId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.zoom, self.column, self.row)
    }
}
