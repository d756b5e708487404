use serde::{Deserialize, Serialize};

/// Integer coordinate in the tile-local grid. `(0, 0)` is the top-left corner of the tile, `y` grows
/// downwards. Coordinates outside of `0..extent` belong to the tile buffer.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePoint {
    /// Column in the tile grid.
    pub x: i64,
    /// Row in the tile grid.
    pub y: i64,
}

impl TilePoint {
    /// Creates a new point.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl From<(i64, i64)> for TilePoint {
    fn from((x, y): (i64, i64)) -> Self {
        Self { x, y }
    }
}
