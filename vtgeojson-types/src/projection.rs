//! Conversion of tile-local coordinates into WGS84 longitude and latitude using the spherical
//! Web-Mercator slippy-map scheme.
//!
//! All computations are done in `f64`. At zoom 20 and above one tile-local unit is a few
//! millimeters, so any `f32` step in the chain produces visible drift.

use std::f64::consts::PI;

use crate::error::TypesError;
use crate::{LatLng, TileId, TilePoint};

/// Projects a single tile-local coordinate into WGS84.
///
/// Fails with [`TypesError::InvalidExtent`] if `extent` is zero.
///
/// ```
/// use vtgeojson_types::{project, TileId, TilePoint};
///
/// let point = project(TilePoint::new(0, 0), TileId::new(0, 0, 0), 4096).unwrap();
/// assert_eq!(point.longitude, -180.0);
/// ```
pub fn project(coord: TilePoint, tile: TileId, extent: u32) -> Result<LatLng, TypesError> {
    Ok(TileProjection::new(tile, extent)?.project(coord))
}

/// Projection of one tile's coordinate grid. The extent is validated once on construction, after
/// which projecting points cannot fail.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TileProjection {
    tile: TileId,
    extent: u32,
    world_size: f64,
}

impl TileProjection {
    /// Creates a projection for the given tile with `extent` units along each tile side.
    pub fn new(tile: TileId, extent: u32) -> Result<Self, TypesError> {
        if extent == 0 {
            return Err(TypesError::InvalidExtent);
        }

        Ok(Self::with_extent(tile, extent))
    }

    pub(crate) fn unit(tile: TileId) -> Self {
        Self::with_extent(tile, 1)
    }

    fn with_extent(tile: TileId, extent: u32) -> Self {
        let zoom = i32::try_from(tile.zoom).unwrap_or(i32::MAX);
        Self {
            tile,
            extent,
            world_size: 2f64.powi(zoom),
        }
    }

    /// Tile of the projection.
    pub fn tile(&self) -> TileId {
        self.tile
    }

    /// Number of grid units along one side of the tile.
    pub fn extent(&self) -> u32 {
        self.extent
    }

    /// Projects a tile-local point.
    pub fn project(&self, point: TilePoint) -> LatLng {
        let extent = f64::from(self.extent);
        let x = (self.tile.column as f64 + point.x as f64 / extent) / self.world_size;
        let y = (self.tile.row as f64 + point.y as f64 / extent) / self.world_size;

        LatLng::new(x * 360.0 - 180.0, mercator_y_to_lat(y))
    }
}

/// Inverse Web-Mercator for the normalized `y` in `[0, 1]`, `0` being the northern edge.
fn mercator_y_to_lat(y: f64) -> f64 {
    (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees()
}
