//! Projection of feature geometry parts into geographic coordinates.

use vtgeojson_mvt::{MvtFeature, MvtGeometry, MvtPart};
use vtgeojson_types::{GeometryType, LatLng, TileId, TilePoint, TileProjection};

use crate::error::VtGeoJsonError;

/// Sign of a ring area computed with the surveyor's formula in tile coordinates (`y` pointing
/// down). Rings of well-formed tiles have positive area for exteriors and negative for holes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Winding {
    /// Positive area, clockwise on screen.
    Positive,
    /// Negative area, counter-clockwise on screen.
    Negative,
    /// Zero area.
    Degenerate,
}

impl Winding {
    /// Winding of a ring. The closing edge is taken into account whether or not the last point
    /// repeats the first one.
    pub fn of_ring(ring: &[TilePoint]) -> Self {
        let n = ring.len();
        let doubled_area: i128 = (0..n)
            .map(|i| {
                let a = ring[i];
                let b = ring[(i + 1) % n];
                i128::from(a.x) * i128::from(b.y) - i128::from(b.x) * i128::from(a.y)
            })
            .sum();

        match doubled_area {
            0 => Self::Degenerate,
            v if v > 0 => Self::Positive,
            _ => Self::Negative,
        }
    }
}

/// Feature geometry with every coordinate projected, parts in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedGeometry {
    /// Type of the source geometry.
    pub geometry_type: GeometryType,
    /// Projected parts, one per source part.
    pub parts: Vec<Vec<LatLng>>,
    /// Windings of the source parts for polygons, empty for other types.
    pub windings: Vec<Winding>,
}

impl ProjectedGeometry {
    /// Returns `true` if there are no parts, in which case no GeoJSON geometry is produced.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Returns `true` if the geometry has more than one part.
    pub fn is_multi(&self) -> bool {
        self.parts.len() > 1
    }
}

/// Projects all parts of a geometry. Part count and order are kept as is, nothing is merged or
/// dropped. Returns [`VtGeoJsonError::UnsupportedGeometryType`] for unknown geometries.
pub fn classify(
    geometry: &MvtGeometry,
    projection: &TileProjection,
) -> Result<ProjectedGeometry, VtGeoJsonError> {
    let geometry_type = geometry.geometry_type();
    if let MvtGeometry::Unknown(raw) = geometry {
        return Err(VtGeoJsonError::UnsupportedGeometryType(*raw));
    }

    let parts = geometry.parts();
    let windings = match geometry_type {
        GeometryType::Polygon => parts.iter().map(|ring| Winding::of_ring(ring)).collect(),
        _ => vec![],
    };

    Ok(ProjectedGeometry {
        geometry_type,
        parts: parts.iter().map(|part| project_part(part, projection)).collect(),
        windings,
    })
}

/// Projects the geometry of a feature stored in `tile` with the given layer extent.
///
/// Fails with [`VtGeoJsonError::InvalidExtent`] if `extent` is zero.
pub fn classify_feature(
    feature: &MvtFeature,
    tile: TileId,
    extent: u32,
) -> Result<ProjectedGeometry, VtGeoJsonError> {
    classify(&feature.geometry, &TileProjection::new(tile, extent)?)
}

fn project_part(part: &MvtPart, projection: &TileProjection) -> Vec<LatLng> {
    part.iter().map(|p| projection.project(*p)).collect()
}
