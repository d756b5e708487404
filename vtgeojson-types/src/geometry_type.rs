use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Kind of a vector tile feature geometry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    /// One or more points.
    Point,
    /// One or more line strings.
    LineString,
    /// One or more polygon rings.
    Polygon,
    /// Geometry type not set or not known. Features of this type never produce geometry.
    Unknown,
}

/// GeoJSON names by geometry type: `(type, singular, multi)`.
const GEOJSON_NAMES: [(GeometryType, &str, &str); 3] = [
    (GeometryType::Point, "Point", "MultiPoint"),
    (GeometryType::LineString, "LineString", "MultiLineString"),
    (GeometryType::Polygon, "Polygon", "MultiPolygon"),
];

impl GeometryType {
    /// Converts the raw `GeomType` value of an MVT feature.
    pub fn from_mvt(value: Option<i32>) -> Self {
        match value {
            Some(1) => Self::Point,
            Some(2) => Self::LineString,
            Some(3) => Self::Polygon,
            _ => Self::Unknown,
        }
    }

    /// GeoJSON type name of the geometry, in its singular or `Multi` form. Returns `None` for
    /// [`GeometryType::Unknown`].
    pub fn geojson_name(&self, multi: bool) -> Option<&'static str> {
        GEOJSON_NAMES
            .iter()
            .find(|(geometry_type, ..)| geometry_type == self)
            .map(|(_, single, multi_name)| if multi { *multi_name } else { *single })
    }
}

impl Display for GeometryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.geojson_name(false) {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "Unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geojson_names() {
        assert_eq!(GeometryType::Point.geojson_name(false), Some("Point"));
        assert_eq!(GeometryType::Point.geojson_name(true), Some("MultiPoint"));
        assert_eq!(
            GeometryType::LineString.geojson_name(true),
            Some("MultiLineString")
        );
        assert_eq!(GeometryType::Polygon.geojson_name(false), Some("Polygon"));
        assert_eq!(GeometryType::Unknown.geojson_name(false), None);
        assert_eq!(GeometryType::Unknown.geojson_name(true), None);
    }

    #[test]
    fn from_mvt() {
        assert_eq!(GeometryType::from_mvt(Some(1)), GeometryType::Point);
        assert_eq!(GeometryType::from_mvt(Some(2)), GeometryType::LineString);
        assert_eq!(GeometryType::from_mvt(Some(3)), GeometryType::Polygon);
        assert_eq!(GeometryType::from_mvt(Some(0)), GeometryType::Unknown);
        assert_eq!(GeometryType::from_mvt(Some(42)), GeometryType::Unknown);
        assert_eq!(GeometryType::from_mvt(None), GeometryType::Unknown);
    }

    #[test]
    fn display() {
        assert_eq!(GeometryType::LineString.to_string(), "LineString");
        assert_eq!(GeometryType::Unknown.to_string(), "Unknown");
    }
}
