//! GeoJSON geometry, feature and feature collection output.
//!
//! Output is built as `geojson` values and written with `serde_json`, so numbers are always
//! formatted with a `.` decimal separator, whatever the process locale is.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, PolygonType, Position, Value};
use serde::{Deserialize, Serialize};
use vtgeojson_mvt::MvtValue;
use vtgeojson_types::{GeometryType, LatLng};

use crate::error::VtGeoJsonError;
use crate::partition::{ProjectedGeometry, Winding};
use crate::properties::{PropertyEncoding, PropertySerializer};

/// Non-standard property carrying the name of the source layer.
pub const LAYER_PROPERTY: &str = "lyr";

/// Feature id property.
pub const ID_PROPERTY: &str = "id";

/// How rings of a polygon feature with several parts are grouped into polygons.
///
/// Vector tiles store all rings of a (multi)polygon in one flat list, so "one polygon with a hole"
/// and "two polygons" both come as two parts.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolygonRings {
    /// Rings are grouped by winding order. The first non-degenerate ring sets the winding of
    /// exterior rings; every ring with the same winding starts a new polygon and every ring with
    /// the opposite winding is a hole of the preceding polygon. Rings with zero area are dropped.
    #[default]
    Winding,
    /// Every part is a separate single-ring polygon.
    PerPart,
}

/// Builds GeoJSON values out of projected geometries.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct GeoJsonEncoder {
    polygon_rings: PolygonRings,
    properties: PropertySerializer,
}

impl GeoJsonEncoder {
    /// Creates a new encoder.
    pub fn new(polygon_rings: PolygonRings, property_encoding: PropertyEncoding) -> Self {
        Self {
            polygon_rings,
            properties: PropertySerializer::new(property_encoding),
        }
    }

    /// Property serializer used for feature properties.
    pub fn property_serializer(&self) -> &PropertySerializer {
        &self.properties
    }

    /// Converts projected geometry into a GeoJSON geometry value. Returns `None` if the geometry
    /// is of unknown type or has no points.
    ///
    /// | type       | parts | result                                      |
    /// |------------|-------|---------------------------------------------|
    /// | Point      | 1     | `Point` (`MultiPoint` if the part has more points) |
    /// | Point      | >1    | `MultiPoint` with points of all parts       |
    /// | LineString | 1     | `LineString`                                |
    /// | LineString | >1    | `MultiLineString`, one line per part        |
    /// | LineString | *     | parts with less than 2 points are dropped   |
    /// | Polygon    | 1     | `Polygon`                                   |
    /// | Polygon    | >1    | depends on [`PolygonRings`]                 |
    pub fn geometry_value(&self, geometry: &ProjectedGeometry) -> Option<Value> {
        if geometry.is_empty() {
            return None;
        }

        match geometry.geometry_type {
            GeometryType::Point => point_value(&geometry.parts),
            GeometryType::LineString => line_value(&geometry.parts),
            GeometryType::Polygon => match self.polygon_rings {
                PolygonRings::PerPart => Some(polygon_per_part_value(&geometry.parts)),
                PolygonRings::Winding => {
                    polygon_by_winding_value(&geometry.parts, &geometry.windings)
                }
            },
            GeometryType::Unknown => None,
        }
    }

    /// Same as [`GeoJsonEncoder::geometry_value`], wrapped into a GeoJSON geometry object.
    pub fn geometry(&self, geometry: &ProjectedGeometry) -> Option<Geometry> {
        self.geometry_value(geometry).map(Geometry::new)
    }

    /// Writes geometry object text, `None` if there is no geometry.
    pub fn encode_geometry(
        &self,
        geometry: &ProjectedGeometry,
    ) -> Result<Option<String>, VtGeoJsonError> {
        self.geometry(geometry)
            .map(|g| serde_json::to_string(&g))
            .transpose()
            .map_err(Into::into)
    }

    /// Builds a feature. Properties start with the feature `id` and the source layer name
    /// ([`LAYER_PROPERTY`]), followed by the feature attributes in order. Attributes named like
    /// one of the first two are skipped with a warning.
    ///
    /// Returns `Ok(None)` if the feature has no geometry; such features must not be written.
    pub fn feature(
        &self,
        id: u64,
        layer_name: &str,
        geometry: &ProjectedGeometry,
        properties: &[(String, MvtValue)],
    ) -> Result<Option<Feature>, VtGeoJsonError> {
        let Some(geometry) = self.geometry(geometry) else {
            return Ok(None);
        };

        let mut object = JsonObject::new();
        object.insert(ID_PROPERTY.into(), id.into());
        object.insert(LAYER_PROPERTY.into(), layer_name.into());
        for (key, value) in properties {
            if key == ID_PROPERTY || key == LAYER_PROPERTY {
                log::warn!(
                    "Feature {id} of layer {layer_name}: attribute '{key}' has a reserved name, skipping"
                );
                continue;
            }

            object.insert(key.clone(), self.properties.encode_value(key, value)?);
        }

        Ok(Some(Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: Some(object),
            foreign_members: None,
        }))
    }

    /// Writes feature text, `None` if the feature has no geometry.
    pub fn encode_feature(
        &self,
        id: u64,
        layer_name: &str,
        geometry: &ProjectedGeometry,
        properties: &[(String, MvtValue)],
    ) -> Result<Option<String>, VtGeoJsonError> {
        match self.feature(id, layer_name, geometry, properties)? {
            Some(feature) => Ok(Some(serde_json::to_string(&feature)?)),
            None => Ok(None),
        }
    }

    /// Wraps features into a collection, keeping their order.
    pub fn feature_collection(features: Vec<Feature>) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    /// Writes feature collection text.
    pub fn encode_feature_collection(
        collection: &FeatureCollection,
    ) -> Result<String, VtGeoJsonError> {
        Ok(serde_json::to_string(collection)?)
    }
}

fn positions(part: &[LatLng]) -> Vec<Position> {
    part.iter().map(LatLng::to_position).collect()
}

fn point_value(parts: &[Vec<LatLng>]) -> Option<Value> {
    let mut points = parts.iter().flatten();
    let first = points.next()?;
    if parts.len() == 1 && parts[0].len() == 1 {
        return Some(Value::Point(first.to_position()));
    }

    Some(Value::MultiPoint(
        std::iter::once(first)
            .chain(points)
            .map(LatLng::to_position)
            .collect(),
    ))
}

fn line_value(parts: &[Vec<LatLng>]) -> Option<Value> {
    let mut lines: Vec<Vec<Position>> = parts
        .iter()
        .filter(|part| {
            if part.len() < 2 {
                log::debug!("Skipping line part with {} points", part.len());
            }
            part.len() >= 2
        })
        .map(|part| positions(part))
        .collect();

    match lines.len() {
        0 => None,
        1 => lines.pop().map(Value::LineString),
        _ => Some(Value::MultiLineString(lines)),
    }
}

fn polygon_per_part_value(parts: &[Vec<LatLng>]) -> Value {
    match parts {
        [ring] => Value::Polygon(vec![positions(ring)]),
        _ => Value::MultiPolygon(parts.iter().map(|ring| vec![positions(ring)]).collect()),
    }
}

fn polygon_by_winding_value(parts: &[Vec<LatLng>], windings: &[Winding]) -> Option<Value> {
    let mut polygons: Vec<PolygonType> = vec![];
    let mut exterior_winding = None;

    for (ring, winding) in parts.iter().zip(windings) {
        if *winding == Winding::Degenerate {
            log::debug!("Skipping polygon ring with zero area");
            continue;
        }

        let exterior = *exterior_winding.get_or_insert(*winding);
        match polygons.last_mut() {
            Some(polygon) if *winding != exterior => polygon.push(positions(ring)),
            _ => polygons.push(vec![positions(ring)]),
        }
    }

    match polygons.len() {
        0 => None,
        1 => polygons.pop().map(Value::Polygon),
        _ => Some(Value::MultiPolygon(polygons)),
    }
}

#[cfg(test)]
mod tests {
    use vtgeojson_mvt::MvtGeometry;
    use vtgeojson_types::{TileId, TilePoint, TileProjection};

    use super::*;
    use crate::partition::classify;

    fn pt(x: i64, y: i64) -> TilePoint {
        TilePoint::new(x, y)
    }

    fn projected(geometry: MvtGeometry) -> ProjectedGeometry {
        let projection = TileProjection::new(TileId::new(0, 0, 0), 4096).unwrap();
        classify(&geometry, &projection).unwrap()
    }

    fn square(x: i64, y: i64, size: i64) -> Vec<TilePoint> {
        vec![
            pt(x, y),
            pt(x + size, y),
            pt(x + size, y + size),
            pt(x, y + size),
            pt(x, y),
        ]
    }

    fn reversed(mut ring: Vec<TilePoint>) -> Vec<TilePoint> {
        ring.reverse();
        ring
    }

    fn to_json(value: &Value) -> serde_json::Value {
        serde_json::to_value(Geometry::new(value.clone())).unwrap()
    }

    #[test]
    fn single_point() {
        let geometry = projected(MvtGeometry::Point(vec![vec![pt(2048, 2048)]]));
        let value = GeoJsonEncoder::default().geometry_value(&geometry).unwrap();

        assert_eq!(value, Value::Point(vec![0.0, 0.0]));
        let json = to_json(&value);
        assert_eq!(json["type"], "Point");
        assert_eq!(json["coordinates"], serde_json::json!([0.0, 0.0]));
    }

    #[test]
    fn multi_point_from_parts() {
        let geometry = projected(MvtGeometry::Point(vec![
            vec![pt(2048, 2048)],
            vec![pt(0, 2048)],
        ]));
        let value = GeoJsonEncoder::default().geometry_value(&geometry).unwrap();

        assert_eq!(
            value,
            Value::MultiPoint(vec![vec![0.0, 0.0], vec![-180.0, 0.0]])
        );
        assert_eq!(to_json(&value)["type"], "MultiPoint");
    }

    #[test]
    fn multi_point_from_single_part() {
        let geometry = projected(MvtGeometry::Point(vec![vec![
            pt(2048, 2048),
            pt(0, 2048),
        ]]));
        assert_matches::assert_matches!(
            GeoJsonEncoder::default().geometry_value(&geometry),
            Some(Value::MultiPoint(points)) if points.len() == 2
        );
    }

    #[test]
    fn line_string() {
        let geometry = projected(MvtGeometry::LineString(vec![vec![
            pt(0, 2048),
            pt(2048, 2048),
        ]]));
        let value = GeoJsonEncoder::default().geometry_value(&geometry).unwrap();
        assert_eq!(
            value,
            Value::LineString(vec![vec![-180.0, 0.0], vec![0.0, 0.0]])
        );
    }

    #[test]
    fn multi_line_string_keeps_part_order() {
        let geometry = projected(MvtGeometry::LineString(vec![
            vec![pt(2048, 2048), pt(4096, 2048)],
            vec![pt(0, 2048), pt(1024, 2048)],
        ]));
        let value = GeoJsonEncoder::default().geometry_value(&geometry).unwrap();

        assert_eq!(
            value,
            Value::MultiLineString(vec![
                vec![vec![0.0, 0.0], vec![180.0, 0.0]],
                vec![vec![-180.0, 0.0], vec![-90.0, 0.0]],
            ])
        );
        let json = to_json(&value);
        assert_eq!(json["type"], "MultiLineString");
        assert_eq!(json["coordinates"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn single_ring_polygon() {
        let geometry = projected(MvtGeometry::Polygon(vec![square(0, 0, 2048)]));
        for rings in [PolygonRings::Winding, PolygonRings::PerPart] {
            let encoder = GeoJsonEncoder::new(rings, PropertyEncoding::Typed);
            assert_matches::assert_matches!(
                encoder.geometry_value(&geometry),
                Some(Value::Polygon(polygon)) if polygon.len() == 1 && polygon[0].len() == 5
            );
        }
    }

    #[test]
    fn polygon_with_hole() {
        let geometry = projected(MvtGeometry::Polygon(vec![
            square(0, 0, 2048),
            reversed(square(512, 512, 512)),
        ]));

        let encoder = GeoJsonEncoder::new(PolygonRings::Winding, PropertyEncoding::Typed);
        assert_matches::assert_matches!(
            encoder.geometry_value(&geometry),
            Some(Value::Polygon(polygon)) if polygon.len() == 2
        );

        let encoder = GeoJsonEncoder::new(PolygonRings::PerPart, PropertyEncoding::Typed);
        assert_matches::assert_matches!(
            encoder.geometry_value(&geometry),
            Some(Value::MultiPolygon(polygons)) if polygons.len() == 2 && polygons[0].len() == 1
        );
    }

    #[test]
    fn two_polygons() {
        let geometry = projected(MvtGeometry::Polygon(vec![
            square(0, 0, 512),
            reversed(square(100, 100, 100)),
            square(2048, 2048, 512),
        ]));

        let encoder = GeoJsonEncoder::new(PolygonRings::Winding, PropertyEncoding::Typed);
        let Some(Value::MultiPolygon(polygons)) = encoder.geometry_value(&geometry) else {
            panic!("expected multipolygon");
        };
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[0].len(), 2);
        assert_eq!(polygons[1].len(), 1);
        assert_eq!(polygons[1][0][0], vec![0.0, 0.0]);
    }

    #[test]
    fn reversed_winding_tile() {
        let geometry = projected(MvtGeometry::Polygon(vec![
            reversed(square(0, 0, 2048)),
            square(512, 512, 512),
        ]));

        let encoder = GeoJsonEncoder::default();
        assert_matches::assert_matches!(
            encoder.geometry_value(&geometry),
            Some(Value::Polygon(polygon)) if polygon.len() == 2
        );
    }

    #[test]
    fn degenerate_rings_are_dropped() {
        let flat = vec![pt(0, 0), pt(10, 0), pt(20, 0), pt(0, 0)];
        let geometry = projected(MvtGeometry::Polygon(vec![flat.clone()]));
        assert_eq!(GeoJsonEncoder::default().geometry_value(&geometry), None);

        let geometry = projected(MvtGeometry::Polygon(vec![flat, square(0, 0, 16)]));
        assert_matches::assert_matches!(
            GeoJsonEncoder::default().geometry_value(&geometry),
            Some(Value::Polygon(polygon)) if polygon.len() == 1
        );
    }

    #[test]
    fn no_geometry() {
        let encoder = GeoJsonEncoder::default();
        for geometry in [
            MvtGeometry::Point(vec![]),
            MvtGeometry::LineString(vec![]),
            MvtGeometry::Polygon(vec![]),
        ] {
            let geometry = projected(geometry);
            assert_eq!(encoder.geometry_value(&geometry), None);
            assert_eq!(encoder.encode_geometry(&geometry).unwrap(), None);
            assert!(encoder
                .feature(1, "layer", &geometry, &[])
                .unwrap()
                .is_none());
        }

        let unknown = ProjectedGeometry {
            geometry_type: GeometryType::Unknown,
            parts: vec![vec![LatLng::new(0.0, 0.0)]],
            windings: vec![],
        };
        assert_eq!(encoder.geometry_value(&unknown), None);
    }

    #[test]
    fn geometry_text() {
        let geometry = projected(MvtGeometry::Point(vec![vec![pt(1024, 2048)]]));
        assert_eq!(
            GeoJsonEncoder::default()
                .encode_geometry(&geometry)
                .unwrap()
                .unwrap(),
            r#"{"type":"Point","coordinates":[-90.0,0.0]}"#
        );
    }

    #[test]
    fn feature_properties_order() {
        let geometry = projected(MvtGeometry::Point(vec![vec![pt(1024, 2048)]]));
        let properties = vec![
            ("name".to_string(), MvtValue::String("Foo".into())),
            ("count".to_string(), MvtValue::Int64(3)),
        ];

        let encoder = GeoJsonEncoder::new(PolygonRings::Winding, PropertyEncoding::Stringify);
        let text = encoder
            .encode_feature(42, "poi", &geometry, &properties)
            .unwrap()
            .unwrap();

        assert_eq!(
            text,
            r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[-90.0,0.0]},"properties":{"id":42,"lyr":"poi","name":"Foo","count":"3"}}"#
        );
    }

    #[test]
    fn reserved_attribute_names() {
        let geometry = projected(MvtGeometry::Point(vec![vec![pt(1024, 2048)]]));
        let properties = vec![
            ("id".to_string(), MvtValue::String("Foo".into())),
            ("lyr".to_string(), MvtValue::Int64(3)),
            ("name".to_string(), MvtValue::String("Bar".into())),
        ];

        let feature = GeoJsonEncoder::default()
            .feature(42, "poi", &geometry, &properties)
            .unwrap()
            .unwrap();
        let object = feature.properties.unwrap();

        assert_eq!(object["id"], 42);
        assert_eq!(object["lyr"], "poi");
        assert_eq!(object["name"], "Bar");
        assert_eq!(object.len(), 3);
    }

    #[test]
    fn single_point_line_parts_are_dropped() {
        let encoder = GeoJsonEncoder::default();

        let geometry = projected(MvtGeometry::LineString(vec![vec![pt(0, 2048)]]));
        assert_eq!(encoder.geometry_value(&geometry), None);
        assert!(encoder
            .feature(1, "roads", &geometry, &[])
            .unwrap()
            .is_none());

        let geometry = projected(MvtGeometry::LineString(vec![
            vec![pt(0, 2048)],
            vec![pt(0, 2048), pt(2048, 2048)],
        ]));
        assert_eq!(
            encoder.geometry_value(&geometry),
            Some(Value::LineString(vec![vec![-180.0, 0.0], vec![0.0, 0.0]]))
        );
    }

    #[test]
    fn collection_keeps_order_and_parses() {
        let encoder = GeoJsonEncoder::default();
        let features = [1024, 2048, 3072]
            .into_iter()
            .enumerate()
            .map(|(i, x)| {
                let geometry = projected(MvtGeometry::Point(vec![vec![pt(x, 2048)]]));
                encoder
                    .feature(i as u64, "poi", &geometry, &[])
                    .unwrap()
                    .unwrap()
            })
            .collect();

        let collection = GeoJsonEncoder::feature_collection(features);
        let text = GeoJsonEncoder::encode_feature_collection(&collection).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["type"], "FeatureCollection");
        let ids: Vec<u64> = parsed["features"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["properties"]["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn empty_collection() {
        let collection = GeoJsonEncoder::feature_collection(vec![]);
        assert_eq!(
            GeoJsonEncoder::encode_feature_collection(&collection).unwrap(),
            r#"{"type":"FeatureCollection","features":[]}"#
        );
    }
}
