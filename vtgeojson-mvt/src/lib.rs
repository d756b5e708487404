//! Reader for the [Mapbox Vector Tile](https://github.com/mapbox/vector-tile-spec) format.
//!
//! Unlike renderer-oriented readers, geometry is kept in the tile-local integer grid: every
//! feature is decoded into a list of parts, each an ordered list of [`TilePoint`]s, exactly as the
//! geometry commands describe them. Scaling and projecting is left to the caller.

use std::fmt::{Display, Formatter};

use bytes::Buf;
use geozero::mvt::{Message as GeozeroMessage, Tile};
use serde::{Deserialize, Serialize};
pub use vtgeojson_types::{GeometryType, TilePoint};

use crate::error::MvtError;

pub mod clip;
pub mod error;

/// Extent used when a layer does not declare one.
pub const DEFAULT_EXTENT: u32 = 4096;

/// Decoded vector tile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MvtTile {
    /// Layers in the order they are stored in the tile.
    pub layers: Vec<MvtLayer>,
}

/// Named layer of a tile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MvtLayer {
    /// Layer name.
    pub name: String,
    /// Features in the order they are stored in the layer.
    pub features: Vec<MvtFeature>,
    /// Property keys table of the layer.
    pub properties: Vec<String>,
    /// Number of grid units along one side of the tile.
    pub extent: u32,
}

/// Single feature of a layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MvtFeature {
    /// Feature id, if set.
    pub id: Option<u64>,
    /// Feature attributes in tag order.
    pub properties: Vec<(String, MvtValue)>,
    /// Geometry in tile-local coordinates.
    pub geometry: MvtGeometry,
}

/// Attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MvtValue {
    /// String value.
    String(String),
    /// Single precision float value.
    Float(f32),
    /// Double precision float value.
    Double(f64),
    /// For both Int and Sint variants of protobuf values
    Int64(i64),
    /// Unsigned integer value.
    Uint64(u64),
    /// Boolean value.
    Bool(bool),
    /// Value that could not be decoded. Only present in tiles read with recoverable errors skipped.
    Unknown,
}

impl Display for MvtValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MvtValue::String(v) => write!(f, "{v}"),
            MvtValue::Float(v) => write!(f, "{v}"),
            MvtValue::Double(v) => write!(f, "{v}"),
            MvtValue::Int64(v) => write!(f, "{v}"),
            MvtValue::Uint64(v) => write!(f, "{v}"),
            MvtValue::Bool(v) => write!(f, "{v}"),
            MvtValue::Unknown => write!(f, "<NONE>"),
        }
    }
}

impl MvtValue {
    /// Short name of the value type, as stored in the tile.
    pub fn kind(&self) -> &'static str {
        match self {
            MvtValue::String(_) => "string",
            MvtValue::Float(_) => "float",
            MvtValue::Double(_) => "double",
            MvtValue::Int64(_) => "int",
            MvtValue::Uint64(_) => "uint",
            MvtValue::Bool(_) => "bool",
            MvtValue::Unknown => "unknown",
        }
    }
}

/// Ordered list of tile-local points: a point group, a line or a polygon ring.
pub type MvtPart = Vec<TilePoint>;

/// Feature geometry as a list of parts.
///
/// Every `MoveTo` command starts a new part, so a multipoint has one part per point, a
/// multilinestring one part per line and a polygon one part per ring (exterior rings and holes
/// alike). Polygon rings are closed: the last point repeats the first one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MvtGeometry {
    /// Point parts.
    Point(Vec<MvtPart>),
    /// Line parts.
    LineString(Vec<MvtPart>),
    /// Polygon rings.
    Polygon(Vec<MvtPart>),
    /// Geometry of unknown type with the raw type value. Commands are not decoded.
    Unknown(Option<i32>),
}

impl MvtGeometry {
    /// Type of the geometry.
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            MvtGeometry::Point(_) => GeometryType::Point,
            MvtGeometry::LineString(_) => GeometryType::LineString,
            MvtGeometry::Polygon(_) => GeometryType::Polygon,
            MvtGeometry::Unknown(_) => GeometryType::Unknown,
        }
    }

    /// Geometry parts. Empty for unknown geometries.
    pub fn parts(&self) -> &[MvtPart] {
        match self {
            MvtGeometry::Point(parts)
            | MvtGeometry::LineString(parts)
            | MvtGeometry::Polygon(parts) => parts,
            MvtGeometry::Unknown(_) => &[],
        }
    }
}

impl MvtTile {
    /// Decodes a tile.
    ///
    /// With `skip_recoverable_errors` set, invalid layers, features and values are logged and
    /// skipped (values are replaced with [`MvtValue::Unknown`]) instead of failing the whole tile.
    pub fn decode<B>(buffer: B, skip_recoverable_errors: bool) -> Result<MvtTile, MvtError>
    where
        B: Buf,
    {
        let pb = Tile::decode(buffer).map_err(|e| MvtError::Proto(e.to_string()))?;
        let layers_count = pb.layers.len();

        let mut layers = vec![];
        for layer in pb.layers.into_iter() {
            match MvtLayer::decode(layer, skip_recoverable_errors) {
                Ok(v) => layers.push(v),
                Err(e) => {
                    if skip_recoverable_errors {
                        log::warn!("{e:?}");
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        if layers_count > 0 && layers.is_empty() {
            return Err(MvtError::Generic(
                "Tile does not contain any valid layers".into(),
            ));
        }

        Ok(MvtTile { layers })
    }

    /// Returns the layer with the given name.
    pub fn layer(&self, name: &str) -> Option<&MvtLayer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Iterates over layer names in tile order.
    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|l| l.name.as_str())
    }
}

impl MvtLayer {
    fn decode(
        pb_layer: geozero::mvt::tile::Layer,
        skip_recoverable_errors: bool,
    ) -> Result<Self, MvtError> {
        let geozero::mvt::tile::Layer {
            name,
            keys,
            values,
            features,
            version,
            extent,
        } = pb_layer;
        if version != 1 && version != 2 {
            return Err(MvtError::Generic(format!(
                "Invalid version of layer '{name}': {version}"
            )));
        }

        let mut mvt_values = Vec::with_capacity(values.len());
        for value in values {
            match MvtValue::decode(value) {
                Ok(v) => mvt_values.push(v),
                Err(e) => {
                    if skip_recoverable_errors {
                        log::warn!("{e:?}");
                        mvt_values.push(MvtValue::Unknown);
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        let mut mvt_features = Vec::with_capacity(features.len());
        for feature in features {
            match MvtFeature::decode(feature, &keys, &mvt_values) {
                Ok(v) => mvt_features.push(v),
                Err(e) => {
                    if skip_recoverable_errors {
                        log::warn!("layer '{name}': {e:?}");
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Ok(MvtLayer {
            name,
            properties: keys,
            features: mvt_features,
            extent: extent.unwrap_or(DEFAULT_EXTENT),
        })
    }
}

impl MvtValue {
    fn decode(pb_value: geozero::mvt::tile::Value) -> Result<MvtValue, MvtError> {
        let mut present_types = 0;
        let mut value = MvtValue::Unknown;

        if let Some(v) = pb_value.string_value {
            value = MvtValue::String(v);
            present_types += 1;
        }

        if let Some(v) = pb_value.float_value {
            value = MvtValue::Float(v);
            present_types += 1;
        }

        if let Some(v) = pb_value.double_value {
            value = MvtValue::Double(v);
            present_types += 1;
        }

        if let Some(v) = pb_value.int_value {
            value = MvtValue::Int64(v);
            present_types += 1;
        }

        if let Some(v) = pb_value.uint_value {
            value = MvtValue::Uint64(v);
            present_types += 1;
        }

        if let Some(v) = pb_value.sint_value {
            value = MvtValue::Int64(v);
            present_types += 1;
        }

        if let Some(v) = pb_value.bool_value {
            value = MvtValue::Bool(v);
            present_types += 1;
        }

        if present_types == 0 {
            Err(MvtError::Generic("No valid value present".into()))
        } else if present_types > 1 {
            Err(MvtError::Generic("More than one value present".into()))
        } else {
            Ok(value)
        }
    }
}

impl MvtFeature {
    /// Type of the feature geometry.
    pub fn geometry_type(&self) -> GeometryType {
        self.geometry.geometry_type()
    }

    /// Returns the first value stored under `key`.
    pub fn property(&self, key: &str) -> Option<&MvtValue> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    fn decode(
        pb_feature: geozero::mvt::tile::Feature,
        keys: &[String],
        values: &[MvtValue],
    ) -> Result<MvtFeature, MvtError> {
        let geozero::mvt::tile::Feature {
            id,
            tags,
            r#type,
            geometry,
        } = pb_feature;
        let properties = Self::decode_properties(tags, keys, values)?;
        let geometry = Self::decode_geometry(r#type, &geometry)?;

        Ok(MvtFeature {
            id,
            properties,
            geometry,
        })
    }

    fn decode_properties(
        tags: Vec<u32>,
        keys: &[String],
        values: &[MvtValue],
    ) -> Result<Vec<(String, MvtValue)>, MvtError> {
        if tags.len() % 2 != 0 {
            return Err(MvtError::Generic(
                "Invalid number of tags in feature".into(),
            ));
        }

        let mut properties = Vec::with_capacity(tags.len() / 2);
        for tag_pair in tags.chunks(2) {
            let key = keys
                .get(tag_pair[0] as usize)
                .ok_or(MvtError::Generic("Invalid tag key".into()))?;
            let value = values
                .get(tag_pair[1] as usize)
                .ok_or(MvtError::Generic("Invalid tag value".into()))?;

            properties.push((key.clone(), value.clone()));
        }

        Ok(properties)
    }

    fn decode_geometry(geom_type: Option<i32>, commands: &[u32]) -> Result<MvtGeometry, MvtError> {
        Ok(match GeometryType::from_mvt(geom_type) {
            GeometryType::Unknown => MvtGeometry::Unknown(geom_type),
            GeometryType::Point => MvtGeometry::Point(Self::decode_points(commands)?),
            GeometryType::LineString => MvtGeometry::LineString(Self::decode_lines(commands)?),
            GeometryType::Polygon => MvtGeometry::Polygon(Self::decode_rings(commands)?),
        })
    }

    fn decode_points(commands: &[u32]) -> Result<Vec<MvtPart>, MvtError> {
        let mut parts = Vec::with_capacity(commands.len() / 2);
        for command in CommandIterator::new(commands.iter()) {
            match command? {
                MvtGeomCommand::MoveTo(p) => parts.push(vec![p]),
                command => {
                    return Err(MvtError::Generic(format!(
                        "Point geometry cannot have {command:?} command"
                    )))
                }
            }
        }

        Ok(parts)
    }

    fn decode_lines(commands: &[u32]) -> Result<Vec<MvtPart>, MvtError> {
        let mut parts: Vec<MvtPart> = vec![];
        for command in CommandIterator::new(commands.iter()) {
            match command? {
                MvtGeomCommand::MoveTo(p) => parts.push(vec![p]),
                MvtGeomCommand::LineTo(p) => match parts.last_mut() {
                    Some(part) => part.push(p),
                    None => {
                        return Err(MvtError::Generic(
                            "LineTo command before the first MoveTo".into(),
                        ))
                    }
                },
                MvtGeomCommand::ClosePath => {
                    return Err(MvtError::Generic(
                        "LineString geometry cannot have ClosePath command".into(),
                    ))
                }
            }
        }

        Ok(parts)
    }

    fn decode_rings(commands: &[u32]) -> Result<Vec<MvtPart>, MvtError> {
        let mut rings = vec![];
        let mut current: Option<MvtPart> = None;
        for command in CommandIterator::new(commands.iter()) {
            match command? {
                MvtGeomCommand::MoveTo(p) => {
                    if current.is_some() {
                        return Err(MvtError::Generic(
                            "polygon cannot contain open contours".into(),
                        ));
                    }
                    current = Some(vec![p]);
                }
                MvtGeomCommand::LineTo(p) => match current.as_mut() {
                    Some(ring) => ring.push(p),
                    None => {
                        return Err(MvtError::Generic(
                            "LineTo command outside of a polygon ring".into(),
                        ))
                    }
                },
                MvtGeomCommand::ClosePath => match current.take() {
                    Some(mut ring) => {
                        ring.push(ring[0]);
                        rings.push(ring);
                    }
                    None => {
                        return Err(MvtError::Generic(
                            "ClosePath command outside of a polygon ring".into(),
                        ))
                    }
                },
            }
        }

        if current.is_some() {
            return Err(MvtError::Generic(
                "polygon cannot contain open contours".into(),
            ));
        }

        Ok(rings)
    }
}

struct CommandIterator<'a, T: Iterator<Item = &'a u32>> {
    inner: T,
    current_command: Option<(u32, u32)>,
    can_continue: bool,
    cursor: TilePoint,
}

impl<'a, T: Iterator<Item = &'a u32>> CommandIterator<'a, T> {
    fn new(inner: T) -> Self {
        Self {
            inner,
            current_command: None,
            can_continue: true,
            cursor: TilePoint::default(),
        }
    }

    fn read_move_to(&mut self) -> Result<MvtGeomCommand, MvtError> {
        self.cursor = self.read_point()?;
        Ok(MvtGeomCommand::MoveTo(self.cursor))
    }

    fn read_line_to(&mut self) -> Result<MvtGeomCommand, MvtError> {
        self.cursor = self.read_point()?;
        Ok(MvtGeomCommand::LineTo(self.cursor))
    }

    fn read_point(&mut self) -> Result<TilePoint, MvtError> {
        let vals = self.read_vals::<2>()?;
        Ok(TilePoint::new(
            i64::from(sint_to_int(vals[0])) + self.cursor.x,
            i64::from(sint_to_int(vals[1])) + self.cursor.y,
        ))
    }

    fn read_vals<const COUNT: usize>(&mut self) -> Result<[u32; COUNT], MvtError> {
        let mut result = [0; COUNT];
        for val in result.iter_mut() {
            *val = match self.inner.next() {
                Some(v) => *v,
                None => {
                    return Err(MvtError::Generic(
                        "Expected value to be present, but found end of data".into(),
                    ));
                }
            };
        }

        Ok(result)
    }
}

fn sint_to_int(sint: u32) -> i32 {
    if sint == u32::MAX {
        // Edge case. Operation below will overflow with this value.
        return i32::MIN;
    }

    match sint & 1 {
        0 => (sint >> 1) as i32,
        1 => -(((sint >> 1) + 1) as i32),
        _ => unreachable!(),
    }
}

impl<'a, T: Iterator<Item = &'a u32>> Iterator for CommandIterator<'a, T> {
    type Item = Result<MvtGeomCommand, MvtError>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.can_continue {
            return None;
        }

        let (command_id, command_count) = match self.current_command {
            Some(command) => command,
            None => {
                let command_integer = self.inner.next()?;
                (command_integer & 0x7, command_integer >> 3)
            }
        };

        self.current_command = match command_count {
            0 => {
                self.can_continue = false;
                return Some(Err(MvtError::Generic("Command count cannot be 0".into())));
            }
            1 => None,
            v => Some((command_id, v - 1)),
        };

        let result = match command_id {
            1 => self.read_move_to(),
            2 => self.read_line_to(),
            7 => {
                if command_count != 1 {
                    Err(MvtError::Generic(format!(
                        "ClosePath command must have count 1, but has {command_count}"
                    )))
                } else {
                    Ok(MvtGeomCommand::ClosePath)
                }
            }
            _ => Err(MvtError::Generic(format!(
                "Unknown command id {command_id}"
            ))),
        };

        if result.is_err() {
            self.can_continue = false;
        }

        Some(result)
    }
}

#[derive(Debug)]
enum MvtGeomCommand {
    MoveTo(TilePoint),
    LineTo(TilePoint),
    ClosePath,
}
