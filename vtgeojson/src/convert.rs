//! Conversion of whole tiles.

use std::collections::HashMap;
use std::fmt::Write;

use geojson::{Feature, FeatureCollection};
use serde::{Deserialize, Serialize};
use vtgeojson_mvt::clip::clip_geometry;
use vtgeojson_mvt::{MvtFeature, MvtLayer, MvtTile};
use vtgeojson_types::{TileId, TileProjection};

use crate::encoder::{GeoJsonEncoder, PolygonRings};
use crate::error::VtGeoJsonError;
use crate::partition::classify;
use crate::properties::PropertyEncoding;

/// Options of a tile conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// If set, geometry is clipped to the tile area extended by this many units on every side.
    pub clip_buffer: Option<u32>,
    /// Extents used instead of the declared ones, by layer name.
    pub extent_overrides: HashMap<String, u32>,
    /// Extent used instead of the declared one for layers without a named override.
    pub default_extent: Option<u32>,
    /// How attribute values are written.
    pub property_encoding: PropertyEncoding,
    /// How polygon rings are grouped.
    pub polygon_rings: PolygonRings,
}

impl ConvertOptions {
    /// Sets the clip buffer.
    pub fn with_clip_buffer(mut self, buffer: Option<u32>) -> Self {
        self.clip_buffer = buffer;
        self
    }

    /// Overrides the extent of one layer.
    pub fn with_layer_extent(mut self, layer: impl Into<String>, extent: u32) -> Self {
        self.extent_overrides.insert(layer.into(), extent);
        self
    }

    /// Overrides the extent of all layers without a named override.
    pub fn with_default_extent(mut self, extent: Option<u32>) -> Self {
        self.default_extent = extent;
        self
    }

    /// Sets the property encoding.
    pub fn with_property_encoding(mut self, encoding: PropertyEncoding) -> Self {
        self.property_encoding = encoding;
        self
    }

    /// Sets the polygon ring grouping.
    pub fn with_polygon_rings(mut self, polygon_rings: PolygonRings) -> Self {
        self.polygon_rings = polygon_rings;
        self
    }

    /// Extent to use for the layer: the named override, then the default override, then the
    /// extent the layer declares.
    pub fn layer_extent(&self, layer: &MvtLayer) -> u32 {
        self.extent_overrides
            .get(&layer.name)
            .copied()
            .or(self.default_extent)
            .unwrap_or(layer.extent)
    }
}

/// Converts decoded tiles with the given id into GeoJSON.
#[derive(Debug, Clone)]
pub struct TileConverter {
    tile_id: TileId,
    options: ConvertOptions,
    encoder: GeoJsonEncoder,
}

impl TileConverter {
    /// Creates a new converter.
    pub fn new(tile_id: TileId, options: ConvertOptions) -> Self {
        let encoder = GeoJsonEncoder::new(options.polygon_rings, options.property_encoding);
        Self {
            tile_id,
            options,
            encoder,
        }
    }

    /// Id of the converted tile.
    pub fn tile_id(&self) -> TileId {
        self.tile_id
    }

    /// Conversion options.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Converts all features of all layers, layer by layer in tile order.
    ///
    /// Features of unknown geometry type or with invalid property values are skipped, as are
    /// features left without geometry after clipping. Zero layer extent aborts the conversion.
    pub fn feature_collection(&self, tile: &MvtTile) -> Result<FeatureCollection, VtGeoJsonError> {
        let mut features = vec![];
        for layer in &tile.layers {
            self.convert_layer(layer, &mut features)?;
        }

        Ok(GeoJsonEncoder::feature_collection(features))
    }

    /// Same as [`TileConverter::feature_collection`], written as GeoJSON text.
    pub fn to_geojson(&self, tile: &MvtTile) -> Result<String, VtGeoJsonError> {
        GeoJsonEncoder::encode_feature_collection(&self.feature_collection(tile)?)
    }

    /// Converts a single layer of the tile.
    pub fn layer_features(&self, layer: &MvtLayer) -> Result<Vec<Feature>, VtGeoJsonError> {
        let mut features = vec![];
        self.convert_layer(layer, &mut features)?;
        Ok(features)
    }

    fn convert_layer(
        &self,
        layer: &MvtLayer,
        output: &mut Vec<Feature>,
    ) -> Result<(), VtGeoJsonError> {
        let extent = self.options.layer_extent(layer);
        let projection = TileProjection::new(self.tile_id, extent)?;

        log::debug!(
            "Converting layer {} of tile {}: {} features, extent {extent}",
            layer.name,
            self.tile_id,
            layer.features.len()
        );

        let before = output.len();
        for (index, feature) in layer.features.iter().enumerate() {
            match self.convert_feature(&layer.name, feature, &projection) {
                Ok(Some(converted)) => output.push(converted),
                Ok(None) => {
                    log::debug!(
                        "Feature {index} of layer {} has no geometry, skipping",
                        layer.name
                    );
                }
                Err(VtGeoJsonError::UnsupportedGeometryType(raw)) => {
                    log::warn!(
                        "Skipping feature {index} of layer {}: unsupported geometry type {raw:?}",
                        layer.name
                    );
                }
                Err(VtGeoJsonError::MalformedProperties(reason)) => {
                    log::warn!(
                        "Skipping feature {index} of layer {}: {reason}",
                        layer.name
                    );
                }
                Err(err) => return Err(err),
            }
        }

        log::debug!(
            "Layer {} produced {} features",
            layer.name,
            output.len() - before
        );

        Ok(())
    }

    fn convert_feature(
        &self,
        layer_name: &str,
        feature: &MvtFeature,
        projection: &TileProjection,
    ) -> Result<Option<Feature>, VtGeoJsonError> {
        let projected = match self.options.clip_buffer {
            Some(buffer) => classify(
                &clip_geometry(&feature.geometry, projection.extent(), buffer),
                projection,
            )?,
            None => classify(&feature.geometry, projection)?,
        };

        self.encoder.feature(
            feature.id.unwrap_or(0),
            layer_name,
            &projected,
            &feature.properties,
        )
    }

    /// Human readable summary of the tile: layer names, feature geometry types and attributes.
    pub fn metadata(&self, tile: &MvtTile) -> String {
        let mut output = String::new();
        for layer in &tile.layers {
            // Writing into a `String` cannot fail.
            let _ = writeln!(output, "------------ LAYER: {} ---------", layer.name);
            for (index, feature) in layer.features.iter().enumerate() {
                let _ = writeln!(output, "feature {index}: {}", feature.geometry_type());
                for (key, value) in &feature.properties {
                    let _ = writeln!(output, "   {key}\t : ({}) {value}", value.kind());
                }
            }
        }

        output
    }
}
