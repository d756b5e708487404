//! Conversion of [Mapbox Vector Tiles](https://github.com/mapbox/vector-tile-spec) into GeoJSON.
//!
//! Tile geometry is stored in a tile-local integer grid. This crate projects it into WGS84
//! longitude and latitude with the Web-Mercator slippy-map scheme and writes every feature of every
//! layer into a single GeoJSON `FeatureCollection`.
//!
//! ```no_run
//! use vtgeojson::{ConvertOptions, TileConverter};
//! use vtgeojson::mvt::MvtTile;
//! use vtgeojson::types::TileId;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("14-8192-5461.mvt")?;
//! let tile = MvtTile::decode(bytes.as_slice(), false)?;
//!
//! let converter = TileConverter::new(TileId::new(14, 8192, 5461), ConvertOptions::default());
//! println!("{}", converter.to_geojson(&tile)?);
//! # Ok(())
//! # }
//! ```
//!
//! The conversion is split into a few steps, each usable on its own:
//! * [`partition::classify`] projects the geometry parts of a feature;
//! * [`GeoJsonEncoder`] turns projected geometry into GeoJSON geometries and features;
//! * [`PropertySerializer`] turns feature attributes into a GeoJSON properties object;
//! * [`TileConverter`] runs them for every feature of a tile.

pub mod convert;
pub mod encoder;
pub mod error;
pub mod partition;
pub mod properties;

pub use convert::{ConvertOptions, TileConverter};
pub use encoder::{GeoJsonEncoder, PolygonRings};
pub use error::VtGeoJsonError;
pub use partition::{classify, ProjectedGeometry};
pub use properties::{PropertyEncoding, PropertySerializer};

pub use vtgeojson_mvt as mvt;
pub use vtgeojson_types as types;
