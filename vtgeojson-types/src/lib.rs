//! Basic types shared by the `vtgeojson` crates: slippy-map tile addressing ([`TileId`]), tile-local
//! coordinates ([`TilePoint`]), geographic coordinates ([`LatLng`]) and the projection between the
//! two ([`TileProjection`]).

mod error;
pub use error::TypesError;

mod geometry_type;
pub use geometry_type::GeometryType;

mod lat_lng;
pub use lat_lng::{LatLng, LatLngBounds};

pub mod projection;
pub use projection::{project, TileProjection};

mod tile_id;
pub use tile_id::TileId;

mod tile_point;
pub use tile_point::TilePoint;
