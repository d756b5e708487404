//! `vtgeojson` - prints a Mapbox Vector Tile as GeoJSON or as a summary of its layers.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use vtgeojson::mvt::MvtTile;
use vtgeojson::types::{TileId, TypesError};
use vtgeojson::{ConvertOptions, PolygonRings, PropertyEncoding, TileConverter};

#[derive(Parser, Debug)]
#[command(
    name = "vtgeojson",
    about = "Convert Mapbox Vector Tiles into WGS84 GeoJSON",
    version
)]
struct Args {
    /// Vector tile file. If `--tile-id` is not given, the file name must start with `<z>-<x>-<y>.`
    #[arg(value_name = "TILE")]
    input: PathBuf,

    /// Tile id as `<z>-<x>-<y>`
    #[arg(long, value_name = "Z-X-Y")]
    tile_id: Option<TileId>,

    /// Clip geometries extending more than this many units beyond the tile border
    #[arg(long, value_name = "BUFFER")]
    clip: Option<u32>,

    /// What to print
    #[arg(long, value_enum, default_value_t = OutputFormat::Metadata)]
    out: OutputFormat,

    /// Extent to use instead of the one stored in the tile, for one layer (`roads=512`) or for
    /// all layers (`512`)
    #[arg(long, value_name = "[LAYER=]SIZE", value_parser = parse_extent)]
    extent: Vec<ExtentOverride>,

    /// Write all property values as strings
    #[arg(long)]
    stringify_properties: bool,

    /// How rings of polygon features are grouped
    #[arg(long, value_enum, default_value_t = RingGrouping::Winding)]
    polygon_rings: RingGrouping,

    /// Skip invalid layers, features and values instead of failing
    #[arg(long)]
    no_validate: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Geojson,
    Metadata,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum RingGrouping {
    Winding,
    PerPart,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ExtentOverride {
    layer: Option<String>,
    extent: u32,
}

fn parse_extent(value: &str) -> Result<ExtentOverride, String> {
    let (layer, size) = match value.rsplit_once('=') {
        Some((layer, size)) if !layer.is_empty() => (Some(layer.to_string()), size),
        Some(_) => return Err(format!("layer name is empty in '{value}'")),
        None => (None, value),
    };

    let extent = size
        .parse()
        .map_err(|e| format!("invalid extent '{size}': {e}"))?;

    Ok(ExtentOverride { layer, extent })
}

impl Args {
    fn resolve_tile_id(&self) -> Result<TileId, TypesError> {
        match self.tile_id {
            Some(id) => Ok(id),
            None => TileId::from_file_name(&self.input),
        }
    }

    fn into_options(self) -> ConvertOptions {
        let mut options = ConvertOptions::default()
            .with_clip_buffer(self.clip)
            .with_property_encoding(if self.stringify_properties {
                PropertyEncoding::Stringify
            } else {
                PropertyEncoding::Typed
            })
            .with_polygon_rings(match self.polygon_rings {
                RingGrouping::Winding => PolygonRings::Winding,
                RingGrouping::PerPart => PolygonRings::PerPart,
            });

        for ExtentOverride { layer, extent } in self.extent {
            options = match layer {
                Some(layer) => options.with_layer_extent(layer, extent),
                None => options.with_default_extent(Some(extent)),
            };
        }

        options
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if !args.input.is_file() {
        anyhow::bail!("file [{}] not found", args.input.display());
    }

    let tile_id = match args.resolve_tile_id() {
        Ok(id) => id,
        Err(err) => Args::command()
            .error(ErrorKind::ValueValidation, err)
            .exit(),
    };

    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let tile = MvtTile::decode(bytes.as_slice(), args.no_validate)
        .with_context(|| format!("Failed to decode tile {tile_id}"))?;

    log::debug!(
        "Tile {tile_id}: {} bytes, {} layers",
        bytes.len(),
        tile.layers.len()
    );

    let out = args.out;
    let converter = TileConverter::new(tile_id, args.into_options());
    match out {
        OutputFormat::Geojson => {
            let geojson = converter
                .to_geojson(&tile)
                .context("Failed to convert tile to GeoJSON")?;
            println!("{geojson}");
        }
        OutputFormat::Metadata => print!("{}", converter.metadata(&tile)),
    }

    Ok(())
}
