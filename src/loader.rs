//! GeoJSON loading for region layers.
//!
//! Reads a FeatureCollection that has already been projected to a planar CRS
//! (for example with `ogr2ogr -t_srs EPSG:2163`). The CRS is taken from the
//! legacy `crs` member; files without one load with an undefined CRS and are
//! rejected at query time.

use anyhow::{Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use hashbrown::HashMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

use crate::models::{Crs, LayerKind};
use crate::pip::{Region, RegionLayer};

#[derive(Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    crs: Option<NamedCrs>,
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct NamedCrs {
    properties: NamedCrsProperties,
}

#[derive(Deserialize)]
struct NamedCrsProperties {
    name: String,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<Geometry>,
}

type Ring = Vec<Vec<f64>>;

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon { coordinates: Vec<Ring> },
    MultiPolygon { coordinates: Vec<Vec<Ring>> },
    #[serde(other)]
    Unsupported,
}

/// Load a region layer from a GeoJSON file
pub fn load_geojson_layer<P: AsRef<Path>>(path: P, kind: LayerKind) -> Result<RegionLayer> {
    let path = path.as_ref();
    info!("Loading {} layer from {}", kind, path.display());
    let file = File::open(path)
        .with_context(|| format!("Failed to open layer file {}", path.display()))?;
    read_geojson_layer(BufReader::new(file), kind)
        .with_context(|| format!("Failed to load layer file {}", path.display()))
}

/// Parse a region layer from GeoJSON text
pub fn read_geojson_layer<R: Read>(reader: R, kind: LayerKind) -> Result<RegionLayer> {
    let collection: FeatureCollection =
        serde_json::from_reader(reader).context("Failed to parse GeoJSON FeatureCollection")?;

    let crs = collection
        .crs
        .map(|c| Crs::parse(&c.properties.name))
        .unwrap_or_default();
    if crs == Crs::Undefined {
        warn!("{} layer has no EPSG CRS; queries against it will fail", kind);
    }

    let total = collection.features.len();
    let mut regions = Vec::with_capacity(total);

    for (i, feature) in collection.features.into_iter().enumerate() {
        let geometry = match feature.geometry.map(to_multipolygon) {
            Some(Some(g)) if !g.0.is_empty() => g,
            _ => {
                warn!("Skipping feature {} without polygon geometry", i);
                continue;
            }
        };

        let attributes: HashMap<String, String> = feature
            .properties
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((key, s)),
                other => Some((key, other.to_string())),
            })
            .collect();

        regions.push(Region::new(geometry, attributes));
    }

    info!(
        "Loaded {}/{} features for {} layer ({:?})",
        regions.len(),
        total,
        kind,
        crs
    );

    Ok(RegionLayer::build(kind, crs, regions))
}

fn to_multipolygon(geometry: Geometry) -> Option<MultiPolygon<f64>> {
    let polygons = match geometry {
        Geometry::Polygon { coordinates } => vec![to_polygon(coordinates)?],
        Geometry::MultiPolygon { coordinates } => coordinates
            .into_iter()
            .filter_map(to_polygon)
            .collect(),
        Geometry::Unsupported => return None,
    };
    Some(MultiPolygon::new(polygons))
}

fn to_polygon(rings: Vec<Ring>) -> Option<Polygon<f64>> {
    let mut rings = rings.into_iter().map(to_ring);
    let exterior = rings.next()??;
    let interiors = rings.flatten().collect();
    Some(Polygon::new(exterior, interiors))
}

fn to_ring(positions: Ring) -> Option<LineString<f64>> {
    let coords: Vec<Coord<f64>> = positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| Coord { x: p[0], y: p[1] })
        .collect();

    // Polygon::new closes the ring
    if coords.len() < 3 {
        return None;
    }
    Some(LineString::new(coords))
}
