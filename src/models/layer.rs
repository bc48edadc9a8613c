//! Region layer kinds and coordinate reference system tags.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::BoundaryError;

/// Census geography layers the resolver knows how to label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// County (5-digit state+county GEOID)
    County,
    /// ZIP code tabulation area
    Zcta,
    /// Census tract (11-digit GEOID)
    Tract,
}

impl LayerKind {
    /// Get all supported layers
    pub fn all() -> &'static [LayerKind] {
        &[LayerKind::County, LayerKind::Zcta, LayerKind::Tract]
    }

    /// Attribute holding the region identifier for this layer
    pub fn id_field(&self) -> &'static str {
        match self {
            LayerKind::County => "GEOID",
            LayerKind::Zcta => "ZCTA5CE20",
            LayerKind::Tract => "GEOID",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::County => "county",
            LayerKind::Zcta => "zcta",
            LayerKind::Tract => "tract",
        }
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LayerKind {
    type Err = BoundaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "county" => Ok(LayerKind::County),
            "zcta" => Ok(LayerKind::Zcta),
            "tract" => Ok(LayerKind::Tract),
            _ => Err(BoundaryError::UnknownLayer(s.to_string())),
        }
    }
}

/// Coordinate reference system attached to a polygon collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Crs {
    Epsg(u32),
    #[default]
    Undefined,
}

impl Crs {
    /// Parse an EPSG reference such as `EPSG:2163` or `urn:ogc:def:crs:EPSG::2163`.
    pub fn parse(name: &str) -> Self {
        let upper = name.trim().to_ascii_uppercase();
        let Some(pos) = upper.rfind("EPSG") else {
            return Crs::Undefined;
        };
        upper[pos + 4..]
            .trim_start_matches(':')
            .parse()
            .map(Crs::Epsg)
            .unwrap_or(Crs::Undefined)
    }

    pub fn epsg(&self) -> Option<u32> {
        match self {
            Crs::Epsg(code) => Some(*code),
            Crs::Undefined => None,
        }
    }
}
