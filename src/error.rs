//! Configuration errors raised before any lookup work starts.

use thiserror::Error;

use crate::models::LayerKind;

/// Errors that halt a query. Coverage gaps are not errors; they surface as
/// an absent lookup or an `error` outcome instead.
#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("unknown layer '{0}' (expected one of: county, zcta, tract)")]
    UnknownLayer(String),

    #[error("no region layer loaded for '{0}'")]
    MissingLayer(LayerKind),

    #[error("layer '{layer}' is in EPSG:{found}, expected EPSG:{expected}")]
    CrsMismatch {
        layer: LayerKind,
        expected: u32,
        found: u32,
    },

    #[error("layer '{0}' has no coordinate reference system")]
    UndefinedCrs(LayerKind),

    #[error("layer '{layer}' is missing identifier field '{field}'")]
    MissingIdentifierField {
        layer: LayerKind,
        field: &'static str,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unsupported planar CRS EPSG:{0}")]
    UnsupportedCrs(u32),

    #[error("projection failed: {0}")]
    Projection(String),
}

pub type Result<T> = std::result::Result<T, BoundaryError>;
