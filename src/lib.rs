//! BoundarySafe - boundary-aware region lookup under GPS uncertainty
//!
//! Resolves which county, ZCTA or census tract contains a point, perturbs the
//! point over the GPS error disk, and abstains when the label is unstable.

pub mod error;
pub mod loader;
pub mod models;
pub mod pip;
pub mod proj;
pub mod stability;

pub use error::{BoundaryError, Result};
pub use models::{Candidate, Crs, DistanceBand, LayerKind, Outcome, Status};
pub use pip::{resolve, Lookup, Region, RegionLayer, RegionLayers};
pub use proj::Projector;
pub use stability::{estimate, estimate_geographic, sample_disk, seeded_rng, EstimateConfig};
