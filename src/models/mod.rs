//! Core data models for boundary-aware lookups.

pub mod layer;
pub mod outcome;

pub use layer::{Crs, LayerKind};
pub use outcome::{Candidate, DistanceBand, Outcome, Status};
