//! Stability of a region label under GPS error.
//!
//! Perturbs a query point over a disk of plausible positions, re-resolves
//! every sample and decides whether the top label is stable enough to report.

mod estimator;
mod sampler;
mod tally;

pub use estimator::{estimate, estimate_geographic, EstimateConfig};
pub use sampler::{sample_disk, seeded_rng};
pub use tally::LabelTally;
