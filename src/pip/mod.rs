//! Point-in-Polygon (PIP) region lookup.
//!
//! Holds region polygons per layer behind an R-tree spatial index and
//! resolves which region a planar point falls in.

mod index;
pub(crate) mod region;
mod resolver;

pub use index::{IndexedRegion, RegionLayer, RegionLayers};
pub use region::Region;
pub use resolver::{boundary_distance, resolve, Lookup};
