//! Spatial index over the regions of one layer.

use hashbrown::HashMap;
use rstar::{RTree, RTreeObject, AABB};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

use super::Region;
use crate::error::{BoundaryError, Result};
use crate::models::{Crs, LayerKind};

/// Wrapper for R-tree indexing of regions
#[derive(Clone)]
pub struct IndexedRegion {
    pub region: Arc<Region>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedRegion {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedRegion {
    pub fn new(region: Region) -> Option<Self> {
        let (min_x, min_y, max_x, max_y) = region.bbox()?;
        Some(Self {
            region: Arc::new(region),
            envelope: AABB::from_corners([min_x, min_y], [max_x, max_y]),
        })
    }
}

/// Immutable polygon collection for one layer, indexed with an R-tree.
///
/// The tree is bulk-loaded on construction and never mutated afterwards, so a
/// layer can be shared by reference across concurrent queries.
pub struct RegionLayer {
    kind: LayerKind,
    crs: Crs,
    tree: RTree<IndexedRegion>,
    /// Attribute fields present on every region
    fields: BTreeSet<String>,
}

impl RegionLayer {
    /// Build the spatial index for a layer. Regions without a bounding box
    /// (empty geometry) are dropped.
    pub fn build(kind: LayerKind, crs: Crs, regions: Vec<Region>) -> Self {
        info!(
            "Building {} spatial index for {} regions...",
            kind,
            regions.len()
        );

        let mut fields: Option<BTreeSet<String>> = None;
        for region in &regions {
            let keys: BTreeSet<String> = region.attributes().map(|(k, _)| k.to_string()).collect();
            fields = Some(match fields {
                Some(existing) => existing.intersection(&keys).cloned().collect(),
                None => keys,
            });
        }

        let indexed: Vec<IndexedRegion> = regions
            .into_iter()
            .filter_map(IndexedRegion::new)
            .collect();

        let tree = RTree::bulk_load(indexed);

        info!("Spatial index for {} built with {} entries", kind, tree.size());

        Self {
            kind,
            crs,
            tree,
            fields: fields.unwrap_or_default(),
        }
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    /// Regions whose bounding box touches the point
    pub fn candidates(&self, x: f64, y: f64) -> impl Iterator<Item = &Arc<Region>> {
        self.tree
            .locate_in_envelope_intersecting(&AABB::from_point([x, y]))
            .map(|ir| &ir.region)
    }

    /// Get total number of indexed regions
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Iterate over all indexed regions
    pub fn regions(&self) -> impl Iterator<Item = &Arc<Region>> {
        self.tree.iter().map(|ir| &ir.region)
    }
}

/// Region layers loaded by the caller, keyed by kind.
#[derive(Default)]
pub struct RegionLayers {
    layers: HashMap<LayerKind, RegionLayer>,
}

impl RegionLayers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer, replacing any previous layer of the same kind
    pub fn insert(&mut self, layer: RegionLayer) {
        self.layers.insert(layer.kind(), layer);
    }

    pub fn get(&self, kind: LayerKind) -> Option<&RegionLayer> {
        self.layers.get(&kind)
    }

    /// Fetch a layer and check it can be queried in the planar CRS `expected_epsg`.
    pub fn validated(&self, kind: LayerKind, expected_epsg: u32) -> Result<&RegionLayer> {
        let layer = self.get(kind).ok_or(BoundaryError::MissingLayer(kind))?;

        match layer.crs() {
            Crs::Undefined => return Err(BoundaryError::UndefinedCrs(kind)),
            Crs::Epsg(found) if found != expected_epsg => {
                return Err(BoundaryError::CrsMismatch {
                    layer: kind,
                    expected: expected_epsg,
                    found,
                })
            }
            Crs::Epsg(_) => {}
        }

        if !layer.is_empty() && !layer.has_field(kind.id_field()) {
            return Err(BoundaryError::MissingIdentifierField {
                layer: kind,
                field: kind.id_field(),
            });
        }

        Ok(layer)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pip::region::fixtures::rect;

    fn county_layer(crs: Crs) -> RegionLayer {
        RegionLayer::build(
            LayerKind::County,
            crs,
            vec![
                Region::with_id(rect(0.0, 0.0, 100.0, 100.0), "GEOID", "A"),
                Region::with_id(rect(100.0, 0.0, 200.0, 100.0), "GEOID", "B"),
            ],
        )
    }

    #[test]
    fn test_candidates_by_envelope() {
        let layer = county_layer(Crs::Epsg(2163));
        assert_eq!(layer.len(), 2);
        assert_eq!(layer.candidates(50.0, 50.0).count(), 1);
        assert_eq!(layer.candidates(100.0, 50.0).count(), 2);
        assert_eq!(layer.candidates(500.0, 50.0).count(), 0);
    }

    #[test]
    fn test_validated_ok() {
        let mut layers = RegionLayers::new();
        layers.insert(county_layer(Crs::Epsg(2163)));
        assert!(layers.validated(LayerKind::County, 2163).is_ok());
    }

    #[test]
    fn test_validated_missing_layer() {
        let layers = RegionLayers::new();
        assert!(matches!(
            layers.validated(LayerKind::Tract, 2163),
            Err(BoundaryError::MissingLayer(LayerKind::Tract))
        ));
    }

    #[test]
    fn test_validated_crs() {
        let mut layers = RegionLayers::new();
        layers.insert(county_layer(Crs::Epsg(4269)));
        assert!(matches!(
            layers.validated(LayerKind::County, 2163),
            Err(BoundaryError::CrsMismatch { found: 4269, .. })
        ));

        layers.insert(county_layer(Crs::Undefined));
        assert!(matches!(
            layers.validated(LayerKind::County, 2163),
            Err(BoundaryError::UndefinedCrs(LayerKind::County))
        ));
    }

    #[test]
    fn test_validated_missing_id_field() {
        let mut layers = RegionLayers::new();
        layers.insert(RegionLayer::build(
            LayerKind::Zcta,
            Crs::Epsg(2163),
            vec![
                Region::with_id(rect(0.0, 0.0, 1.0, 1.0), "ZCTA5CE20", "10001"),
                Region::with_id(rect(1.0, 0.0, 2.0, 1.0), "GEOID", "10002"),
            ],
        ));
        assert!(matches!(
            layers.validated(LayerKind::Zcta, 2163),
            Err(BoundaryError::MissingIdentifierField {
                field: "ZCTA5CE20",
                ..
            })
        ));
    }

    #[test]
    fn test_layers_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RegionLayers>();
    }
}
