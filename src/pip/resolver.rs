//! Exact point-in-region resolution for a single layer.

use geo::{Contains, Distance, Euclidean, Intersects, MultiPolygon, Point};
use std::sync::Arc;
use tracing::trace;

use super::{Region, RegionLayer};
use crate::error::{BoundaryError, Result};

/// Region found for a point, with the point's distance to that region's boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub label: String,
    pub distance: f64,
}

/// Resolve the region containing `(x, y)` in `layer`.
///
/// Regions that cover the point (boundary inclusive) win over regions that
/// only contain it, so a point on a shared edge still gets a label. When
/// several regions match, the smallest by area is taken, then the smallest
/// identifier. Returns `Ok(None)` when nothing covers the point.
pub fn resolve(x: f64, y: f64, layer: &RegionLayer) -> Result<Option<Lookup>> {
    let point = Point::new(x, y);
    let field = layer.kind().id_field();

    let candidates: Vec<&Arc<Region>> = layer.candidates(x, y).collect();
    if candidates.is_empty() {
        return Ok(None);
    }

    // For a point target, intersects is the covers predicate
    let covering = candidates
        .iter()
        .copied()
        .filter(|r| r.geometry.intersects(&point));
    let mut best = pick(covering, layer, field)?;

    if best.is_none() {
        let containing = candidates
            .iter()
            .copied()
            .filter(|r| r.geometry.contains(&point));
        best = pick(containing, layer, field)?;
    }

    Ok(best.map(|(region, label)| {
        let distance = boundary_distance(&point, &region.geometry);
        trace!("({}, {}) -> {} at {:.3}", x, y, label, distance);
        Lookup {
            label: label.to_string(),
            distance,
        }
    }))
}

/// Smallest region by area, ties broken by identifier
fn pick<'a>(
    matches: impl Iterator<Item = &'a Arc<Region>>,
    layer: &RegionLayer,
    field: &'static str,
) -> Result<Option<(&'a Region, &'a str)>> {
    let mut best: Option<(&Region, &str)> = None;

    for region in matches {
        let label = region
            .attribute(field)
            .ok_or(BoundaryError::MissingIdentifierField {
                layer: layer.kind(),
                field,
            })?;

        let better = match best {
            None => true,
            Some((current, current_label)) => region
                .area()
                .total_cmp(&current.area())
                .then_with(|| label.cmp(current_label))
                .is_lt(),
        };

        if better {
            best = Some((region.as_ref(), label));
        }
    }

    Ok(best)
}

/// Planar distance from a point to the boundary rings of a geometry.
/// Zero on the boundary, positive both inside and outside.
pub fn boundary_distance(point: &Point<f64>, geometry: &MultiPolygon<f64>) -> f64 {
    geometry
        .iter()
        .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
        .map(|ring| Euclidean.distance(point, ring))
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Crs, LayerKind};
    use crate::pip::region::fixtures::rect;
    use geo::{polygon, MultiPolygon};

    fn two_counties() -> RegionLayer {
        RegionLayer::build(
            LayerKind::County,
            Crs::Epsg(2163),
            vec![
                Region::with_id(rect(100.0, 0.0, 200.0, 100.0), "GEOID", "B"),
                Region::with_id(rect(0.0, 0.0, 100.0, 100.0), "GEOID", "A"),
            ],
        )
    }

    #[test]
    fn test_resolve_inside() {
        let layer = two_counties();
        let hit = resolve(25.0, 40.0, &layer).unwrap().unwrap();
        assert_eq!(hit.label, "A");
        assert!((hit.distance - 25.0).abs() < 1e-9);

        let hit = resolve(150.0, 95.0, &layer).unwrap().unwrap();
        assert_eq!(hit.label, "B");
        assert!((hit.distance - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_outside() {
        let layer = two_counties();
        assert_eq!(resolve(500.0, 500.0, &layer).unwrap(), None);
        // Just left of A's envelope
        assert_eq!(resolve(-0.5, 50.0, &layer).unwrap(), None);
    }

    #[test]
    fn test_shared_edge_resolves() {
        let layer = two_counties();
        let hit = resolve(100.0, 50.0, &layer).unwrap().unwrap();
        // Equal areas, so the smaller identifier wins regardless of tree order
        assert_eq!(hit.label, "A");
        assert_eq!(hit.distance, 0.0);
    }

    #[test]
    fn test_outer_corner_resolves() {
        let layer = two_counties();
        let hit = resolve(200.0, 100.0, &layer).unwrap().unwrap();
        assert_eq!(hit.label, "B");
        assert_eq!(hit.distance, 0.0);
    }

    #[test]
    fn test_nested_prefers_smaller_region() {
        let layer = RegionLayer::build(
            LayerKind::Tract,
            Crs::Epsg(2163),
            vec![
                Region::with_id(rect(0.0, 0.0, 1000.0, 1000.0), "GEOID", "big"),
                Region::with_id(rect(400.0, 400.0, 600.0, 600.0), "GEOID", "small"),
            ],
        );
        let hit = resolve(500.0, 500.0, &layer).unwrap().unwrap();
        assert_eq!(hit.label, "small");
        assert!((hit.distance - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_hole_is_not_covered() {
        let donut = MultiPolygon::new(vec![polygon!(
            exterior: [
                (x: 0.0, y: 0.0),
                (x: 100.0, y: 0.0),
                (x: 100.0, y: 100.0),
                (x: 0.0, y: 100.0),
                (x: 0.0, y: 0.0),
            ],
            interiors: [[
                (x: 40.0, y: 40.0),
                (x: 60.0, y: 40.0),
                (x: 60.0, y: 60.0),
                (x: 40.0, y: 60.0),
                (x: 40.0, y: 40.0),
            ]],
        )]);
        let layer = RegionLayer::build(
            LayerKind::County,
            Crs::Epsg(2163),
            vec![Region::with_id(donut, "GEOID", "D")],
        );

        assert_eq!(resolve(50.0, 50.0, &layer).unwrap(), None);

        // Distance measures the nearest ring, including the hole
        let hit = resolve(35.0, 50.0, &layer).unwrap().unwrap();
        assert!((hit.distance - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let layer = two_counties();
        let first = resolve(99.999, 12.5, &layer).unwrap();
        let second = resolve(99.999, 12.5, &layer).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_identifier_on_match() {
        let layer = RegionLayer::build(
            LayerKind::Zcta,
            Crs::Epsg(2163),
            vec![Region::with_id(rect(0.0, 0.0, 10.0, 10.0), "GEOID", "x")],
        );
        assert!(matches!(
            resolve(5.0, 5.0, &layer),
            Err(BoundaryError::MissingIdentifierField { .. })
        ));
    }
}
