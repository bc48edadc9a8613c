//! Region polygons with their attribute rows.

use geo::{Area, BoundingRect, MultiPolygon};
use hashbrown::HashMap;

/// A single region polygon with metadata
#[derive(Debug, Clone)]
pub struct Region {
    pub geometry: MultiPolygon<f64>,
    attributes: HashMap<String, String>,
    area: f64,
}

impl Region {
    pub fn new(geometry: MultiPolygon<f64>, attributes: HashMap<String, String>) -> Self {
        let area = geometry.unsigned_area();
        Self {
            geometry,
            attributes,
            area,
        }
    }

    /// Convenience constructor for a region carrying a single identifier attribute
    pub fn with_id(geometry: MultiPolygon<f64>, field: &str, id: &str) -> Self {
        let mut attributes = HashMap::new();
        attributes.insert(field.to_string(), id.to_string());
        Self::new(geometry, attributes)
    }

    /// Get the bounding box of this region
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        self.geometry
            .bounding_rect()
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }

    pub fn attribute(&self, field: &str) -> Option<&str> {
        self.attributes.get(field).map(String::as_str)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Planar area, cached at construction
    pub fn area(&self) -> f64 {
        self.area
    }
}
