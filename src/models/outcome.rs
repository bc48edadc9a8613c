//! Query outcome returned by the stability estimator.

use serde::{Deserialize, Serialize};

/// Decision taken for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Enough perturbed samples agree on the top label
    Answer,
    /// Agreement fell below the threshold; the top label is only a best guess
    Abstain,
    /// The original point is outside every known region
    Error,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Answer => write!(f, "answer"),
            Status::Abstain => write!(f, "abstain"),
            Status::Error => write!(f, "error"),
        }
    }
}

/// Candidate label with its empirical probability, serialized as `[label, p]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate(pub String, pub f64);

impl Candidate {
    pub fn label(&self) -> &str {
        &self.0
    }

    pub fn probability(&self) -> f64 {
        self.1
    }
}

/// Final record for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub status: Status,

    /// Most frequent label (also surfaced on abstain)
    pub label_id: Option<String>,

    /// Share of labelled samples agreeing with `label_id`
    pub confidence: Option<f64>,

    /// Distance from the original point to its region boundary, in meters
    pub dist_to_boundary_m: Option<f64>,

    /// Up to two labels ordered by frequency
    pub candidates: Vec<Candidate>,

    /// Difficulty band of the original point, from its unrounded distance
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub band: Option<DistanceBand>,

    /// Echo of geographic input, when the query was made in lat/lon
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lat: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lon: Option<f64>,
}

impl Outcome {
    /// Outcome for a point no region covers
    pub fn error() -> Self {
        Self {
            status: Status::Error,
            label_id: None,
            confidence: None,
            dist_to_boundary_m: None,
            candidates: Vec::new(),
            band: None,
            lat: None,
            lon: None,
        }
    }

    pub fn with_geographic(mut self, lat: f64, lon: f64) -> Self {
        self.lat = Some(lat);
        self.lon = Some(lon);
        self
    }
}

/// Difficulty bucket by distance to the nearest region boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceBand {
    /// Under 10 m
    Boundary,
    /// 10 m to 100 m
    Hard,
    /// 100 m to 500 m
    Medium,
    /// 500 m and beyond
    Easy,
}

impl DistanceBand {
    pub fn from_distance(meters: f64) -> Self {
        if meters < 10.0 {
            DistanceBand::Boundary
        } else if meters < 100.0 {
            DistanceBand::Hard
        } else if meters < 500.0 {
            DistanceBand::Medium
        } else {
            DistanceBand::Easy
        }
    }

    pub fn all() -> &'static [DistanceBand] {
        &[
            DistanceBand::Boundary,
            DistanceBand::Hard,
            DistanceBand::Medium,
            DistanceBand::Easy,
        ]
    }
}

impl std::fmt::Display for DistanceBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceBand::Boundary => write!(f, "boundary"),
            DistanceBand::Hard => write!(f, "hard"),
            DistanceBand::Medium => write!(f, "medium"),
            DistanceBand::Easy => write!(f, "easy"),
        }
    }
}
