//! Monte Carlo stability estimate and the answer/abstain decision.

use rand::Rng;
use serde::Deserialize;
use tracing::debug;

use super::{sample_disk, LabelTally};
use crate::error::{BoundaryError, Result};
use crate::models::{Candidate, DistanceBand, LayerKind, Outcome, Status};
use crate::pip::{resolve, RegionLayers};
use crate::proj::{Projector, DEFAULT_PLANAR_EPSG};

/// Decimal places kept for reported probabilities
const PROBABILITY_DECIMALS: i32 = 4;

/// Decimal places kept for reported distances (centimeters)
const DISTANCE_DECIMALS: i32 = 2;

/// Number of candidates reported
const TOP_CANDIDATES: usize = 2;

/// Parameters of one stability estimate
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EstimateConfig {
    /// Assumed maximum GPS error, in meters
    pub gps_radius_m: f64,

    /// Perturbed samples drawn per query
    pub n_samples: usize,

    /// Minimum top-label share required to answer
    pub p_thresh: f64,

    /// Planar CRS the region layers must be stored in
    pub planar_epsg: u32,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            gps_radius_m: 20.0,
            n_samples: 100,
            p_thresh: 0.90,
            planar_epsg: DEFAULT_PLANAR_EPSG,
        }
    }
}

impl EstimateConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.gps_radius_m.is_finite() || self.gps_radius_m < 0.0 {
            return Err(BoundaryError::InvalidParameter(format!(
                "gps_radius_m must be finite and >= 0, got {}",
                self.gps_radius_m
            )));
        }
        if !self.p_thresh.is_finite() || !(0.0..=1.0).contains(&self.p_thresh) {
            return Err(BoundaryError::InvalidParameter(format!(
                "p_thresh must be within [0, 1], got {}",
                self.p_thresh
            )));
        }
        Ok(())
    }
}

/// Resolve a planar point in `layer` and decide whether the label is stable
/// under GPS error.
///
/// Configuration problems (missing layer, CRS mismatch, missing identifier
/// field, bad parameters) fail before any sampling. A point outside all
/// regions is not an error: it yields an `error` outcome.
pub fn estimate<R: Rng + ?Sized>(
    x: f64,
    y: f64,
    layer: LayerKind,
    layers: &RegionLayers,
    config: &EstimateConfig,
    rng: &mut R,
) -> Result<Outcome> {
    config.validate()?;
    if !x.is_finite() || !y.is_finite() {
        return Err(BoundaryError::InvalidParameter(format!(
            "non-finite query point ({x}, {y})"
        )));
    }
    let regions = layers.validated(layer, config.planar_epsg)?;

    let Some(exact) = resolve(x, y, regions)? else {
        debug!("({}, {}) outside {} coverage", x, y, layer);
        return Ok(Outcome::error());
    };
    let distance = round_to(exact.distance, DISTANCE_DECIMALS);
    let band = DistanceBand::from_distance(exact.distance);

    let mut tally = LabelTally::new();
    for (sx, sy) in sample_disk(x, y, config.gps_radius_m, config.n_samples, rng) {
        if let Some(hit) = resolve(sx, sy, regions)? {
            tally.add(&hit.label);
        }
    }

    if tally.is_empty() {
        debug!(
            "({}, {}) -> {}: no labelled samples, using exact result",
            x, y, exact.label
        );
        return Ok(Outcome {
            status: Status::Answer,
            label_id: Some(exact.label.clone()),
            confidence: Some(1.0),
            dist_to_boundary_m: Some(distance),
            candidates: vec![Candidate(exact.label, 1.0)],
            band: Some(band),
            lat: None,
            lon: None,
        });
    }

    let ranked = tally.most_common(TOP_CANDIDATES);
    let (top_label, p_top) = ranked[0];

    // Threshold is applied before rounding
    let status = if p_top >= config.p_thresh {
        Status::Answer
    } else {
        Status::Abstain
    };

    let candidates: Vec<Candidate> = ranked
        .iter()
        .map(|(label, p)| Candidate(label.to_string(), round_to(*p, PROBABILITY_DECIMALS)))
        .collect();

    debug!(
        "({}, {}) -> {} ({}/{} of {} samples, {} distinct) [{}]: {}",
        x,
        y,
        top_label,
        tally.count(top_label),
        tally.total(),
        config.n_samples,
        tally.distinct(),
        candidates
            .iter()
            .map(|c| format!("{}={:.4}", c.label(), c.probability()))
            .collect::<Vec<_>>()
            .join(" "),
        status
    );

    Ok(Outcome {
        status,
        label_id: Some(top_label.to_string()),
        confidence: Some(round_to(p_top, PROBABILITY_DECIMALS)),
        dist_to_boundary_m: Some(distance),
        candidates,
        band: Some(band),
        lat: None,
        lon: None,
    })
}

/// Same as [`estimate`] for a (lat, lon) query. The point is projected once
/// and the input coordinates are echoed in the outcome.
pub fn estimate_geographic<R: Rng + ?Sized>(
    lat: f64,
    lon: f64,
    layer: LayerKind,
    layers: &RegionLayers,
    projector: &Projector,
    config: &EstimateConfig,
    rng: &mut R,
) -> Result<Outcome> {
    if projector.epsg() != config.planar_epsg {
        return Err(BoundaryError::CrsMismatch {
            layer,
            expected: config.planar_epsg,
            found: projector.epsg(),
        });
    }
    let (x, y) = projector.to_planar(lon, lat)?;
    Ok(estimate(x, y, layer, layers, config, rng)?.with_geographic(lat, lon))
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
