//! Uniform disk sampling for GPS error perturbation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;

/// Generator for one query. Each concurrent query gets its own.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Draw `n` points uniformly over the area of the disk of `radius` around `(x, y)`.
///
/// The radial draw is `radius * sqrt(u)`; a plain `radius * u` would crowd
/// samples toward the center. Each point consumes an angle then a radius
/// draw from `rng`, so identical seeds give identical sequences.
pub fn sample_disk<R: Rng + ?Sized>(
    x: f64,
    y: f64,
    radius: f64,
    n: usize,
    rng: &mut R,
) -> Vec<(f64, f64)> {
    (0..n)
        .map(|_| {
            let theta = rng.random_range(0.0..TAU);
            let r = radius * rng.random::<f64>().sqrt();
            (x + r * theta.cos(), y + r * theta.sin())
        })
        .collect()
}
