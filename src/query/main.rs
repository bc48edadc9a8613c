//! Command-line front end for boundary-aware region lookups.
//!
//! Loads region layers from GeoJSON, then answers a single point query or a
//! CSV batch of points, printing one JSON outcome per point.

mod config;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hashbrown::HashMap;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use boundarysafe::loader::load_geojson_layer;
use boundarysafe::{
    estimate, estimate_geographic, seeded_rng, DistanceBand, EstimateConfig, LayerKind, Outcome,
    Projector, RegionLayers, Status,
};

use crate::config::{parse_layer_arg, Config};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Boundary-aware region lookup under GPS uncertainty")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Region layer as KIND=PATH (GeoJSON, planar CRS); repeatable
    #[arg(long = "layer-file", value_name = "KIND=PATH")]
    layer_files: Vec<String>,

    /// Seed for the per-query random generator
    #[arg(long)]
    seed: Option<u64>,

    /// GPS error radius in meters
    #[arg(long)]
    gps_radius: Option<f64>,

    /// Monte Carlo samples per query
    #[arg(long)]
    n_samples: Option<usize>,

    /// Top-label share required to answer
    #[arg(long)]
    p_thresh: Option<f64>,

    /// EPSG code of the planar CRS the layers are stored in
    #[arg(long)]
    planar_epsg: Option<u32>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a single point
    Point {
        /// Layer to resolve against (county, zcta, tract)
        #[arg(long)]
        layer: String,

        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Planar x in meters (instead of lat/lon)
        #[arg(long, allow_hyphen_values = true)]
        x: Option<f64>,

        /// Planar y in meters (instead of lat/lon)
        #[arg(long, allow_hyphen_values = true)]
        y: Option<f64>,
    },

    /// Resolve every row of a CSV file with `id,lat,lon` columns
    Batch {
        /// Layer to resolve against (county, zcta, tract)
        #[arg(long)]
        layer: String,

        /// Input CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Output JSON lines (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Deserialize)]
struct PointRow {
    id: String,
    lat: f64,
    lon: f64,
}

#[derive(Serialize)]
struct BatchRecord<'a> {
    id: &'a str,
    #[serde(flatten)]
    outcome: &'a Outcome,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays pure JSON
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => Config::default(),
    };
    apply_overrides(&args, &mut config)?;
    config.estimate.validate()?;

    let layers = load_layers(&config)?;
    let seed = config.global.seed;

    match &args.command {
        Command::Point {
            layer,
            lat,
            lon,
            x,
            y,
        } => {
            let layer: LayerKind = layer.parse()?;
            let mut rng = seeded_rng(seed);
            let outcome = match (lat, lon, x, y) {
                (Some(lat), Some(lon), None, None) => {
                    let projector = Projector::new(config.estimate.planar_epsg)?;
                    estimate_geographic(
                        *lat,
                        *lon,
                        layer,
                        &layers,
                        &projector,
                        &config.estimate,
                        &mut rng,
                    )?
                }
                (None, None, Some(x), Some(y)) => {
                    estimate(*x, *y, layer, &layers, &config.estimate, &mut rng)?
                }
                _ => bail!("Provide either --lat and --lon, or --x and --y"),
            };
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Batch {
            layer,
            input,
            output,
        } => {
            let layer: LayerKind = layer.parse()?;
            run_batch(layer, input, output.as_deref(), &layers, &config.estimate, seed)?;
        }
    }

    Ok(())
}

fn apply_overrides(args: &Args, config: &mut Config) -> Result<()> {
    if let Some(seed) = args.seed {
        config.global.seed = seed;
    }
    if let Some(radius) = args.gps_radius {
        config.estimate.gps_radius_m = radius;
    }
    if let Some(n) = args.n_samples {
        config.estimate.n_samples = n;
    }
    if let Some(p) = args.p_thresh {
        config.estimate.p_thresh = p;
    }
    if let Some(epsg) = args.planar_epsg {
        config.estimate.planar_epsg = epsg;
    }
    for arg in &args.layer_files {
        config.layers.push(parse_layer_arg(arg)?);
    }
    Ok(())
}

fn load_layers(config: &Config) -> Result<RegionLayers> {
    if config.layers.is_empty() {
        bail!("No region layers configured (use --layer-file KIND=PATH or [[layers]] in config)");
    }

    let mut layers = RegionLayers::new();
    for layer in &config.layers {
        layers.insert(load_geojson_layer(&layer.path, layer.kind)?);
    }
    info!("Loaded {} region layers", layers.len());
    Ok(layers)
}

fn run_batch(
    layer: LayerKind,
    input: &Path,
    output: Option<&Path>,
    layers: &RegionLayers,
    estimate_config: &EstimateConfig,
    seed: u64,
) -> Result<()> {
    // Fail on configuration before reading any rows
    layers.validated(layer, estimate_config.planar_epsg)?;
    let projector = Projector::new(estimate_config.planar_epsg)?;

    let mut reader = csv::Reader::from_path(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;

    // Projection runs once per row, up front
    let mut rows = Vec::new();
    for (i, row) in reader.deserialize::<PointRow>().enumerate() {
        let row = row.with_context(|| format!("Bad CSV row {}", i + 1))?;
        let (x, y) = projector
            .to_planar(row.lon, row.lat)
            .with_context(|| format!("Cannot project row {} ({})", i + 1, row.id))?;
        rows.push((row, x, y));
    }
    info!("Resolving {} points against {} layer", rows.len(), layer);

    let pb = ProgressBar::new(rows.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    // One generator per row keeps results independent of thread scheduling
    let outcomes: Vec<Outcome> = rows
        .par_iter()
        .enumerate()
        .map(|(i, (row, x, y))| {
            let mut rng = seeded_rng(seed.wrapping_add(i as u64));
            let outcome = estimate(*x, *y, layer, layers, estimate_config, &mut rng)
                .map(|o| o.with_geographic(row.lat, row.lon));
            pb.inc(1);
            outcome
        })
        .collect::<boundarysafe::Result<_>>()?;
    pb.finish_and_clear();

    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut by_status: HashMap<Status, usize> = HashMap::new();
    let mut by_band: HashMap<DistanceBand, usize> = HashMap::new();

    for ((row, _, _), outcome) in rows.iter().zip(&outcomes) {
        *by_status.entry(outcome.status).or_default() += 1;
        if let Some(band) = outcome.band {
            *by_band.entry(band).or_default() += 1;
        }

        let record = BatchRecord {
            id: &row.id,
            outcome,
        };
        serde_json::to_writer(&mut writer, &record)?;
        writeln!(writer)?;
    }
    writer.flush()?;

    for status in [Status::Answer, Status::Abstain, Status::Error] {
        info!("  {}: {}", status, by_status.get(&status).copied().unwrap_or(0));
    }
    for band in DistanceBand::all() {
        info!("  {}: {}", band, by_band.get(band).copied().unwrap_or(0));
    }

    Ok(())
}
