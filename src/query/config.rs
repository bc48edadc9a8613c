use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use boundarysafe::{EstimateConfig, LayerKind};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub global: GlobalConfig,
    pub estimate: EstimateConfig,
    pub layers: Vec<LayerConfig>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GlobalConfig {
    pub seed: u64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LayerConfig {
    pub kind: LayerKind,
    pub path: PathBuf,
}

impl Config {
    /// Load a config file. Relative layer paths are taken from the file's directory.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let mut config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        if let Some(dir) = path.parent() {
            for layer in &mut config.layers {
                if layer.path.is_relative() {
                    layer.path = dir.join(&layer.path);
                }
            }
        }
        Ok(config)
    }
}

/// Parse a `kind=path` layer argument
pub fn parse_layer_arg(arg: &str) -> Result<LayerConfig> {
    let (kind, path) = arg
        .split_once('=')
        .with_context(|| format!("Expected KIND=PATH, got '{arg}'"))?;
    Ok(LayerConfig {
        kind: kind.parse()?,
        path: PathBuf::from(path),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boundarysafe.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[global]
seed = 7

[estimate]
gps_radius_m = 30.0
p_thresh = 0.95

[[layers]]
kind = "zcta"
path = "zcta.geojson"
"#
        )
        .unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.global.seed, 7);
        assert_eq!(config.estimate.gps_radius_m, 30.0);
        assert_eq!(config.estimate.n_samples, 100);
        assert_eq!(config.estimate.p_thresh, 0.95);
        assert_eq!(config.estimate.planar_epsg, 2163);
        assert_eq!(config.layers.len(), 1);
        assert_eq!(config.layers[0].kind, LayerKind::Zcta);
        assert_eq!(config.layers[0].path, dir.path().join("zcta.geojson"));
    }

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.global.seed, 42);
        assert_eq!(config.estimate.n_samples, 100);
        assert!(config.layers.is_empty());
    }

    #[test]
    fn test_parse_layer_arg() {
        let layer = parse_layer_arg("tract=/data/tracts.geojson").unwrap();
        assert_eq!(layer.kind, LayerKind::Tract);
        assert_eq!(layer.path, PathBuf::from("/data/tracts.geojson"));
        assert!(parse_layer_arg("tract").is_err());
        assert!(parse_layer_arg("state=x.geojson").is_err());
    }
}
