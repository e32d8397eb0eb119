use crate::errors::ConfigError;
use crate::models::HeatmapQuery;
use std::{env, path::PathBuf, str::FromStr, time::Duration};

pub const DEFAULT_CELL_SIZE: u32 = 20;
pub const DEFAULT_THRESHOLD: f64 = 30.0;
pub const DEFAULT_INTENSITY: u32 = 50;
pub const DEFAULT_WIDTH: u32 = 1920;
pub const DEFAULT_HEIGHT: u32 = 1080;
pub const MAX_CANVAS_SIDE: u32 = 16_384;
pub const MAX_GRID_CELLS: u64 = 1_000_000;

/// Options consumed by the heatmap pipeline. `intensity` is only read when
/// painting; the transforms ignore it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatmapConfig {
    pub cell_size: u32,
    pub threshold: f64,
    pub intensity: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            threshold: DEFAULT_THRESHOLD,
            intensity: DEFAULT_INTENSITY,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl HeatmapConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cell_size == 0 {
            return Err(ConfigError::CellSize);
        }
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(ConfigError::Threshold(self.threshold));
        }
        if !(10..=100).contains(&self.intensity) {
            return Err(ConfigError::Intensity(self.intensity));
        }
        let side = 1..=MAX_CANVAS_SIDE;
        if !side.contains(&self.width) || !side.contains(&self.height) {
            return Err(ConfigError::Canvas {
                width: self.width,
                height: self.height,
            });
        }
        let rows = u64::from(self.height.div_ceil(self.cell_size));
        let cols = u64::from(self.width.div_ceil(self.cell_size));
        match rows.checked_mul(cols) {
            Some(cells) if cells <= MAX_GRID_CELLS => Ok(()),
            _ => Err(ConfigError::Grid { rows, cols }),
        }
    }

    /// Applies per-request overrides on top of `self` and validates the result.
    pub fn with_overrides(&self, query: &HeatmapQuery) -> Result<Self, ConfigError> {
        let config = Self {
            cell_size: query.cell_size.unwrap_or(self.cell_size),
            threshold: query.threshold.unwrap_or(self.threshold),
            intensity: query.intensity.unwrap_or(self.intensity),
            width: query.width.unwrap_or(self.width),
            height: query.height.unwrap_or(self.height),
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub data_path: PathBuf,
    pub heartbeat: Duration,
    pub move_sample_rate: f64,
    pub heatmap: HeatmapConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            data_path: PathBuf::from("data/state.json"),
            heartbeat: Duration::from_secs(30),
            move_sample_rate: 0.01,
            heatmap: HeatmapConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let heartbeat_secs: u64 = parse_var(&lookup, "HEARTBEAT_SECS", 30)?;
        if heartbeat_secs == 0 {
            return Err(ConfigError::Heartbeat);
        }

        let config = Self {
            port: parse_var(&lookup, "PORT", defaults.port)?,
            data_path: lookup("APP_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            heartbeat: Duration::from_secs(heartbeat_secs),
            move_sample_rate: parse_var(&lookup, "MOVE_SAMPLE_RATE", defaults.move_sample_rate)?,
            heatmap: HeatmapConfig {
                cell_size: parse_var(&lookup, "HEATMAP_CELL_SIZE", DEFAULT_CELL_SIZE)?,
                threshold: parse_var(&lookup, "HEATMAP_THRESHOLD", DEFAULT_THRESHOLD)?,
                intensity: parse_var(&lookup, "HEATMAP_INTENSITY", DEFAULT_INTENSITY)?,
                width: parse_var(&lookup, "HEATMAP_WIDTH", DEFAULT_WIDTH)?,
                height: parse_var(&lookup, "HEATMAP_HEIGHT", DEFAULT_HEIGHT)?,
            },
        };

        if !(0.0..=1.0).contains(&config.move_sample_rate) {
            return Err(ConfigError::SampleRate(config.move_sample_rate));
        }
        config.heatmap.validate()?;
        Ok(config)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Env { key, value }),
        None => Ok(default),
    }
}
