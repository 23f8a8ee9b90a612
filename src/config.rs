//! Session configuration.
//!
//! Loaded from an optional TOML file, then overridden by command-line flags.
//! Everything here is fixed for the session except target depth and rate,
//! which operator commands change later.

use crate::deco::ModelKind;
use crate::profile::{DEFAULT_DEPTH_AXIS_STEP_M, DEFAULT_SAMPLE_INTERVAL_S, DEFAULT_TIME_AXIS_STEP_MIN};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: f64 },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub dive: DiveConfig,

    #[serde(default)]
    pub models: Vec<ModelKind>,

    /// `tcp://host:port` or a serial device path.
    #[serde(default)]
    pub device: Option<String>,

    #[serde(default)]
    pub plot: PlotConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiveConfig {
    #[serde(default = "default_target_depth")]
    pub initial_target_depth_m: f64,

    /// Metres per minute, as the operator enters it.
    #[serde(default = "default_rate")]
    pub initial_rate_m_per_min: f64,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for DiveConfig {
    fn default() -> Self {
        Self {
            initial_target_depth_m: default_target_depth(),
            initial_rate_m_per_min: default_rate(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlotConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_sample_interval")]
    pub sample_interval_s: f64,

    #[serde(default = "default_time_axis_step")]
    pub time_axis_step_min: f64,

    #[serde(default = "default_depth_axis_step")]
    pub depth_axis_step_m: f64,

    /// JSON-lines file receiving profile samples.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sample_interval_s: default_sample_interval(),
            time_axis_step_min: default_time_axis_step(),
            depth_axis_step_m: default_depth_axis_step(),
            output: None,
        }
    }
}

fn default_target_depth() -> f64 {
    5.0
}

fn default_rate() -> f64 {
    8.0
}

fn default_tick_interval_ms() -> u64 {
    100
}

fn default_sample_interval() -> f64 {
    DEFAULT_SAMPLE_INTERVAL_S
}

fn default_time_axis_step() -> f64 {
    DEFAULT_TIME_AXIS_STEP_MIN
}

fn default_depth_axis_step() -> f64 {
    DEFAULT_DEPTH_AXIS_STEP_M
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dive: DiveConfig::default(),
            models: Vec::new(),
            device: None,
            plot: PlotConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&contents)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_finite("initial_target_depth_m", self.dive.initial_target_depth_m)?;
        require_finite("initial_rate_m_per_min", self.dive.initial_rate_m_per_min)?;

        if self.dive.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tick_interval_ms",
                value: 0.0,
            });
        }

        require_positive("sample_interval_s", self.plot.sample_interval_s)?;
        require_positive("time_axis_step_min", self.plot.time_axis_step_min)?;
        require_positive("depth_axis_step_m", self.plot.depth_axis_step_m)?;
        Ok(())
    }

    /// Initial rate as the integrator stores it, metres per second.
    pub fn initial_rate_per_second(&self) -> f64 {
        (self.dive.initial_rate_m_per_min / 60.0).abs()
    }

    pub fn enable_model(&mut self, kind: ModelKind) {
        if !self.models.contains(&kind) {
            self.models.push(kind);
        }
    }
}

fn require_finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue { field, value })
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue { field, value })
    }
}
