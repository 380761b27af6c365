//! Analytics configuration: P-Score weights, priority thresholds and forecast
//! parameters.
//!
//! Loaded from a TOML file (every field optional, see the `default_*`
//! functions) and then adjusted from environment variables.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors raised while loading or validating analytics configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("No csip.toml found in standard locations")]
    NotFound,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Relative weight of each sub-score in the P-Score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightConfig {
    #[serde(default = "default_weight_hvi")]
    pub hvi: f64,
    #[serde(default = "default_weight_iss")]
    pub iss: f64,
    #[serde(default = "default_weight_rcs")]
    pub rcs: f64,
}

fn default_weight_hvi() -> f64 {
    0.4
}

fn default_weight_iss() -> f64 {
    0.3
}

fn default_weight_rcs() -> f64 {
    0.3
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            hvi: default_weight_hvi(),
            iss: default_weight_iss(),
            rcs: default_weight_rcs(),
        }
    }
}

impl WeightConfig {
    pub fn sum(&self) -> f64 {
        self.hvi + self.iss + self.rcs
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, w) in [("hvi", self.hvi), ("iss", self.iss), ("rcs", self.rcs)] {
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "weight '{}' must be a finite non-negative number, got {}",
                    name, w
                )));
            }
        }
        if self.sum() <= 0.0 {
            return Err(ConfigError::Invalid(
                "at least one P-Score weight must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Scale the weights so they sum to 1.0.
    ///
    /// The default weights already sum to 1.0 and are returned unchanged.
    pub fn normalised(&self) -> Self {
        let sum = self.sum();
        if sum <= 0.0 || (sum - 1.0).abs() < f64::EPSILON {
            return *self;
        }
        Self {
            hvi: self.hvi / sum,
            iss: self.iss / sum,
            rcs: self.rcs / sum,
        }
    }
}

/// Priority and comparison thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_critical")]
    pub critical: f64,
    #[serde(default = "default_high")]
    pub high: f64,
    #[serde(default = "default_medium")]
    pub medium: f64,
    #[serde(default = "default_sel_critical")]
    pub sel_critical: f64,
    #[serde(default = "default_sel_high")]
    pub sel_high: f64,
    /// Differences at or below this magnitude are left out of comparisons.
    #[serde(default = "default_compare_epsilon")]
    pub compare_epsilon: f64,
}

fn default_critical() -> f64 {
    8.0
}

fn default_high() -> f64 {
    6.0
}

fn default_medium() -> f64 {
    4.0
}

fn default_sel_critical() -> f64 {
    1.3
}

fn default_sel_high() -> f64 {
    1.2
}

fn default_compare_epsilon() -> f64 {
    0.1
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            critical: default_critical(),
            high: default_high(),
            medium: default_medium(),
            sel_critical: default_sel_critical(),
            sel_high: default_sel_high(),
            compare_epsilon: default_compare_epsilon(),
        }
    }
}

impl ThresholdConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.critical > self.high && self.high > self.medium && self.medium >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "score thresholds must descend: critical {} > high {} > medium {} >= 0",
                self.critical, self.high, self.medium
            )));
        }
        if self.sel_high > self.sel_critical {
            return Err(ConfigError::Invalid(format!(
                "sel_high ({}) must not exceed sel_critical ({})",
                self.sel_high, self.sel_critical
            )));
        }
        if !self.compare_epsilon.is_finite() || self.compare_epsilon < 0.0 {
            return Err(ConfigError::Invalid(
                "compare_epsilon must be a finite non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacityGapConfig {
    /// Worker count at which the gap is half of the HVI.
    #[serde(default = "default_half_saturation_workers")]
    pub half_saturation_workers: f64,
}

fn default_half_saturation_workers() -> f64 {
    25.0
}

impl Default for CapacityGapConfig {
    fn default() -> Self {
        Self {
            half_saturation_workers: default_half_saturation_workers(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Default hold-out window for KPIs.
    #[serde(default = "default_holdout")]
    pub holdout: usize,
    /// Points compared on each side of the trend split.
    #[serde(default = "default_trend_window")]
    pub trend_window: usize,
    #[serde(default = "default_stable_band_pct")]
    pub stable_band_pct: f64,
    #[serde(default = "default_increase_ratio")]
    pub increase_ratio: f64,
    #[serde(default = "default_decrease_ratio")]
    pub decrease_ratio: f64,
    #[serde(default = "default_risk_percentile")]
    pub risk_percentile: f64,
    #[serde(default = "default_max_finetune_steps")]
    pub max_finetune_steps: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Longest horizon a caller may request.
    #[serde(default = "default_max_horizon")]
    pub max_horizon: usize,
}

fn default_holdout() -> usize {
    8
}

fn default_trend_window() -> usize {
    8
}

fn default_stable_band_pct() -> f64 {
    10.0
}

fn default_increase_ratio() -> f64 {
    1.2
}

fn default_decrease_ratio() -> f64 {
    0.8
}

fn default_risk_percentile() -> f64 {
    90.0
}

fn default_max_finetune_steps() -> usize {
    50
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_horizon() -> usize {
    104
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            holdout: default_holdout(),
            trend_window: default_trend_window(),
            stable_band_pct: default_stable_band_pct(),
            increase_ratio: default_increase_ratio(),
            decrease_ratio: default_decrease_ratio(),
            risk_percentile: default_risk_percentile(),
            max_finetune_steps: default_max_finetune_steps(),
            timeout_secs: default_timeout_secs(),
            max_horizon: default_max_horizon(),
        }
    }
}

/// Complete analytics configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default)]
    pub weights: WeightConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub capacity_gap: CapacityGapConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
}

impl AnalyticsConfig {
    /// Load analytics configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AnalyticsConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load analytics configuration from the default location.
    ///
    /// Searches for `csip.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let search_paths = [
            PathBuf::from("csip.toml"),
            PathBuf::from("backend/csip.toml"),
            PathBuf::from("../csip.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(ConfigError::NotFound)
    }

    /// Resolve the configuration the server runs with.
    ///
    /// An explicit path must load; otherwise the default locations are tried
    /// and built-in defaults used when none exists. Environment overrides are
    /// applied last.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit_path {
            Some(path) => Self::from_file(path)?,
            None => match Self::from_default_location() {
                Ok(config) => config,
                Err(ConfigError::NotFound) => {
                    log::info!("No csip.toml found, using built-in analytics defaults");
                    Self::default()
                }
                Err(e) => return Err(e),
            },
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `P_SCORE_WEIGHT_*` and `FORECAST_TIMEOUT_SECS` overrides.
    ///
    /// Values that do not parse are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Some(w) = env_number::<f64>("P_SCORE_WEIGHT_HVI") {
            self.weights.hvi = w;
        }
        if let Some(w) = env_number::<f64>("P_SCORE_WEIGHT_ISS") {
            self.weights.iss = w;
        }
        if let Some(w) = env_number::<f64>("P_SCORE_WEIGHT_RCS") {
            self.weights.rcs = w;
        }
        if let Some(secs) = env_number::<u64>("FORECAST_TIMEOUT_SECS") {
            self.forecast.timeout_secs = secs;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        self.thresholds.validate()?;

        let h = self.capacity_gap.half_saturation_workers;
        if !h.is_finite() || h <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "half_saturation_workers must be positive, got {}",
                h
            )));
        }
        if self.forecast.holdout == 0 {
            return Err(ConfigError::Invalid(
                "forecast.holdout must be at least 1".to_string(),
            ));
        }
        if self.forecast.trend_window == 0 {
            return Err(ConfigError::Invalid(
                "forecast.trend_window must be at least 1".to_string(),
            ));
        }
        if self.forecast.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "forecast.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.forecast.max_horizon < self.forecast.holdout {
            return Err(ConfigError::Invalid(format!(
                "forecast.max_horizon ({}) must be at least forecast.holdout ({})",
                self.forecast.max_horizon, self.forecast.holdout
            )));
        }
        Ok(())
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {}={:?}: not a valid number", key, raw);
            None
        }
    }
}
