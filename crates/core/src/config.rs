//! Configuration structures for the liquidity signal pipeline.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Symbol used in diagnostics when a message carries none.
pub const DEFAULT_SYMBOL: &str = "UNKNOWN";
/// Average volume assumed when a message carries none.
pub const DEFAULT_AVG_VOLUME: i64 = 1_000_000;
/// Turnover ratio assumed when a message carries none.
pub const DEFAULT_TURNOVER_RATIO: f64 = 0.8;
/// Divisor that normalizes average volume into score units.
pub const VOLUME_NORMALIZER: f64 = 1_000_000.0;
/// Scores at or above this are LIQUID.
pub const LIQUID_THRESHOLD: f64 = 2.0;
/// Decimal places kept in the stored score.
pub const SCORE_DECIMALS: u32 = 4;

/// Largest scale a decimal rounding can carry.
const MAX_SCORE_DECIMALS: u32 = 28;

/// Main configuration for the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scoring configuration.
    pub scoring: ScoringConfig,
    /// Default schema configuration.
    pub schema: SchemaConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse a JSON document. Missing sections and fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    /// Check that every section holds usable values.
    pub fn validate(&self) -> Result<()> {
        self.scoring.validate()?;
        self.logging.validate()
    }
}

/// Scoring policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Symbol reported when a message has none.
    pub default_symbol: String,
    /// Average volume used when the field is absent.
    pub default_avg_volume: i64,
    /// Turnover ratio used when the field is absent.
    pub default_turnover_ratio: f64,
    /// Volume is divided by this before adding the turnover ratio.
    pub volume_normalizer: f64,
    /// Inclusive LIQUID threshold, compared against the unrounded score.
    pub liquid_threshold: f64,
    /// Decimal places of the stored score (round half to even).
    pub score_decimals: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            default_symbol: DEFAULT_SYMBOL.to_string(),
            default_avg_volume: DEFAULT_AVG_VOLUME,
            default_turnover_ratio: DEFAULT_TURNOVER_RATIO,
            volume_normalizer: VOLUME_NORMALIZER,
            liquid_threshold: LIQUID_THRESHOLD,
            score_decimals: SCORE_DECIMALS,
        }
    }
}

impl ScoringConfig {
    /// Check the scoring policy.
    pub fn validate(&self) -> Result<()> {
        if !self.volume_normalizer.is_finite() || self.volume_normalizer <= 0.0 {
            return Err(Error::config(format!(
                "volume_normalizer must be positive and finite, got {}",
                self.volume_normalizer
            )));
        }
        if !self.liquid_threshold.is_finite() {
            return Err(Error::config("liquid_threshold must be finite"));
        }
        if !self.default_turnover_ratio.is_finite() {
            return Err(Error::config("default_turnover_ratio must be finite"));
        }
        if self.score_decimals > MAX_SCORE_DECIMALS {
            return Err(Error::config(format!(
                "score_decimals must be at most {}, got {}",
                MAX_SCORE_DECIMALS, self.score_decimals
            )));
        }
        Ok(())
    }
}

/// Settings for the built-in market-data schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Keys every message must carry.
    pub required_fields: Vec<String>,
}

/// Tracing subscriber settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
    /// Include the event target.
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            with_target: true,
        }
    }
}

impl LoggingConfig {
    /// Check that the level names a tracing level.
    pub fn validate(&self) -> Result<()> {
        tracing::Level::from_str(&self.level)
            .map(|_| ())
            .map_err(|_| Error::config(format!("unknown log level '{}'", self.level)))
    }
}
