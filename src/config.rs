//! Aggregator configuration.
//!
//! Stored as a plain JSON object on disk, every field optional:
//! ```json
//! {
//!   "sentinels": [-999, -9999, -1, 999, 9999],
//!   "trend_threshold_pct": 5.0,
//!   "utc_offset_minutes": -480,
//!   "fill_gaps": false,
//!   "max_buckets": 10000
//! }
//! ```
//! Environment variables `AQI_TREND_THRESHOLD_PCT`, `AQI_UTC_OFFSET_MINUTES`,
//! `AQI_FILL_GAPS` and `AQI_MAX_BUCKETS` override the file.

use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AggregateError;

/// Placeholder values upstream feeds use for missing or broken readings.
pub const DEFAULT_SENTINELS: &[f64] = &[-999.0, -9999.0, -1.0, 999.0, 9999.0];

/// Minimum absolute percentage change classified as a trend.
pub const DEFAULT_TREND_THRESHOLD_PCT: f64 = 5.0;

/// Upper bound on buckets produced by gap filling.
pub const DEFAULT_MAX_BUCKETS: usize = 10_000;

/// Immutable settings shared by every aggregation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub sentinels: Vec<f64>,
    /// Classification threshold in percent. `improving` at `<= -threshold`,
    /// `worsening` at `>= threshold`.
    pub trend_threshold_pct: f64,
    /// Fixed offset of the reference timezone used for bucket boundaries.
    pub utc_offset_minutes: i32,
    /// Emit empty buckets for every boundary in the range.
    pub fill_gaps: bool,
    /// Gap filling fails with [`AggregateError::RangeTooLarge`] beyond this many buckets.
    pub max_buckets: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            sentinels: DEFAULT_SENTINELS.to_vec(),
            trend_threshold_pct: DEFAULT_TREND_THRESHOLD_PCT,
            utc_offset_minutes: 0,
            fill_gaps: false,
            max_buckets: DEFAULT_MAX_BUCKETS,
        }
    }
}

impl AggregatorConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{path}'"))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config '{path}'"))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads from `path` when given, otherwise defaults, then applies
    /// environment overrides.
    pub fn resolve(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        debug!(?config, "Aggregator configuration resolved");
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var("AQI_TREND_THRESHOLD_PCT") {
            self.trend_threshold_pct = v
                .parse()
                .with_context(|| format!("AQI_TREND_THRESHOLD_PCT is not a number: '{v}'"))?;
        }
        if let Ok(v) = std::env::var("AQI_UTC_OFFSET_MINUTES") {
            self.utc_offset_minutes = v
                .parse()
                .with_context(|| format!("AQI_UTC_OFFSET_MINUTES is not an integer: '{v}'"))?;
        }
        if let Ok(v) = std::env::var("AQI_FILL_GAPS") {
            self.fill_gaps = matches!(v.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Ok(v) = std::env::var("AQI_MAX_BUCKETS") {
            self.max_buckets = v
                .parse()
                .with_context(|| format!("AQI_MAX_BUCKETS is not a count: '{v}'"))?;
        }
        Ok(())
    }

    /// Checks that the threshold, bucket limit and offset are usable.
    pub fn validate(&self) -> Result<(), AggregateError> {
        if !self.trend_threshold_pct.is_finite() || self.trend_threshold_pct <= 0.0 {
            return Err(AggregateError::InvalidConfig(format!(
                "trend_threshold_pct must be a positive number, got {}",
                self.trend_threshold_pct
            )));
        }
        if self.max_buckets == 0 {
            return Err(AggregateError::InvalidConfig(
                "max_buckets must be at least 1".to_string(),
            ));
        }
        self.timezone()?;
        Ok(())
    }

    /// The reference timezone for bucket boundaries.
    pub fn timezone(&self) -> Result<FixedOffset, AggregateError> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                AggregateError::InvalidConfig(format!(
                    "utc_offset_minutes out of range: {}",
                    self.utc_offset_minutes
                ))
            })
    }
}
