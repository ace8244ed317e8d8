//! Sensor readings and the sentinel policy.
//!
//! Station feeds encode missing data as magic numbers (-999, 9999, ...).
//! [`Reading`] turns a raw value into either a usable measurement or
//! [`Reading::Absent`], so nothing downstream averages a placeholder.

use serde::{Deserialize, Serialize};

use crate::config::AggregatorConfig;

/// A single numeric field after the sentinel check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Reading {
    Value(f64),
    Absent,
}

impl Reading {
    /// Classifies a raw value. Negative, non-finite and sentinel values are absent.
    pub fn classify(raw: Option<f64>, sentinels: &[f64]) -> Self {
        match raw {
            Some(v) if is_valid(v, sentinels) => Reading::Value(v),
            _ => Reading::Absent,
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Reading::Value(v) => Some(v),
            Reading::Absent => None,
        }
    }
}

/// Returns `true` if `v` is a real measurement under the given sentinel set.
pub fn is_valid(v: f64, sentinels: &[f64]) -> bool {
    v.is_finite() && v >= 0.0 && !sentinels.iter().any(|s| *s == v)
}

/// The cleaned numeric fields of one observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readings {
    pub aqi: Reading,
    pub o3: Reading,
    pub no2: Reading,
    pub pm25: Reading,
}

impl Readings {
    pub fn from_raw(
        aqi: Option<i32>,
        o3: Option<f64>,
        no2: Option<f64>,
        pm25: Option<f64>,
        config: &AggregatorConfig,
    ) -> Self {
        let s = &config.sentinels;
        Self {
            aqi: Reading::classify(aqi.map(f64::from), s),
            o3: Reading::classify(o3, s),
            no2: Reading::classify(no2, s),
            pm25: Reading::classify(pm25, s),
        }
    }
}
