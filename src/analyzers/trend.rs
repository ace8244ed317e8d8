//! Trend classification over a sequence of bucket averages.

use serde::{Deserialize, Serialize};

use crate::analyzers::types::Trend;
use crate::analyzers::utility::{mean, round2};

/// Whether air quality got better or worse. Lower AQI is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Worsening,
    Stable,
}

/// Classifies a percentage change against a symmetric threshold.
///
/// | Change              | Direction |
/// |---------------------|-----------|
/// | <= -threshold       | improving |
/// | >= +threshold       | worsening |
/// | otherwise           | stable    |
pub fn classify(percentage_change: f64, threshold_pct: f64) -> TrendDirection {
    match percentage_change {
        p if p <= -threshold_pct => TrendDirection::Improving,
        p if p >= threshold_pct => TrendDirection::Worsening,
        _ => TrendDirection::Stable,
    }
}

/// Relative change from `first` to `second`, in percent, rounded to two
/// decimals. A zero baseline gives 0.0 if `second` is also zero, 100.0 otherwise.
pub fn percentage_change(first: f64, second: f64) -> f64 {
    if first == 0.0 {
        return if second == 0.0 { 0.0 } else { 100.0 };
    }
    round2((second - first) / first * 100.0)
}

/// Compares the mean of the first half of `series` with the mean of the
/// second half. Halves are split by count at `len / 2`, so with an odd
/// length the middle value belongs to the second half.
///
/// Returns `None` with fewer than two values.
pub fn trend(series: &[f64], threshold_pct: f64) -> Option<Trend> {
    if series.len() < 2 {
        return None;
    }

    let mid = series.len() / 2;
    let first = mean(&series[..mid]);
    let second = mean(&series[mid..]);

    let pct = percentage_change(first, second);
    let direction = classify(pct, threshold_pct);

    Some(Trend {
        direction,
        percentage_change: pct,
        message: message(direction, pct, first, second),
    })
}

fn message(direction: TrendDirection, pct: f64, first: f64, second: f64) -> String {
    match direction {
        TrendDirection::Improving => format!(
            "Air quality improved by {:.1}% over the period (average AQI {:.0} → {:.0}).",
            pct.abs(),
            first,
            second
        ),
        TrendDirection::Worsening => format!(
            "Air quality worsened by {:.1}% over the period (average AQI {:.0} → {:.0}).",
            pct.abs(),
            first,
            second
        ),
        TrendDirection::Stable => format!(
            "Air quality remained stable over the period ({:+.1}% change, average AQI {:.0} → {:.0}).",
            pct, first, second
        ),
    }
}
