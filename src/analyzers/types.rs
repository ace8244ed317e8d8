//! Data types produced by the aggregation pipeline.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::analyzers::trend::TrendDirection;
use crate::aqi::{AqiCategory, CategoryCounts, Pollutant};

fn is_zero(n: &usize) -> bool {
    *n == 0
}

/// Statistics for one time bucket. Numeric fields are omitted when the
/// bucket holds no valid reading for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketStat {
    /// Bucket start in the reference timezone.
    pub timestamp: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aqi_avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aqi_min: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aqi_max: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub o3_avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no2_avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm25_avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_pollutant: Option<Pollutant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<AqiCategory>,
    /// How many valid AQI readings fell in each health category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_counts: Option<CategoryCounts>,
    /// Number of valid AQI readings in the bucket.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub samples_count: usize,
}

impl BucketStat {
    /// A bucket with no valid readings.
    pub fn empty(timestamp: DateTime<FixedOffset>) -> Self {
        BucketStat {
            timestamp,
            aqi_avg: None,
            aqi_min: None,
            aqi_max: None,
            o3_avg: None,
            no2_avg: None,
            pm25_avg: None,
            dominant_pollutant: None,
            category: None,
            category_counts: None,
            samples_count: 0,
        }
    }
}

/// Statistics of bucket averages across the whole range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub stddev: f64,
    /// Number of buckets with a valid AQI average.
    pub buckets: usize,
}

/// Direction and size of the AQI change across the range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub direction: TrendDirection,
    #[serde(rename = "percentageChange")]
    pub percentage_change: f64,
    pub message: String,
}

/// Output of a single aggregation call.
///
/// `stats` and `trend` serialize as `null` when absent so callers always
/// see the keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryResult {
    pub buckets: Vec<BucketStat>,
    pub stats: Option<SeriesStats>,
    pub trend: Option<Trend>,
}

impl HistoryResult {
    /// No bucket carries a valid AQI average.
    pub fn is_empty(&self) -> bool {
        self.stats.is_none()
    }
}
