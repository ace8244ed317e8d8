//! Historical AQI aggregation and trend classification.
//!
//! Observations are grouped into time buckets, each bucket is reduced to
//! averages and extremes over valid readings, and the bucket averages are
//! then summarised and classified as improving, worsening or stable.

pub mod aggregate;
pub mod trend;
pub mod types;
pub mod utility;
