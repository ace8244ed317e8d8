//! Error taxonomy for the aggregation core.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors returned by [`crate::analyzers::aggregate::aggregate`] and the
/// parsing helpers that feed it.
///
/// An empty result is not an error: it is a [`crate::analyzers::types::HistoryResult`]
/// with no stats and no trend.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AggregateError {
    /// The requested range ends before it starts.
    #[error("Invalid range: end {end} is before start {start}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// The granularity string is not one of the supported bucket sizes.
    #[error("Invalid granularity: '{0}'. Valid granularities: hourly, daily, weekly, monthly")]
    InvalidGranularity(String),

    /// Filling every boundary of the range would exceed the bucket limit.
    #[error("Range too large: more than {limit} {granularity} buckets between {start} and {end}")]
    RangeTooLarge {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity: &'static str,
        limit: usize,
    },

    /// The aggregator configuration cannot be used.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
