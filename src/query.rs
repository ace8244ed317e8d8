//! Request handling for the history endpoint.
//!
//! Validates a [`HistoryRequest`], resolves nearby stations through an
//! [`ObservationSource`] and shapes the aggregation into a [`HistoryResponse`].

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analyzers::aggregate::aggregate;
use crate::analyzers::types::{BucketStat, SeriesStats, Trend};
use crate::config::AggregatorConfig;
use crate::error::AggregateError;
use crate::granularity::Granularity;
use crate::source::{ObservationSource, SearchArea};

/// Default search radius around the requested point.
pub const DEFAULT_RADIUS_KM: f64 = 25.0;

fn default_radius() -> f64 {
    DEFAULT_RADIUS_KM
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub granularity: String,
    #[serde(default = "default_radius")]
    pub radius_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub data: Vec<BucketStat>,
    pub stats: Option<SeriesStats>,
    pub trend: Option<Trend>,
    pub granularity: Granularity,
}

impl HistoryRequest {
    /// Checks everything that can be rejected without touching a source.
    pub fn validate(&self) -> Result<(Granularity, SearchArea)> {
        let granularity: Granularity = self.granularity.parse()?;

        if self.end_date < self.start_date {
            return Err(AggregateError::InvalidRange {
                start: self.start_date,
                end: self.end_date,
            }
            .into());
        }
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude) {
            bail!(
                "Coordinates out of range: lat={}, lon={}",
                self.latitude,
                self.longitude
            );
        }
        if !self.radius_km.is_finite() || self.radius_km <= 0.0 {
            bail!("radiusKm must be a positive number, got {}", self.radius_km);
        }

        Ok((
            granularity,
            SearchArea {
                latitude: self.latitude,
                longitude: self.longitude,
                radius_km: self.radius_km,
            },
        ))
    }
}

/// Answers a history request: validate, fetch nearby observations, aggregate.
#[tracing::instrument(
    skip(source, config),
    fields(lat = request.latitude, lon = request.longitude, granularity = %request.granularity)
)]
pub async fn handle_history_query<S: ObservationSource + ?Sized>(
    source: &S,
    request: &HistoryRequest,
    config: &AggregatorConfig,
) -> Result<HistoryResponse> {
    let (granularity, area) = request.validate()?;

    let observations = source
        .observations(Some(area), request.start_date, request.end_date)
        .await?;

    let result = aggregate(
        &observations,
        request.start_date,
        request.end_date,
        granularity,
        config,
    )?;

    info!(
        observations = observations.len(),
        buckets = result.buckets.len(),
        empty = result.is_empty(),
        "History query answered"
    );

    Ok(HistoryResponse {
        data: result.buckets,
        stats: result.stats,
        trend: result.trend,
        granularity,
    })
}
