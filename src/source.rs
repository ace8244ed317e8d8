//! Station resolution and observation loading.
//!
//! [`ObservationSource`] is the seam between the query handler and wherever
//! readings live. [`ReadingStore`] implements it over a CSV or JSON file,
//! read from disk or fetched over HTTP.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::fetch::{HttpClient, fetch_bytes};
use crate::observation::{Observation, StationReading};

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points, in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// A circle around a point of interest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchArea {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
}

impl SearchArea {
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        haversine_km(self.latitude, self.longitude, latitude, longitude) <= self.radius_km
    }
}

/// Provides observations for stations inside an area over a time range.
#[async_trait]
pub trait ObservationSource: Send + Sync {
    /// Returns every observation in `[start, end]` from stations inside
    /// `area`, or from all stations when `area` is `None`.
    async fn observations(
        &self,
        area: Option<SearchArea>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Observation>>;
}

/// Decodes a readings file. A body starting with `[` is a JSON array,
/// anything else is CSV with a header row.
pub fn parse_readings(bytes: &[u8]) -> Result<Vec<StationReading>> {
    let first = bytes.iter().find(|b| !b.is_ascii_whitespace());

    if first == Some(&b'[') {
        return serde_json::from_slice(bytes).context("Failed to parse JSON readings");
    }

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let mut rows = Vec::new();
    for (line, result) in rdr.deserialize().enumerate() {
        let record: StationReading =
            result.with_context(|| format!("Invalid CSV reading at record {}", line + 1))?;
        rows.push(record);
    }
    Ok(rows)
}

/// Keeps readings inside `area` and `[start, end]`, logging how many
/// stations matched.
pub fn select_readings(
    readings: Vec<StationReading>,
    area: Option<SearchArea>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<Observation> {
    let total = readings.len();
    let mut stations = BTreeSet::new();

    let selected: Vec<Observation> = readings
        .into_iter()
        .filter(|r| area.is_none_or(|a| a.contains(r.latitude, r.longitude)))
        .filter(|r| r.timestamp >= start && r.timestamp <= end)
        .map(|r| {
            stations.insert(r.station_id.clone());
            r.into_observation()
        })
        .collect();

    info!(
        total,
        selected = selected.len(),
        stations = stations.len(),
        "Resolved station readings"
    );
    selected
}

enum Location {
    Local(String),
    Remote {
        url: String,
        client: Box<dyn HttpClient>,
    },
}

/// Station readings stored in a single file on disk or behind a URL.
pub struct ReadingStore {
    location: Location,
}

impl ReadingStore {
    pub fn local(path: &str) -> Self {
        Self {
            location: Location::Local(path.to_string()),
        }
    }

    pub fn remote(url: &str, client: Box<dyn HttpClient>) -> Self {
        Self {
            location: Location::Remote {
                url: url.to_string(),
                client,
            },
        }
    }

    async fn load(&self) -> Result<Vec<StationReading>> {
        let bytes = match &self.location {
            Location::Local(path) => tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read readings file '{path}'"))?,
            Location::Remote { url, client } => fetch_bytes(client.as_ref(), url).await?,
        };
        debug!(bytes = bytes.len(), "Readings loaded, parsing");
        parse_readings(&bytes)
    }
}

#[async_trait]
impl ObservationSource for ReadingStore {
    async fn observations(
        &self,
        area: Option<SearchArea>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Observation>> {
        let readings = self.load().await?;
        Ok(select_readings(readings, area, start, end))
    }
}
