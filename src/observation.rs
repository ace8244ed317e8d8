//! Station observations as they arrive from upstream feeds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AggregatorConfig;
use crate::reading::Readings;

/// One time-stamped reading from a monitoring station, already resolved to
/// the requested area. Numeric fields may still hold sentinel values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub aqi: Option<i32>,
    /// Ozone, ppb.
    #[serde(default)]
    pub o3: Option<f64>,
    /// Nitrogen dioxide, ppb.
    #[serde(default)]
    pub no2: Option<f64>,
    /// Fine particulate matter, µg/m³.
    #[serde(default)]
    pub pm25: Option<f64>,
    /// Dominant pollutant code as reported by the station (e.g. `"PM2.5"`).
    #[serde(default)]
    pub dominant_pollutant: Option<String>,
}

impl Observation {
    pub fn new(timestamp: DateTime<Utc>, aqi: Option<i32>) -> Self {
        Observation {
            timestamp,
            aqi,
            o3: None,
            no2: None,
            pm25: None,
            dominant_pollutant: None,
        }
    }

    /// Set pollutant concentrations
    pub fn with_pollutants(mut self, o3: Option<f64>, no2: Option<f64>, pm25: Option<f64>) -> Self {
        self.o3 = o3;
        self.no2 = no2;
        self.pm25 = pm25;
        self
    }

    /// Set the station-reported dominant pollutant code
    pub fn with_dominant(mut self, code: &str) -> Self {
        self.dominant_pollutant = Some(code.to_string());
        self
    }

    /// Numeric fields after the sentinel check.
    pub fn readings(&self, config: &AggregatorConfig) -> Readings {
        Readings::from_raw(self.aqi, self.o3, self.no2, self.pm25, config)
    }
}

/// A row of a station readings file: an [`Observation`] plus station location.
///
/// Kept flat so the same struct reads CSV rows and JSON objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationReading {
    pub station_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub aqi: Option<i32>,
    #[serde(default)]
    pub o3: Option<f64>,
    #[serde(default)]
    pub no2: Option<f64>,
    #[serde(default)]
    pub pm25: Option<f64>,
    #[serde(default)]
    pub dominant_pollutant: Option<String>,
}

impl StationReading {
    pub fn into_observation(self) -> Observation {
        Observation {
            timestamp: self.timestamp,
            aqi: self.aqi,
            o3: self.o3,
            no2: self.no2,
            pm25: self.pm25,
            dominant_pollutant: self.dominant_pollutant.filter(|c| !c.trim().is_empty()),
        }
    }
}
