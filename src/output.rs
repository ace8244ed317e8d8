//! Output formatting and persistence for aggregation results.
//!
//! Supports pretty-printing, JSON serialization, and CSV append.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::types::BucketStat;
use crate::aqi::{AqiCategory, Pollutant};
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Flat CSV row for a [`BucketStat`]. Every column is always written so
/// rows stay aligned; absent values become empty cells.
#[derive(Debug, Serialize)]
struct BucketRow {
    granularity: &'static str,
    timestamp: String,
    aqi_avg: Option<f64>,
    aqi_min: Option<i32>,
    aqi_max: Option<i32>,
    o3_avg: Option<f64>,
    no2_avg: Option<f64>,
    pm25_avg: Option<f64>,
    dominant_pollutant: Option<&'static str>,
    category: Option<AqiCategory>,
    samples_count: usize,
    good: Option<usize>,
    moderate: Option<usize>,
    unhealthy_for_sensitive_groups: Option<usize>,
    unhealthy: Option<usize>,
    very_unhealthy: Option<usize>,
    hazardous: Option<usize>,
}

impl BucketRow {
    fn new(granularity: &'static str, b: &BucketStat) -> Self {
        let counts = b.category_counts;
        BucketRow {
            granularity,
            timestamp: b.timestamp.to_rfc3339(),
            aqi_avg: b.aqi_avg,
            aqi_min: b.aqi_min,
            aqi_max: b.aqi_max,
            o3_avg: b.o3_avg,
            no2_avg: b.no2_avg,
            pm25_avg: b.pm25_avg,
            dominant_pollutant: b.dominant_pollutant.map(Pollutant::code),
            category: b.category,
            samples_count: b.samples_count,
            good: counts.map(|c| c.good),
            moderate: counts.map(|c| c.moderate),
            unhealthy_for_sensitive_groups: counts.map(|c| c.unhealthy_for_sensitive_groups),
            unhealthy: counts.map(|c| c.unhealthy),
            very_unhealthy: counts.map(|c| c.very_unhealthy),
            hazardous: counts.map(|c| c.hazardous),
        }
    }
}

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty<T: std::fmt::Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Appends bucket rows to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_buckets(path: &str, granularity: &'static str, buckets: &[BucketStat]) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, rows = buckets.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for b in buckets {
        writer.serialize(BucketRow::new(granularity, b))?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aqi::CategoryCounts;
    use chrono::{FixedOffset, TimeZone};
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn buckets() -> Vec<BucketStat> {
        let tz = FixedOffset::east_opt(0).unwrap();
        let mut full = BucketStat::empty(tz.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        full.aqi_avg = Some(42.5);
        full.aqi_min = Some(40);
        full.aqi_max = Some(45);
        full.pm25_avg = Some(9.1);
        full.dominant_pollutant = Some(Pollutant::Pm25);
        full.category = Some(AqiCategory::Good);
        full.category_counts = Some(CategoryCounts {
            good: 2,
            ..Default::default()
        });
        full.samples_count = 2;

        let empty = BucketStat::empty(tz.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap());
        vec![full, empty]
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&buckets());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&buckets()).unwrap();
    }

    #[test]
    fn test_append_buckets_creates_file() {
        let path = temp_path("aqi_history_test_create.csv");
        let _ = fs::remove_file(&path); // clean up any prior run

        append_buckets(&path, "daily", &buckets()).unwrap();

        assert!(Path::new(&path).exists());
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("pm25"));
        assert!(content.contains("good"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_buckets_writes_header_once() {
        let path = temp_path("aqi_history_test_header.csv");
        let _ = fs::remove_file(&path);

        append_buckets(&path, "daily", &buckets()).unwrap();
        append_buckets(&path, "daily", &buckets()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        // Header line should appear exactly once
        let header_count = content.lines().filter(|l| l.contains("timestamp")).count();
        assert_eq!(header_count, 1);

        // 1 header + 2 appends of 2 rows
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 5);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_empty_bucket_row_keeps_column_count() {
        let path = temp_path("aqi_history_test_columns.csv");
        let _ = fs::remove_file(&path);

        append_buckets(&path, "daily", &buckets()).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let widths: Vec<usize> = rdr.records().map(|r| r.unwrap().len()).collect();
        assert_eq!(widths, vec![17, 17]);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_category_count_columns() {
        let path = temp_path("aqi_history_test_category_columns.csv");
        let _ = fs::remove_file(&path);

        append_buckets(&path, "daily", &buckets()).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let headers = rdr.headers().unwrap().clone();
        let good = headers.iter().position(|h| h == "good").unwrap();
        let hazardous = headers.iter().position(|h| h == "hazardous").unwrap();

        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[0][good], "2");
        assert_eq!(&rows[0][hazardous], "0");
        assert_eq!(&rows[1][good], "");

        fs::remove_file(&path).unwrap();
    }
}
