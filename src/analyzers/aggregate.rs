use crate::analyzers::trend::trend;
use crate::analyzers::types::{BucketStat, HistoryResult, SeriesStats};
use crate::analyzers::utility::{mean, mean_opt, min_max, stddev};
use crate::aqi::{CategoryCounts, Pollutant, category};
use crate::config::AggregatorConfig;
use crate::error::AggregateError;
use crate::granularity::Granularity;
use crate::observation::Observation;
use crate::reading::Reading;
use chrono::{DateTime, FixedOffset, Utc};
use std::collections::BTreeMap;
use tracing::debug;

/// Valid readings collected for one bucket.
#[derive(Default)]
struct BucketAccumulator {
    aqi: Vec<i32>,
    o3: Vec<f64>,
    no2: Vec<f64>,
    pm25: Vec<f64>,
    reported: Vec<Pollutant>,
}

impl BucketAccumulator {
    fn push(&mut self, obs: &Observation, config: &AggregatorConfig) {
        let r = obs.readings(config);

        if let (Reading::Value(_), Some(aqi)) = (r.aqi, obs.aqi) {
            self.aqi.push(aqi);
        }
        self.o3.extend(r.o3.value());
        self.no2.extend(r.no2.value());
        self.pm25.extend(r.pm25.value());

        if let Some(p) = obs.dominant_pollutant.as_deref().and_then(Pollutant::from_code) {
            self.reported.push(p);
        }
    }

    fn finish(self, timestamp: DateTime<FixedOffset>) -> BucketStat {
        let aqi: Vec<f64> = self.aqi.iter().map(|&a| f64::from(a)).collect();
        let aqi_avg = mean_opt(&aqi);
        let o3_avg = mean_opt(&self.o3);
        let no2_avg = mean_opt(&self.no2);
        let pm25_avg = mean_opt(&self.pm25);

        let dominant_pollutant = dominant_by_sub_index(&[
            (Pollutant::O3, o3_avg),
            (Pollutant::No2, no2_avg),
            (Pollutant::Pm25, pm25_avg),
        ])
        .or_else(|| most_reported(&self.reported));

        let category_counts =
            (!aqi.is_empty()).then(|| CategoryCounts::from_values(aqi.iter().copied()));

        BucketStat {
            timestamp,
            aqi_avg,
            aqi_min: self.aqi.iter().min().copied(),
            aqi_max: self.aqi.iter().max().copied(),
            o3_avg,
            no2_avg,
            pm25_avg,
            dominant_pollutant,
            category: aqi_avg.map(category),
            category_counts,
            samples_count: self.aqi.len(),
        }
    }
}

/// Picks the pollutant whose average concentration maps to the highest AQI
/// sub-index. Ties go to the earlier entry of [`Pollutant::BY_PRIORITY`].
fn dominant_by_sub_index(averages: &[(Pollutant, Option<f64>)]) -> Option<Pollutant> {
    let mut best: Option<(Pollutant, f64)> = None;

    for p in Pollutant::BY_PRIORITY {
        let Some(avg) = averages.iter().find(|(q, _)| *q == p).and_then(|(_, a)| *a) else {
            continue;
        };
        let index = p.sub_index(avg);
        if best.is_none_or(|(_, b)| index > b) {
            best = Some((p, index));
        }
    }

    best.map(|(p, _)| p)
}

/// Most frequently reported dominant pollutant, same tie-break as above.
fn most_reported(reported: &[Pollutant]) -> Option<Pollutant> {
    let mut best: Option<(Pollutant, usize)> = None;

    for p in Pollutant::BY_PRIORITY {
        let count = reported.iter().filter(|&&q| q == p).count();
        if count > 0 && best.is_none_or(|(_, b)| count > b) {
            best = Some((p, count));
        }
    }

    best.map(|(p, _)| p)
}

/// Every bucket start from the one containing `start` up to `end`.
///
/// Returns `None` as soon as more than `limit` boundaries would be produced.
fn boundaries(
    granularity: Granularity,
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    limit: usize,
) -> Option<Vec<DateTime<FixedOffset>>> {
    let mut out = Vec::new();
    let mut cursor = Some(granularity.truncate(start));

    while let Some(b) = cursor {
        if b > end {
            break;
        }
        if out.len() == limit {
            return None;
        }
        out.push(b);
        cursor = granularity.next(b);
    }

    Some(out)
}

/// Aggregates raw observations into time buckets, series statistics and a
/// trend classification.
///
/// Observations outside `[start, end]` are ignored. Sentinel and negative
/// values never contribute to any average. Buckets are returned in
/// ascending order; a leading bucket whose boundary precedes `start` is
/// stamped with `start`. Stats and trend are computed from bucket averages,
/// not raw readings, so dense buckets do not dominate.
pub fn aggregate(
    observations: &[Observation],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    granularity: Granularity,
    config: &AggregatorConfig,
) -> Result<HistoryResult, AggregateError> {
    if end < start {
        return Err(AggregateError::InvalidRange { start, end });
    }

    let tz = config.timezone()?;
    let range_start = start.with_timezone(&tz);
    let range_end = end.with_timezone(&tz);

    let mut buckets: BTreeMap<DateTime<FixedOffset>, BucketAccumulator> = BTreeMap::new();

    if config.fill_gaps {
        let Some(filled) = boundaries(granularity, range_start, range_end, config.max_buckets)
        else {
            return Err(AggregateError::RangeTooLarge {
                start,
                end,
                granularity: granularity.as_str(),
                limit: config.max_buckets,
            });
        };
        for b in filled {
            buckets.entry(b).or_default();
        }
    }

    let mut out_of_range = 0usize;
    for obs in observations {
        if obs.timestamp < start || obs.timestamp > end {
            out_of_range += 1;
            continue;
        }
        let key = granularity.truncate(obs.timestamp.with_timezone(&tz));
        buckets.entry(key).or_default().push(obs, config);
    }

    let buckets: Vec<BucketStat> = buckets
        .into_iter()
        .map(|(bucket_start, acc)| acc.finish(bucket_start.max(range_start)))
        .collect();

    let averages: Vec<f64> = buckets.iter().filter_map(|b| b.aqi_avg).collect();

    let stats = min_max(&averages).map(|(min, max)| {
        let avg = mean(&averages);
        SeriesStats {
            avg,
            min,
            max,
            stddev: stddev(&averages, avg),
            buckets: averages.len(),
        }
    });

    let trend = trend(&averages, config.trend_threshold_pct);

    debug!(
        observations = observations.len(),
        out_of_range,
        buckets = buckets.len(),
        non_empty = averages.len(),
        granularity = %granularity,
        "Aggregated AQI history"
    );

    Ok(HistoryResult {
        buckets,
        stats,
        trend,
    })
}
