//! EPA AQI sub-indices and health categories.

use serde::{Deserialize, Serialize};

/// Pollutants tracked per observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pollutant {
    O3,
    No2,
    Pm25,
}

impl Pollutant {
    /// Tie-break order for dominant pollutant selection, highest health
    /// impact first.
    pub const BY_PRIORITY: [Pollutant; 3] = [Pollutant::Pm25, Pollutant::No2, Pollutant::O3];

    /// Parses a station-reported pollutant code. Unknown codes (PM10, CO, ...)
    /// return `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        let normalized: String = code
            .chars()
            .filter(|c| !matches!(c, '.' | '_' | '-' | ' '))
            .collect::<String>()
            .to_uppercase();
        match normalized.as_str() {
            "PM25" => Some(Pollutant::Pm25),
            "NO2" => Some(Pollutant::No2),
            "O3" | "OZONE" => Some(Pollutant::O3),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Pollutant::O3 => "o3",
            Pollutant::No2 => "no2",
            Pollutant::Pm25 => "pm25",
        }
    }

    /// Breakpoints as `(concentration_high, index_high)`, starting from `(0, 0)`.
    /// O3 and NO2 in ppb, PM2.5 in µg/m³.
    fn breakpoints(self) -> &'static [(f64, f64)] {
        match self {
            Pollutant::O3 => &[
                (54.0, 50.0),
                (70.0, 100.0),
                (85.0, 150.0),
                (105.0, 200.0),
                (200.0, 300.0),
            ],
            Pollutant::No2 => &[
                (53.0, 50.0),
                (100.0, 100.0),
                (360.0, 150.0),
                (649.0, 200.0),
                (1249.0, 300.0),
            ],
            Pollutant::Pm25 => &[
                (12.0, 50.0),
                (35.4, 100.0),
                (55.4, 150.0),
                (150.4, 200.0),
                (250.4, 300.0),
            ],
        }
    }

    /// Converts a concentration to this pollutant's AQI sub-index by linear
    /// interpolation between breakpoints. Above the top breakpoint the last
    /// segment's slope is extended. Negative input yields 0.
    pub fn sub_index(self, concentration: f64) -> f64 {
        if concentration <= 0.0 {
            return 0.0;
        }

        let mut lo = (0.0, 0.0);
        for &hi in self.breakpoints() {
            if concentration <= hi.0 {
                return interpolate(lo, hi, concentration);
            }
            lo = hi;
        }

        let points = self.breakpoints();
        let last = points[points.len() - 1];
        let prev = points[points.len() - 2];
        interpolate(prev, last, concentration)
    }
}

fn interpolate(lo: (f64, f64), hi: (f64, f64), c: f64) -> f64 {
    lo.1 + (c - lo.0) / (hi.0 - lo.0) * (hi.1 - lo.1)
}

/// EPA health category of an AQI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

/// Converts an AQI value into its health category.
///
/// | Range     | Category                        |
/// |-----------|---------------------------------|
/// | <= 50     | Good                            |
/// | <= 100    | Moderate                        |
/// | <= 150    | Unhealthy for sensitive groups  |
/// | <= 200    | Unhealthy                       |
/// | <= 300    | Very unhealthy                  |
/// | > 300     | Hazardous                       |
pub fn category(aqi: f64) -> AqiCategory {
    match aqi {
        a if a <= 50.0 => AqiCategory::Good,
        a if a <= 100.0 => AqiCategory::Moderate,
        a if a <= 150.0 => AqiCategory::UnhealthyForSensitiveGroups,
        a if a <= 200.0 => AqiCategory::Unhealthy,
        a if a <= 300.0 => AqiCategory::VeryUnhealthy,
        _ => AqiCategory::Hazardous,
    }
}

/// Number of readings that fell in each health category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub good: usize,
    pub moderate: usize,
    pub unhealthy_for_sensitive_groups: usize,
    pub unhealthy: usize,
    pub very_unhealthy: usize,
    pub hazardous: usize,
}

impl CategoryCounts {
    /// Tallies each AQI value by [`category`].
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut counts = CategoryCounts::default();
        for v in values {
            counts.add(category(v));
        }
        counts
    }

    pub fn add(&mut self, c: AqiCategory) {
        match c {
            AqiCategory::Good => self.good += 1,
            AqiCategory::Moderate => self.moderate += 1,
            AqiCategory::UnhealthyForSensitiveGroups => self.unhealthy_for_sensitive_groups += 1,
            AqiCategory::Unhealthy => self.unhealthy += 1,
            AqiCategory::VeryUnhealthy => self.very_unhealthy += 1,
            AqiCategory::Hazardous => self.hazardous += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.good
            + self.moderate
            + self.unhealthy_for_sensitive_groups
            + self.unhealthy
            + self.very_unhealthy
            + self.hazardous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_category_boundaries() {
        assert_eq!(category(0.0), AqiCategory::Good);
        assert_eq!(category(50.0), AqiCategory::Good);
        assert_eq!(category(50.5), AqiCategory::Moderate);
        assert_eq!(category(100.0), AqiCategory::Moderate);
        assert_eq!(category(101.0), AqiCategory::UnhealthyForSensitiveGroups);
        assert_eq!(category(150.0), AqiCategory::UnhealthyForSensitiveGroups);
        assert_eq!(category(151.0), AqiCategory::Unhealthy);
        assert_eq!(category(200.0), AqiCategory::Unhealthy);
        assert_eq!(category(201.0), AqiCategory::VeryUnhealthy);
        assert_eq!(category(300.0), AqiCategory::VeryUnhealthy);
        assert_eq!(category(301.0), AqiCategory::Hazardous);
    }

    #[test]
    fn test_category_counts_split_on_upper_bounds() {
        let values = [
            0.0, 50.0, 51.0, 100.0, 101.0, 150.0, 151.0, 200.0, 201.0, 300.0, 301.0, 500.0,
        ];
        let counts = CategoryCounts::from_values(values);

        assert_eq!(
            counts,
            CategoryCounts {
                good: 2,
                moderate: 2,
                unhealthy_for_sensitive_groups: 2,
                unhealthy: 2,
                very_unhealthy: 2,
                hazardous: 2,
            }
        );
        assert_eq!(counts.total(), values.len());
        assert_eq!(CategoryCounts::from_values([]).total(), 0);
    }

    #[test]
    fn test_pm25_sub_index_breakpoints() {
        assert!(close(Pollutant::Pm25.sub_index(0.0), 0.0));
        assert!(close(Pollutant::Pm25.sub_index(6.0), 25.0));
        assert!(close(Pollutant::Pm25.sub_index(12.0), 50.0));
        assert!(close(Pollutant::Pm25.sub_index(35.4), 100.0));
        assert!(close(Pollutant::Pm25.sub_index(250.4), 300.0));
        assert!(close(Pollutant::Pm25.sub_index(350.4), 400.0));
    }

    #[test]
    fn test_o3_and_no2_sub_index() {
        assert!(close(Pollutant::O3.sub_index(54.0), 50.0));
        assert!(close(Pollutant::O3.sub_index(62.0), 75.0));
        assert!(close(Pollutant::No2.sub_index(53.0), 50.0));
        assert!(close(Pollutant::No2.sub_index(100.0), 100.0));
        assert!(close(Pollutant::No2.sub_index(1849.0), 400.0));
    }

    #[test]
    fn test_negative_concentration_is_zero() {
        assert_eq!(Pollutant::No2.sub_index(-5.0), 0.0);
    }

    #[test]
    fn test_from_code() {
        assert_eq!(Pollutant::from_code("PM2.5"), Some(Pollutant::Pm25));
        assert_eq!(Pollutant::from_code("pm25"), Some(Pollutant::Pm25));
        assert_eq!(Pollutant::from_code("PM_25"), Some(Pollutant::Pm25));
        assert_eq!(Pollutant::from_code("o3"), Some(Pollutant::O3));
        assert_eq!(Pollutant::from_code("OZONE"), Some(Pollutant::O3));
        assert_eq!(Pollutant::from_code("NO2"), Some(Pollutant::No2));
        assert_eq!(Pollutant::from_code("PM10"), None);
        assert_eq!(Pollutant::from_code(""), None);
    }

    #[test]
    fn test_serialized_codes() {
        assert_eq!(serde_json::to_string(&Pollutant::Pm25).unwrap(), "\"pm25\"");
        assert_eq!(serde_json::to_string(&Pollutant::No2).unwrap(), "\"no2\"");
        assert_eq!(
            serde_json::to_string(&AqiCategory::UnhealthyForSensitiveGroups).unwrap(),
            "\"unhealthy_for_sensitive_groups\""
        );
    }
}
