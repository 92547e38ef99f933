// Reading and aggregation domain models
use super::station::Station;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SensorId(pub i64);

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single reading as reported by the latest-measurements lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    pub sensor_id: Option<SensorId>,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub observed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LatestMeasurements {
    pub readings: Vec<RawReading>,
    pub last_observed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorMetadata {
    pub sensor_id: SensorId,
    /// Upper-case parameter key, e.g. "PM25" or "NO2".
    pub parameter_name: String,
    pub parameter_unit: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPollutant {
    pub parameter_name: String,
    pub value: f64,
    pub unit: String,
}

impl fmt::Display for NormalizedPollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_empty() {
            write!(f, "{:.2}", self.value)
        } else {
            write!(f, "{:.2} {}", self.value, self.unit)
        }
    }
}

/// A pollutant slot in a station reading. `Unknown` marks a key another station reported.
#[derive(Debug, Clone, PartialEq)]
pub enum PollutantValue {
    Measured(NormalizedPollutant),
    Unknown,
}

impl PollutantValue {
    pub fn measured(&self) -> Option<&NormalizedPollutant> {
        match self {
            PollutantValue::Measured(p) => Some(p),
            PollutantValue::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationReading {
    pub station: Station,
    pub pollutants: BTreeMap<String, PollutantValue>,
    pub last_observed_at: Option<DateTime<Utc>>,
}

impl StationReading {
    pub fn new(station: Station) -> Self {
        Self {
            station,
            pollutants: BTreeMap::new(),
            last_observed_at: None,
        }
    }

    pub fn parameter_keys(&self) -> BTreeSet<&str> {
        self.pollutants.keys().map(String::as_str).collect()
    }
}

/// Final output of one aggregation request. Every entry carries the same key set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregationResult {
    pub stations: Vec<StationReading>,
}

impl AggregationResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Union of parameter keys across all stations, in sorted order.
    pub fn parameter_keys(&self) -> BTreeSet<String> {
        self.stations
            .iter()
            .flat_map(|s| s.pollutants.keys().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_rounds_to_two_places() {
        let p = NormalizedPollutant {
            parameter_name: "PM25".to_string(),
            value: 12.3456,
            unit: "µg/m³".to_string(),
        };
        assert_eq!(p.to_string(), "12.35 µg/m³");
    }

    #[test]
    fn test_display_without_unit() {
        let p = NormalizedPollutant {
            parameter_name: "RELATIVEHUMIDITY".to_string(),
            value: 40.0,
            unit: String::new(),
        };
        assert_eq!(p.to_string(), "40.00");
    }
}
