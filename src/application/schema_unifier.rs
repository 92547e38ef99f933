// Schema unifier - Gives every station the same set of pollutant keys
use crate::domain::reading::{AggregationResult, PollutantValue, StationReading};
use std::collections::BTreeSet;

/// Backfill every key seen at any station with `PollutantValue::Unknown`.
/// Station order is preserved.
pub fn unify(station_readings: Vec<StationReading>) -> AggregationResult {
    let all_keys: BTreeSet<String> = station_readings
        .iter()
        .flat_map(|reading| reading.parameter_keys())
        .map(str::to_string)
        .collect();

    let stations = station_readings
        .into_iter()
        .map(|mut reading| {
            for key in &all_keys {
                reading
                    .pollutants
                    .entry(key.clone())
                    .or_insert(PollutantValue::Unknown);
            }
            reading
        })
        .collect();

    AggregationResult { stations }
}
