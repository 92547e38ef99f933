// Measurement fetcher - Builds one station's pollutant map from its latest readings
use crate::application::air_quality_source::AirQualitySource;
use crate::application::sensor_resolver::SensorMetadataResolver;
use crate::domain::error::AggregationError;
use crate::domain::reading::{NormalizedPollutant, PollutantValue, RawReading, StationReading};
use crate::domain::station::Station;
use crate::domain::units::UnitNormalizer;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;

pub struct MeasurementFetcher<'r> {
    source: Arc<dyn AirQualitySource>,
    resolver: &'r SensorMetadataResolver,
    normalizer: UnitNormalizer,
}

impl<'r> MeasurementFetcher<'r> {
    pub fn new(
        source: Arc<dyn AirQualitySource>,
        resolver: &'r SensorMetadataResolver,
        normalizer: UnitNormalizer,
    ) -> Self {
        Self {
            source,
            resolver,
            normalizer,
        }
    }

    /// Fails only when the station's measurement list cannot be fetched.
    /// Readings with unresolvable sensors or unconvertible units are dropped.
    pub async fn fetch_station_reading(
        &self,
        station: &Station,
    ) -> Result<StationReading, AggregationError> {
        let latest = self
            .source
            .latest_measurements(station.id)
            .await
            .map_err(|e| {
                AggregationError::UpstreamUnavailable(format!(
                    "latest measurements for station {} ({}): {:#}",
                    station.id, station.name, e
                ))
            })?;

        let normalized = join_all(
            latest
                .readings
                .iter()
                .map(|raw| self.normalize_reading(station, raw)),
        )
        .await;

        let mut reading = StationReading::new(station.clone());
        reading.last_observed_at = latest
            .readings
            .iter()
            .map(|raw| raw.observed_at)
            .fold(latest.last_observed_at, newest);

        // When two sensors report the same parameter, the most recent observation wins
        let mut observed: HashMap<String, Option<DateTime<Utc>>> = HashMap::new();
        for (raw, pollutant) in latest.readings.iter().zip(normalized) {
            let Some(pollutant) = pollutant else {
                continue;
            };
            let replace = match observed.get(&pollutant.parameter_name) {
                None => true,
                Some(existing) => raw.observed_at > *existing,
            };
            if replace {
                observed.insert(pollutant.parameter_name.clone(), raw.observed_at);
                reading
                    .pollutants
                    .insert(pollutant.parameter_name.clone(), PollutantValue::Measured(pollutant));
            }
        }

        tracing::debug!(
            "Station {} ({}): {} of {} readings usable",
            station.id,
            station.name,
            reading.pollutants.len(),
            latest.readings.len()
        );
        Ok(reading)
    }

    async fn normalize_reading(
        &self,
        station: &Station,
        raw: &RawReading,
    ) -> Option<NormalizedPollutant> {
        let Some(sensor_id) = raw.sensor_id else {
            tracing::debug!("Station {}: skipping reading without sensor id", station.id);
            return None;
        };

        let metadata = match self.resolver.resolve(sensor_id).await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::debug!("Station {}: dropping reading: {}", station.id, e);
                return None;
            }
        };

        let unit = if metadata.parameter_unit.is_empty() {
            raw.unit.as_deref()
        } else {
            Some(metadata.parameter_unit.as_str())
        };

        match self
            .normalizer
            .normalize(raw.value, unit, Some(&metadata.parameter_name))
        {
            Ok(pollutant) => Some(pollutant),
            Err(e) => {
                tracing::debug!("Station {}: dropping pollutant: {}", station.id, e);
                None
            }
        }
    }
}

fn newest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    a.max(b)
}
