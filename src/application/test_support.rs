// In-memory AirQualitySource used by the application tests
use crate::application::air_quality_source::AirQualitySource;
use crate::domain::coordinate::Coordinate;
use crate::domain::reading::{LatestMeasurements, RawReading, SensorId, SensorMetadata};
use crate::domain::station::{Station, StationId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Default)]
pub struct FakeSource {
    stations: Vec<Station>,
    measurements: HashMap<StationId, LatestMeasurements>,
    sensors: HashMap<SensorId, SensorMetadata>,
    directory_down: bool,
    delay: Option<Duration>,
    pub locate_calls: AtomicUsize,
    pub measurement_calls: AtomicUsize,
    pub sensor_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_station(mut self, id: i64, name: &str) -> Self {
        let coordinates = Coordinate::new(28.6 + id as f64 * 0.01, 77.2).unwrap();
        self.stations
            .push(Station::new(StationId(id), name.to_string(), coordinates));
        self
    }

    pub fn with_measurements(mut self, station_id: i64, readings: Vec<RawReading>) -> Self {
        self.measurements.insert(
            StationId(station_id),
            LatestMeasurements {
                readings,
                last_observed_at: None,
            },
        );
        self
    }

    pub fn with_sensor(mut self, sensor_id: i64, parameter: &str, unit: &str) -> Self {
        self.sensors.insert(
            SensorId(sensor_id),
            SensorMetadata {
                sensor_id: SensorId(sensor_id),
                parameter_name: parameter.to_string(),
                parameter_unit: unit.to_string(),
            },
        );
        self
    }

    pub fn with_directory_down(mut self) -> Self {
        self.directory_down = true;
        self
    }

    /// Every upstream call sleeps this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> (usize, usize, usize) {
        (
            self.locate_calls.load(Ordering::SeqCst),
            self.measurement_calls.load(Ordering::SeqCst),
            self.sensor_calls.load(Ordering::SeqCst),
        )
    }

    async fn pause(&self) {
        match self.delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }
    }
}

pub fn reading(sensor_id: i64, value: f64, unit: &str) -> RawReading {
    RawReading {
        sensor_id: Some(SensorId(sensor_id)),
        value: Some(value),
        unit: Some(unit.to_string()),
        observed_at: None,
    }
}

pub fn reading_at(sensor_id: i64, value: f64, unit: &str, observed_at: &str) -> RawReading {
    RawReading {
        observed_at: Some(timestamp(observed_at)),
        ..reading(sensor_id, value, unit)
    }
}

pub fn timestamp(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}

#[async_trait]
impl AirQualitySource for FakeSource {
    async fn locate_stations(
        &self,
        _coordinate: Coordinate,
        _radius_meters: u32,
        limit: usize,
    ) -> anyhow::Result<Vec<Station>> {
        self.locate_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.directory_down {
            anyhow::bail!("directory returned status 503");
        }
        Ok(self.stations.iter().take(limit).cloned().collect())
    }

    async fn latest_measurements(
        &self,
        station_id: StationId,
    ) -> anyhow::Result<LatestMeasurements> {
        self.measurement_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.measurements
            .get(&station_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("latest for station {} returned status 500", station_id))
    }

    async fn sensor_metadata(&self, sensor_id: SensorId) -> anyhow::Result<SensorMetadata> {
        self.sensor_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.sensors
            .get(&sensor_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("sensor {} returned status 404", sensor_id))
    }
}
