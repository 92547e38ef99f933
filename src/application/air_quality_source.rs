// Port for the upstream air quality directory, measurement and sensor services
use crate::domain::coordinate::Coordinate;
use crate::domain::reading::{LatestMeasurements, SensorId, SensorMetadata};
use crate::domain::station::{Station, StationId};
use async_trait::async_trait;

#[async_trait]
pub trait AirQualitySource: Send + Sync {
    /// Stations within `radius_meters` of `coordinate`, at most `limit` of them
    async fn locate_stations(
        &self,
        coordinate: Coordinate,
        radius_meters: u32,
        limit: usize,
    ) -> anyhow::Result<Vec<Station>>;

    /// Latest raw readings reported by one station
    async fn latest_measurements(
        &self,
        station_id: StationId,
    ) -> anyhow::Result<LatestMeasurements>;

    /// Parameter name and unit measured by one sensor
    async fn sensor_metadata(&self, sensor_id: SensorId) -> anyhow::Result<SensorMetadata>;
}
