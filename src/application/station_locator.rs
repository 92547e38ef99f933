// Station locator - Finds candidate stations around a coordinate
use crate::application::air_quality_source::AirQualitySource;
use crate::domain::coordinate::Coordinate;
use crate::domain::error::AggregationError;
use crate::domain::station::Station;
use std::sync::Arc;

/// Largest search radius the directory accepts.
pub const MAX_RADIUS_METERS: u32 = 25_000;

#[derive(Clone)]
pub struct StationLocator {
    source: Arc<dyn AirQualitySource>,
}

impl StationLocator {
    pub fn new(source: Arc<dyn AirQualitySource>) -> Self {
        Self { source }
    }

    /// An empty list means nothing is within range and is not an error.
    pub async fn locate(
        &self,
        coordinate: Coordinate,
        radius_meters: u32,
        max_results: usize,
    ) -> Result<Vec<Station>, AggregationError> {
        // Coordinate fields are public, so re-check before going to the network
        let coordinate = Coordinate::new(coordinate.latitude, coordinate.longitude)?;
        if radius_meters == 0 || radius_meters > MAX_RADIUS_METERS {
            return Err(AggregationError::InvalidInput(format!(
                "radius {}m must be between 1 and {}",
                radius_meters, MAX_RADIUS_METERS
            )));
        }
        if max_results == 0 {
            return Err(AggregationError::InvalidInput(
                "max_results must be at least 1".to_string(),
            ));
        }

        let mut stations = self
            .source
            .locate_stations(coordinate, radius_meters, max_results)
            .await
            .map_err(|e| {
                tracing::error!("Station lookup around {} failed: {:#}", coordinate, e);
                AggregationError::UpstreamUnavailable(format!("station directory: {:#}", e))
            })?;

        stations.truncate(max_results);
        tracing::debug!(
            "Located {} stations within {}m of {}",
            stations.len(),
            radius_meters,
            coordinate
        );
        Ok(stations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::FakeSource;

    fn origin() -> Coordinate {
        Coordinate::new(28.6, 77.2).unwrap()
    }

    #[tokio::test]
    async fn test_locate_caps_results() {
        let source = Arc::new(
            FakeSource::new()
                .with_station(1, "A")
                .with_station(2, "B")
                .with_station(3, "C"),
        );
        let locator = StationLocator::new(source.clone());

        let stations = locator.locate(origin(), 5000, 2).await.unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].name, "A");
    }

    #[tokio::test]
    async fn test_locate_empty_is_ok() {
        let locator = StationLocator::new(Arc::new(FakeSource::new()));
        let stations = locator.locate(origin(), 5000, 5).await.unwrap();
        assert!(stations.is_empty());
    }

    #[tokio::test]
    async fn test_locate_directory_down() {
        let locator = StationLocator::new(Arc::new(FakeSource::new().with_directory_down()));
        let err = locator.locate(origin(), 5000, 5).await.unwrap_err();
        assert!(matches!(err, AggregationError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_locate_rejects_bad_input_without_network() {
        let source = Arc::new(FakeSource::new().with_station(1, "A"));
        let locator = StationLocator::new(source.clone());

        let bad = Coordinate {
            latitude: 120.0,
            longitude: 0.0,
        };
        assert!(matches!(
            locator.locate(bad, 5000, 5).await,
            Err(AggregationError::InvalidInput(_))
        ));
        assert!(locator.locate(origin(), 0, 5).await.is_err());
        assert!(locator.locate(origin(), 30_000, 5).await.is_err());
        assert!(locator.locate(origin(), 5000, 0).await.is_err());
        assert_eq!(source.calls(), (0, 0, 0));
    }
}
