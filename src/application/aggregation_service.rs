// Aggregation service - Use case for building a uniform air quality snapshot around a point
use crate::application::air_quality_source::AirQualitySource;
use crate::application::measurement_fetcher::MeasurementFetcher;
use crate::application::reading_sink::ReadingSink;
use crate::application::schema_unifier::unify;
use crate::application::sensor_resolver::SensorMetadataResolver;
use crate::application::station_locator::StationLocator;
use crate::domain::coordinate::Coordinate;
use crate::domain::error::AggregationError;
use crate::domain::reading::AggregationResult;
use crate::domain::units::{ConversionFactors, UnitNormalizer};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregationSettings {
    pub radius_meters: u32,
    pub max_stations: usize,
    /// Covers the whole request, including every upstream call
    pub deadline: Duration,
    pub conversion: ConversionFactors,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            radius_meters: 5000,
            max_stations: 5,
            deadline: Duration::from_secs(20),
            conversion: ConversionFactors::default(),
        }
    }
}

#[derive(Clone)]
pub struct AirQualityService {
    source: Arc<dyn AirQualitySource>,
    locator: StationLocator,
    settings: AggregationSettings,
    sink: Option<Arc<dyn ReadingSink>>,
}

impl AirQualityService {
    pub fn new(source: Arc<dyn AirQualitySource>, settings: AggregationSettings) -> Self {
        Self {
            locator: StationLocator::new(source.clone()),
            source,
            settings,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ReadingSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Build the snapshot for `coordinate`.
    ///
    /// Stations whose measurements cannot be fetched are left out. The request fails
    /// only on invalid input, when the directory is down, when no station could be
    /// queried at all, or when the deadline passes. No partial result is returned on
    /// timeout.
    pub async fn aggregate(
        &self,
        coordinate: Coordinate,
    ) -> Result<AggregationResult, AggregationError> {
        let started = Instant::now();
        let deadline = self.settings.deadline;

        let result = tokio::time::timeout(deadline, self.collect(coordinate))
            .await
            .map_err(|_| {
                tracing::warn!("Aggregation around {} exceeded {:?}", coordinate, deadline);
                AggregationError::Timeout {
                    timeout_ms: deadline.as_millis() as u64,
                }
            })??;

        tracing::info!(
            "Aggregated {} stations with {} parameters around {} in {}ms",
            result.len(),
            result.parameter_keys().len(),
            coordinate,
            started.elapsed().as_millis()
        );

        self.record(&result).await;
        Ok(result)
    }

    async fn collect(&self, coordinate: Coordinate) -> Result<AggregationResult, AggregationError> {
        let stations = self
            .locator
            .locate(coordinate, self.settings.radius_meters, self.settings.max_stations)
            .await?;

        if stations.is_empty() {
            tracing::info!("No stations found near {}", coordinate);
            return Ok(AggregationResult::empty());
        }

        // The metadata cache lives only as long as this request
        let resolver = SensorMetadataResolver::new(self.source.clone());
        let fetcher = MeasurementFetcher::new(
            self.source.clone(),
            &resolver,
            UnitNormalizer::new(self.settings.conversion),
        );

        // Each station gets its own outcome so one failure cannot sink the others
        let outcomes = join_all(
            stations
                .iter()
                .map(|station| fetcher.fetch_station_reading(station)),
        )
        .await;

        let mut readings = Vec::with_capacity(stations.len());
        for (station, outcome) in stations.iter().zip(outcomes) {
            match outcome {
                Ok(reading) => readings.push(reading),
                Err(e) => {
                    tracing::warn!("Excluding station {} ({}): {}", station.id, station.name, e);
                }
            }
        }

        if readings.is_empty() {
            return Err(AggregationError::UpstreamUnavailable(format!(
                "measurements unavailable for all {} stations",
                stations.len()
            )));
        }

        tracing::debug!(
            "Resolved {} distinct sensors across {} stations",
            resolver.len().await,
            readings.len()
        );
        Ok(unify(readings))
    }

    async fn record(&self, result: &AggregationResult) {
        let Some(sink) = &self.sink else {
            return;
        };
        if result.is_empty() {
            return;
        }
        if let Err(e) = sink.append(chrono::Utc::now(), result).await {
            tracing::warn!("Failed to persist aggregation result: {:#}", e);
        }
    }
}
