// Sensor metadata resolver - Request-scoped, single-flight metadata cache
use crate::application::air_quality_source::AirQualitySource;
use crate::domain::error::AggregationError;
use crate::domain::reading::{SensorId, SensorMetadata};
use crate::domain::units::canonical_parameter;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// A failed lookup is stored as `Err` and returned for the rest of this request.
type Slot = Arc<OnceCell<Result<Arc<SensorMetadata>, AggregationError>>>;

/// Resolves sensor metadata for the duration of one aggregation request.
///
/// The first caller for a sensor id performs the lookup. Concurrent callers for the
/// same id wait on that lookup instead of issuing their own, and later callers read
/// the stored outcome. A failure is remembered only by this instance, so a fresh
/// resolver (the next request) tries again.
pub struct SensorMetadataResolver {
    source: Arc<dyn AirQualitySource>,
    slots: Mutex<HashMap<SensorId, Slot>>,
}

impl SensorMetadataResolver {
    pub fn new(source: Arc<dyn AirQualitySource>) -> Self {
        Self {
            source,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub async fn resolve(
        &self,
        sensor_id: SensorId,
    ) -> Result<Arc<SensorMetadata>, AggregationError> {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots.entry(sensor_id).or_default().clone()
        };

        let outcome = slot
            .get_or_init(|| async {
                tracing::debug!("Fetching metadata for sensor {}", sensor_id);
                self.fetch(sensor_id).await.map(Arc::new).inspect_err(|e| {
                    tracing::warn!("Failed to fetch sensor {}: {}", sensor_id, e);
                })
            })
            .await;
        outcome.clone()
    }

    /// Number of distinct sensors seen so far, resolved or not
    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    async fn fetch(&self, sensor_id: SensorId) -> Result<SensorMetadata, AggregationError> {
        let metadata = self
            .source
            .sensor_metadata(sensor_id)
            .await
            .map_err(|e| AggregationError::SensorUnresolvable {
                sensor_id: sensor_id.to_string(),
                reason: format!("{:#}", e),
            })?;

        let parameter_name = canonical_parameter(&metadata.parameter_name);
        if parameter_name.is_empty() {
            return Err(AggregationError::SensorUnresolvable {
                sensor_id: sensor_id.to_string(),
                reason: "metadata has no parameter name".to_string(),
            });
        }

        Ok(SensorMetadata {
            sensor_id,
            parameter_name,
            parameter_unit: metadata.parameter_unit.trim().to_string(),
        })
    }
}
