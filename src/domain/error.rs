// Error taxonomy for the aggregation pipeline
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("sensor {sensor_id} could not be resolved: {reason}")]
    SensorUnresolvable { sensor_id: String, reason: String },

    #[error("cannot convert {parameter} from '{unit}': {reason}")]
    Unconvertible {
        parameter: String,
        unit: String,
        reason: String,
    },

    #[error("aggregation exceeded deadline of {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl AggregationError {
    /// Stable machine-readable kind, surfaced to HTTP clients.
    pub fn kind(&self) -> &'static str {
        match self {
            AggregationError::InvalidInput(_) => "invalid_input",
            AggregationError::UpstreamUnavailable(_) => "upstream_unavailable",
            AggregationError::SensorUnresolvable { .. } => "sensor_unresolvable",
            AggregationError::Unconvertible { .. } => "unconvertible",
            AggregationError::Timeout { .. } => "timeout",
        }
    }

    pub(crate) fn unconvertible(
        parameter: Option<&str>,
        unit: Option<&str>,
        reason: impl Into<String>,
    ) -> Self {
        AggregationError::Unconvertible {
            parameter: parameter.unwrap_or("<none>").to_string(),
            unit: unit.unwrap_or("<none>").to_string(),
            reason: reason.into(),
        }
    }
}
