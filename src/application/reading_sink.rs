// Port for durable logging of finished aggregation results
use crate::domain::reading::AggregationResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait ReadingSink: Send + Sync {
    /// Append one row per station. Failures are reported, never retried.
    async fn append(
        &self,
        requested_at: DateTime<Utc>,
        result: &AggregationResult,
    ) -> anyhow::Result<()>;
}
