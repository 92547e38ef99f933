// HTTP request handlers
use crate::domain::coordinate::Coordinate;
use crate::domain::error::AggregationError;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::infrastructure::json_mapper::{aggregation_to_dto, error_to_dto, ApiResponse};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

/// Raw query parameters; parsed by `Coordinate::parse` so bad input maps to `invalid_input`
#[derive(Deserialize)]
pub struct CoordinateQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Air quality snapshot for the stations around `lat`/`lon`
pub async fn air_quality(
    Query(query): Query<CoordinateQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);

    let outcome = match Coordinate::parse(query.lat.as_deref(), query.lon.as_deref()) {
        Ok(coordinate) => state.air_quality_service.aggregate(coordinate).await,
        Err(e) => Err(e),
    };

    let response = match outcome {
        Ok(result) => {
            let message = if result.is_empty() {
                "No stations found nearby"
            } else {
                "Fetched air quality data successfully"
            };
            let body = ApiResponse {
                status_code: StatusCode::OK.as_u16(),
                data: aggregation_to_dto(result),
                message: message.to_string(),
                success: true,
            };
            json_response(StatusCode::OK, &body, compress).await
        }
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                tracing::error!("Air quality request failed: {}", e);
            } else {
                tracing::debug!("Rejected air quality request: {}", e);
            }
            json_response(status, &error_to_dto(status.as_u16(), &e), compress).await
        }
    };

    match response {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

pub fn status_for(error: &AggregationError) -> StatusCode {
    match error {
        AggregationError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AggregationError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        AggregationError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        // Recoverable kinds never leave the service
        AggregationError::SensorUnresolvable { .. } | AggregationError::Unconvertible { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
