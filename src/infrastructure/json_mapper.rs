// Mapper to convert domain models to JSON wire types
use crate::domain::error::AggregationError;
use crate::domain::reading::{AggregationResult, StationReading};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub status_code: u16,
    pub success: bool,
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CoordinatesDto {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationDto {
    pub location: String,
    pub coordinates: CoordinatesDto,
    pub last_observed_at: Option<DateTime<Utc>>,
    /// Display string such as "12.34 µg/m³", or null when the station has no data for the key
    pub pollutants: BTreeMap<String, Option<String>>,
}

pub fn aggregation_to_dto(result: AggregationResult) -> Vec<StationDto> {
    result.stations.into_iter().map(station_to_dto).collect()
}

fn station_to_dto(reading: StationReading) -> StationDto {
    let pollutants = reading
        .pollutants
        .into_iter()
        .map(|(key, value)| (key, value.measured().map(ToString::to_string)))
        .collect();

    StationDto {
        location: reading.station.name,
        coordinates: CoordinatesDto {
            latitude: reading.station.coordinates.latitude,
            longitude: reading.station.coordinates.longitude,
        },
        last_observed_at: reading.last_observed_at,
        pollutants,
    }
}

pub fn error_to_dto(status_code: u16, error: &AggregationError) -> ApiErrorResponse {
    ApiErrorResponse {
        status_code,
        success: false,
        error: ErrorBody {
            kind: error.kind(),
            message: error.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::schema_unifier::unify;
    use crate::domain::coordinate::Coordinate;
    use crate::domain::reading::{NormalizedPollutant, PollutantValue};
    use crate::domain::station::{Station, StationId};
    use serde_json::json;

    #[test]
    fn test_station_json_shape() {
        let mut a = StationReading::new(Station::new(
            StationId(1),
            "Lodhi Road".to_string(),
            Coordinate::new(28.59, 77.22).unwrap(),
        ));
        a.pollutants.insert(
            "O3".to_string(),
            PollutantValue::Measured(NormalizedPollutant {
                parameter_name: "O3".to_string(),
                value: 98.16,
                unit: "µg/m³".to_string(),
            }),
        );
        let b = StationReading::new(Station::new(
            StationId(2),
            "Pusa".to_string(),
            Coordinate::new(28.64, 77.15).unwrap(),
        ));

        let dto = aggregation_to_dto(unify(vec![a, b]));
        let value = serde_json::to_value(&dto).unwrap();

        assert_eq!(
            value,
            json!([
                {
                    "location": "Lodhi Road",
                    "coordinates": {"latitude": 28.59, "longitude": 77.22},
                    "lastObservedAt": null,
                    "pollutants": {"O3": "98.16 µg/m³"}
                },
                {
                    "location": "Pusa",
                    "coordinates": {"latitude": 28.64, "longitude": 77.15},
                    "lastObservedAt": null,
                    "pollutants": {"O3": null}
                }
            ])
        );
    }

    #[test]
    fn test_error_json_shape() {
        let dto = error_to_dto(504, &AggregationError::Timeout { timeout_ms: 20000 });
        let value = serde_json::to_value(&dto).unwrap();
        assert_eq!(value["statusCode"], 504);
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["kind"], "timeout");
    }
}
