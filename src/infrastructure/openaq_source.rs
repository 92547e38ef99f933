// OpenAQ v3 implementation of the air quality source
use crate::application::air_quality_source::AirQualitySource;
use crate::domain::coordinate::Coordinate;
use crate::domain::reading::{LatestMeasurements, RawReading, SensorId, SensorMetadata};
use crate::domain::station::{Station, StationId};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OpenAqSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct OpenAqResponse<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct OpenAqCoordinates {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OpenAqDatetime {
    utc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAqLocation {
    id: i64,
    name: Option<String>,
    coordinates: Option<OpenAqCoordinates>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenAqLatest {
    sensors_id: Option<i64>,
    value: Option<f64>,
    #[serde(default)]
    unit: Option<String>,
    datetime: Option<OpenAqDatetime>,
}

#[derive(Debug, Deserialize)]
struct OpenAqParameter {
    name: Option<String>,
    units: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAqSensor {
    parameter: Option<OpenAqParameter>,
}

impl OpenAqSource {
    pub fn new(base_url: String, api_key: String, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("OpenAQ request: {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .header("X-API-Key", &self.api_key)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAQ request to {} failed with status {}: {}", url, status, body);
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse OpenAQ response from {}", url))
    }
}

#[async_trait]
impl AirQualitySource for OpenAqSource {
    async fn locate_stations(
        &self,
        coordinate: Coordinate,
        radius_meters: u32,
        limit: usize,
    ) -> Result<Vec<Station>> {
        let response: OpenAqResponse<OpenAqLocation> = self
            .get_json(
                "/locations",
                &[
                    ("coordinates", coordinate.to_string()),
                    ("radius", radius_meters.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        Ok(stations_from_response(response))
    }

    async fn latest_measurements(&self, station_id: StationId) -> Result<LatestMeasurements> {
        let response: OpenAqResponse<OpenAqLatest> = self
            .get_json(&format!("/locations/{}/latest", station_id), &[])
            .await?;

        Ok(measurements_from_response(response))
    }

    async fn sensor_metadata(&self, sensor_id: SensorId) -> Result<SensorMetadata> {
        let response: OpenAqResponse<OpenAqSensor> = self
            .get_json(&format!("/sensors/{}", sensor_id), &[])
            .await?;

        metadata_from_response(sensor_id, response)
    }
}

fn stations_from_response(response: OpenAqResponse<OpenAqLocation>) -> Vec<Station> {
    response
        .results
        .into_iter()
        .filter_map(|location| {
            let coordinates = location
                .coordinates
                .and_then(|c| Coordinate::new(c.latitude?, c.longitude?).ok());
            let Some(coordinates) = coordinates else {
                tracing::debug!("Skipping location {} without usable coordinates", location.id);
                return None;
            };
            let name = location
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("Location {}", location.id));
            Some(Station::new(StationId(location.id), name, coordinates))
        })
        .collect()
}

fn measurements_from_response(response: OpenAqResponse<OpenAqLatest>) -> LatestMeasurements {
    let readings: Vec<RawReading> = response
        .results
        .into_iter()
        .map(|latest| RawReading {
            sensor_id: latest.sensors_id.map(SensorId),
            value: latest.value,
            unit: latest.unit,
            observed_at: latest
                .datetime
                .and_then(|d| d.utc)
                .and_then(|utc| parse_utc(&utc)),
        })
        .collect();

    let last_observed_at = readings.iter().filter_map(|r| r.observed_at).max();
    LatestMeasurements {
        readings,
        last_observed_at,
    }
}

fn metadata_from_response(
    sensor_id: SensorId,
    response: OpenAqResponse<OpenAqSensor>,
) -> Result<SensorMetadata> {
    let parameter = response
        .results
        .into_iter()
        .next()
        .and_then(|sensor| sensor.parameter)
        .with_context(|| format!("Sensor {} has no parameter information", sensor_id))?;

    let parameter_name = parameter
        .name
        .with_context(|| format!("Sensor {} parameter has no name", sensor_id))?;

    Ok(SensorMetadata {
        sensor_id,
        parameter_name,
        parameter_unit: parameter.units.unwrap_or_default(),
    })
}

fn parse_utc(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .ok()
}
