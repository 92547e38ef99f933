// Coordinate value object
use super::error::AggregationError;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, AggregationError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(AggregationError::InvalidInput(format!(
                "latitude {} is out of range [-90, 90]",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(AggregationError::InvalidInput(format!(
                "longitude {} is out of range [-180, 180]",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parse raw query parameters. Both values must be present and numeric.
    pub fn parse(
        latitude: Option<&str>,
        longitude: Option<&str>,
    ) -> Result<Self, AggregationError> {
        let (lat, lon) = match (latitude.map(str::trim), longitude.map(str::trim)) {
            (Some(lat), Some(lon)) if !lat.is_empty() && !lon.is_empty() => (lat, lon),
            _ => {
                return Err(AggregationError::InvalidInput(
                    "Latitude and Longitude are required.".to_string(),
                ));
            }
        };

        let lat: f64 = lat.parse().map_err(|_| {
            AggregationError::InvalidInput(format!("latitude '{}' is not a number", lat))
        })?;
        let lon: f64 = lon.parse().map_err(|_| {
            AggregationError::InvalidInput(format!("longitude '{}' is not a number", lon))
        })?;

        Self::new(lat, lon)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}
