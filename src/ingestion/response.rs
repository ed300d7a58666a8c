use serde::Deserialize;
use std::fmt::{Display, Formatter};

/// Deserialized Open-Meteo response, restricted to the fields the pipeline
/// consumes. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    #[serde(default)]
    pub hourly: Option<HourlySeries>,
}

/// The time-indexed hourly block. Every measurement array, when present, must
/// be parallel to `time`; the batch transformer enforces that.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HourlySeries {
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub relative_humidity_2m: Option<Vec<Option<i32>>>,
    #[serde(default)]
    pub precipitation: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub wind_speed_10m: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub cloud_cover: Option<Vec<Option<i32>>>,
    #[serde(default)]
    pub pressure_msl: Option<Vec<Option<f64>>>,
}

/// Why a parseable response still failed the minimal shape contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeViolation {
    MissingHourlyBlock,
    EmptyTimeIndex,
}

impl Display for ShapeViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ShapeViolation::MissingHourlyBlock => f.write_str("missing required 'hourly' block"),
            ShapeViolation::EmptyTimeIndex => f.write_str("empty time index in 'hourly' block"),
        }
    }
}

impl WeatherResponse {
    /// Minimal shape contract: the required `hourly` block is present and its
    /// time index is non-empty. A violation is handled as "no data" by the
    /// fetch client, never retried.
    pub fn validate(&self) -> Result<(), ShapeViolation> {
        match &self.hourly {
            None => Err(ShapeViolation::MissingHourlyBlock),
            Some(hourly) if hourly.time.is_empty() => Err(ShapeViolation::EmptyTimeIndex),
            Some(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_response() {
        let body = r#"{
            "latitude": 52.36,
            "longitude": 4.9,
            "timezone": "Europe/Amsterdam",
            "generationtime_ms": 0.3,
            "hourly": {
                "time": ["2024-01-01T00:00", "2024-01-01T01:00"],
                "temperature_2m": [3.1, null]
            }
        }"#;
        let response: WeatherResponse = serde_json::from_str(body).unwrap();
        assert!(response.validate().is_ok());
        let hourly = response.hourly.unwrap();
        assert_eq!(hourly.time.len(), 2);
        assert_eq!(hourly.temperature_2m, Some(vec![Some(3.1), None]));
        assert!(hourly.precipitation.is_none());
    }

    #[test]
    fn missing_hourly_block_is_a_shape_violation() {
        let body = r#"{"latitude": 0.0, "longitude": 0.0, "timezone": "UTC"}"#;
        let response: WeatherResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response.validate(),
            Err(ShapeViolation::MissingHourlyBlock)
        );
    }

    #[test]
    fn empty_time_index_is_a_shape_violation() {
        let body = r#"{
            "latitude": 0.0, "longitude": 0.0, "timezone": "UTC",
            "hourly": {"time": []}
        }"#;
        let response: WeatherResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.validate(), Err(ShapeViolation::EmptyTimeIndex));
    }
}
