use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration as StdDuration;

/// A monitored location with fixed geographic and timezone metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
}

impl City {
    pub fn new(id: &str, name: &str, latitude: f64, longitude: f64, timezone: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            latitude,
            longitude,
            timezone: timezone.to_string(),
        }
    }
}

pub const HISTORICAL_API_URL: &str = "https://archive-api.open-meteo.com/v1/archive";
pub const FORECAST_API_URL: &str = "https://api.open-meteo.com/v1/forecast";

pub const BACKFILL_START_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2024, 1, 1) {
    Some(date) => date,
    None => panic!("invalid backfill start date"),
};
pub const BACKFILL_END_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2025, 12, 31) {
    Some(date) => date,
    None => panic!("invalid backfill end date"),
};

/// Hourly variables requested from the API, in raw-table column order.
pub const HOURLY_VARIABLES: [&str; 6] = [
    "temperature_2m",
    "relative_humidity_2m",
    "precipitation",
    "wind_speed_10m",
    "cloud_cover",
    "pressure_msl",
];

/// Explicit configuration context threaded through every pipeline component.
///
/// There is deliberately no process-global configuration: each `Ingestor` and
/// `Warehouse` receives its own copy, so concurrent per-city ingestion runs
/// share nothing but the data directory.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding the immutable raw parquet snapshots.
    pub data_dir: PathBuf,
    /// Directory holding the derived staging/mart tables.
    pub warehouse_dir: PathBuf,
    pub historical_api_url: String,
    pub forecast_api_url: String,
    pub request_timeout: StdDuration,
    pub max_retries: u32,
    pub retry_delay: StdDuration,
    pub hourly_variables: Vec<String>,
    pub cities: Vec<City>,
}

impl PipelineConfig {
    pub fn new(data_dir: PathBuf, warehouse_dir: PathBuf) -> Self {
        Self {
            data_dir,
            warehouse_dir,
            historical_api_url: HISTORICAL_API_URL.to_string(),
            forecast_api_url: FORECAST_API_URL.to_string(),
            request_timeout: StdDuration::from_secs(30),
            max_retries: 3,
            retry_delay: StdDuration::from_secs(2),
            hourly_variables: HOURLY_VARIABLES.iter().map(|v| v.to_string()).collect(),
            cities: default_cities(),
        }
    }

    pub fn city(&self, city_id: &str) -> Option<&City> {
        self.cities.iter().find(|c| c.id == city_id)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("data/raw"), PathBuf::from("data/warehouse"))
    }
}

pub fn default_cities() -> Vec<City> {
    vec![
        City::new("amsterdam", "Amsterdam", 52.3676, 4.9041, "Europe/Amsterdam"),
        City::new("new_york", "New York", 40.7128, -74.0060, "America/New_York"),
        City::new("london", "London", 51.5074, -0.1278, "Europe/London"),
        City::new("paris", "Paris", 48.8566, 2.3522, "Europe/Paris"),
        City::new("tokyo", "Tokyo", 35.6762, 139.6503, "Asia/Tokyo"),
    ]
}

/// Yesterday's local date, the window used by incremental ingestion runs.
pub fn incremental_date() -> NaiveDate {
    Local::now().date_naive() - Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_lookup_by_id() {
        let config = PipelineConfig::default();
        let city = config.city("amsterdam").unwrap();
        assert_eq!(city.name, "Amsterdam");
        assert_eq!(city.timezone, "Europe/Amsterdam");
        assert!(config.city("atlantis").is_none());
    }

    #[test]
    fn incremental_date_is_yesterday() {
        let yesterday = incremental_date();
        assert_eq!(Local::now().date_naive() - yesterday, Duration::days(1));
    }
}
