use crate::config::{City, PipelineConfig};
use crate::ingestion::error::IngestionError;
use crate::ingestion::response::WeatherResponse;
use chrono::NaiveDate;
use log::{error, info, warn};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// A single transport-level failure mode, before any retry policy is applied.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("transport failure: {0}")]
    Connection(String),
}

/// One HTTP GET, returning the response body on success. The fetch client owns
/// all retry behaviour; implementations perform exactly one attempt.
pub trait Transport {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<String, TransportError>;
}

/// Blocking reqwest-backed transport with a per-request timeout.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, IngestionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(IngestionError::TransportConstruction)?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<String, TransportError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(TransportError::Status(status.as_u16()));
        }

        response
            .text()
            .map_err(|e| TransportError::Connection(e.to_string()))
    }
}

/// Issues one logical request with a bounded number of attempts.
///
/// Outcome contract:
/// - `Ok(Some(response))`: a parseable, shape-valid body.
/// - `Ok(None)`: no data. Retry budget exhausted on timeouts or transport
///   failures, or the body failed shape validation. Soft failure for the run.
/// - `Err(HttpStatus)`: the server kept rejecting with an error status for the
///   whole retry budget. Hard failure.
/// - `Err(MalformedResponse)`: unparseable body, a contract violation by the
///   server; fails on the first occurrence without consuming the budget.
pub struct FetchClient<T: Transport = HttpTransport> {
    transport: T,
    max_retries: u32,
    retry_delay: Duration,
}

impl FetchClient<HttpTransport> {
    pub fn new(config: &PipelineConfig) -> Result<Self, IngestionError> {
        Ok(Self::with_transport(
            HttpTransport::new(config.request_timeout)?,
            config.max_retries,
            config.retry_delay,
        ))
    }
}

impl<T: Transport> FetchClient<T> {
    pub fn with_transport(transport: T, max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            transport,
            max_retries,
            retry_delay,
        }
    }

    /// Fetches hourly weather for one city and date range.
    pub fn fetch(
        &self,
        url: &str,
        city: &City,
        start_date: NaiveDate,
        end_date: NaiveDate,
        hourly_variables: &[String],
    ) -> Result<Option<WeatherResponse>, IngestionError> {
        let query: Vec<(&str, String)> = vec![
            ("latitude", city.latitude.to_string()),
            ("longitude", city.longitude.to_string()),
            ("start_date", start_date.to_string()),
            ("end_date", end_date.to_string()),
            ("hourly", hourly_variables.join(",")),
            ("timezone", city.timezone.clone()),
        ];

        for attempt in 1..=self.max_retries {
            info!(
                "API request attempt {}/{} for city '{}'",
                attempt, self.max_retries, city.id
            );

            let body = match self.transport.get(url, &query) {
                Ok(body) => body,
                Err(TransportError::Timeout) => {
                    warn!("Request timeout (attempt {})", attempt);
                    if attempt < self.max_retries {
                        // Linear backoff on timeouts only.
                        thread::sleep(self.retry_delay * attempt);
                    }
                    continue;
                }
                Err(TransportError::Status(status)) => {
                    error!("HTTP error {} from {} (attempt {})", status, url, attempt);
                    if attempt < self.max_retries {
                        thread::sleep(self.retry_delay);
                        continue;
                    }
                    return Err(IngestionError::HttpStatus {
                        url: url.to_string(),
                        status,
                        attempts: attempt,
                    });
                }
                Err(TransportError::Connection(message)) => {
                    error!("Request failed: {} (attempt {})", message, attempt);
                    if attempt < self.max_retries {
                        thread::sleep(self.retry_delay);
                    }
                    continue;
                }
            };

            let response: WeatherResponse =
                serde_json::from_str(&body).map_err(|source| IngestionError::MalformedResponse {
                    url: url.to_string(),
                    source,
                })?;

            if let Err(violation) = response.validate() {
                warn!(
                    "Response for city '{}' failed validation: {}",
                    city.id, violation
                );
                return Ok(None);
            }

            info!("API request successful for city '{}'", city.id);
            return Ok(Some(response));
        }

        error!(
            "All {} attempts failed for city '{}'",
            self.max_retries, city.id
        );
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::City;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    struct ScriptedTransport {
        responses: RefCell<VecDeque<Result<String, TransportError>>>,
        calls: Cell<u32>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<String, TransportError>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                calls: Cell::new(0),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn get(&self, _url: &str, _query: &[(&str, String)]) -> Result<String, TransportError> {
            self.calls.set(self.calls.get() + 1);
            self.responses
                .borrow_mut()
                .pop_front()
                .expect("transport called more times than scripted")
        }
    }

    fn test_city() -> City {
        City::new("amsterdam", "Amsterdam", 52.3676, 4.9041, "Europe/Amsterdam")
    }

    fn valid_body() -> String {
        r#"{
            "latitude": 52.36, "longitude": 4.9, "timezone": "Europe/Amsterdam",
            "hourly": {"time": ["2024-01-01T00:00"], "temperature_2m": [1.5]}
        }"#
        .to_string()
    }

    fn dates() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        )
    }

    fn fetch_with(
        transport: ScriptedTransport,
    ) -> (
        Result<Option<WeatherResponse>, IngestionError>,
        u32,
    ) {
        let client = FetchClient::with_transport(transport, 3, Duration::ZERO);
        let (start, end) = dates();
        let vars = vec!["temperature_2m".to_string()];
        let result = client.fetch("http://unit.test/v1", &test_city(), start, end, &vars);
        let calls = client.transport.calls.get();
        (result, calls)
    }

    #[test]
    fn timeout_exhaustion_yields_no_data() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Timeout),
            Err(TransportError::Timeout),
            Err(TransportError::Timeout),
        ]);
        let (result, calls) = fetch_with(transport);
        assert!(matches!(result, Ok(None)));
        assert_eq!(calls, 3);
    }

    #[test]
    fn http_error_exhaustion_propagates() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Status(500)),
            Err(TransportError::Status(500)),
            Err(TransportError::Status(500)),
        ]);
        let (result, calls) = fetch_with(transport);
        assert!(matches!(
            result,
            Err(IngestionError::HttpStatus {
                status: 500,
                attempts: 3,
                ..
            })
        ));
        assert_eq!(calls, 3);
    }

    #[test]
    fn connection_failure_exhaustion_yields_no_data() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Connection("connection reset".into())),
            Err(TransportError::Connection("connection reset".into())),
            Err(TransportError::Connection("connection reset".into())),
        ]);
        let (result, calls) = fetch_with(transport);
        assert!(matches!(result, Ok(None)));
        assert_eq!(calls, 3);
    }

    #[test]
    fn malformed_body_short_circuits() {
        let transport = ScriptedTransport::new(vec![Ok("<html>not json</html>".to_string())]);
        let (result, calls) = fetch_with(transport);
        assert!(matches!(
            result,
            Err(IngestionError::MalformedResponse { .. })
        ));
        assert_eq!(calls, 1);
    }

    #[test]
    fn shape_violation_is_no_data_without_retry() {
        let body = r#"{"latitude": 0.0, "longitude": 0.0, "timezone": "UTC"}"#.to_string();
        let transport = ScriptedTransport::new(vec![Ok(body)]);
        let (result, calls) = fetch_with(transport);
        assert!(matches!(result, Ok(None)));
        assert_eq!(calls, 1);
    }

    #[test]
    fn recovers_after_transient_failures() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Timeout),
            Err(TransportError::Status(503)),
            Ok(valid_body()),
        ]);
        let (result, calls) = fetch_with(transport);
        let response = result.unwrap().expect("expected data");
        assert_eq!(response.timezone, "Europe/Amsterdam");
        assert_eq!(calls, 3);
    }
}
