use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("Unknown city '{0}'")]
    UnknownCity(String),

    #[error("Failed to construct HTTP client")]
    TransportConstruction(#[source] reqwest::Error),

    #[error("HTTP request to {url} failed with status {status} after {attempts} attempt(s)")]
    HttpStatus {
        url: String,
        status: u16,
        attempts: u32,
    },

    #[error("Response body from {url} is not valid JSON")]
    MalformedResponse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Response for city '{city}' has no hourly block despite passing validation")]
    MissingHourlyBlock { city: String },

    #[error("Column '{column}' has {found} values but the time index has {expected}")]
    RowCountMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Failed to parse time index entry '{value}'")]
    TimestampParse {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Failed to assemble batch DataFrame")]
    FrameConstruction(#[from] PolarsError),

    #[error("Failed to create data directory '{0}'")]
    DataDirCreation(PathBuf, #[source] std::io::Error),

    #[error("I/O error writing snapshot '{0}'")]
    SnapshotWriteIo(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing snapshot '{0}'")]
    SnapshotWritePolars(PathBuf, #[source] PolarsError),

    #[error("Failed to move completed snapshot into place at '{0}'")]
    SnapshotPersist(PathBuf, #[source] tempfile::PersistError),
}
