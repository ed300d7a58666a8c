mod config;
mod error;
mod ingestion;
mod types;
mod warehouse;

pub use config::*;
pub use error::MeteoflowError;
pub use types::{ApiSource, Granularity};

pub use ingestion::batch::{batch_to_dataframe, generate_batch_id};
pub use ingestion::client::{FetchClient, HttpTransport, Transport, TransportError};
pub use ingestion::error::IngestionError;
pub use ingestion::response::{HourlySeries, ShapeViolation, WeatherResponse};
pub use ingestion::store::SnapshotStore;
pub use ingestion::Ingestor;

pub use warehouse::error::WarehouseError;
pub use warehouse::health::{HealthReport, TableStatus};
pub use warehouse::mart::{build_anomalies, build_daily};
pub use warehouse::raw::{scan_raw_table, snapshot_paths};
pub use warehouse::staging::build_staging;
pub use warehouse::tables::{replace_table, scan_table, table_path, Table};
pub use warehouse::Warehouse;
