use crate::warehouse::tables::Table;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("Failed to create warehouse directory '{0}'")]
    WarehouseDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read data directory '{0}'")]
    DataDirRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to scan snapshot '{0}'")]
    SnapshotScan(PathBuf, #[source] PolarsError),

    #[error("Failed to build empty raw table frame")]
    EmptyRawFrame(#[source] PolarsError),

    #[error("Failed to union raw snapshots")]
    RawUnion(#[source] PolarsError),

    #[error("Failed to count rows in the raw {granularity} table")]
    RawCount {
        granularity: crate::types::Granularity,
        #[source]
        source: PolarsError,
    },

    #[error("Rebuild of table '{table}' failed")]
    StageCollect {
        table: Table,
        #[source]
        source: PolarsError,
    },

    #[error("I/O error writing table '{table}' at '{path}'")]
    TableWriteIo {
        table: Table,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Encoding error writing table '{table}' at '{path}'")]
    TableWritePolars {
        table: Table,
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Failed to move rebuilt table '{table}' into place at '{path}'")]
    TablePersist {
        table: Table,
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },

    #[error("Failed to scan table '{table}' at '{path}'")]
    TableScan {
        table: Table,
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Health query against '{table}' failed")]
    HealthQuery {
        table: Table,
        #[source]
        source: PolarsError,
    },
}
