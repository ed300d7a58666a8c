use crate::ingestion::error::IngestionError;
use crate::types::Granularity;
use chrono::NaiveDate;
use log::info;
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Writes batch row-sets as immutable, uniquely named parquet snapshots.
///
/// Snapshots are write-once: re-running ingestion for the same window produces
/// a new batch id and therefore a new file, never an overwrite. Deduplication
/// of overlapping snapshots is deliberately left to the downstream rebuild.
pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
        }
    }

    /// `{city_id}_{granularity}_{start}_{end}_{batch_id}.parquet`
    pub fn snapshot_filename(
        city_id: &str,
        granularity: Granularity,
        start_date: NaiveDate,
        end_date: NaiveDate,
        batch_id: &str,
    ) -> String {
        format!(
            "{}_{}_{}_{}_{}.parquet",
            city_id, granularity, start_date, end_date, batch_id
        )
    }

    /// Persists one snapshot. The parquet file is written to a temporary file
    /// in the data directory and only moved into place once complete, so a
    /// failed write never leaves a partial snapshot behind.
    pub fn write(
        &self,
        mut df: DataFrame,
        city_id: &str,
        granularity: Granularity,
        start_date: NaiveDate,
        end_date: NaiveDate,
        batch_id: &str,
    ) -> Result<PathBuf, IngestionError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| IngestionError::DataDirCreation(self.data_dir.clone(), e))?;

        let filename =
            Self::snapshot_filename(city_id, granularity, start_date, end_date, batch_id);
        let path = self.data_dir.join(filename);

        let temp = NamedTempFile::new_in(&self.data_dir)
            .map_err(|e| IngestionError::SnapshotWriteIo(path.clone(), e))?;
        ParquetWriter::new(&temp)
            .with_compression(ParquetCompression::Snappy)
            .finish(&mut df)
            .map_err(|e| IngestionError::SnapshotWritePolars(path.clone(), e))?;
        temp.persist(&path)
            .map_err(|e| IngestionError::SnapshotPersist(path.clone(), e))?;

        let size = fs::metadata(&path)
            .map(|m| m.len())
            .unwrap_or(0);
        info!("Saved snapshot to {:?} ({} bytes)", path, size);

        Ok(path)
    }
}
