use crate::warehouse::error::WarehouseError;
use polars::prelude::*;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// The derived tables the transform pipeline produces, each materialized as a
/// single parquet file in the warehouse directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    StagingWeatherHourly,
    MartWeatherDaily,
    MartWeatherAnomalies,
}

impl Table {
    pub const ALL: [Table; 3] = [
        Table::StagingWeatherHourly,
        Table::MartWeatherDaily,
        Table::MartWeatherAnomalies,
    ];

    /// Schema-qualified name, mirroring the layered warehouse layout.
    pub const fn name(self) -> &'static str {
        match self {
            Table::StagingWeatherHourly => "staging.weather_hourly",
            Table::MartWeatherDaily => "mart.weather_daily",
            Table::MartWeatherAnomalies => "mart.weather_anomalies",
        }
    }

    pub const fn file_name(self) -> &'static str {
        match self {
            Table::StagingWeatherHourly => "staging_weather_hourly.parquet",
            Table::MartWeatherDaily => "mart_weather_daily.parquet",
            Table::MartWeatherAnomalies => "mart_weather_anomalies.parquet",
        }
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

pub fn table_path(warehouse_dir: &Path, table: Table) -> PathBuf {
    warehouse_dir.join(table.file_name())
}

/// Create-or-replace: writes the rebuilt table to a temporary file and swaps
/// it over the previous version in one rename. A failed rebuild leaves the
/// prior table intact; readers never observe a partially written file.
pub fn replace_table(
    warehouse_dir: &Path,
    table: Table,
    df: &mut DataFrame,
) -> Result<(), WarehouseError> {
    let path = table_path(warehouse_dir, table);
    let temp = NamedTempFile::new_in(warehouse_dir).map_err(|source| {
        WarehouseError::TableWriteIo {
            table,
            path: path.clone(),
            source,
        }
    })?;
    ParquetWriter::new(&temp)
        .with_compression(ParquetCompression::Snappy)
        .finish(df)
        .map_err(|source| WarehouseError::TableWritePolars {
            table,
            path: path.clone(),
            source,
        })?;
    temp.persist(&path)
        .map_err(|source| WarehouseError::TablePersist {
            table,
            path,
            source,
        })?;
    Ok(())
}

pub fn scan_table(warehouse_dir: &Path, table: Table) -> Result<LazyFrame, WarehouseError> {
    let path = table_path(warehouse_dir, table);
    LazyFrame::scan_parquet(&path, ScanArgsParquet::default()).map_err(|source| {
        WarehouseError::TableScan {
            table,
            path,
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_swaps_content_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = df!("x" => [1i64, 2, 3]).unwrap();
        replace_table(dir.path(), Table::MartWeatherDaily, &mut first).unwrap();

        let mut second = df!("x" => [9i64]).unwrap();
        replace_table(dir.path(), Table::MartWeatherDaily, &mut second).unwrap();

        let read = scan_table(dir.path(), Table::MartWeatherDaily)
            .unwrap()
            .collect()
            .unwrap();
        assert_eq!(read.height(), 1);
        assert_eq!(read.column("x").unwrap().i64().unwrap().get(0), Some(9));
        // The replaced version is gone and no temp files linger.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn table_names_and_files() {
        assert_eq!(Table::StagingWeatherHourly.to_string(), "staging.weather_hourly");
        assert_eq!(
            table_path(Path::new("/wh"), Table::MartWeatherAnomalies),
            Path::new("/wh/mart_weather_anomalies.parquet")
        );
    }
}
