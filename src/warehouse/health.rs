use crate::warehouse::error::WarehouseError;
use crate::warehouse::tables::{self, Table};
use chrono::NaiveDate;
use log::{info, warn};
use polars::prelude::*;
use std::fs;
use std::path::Path;

/// Presence and size of one produced table. `rows`/`bytes` are `None` when
/// the table file is missing.
#[derive(Debug, Clone)]
pub struct TableStatus {
    pub table: Table,
    pub rows: Option<u64>,
    pub bytes: Option<u64>,
}

impl TableStatus {
    pub fn present(&self) -> bool {
        self.rows.is_some()
    }
}

/// Read-only post-build verification result. A failed check never rolls back
/// already-built tables; it only reports.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub tables: Vec<TableStatus>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub distinct_cities: u64,
}

impl HealthReport {
    /// All expected tables exist. Zero coverage (empty tables) still passes.
    pub fn passed(&self) -> bool {
        self.tables.iter().all(TableStatus::present)
    }

    pub fn log_summary(&self) {
        info!("Warehouse tables:");
        for status in &self.tables {
            match (status.rows, status.bytes) {
                (Some(rows), Some(bytes)) => {
                    info!("  {} - {} rows, {} bytes", status.table, rows, bytes)
                }
                _ => warn!("  {} - MISSING", status.table),
            }
        }
        match (self.first_date, self.last_date) {
            (Some(first), Some(last)) => {
                info!("Data coverage: {} to {}, {} cities", first, last, self.distinct_cities)
            }
            _ => info!("Data coverage: none"),
        }
        if self.passed() {
            info!("All health checks passed");
        } else {
            warn!("Health checks failed: missing tables");
        }
    }
}

/// Enumerates the produced tables with row/byte counts and reports date
/// coverage and distinct-city count from the staging table.
pub fn check(warehouse_dir: &Path) -> Result<HealthReport, WarehouseError> {
    let mut statuses = Vec::with_capacity(Table::ALL.len());
    for table in Table::ALL {
        let path = tables::table_path(warehouse_dir, table);
        match fs::metadata(&path) {
            Ok(metadata) => {
                let rows = count_rows(warehouse_dir, table)?;
                statuses.push(TableStatus {
                    table,
                    rows: Some(rows),
                    bytes: Some(metadata.len()),
                });
            }
            Err(_) => {
                warn!("Expected table {} is missing at {:?}", table, path);
                statuses.push(TableStatus {
                    table,
                    rows: None,
                    bytes: None,
                });
            }
        }
    }

    let staging_present = statuses
        .iter()
        .any(|s| s.table == Table::StagingWeatherHourly && s.present());
    let (first_date, last_date, distinct_cities) = if staging_present {
        coverage(warehouse_dir)?
    } else {
        (None, None, 0)
    };

    Ok(HealthReport {
        tables: statuses,
        first_date,
        last_date,
        distinct_cities,
    })
}

fn count_rows(warehouse_dir: &Path, table: Table) -> Result<u64, WarehouseError> {
    let counted = tables::scan_table(warehouse_dir, table)?
        .select([len().alias("rows")])
        .collect()
        .map_err(|source| WarehouseError::HealthQuery { table, source })?;
    let rows = counted
        .column("rows")
        .and_then(|c| c.u32())
        .map_err(|source| WarehouseError::HealthQuery { table, source })?
        .get(0)
        .unwrap_or(0);
    Ok(u64::from(rows))
}

fn coverage(
    warehouse_dir: &Path,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>, u64), WarehouseError> {
    let table = Table::StagingWeatherHourly;
    let df = tables::scan_table(warehouse_dir, table)?
        .select([
            col("date").min().alias("min_date"),
            col("date").max().alias("max_date"),
            col("city_id").n_unique().alias("cities"),
        ])
        .collect()
        .map_err(|source| WarehouseError::HealthQuery { table, source })?;

    let first_date = date_at(&df, "min_date", table)?;
    let last_date = date_at(&df, "max_date", table)?;
    let cities = df
        .column("cities")
        .and_then(|c| c.u32())
        .map_err(|source| WarehouseError::HealthQuery { table, source })?
        .get(0)
        .unwrap_or(0);

    Ok((first_date, last_date, u64::from(cities)))
}

fn date_at(
    df: &DataFrame,
    column: &str,
    table: Table,
) -> Result<Option<NaiveDate>, WarehouseError> {
    let dates = df
        .column(column)
        .and_then(|c| c.date())
        .map_err(|source| WarehouseError::HealthQuery { table, source })?;
    Ok(dates.as_date_iter().next().flatten())
}
