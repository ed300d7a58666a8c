//! The multi-stage transform engine: raw snapshot federation, staging
//! derivation, daily rollups, anomaly detection, and post-build health
//! checks. Every stage is a full rebuild from its input (create-or-replace),
//! never an incremental merge.

pub mod error;
pub mod health;
pub mod mart;
pub mod raw;
pub mod staging;
pub mod tables;

use crate::config::PipelineConfig;
use crate::types::Granularity;
use crate::warehouse::error::WarehouseError;
use crate::warehouse::health::HealthReport;
use crate::warehouse::tables::Table;
use log::info;
use polars::prelude::*;
use std::fs;
use std::path::PathBuf;

/// Rebuilds the derived tables from the raw snapshot directory.
///
/// `refresh` is not safe to run concurrently against the same warehouse
/// directory: each stage replaces a named table, and two racing rebuilds
/// produce an undefined final state. The caller serializes transform runs.
pub struct Warehouse {
    data_dir: PathBuf,
    warehouse_dir: PathBuf,
}

impl Warehouse {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            warehouse_dir: config.warehouse_dir.clone(),
        }
    }

    /// Runs the full transform pipeline: raw → staging → mart → health.
    ///
    /// Stages run in order and each replaces its table only on successful
    /// completion, so a mid-pipeline failure aborts the remaining stages and
    /// leaves earlier outputs (and any previous build of the failed table)
    /// intact. Zero snapshot files is a valid input and produces empty tables.
    pub fn refresh(&self) -> Result<HealthReport, WarehouseError> {
        fs::create_dir_all(&self.warehouse_dir)
            .map_err(|e| WarehouseError::WarehouseDirCreation(self.warehouse_dir.clone(), e))?;

        let (raw_hourly, hourly_files) = raw::scan_raw_table(&self.data_dir, Granularity::Hourly)?;
        info!(
            "Raw hourly table: {} snapshot file(s), {} rows",
            hourly_files,
            count_raw_rows(raw_hourly.clone(), Granularity::Hourly)?
        );

        let (raw_daily, daily_files) = raw::scan_raw_table(&self.data_dir, Granularity::Daily)?;
        if daily_files > 0 {
            info!(
                "Raw daily table: {} snapshot file(s), {} rows",
                daily_files,
                count_raw_rows(raw_daily, Granularity::Daily)?
            );
        }

        let mut staged = staging::build_staging(raw_hourly)
            .collect()
            .map_err(|source| WarehouseError::StageCollect {
                table: Table::StagingWeatherHourly,
                source,
            })?;
        info!("Built {} with {} rows", Table::StagingWeatherHourly, staged.height());
        tables::replace_table(&self.warehouse_dir, Table::StagingWeatherHourly, &mut staged)?;

        // Mart stages read the materialized staging table, not the raw scan,
        // so they see exactly what was just written.
        let staging_scan = tables::scan_table(&self.warehouse_dir, Table::StagingWeatherHourly)?;

        let mut daily = mart::build_daily(staging_scan.clone())
            .collect()
            .map_err(|source| WarehouseError::StageCollect {
                table: Table::MartWeatherDaily,
                source,
            })?;
        info!("Built {} with {} rows", Table::MartWeatherDaily, daily.height());
        tables::replace_table(&self.warehouse_dir, Table::MartWeatherDaily, &mut daily)?;

        let mut anomalies = mart::build_anomalies(staging_scan)
            .collect()
            .map_err(|source| WarehouseError::StageCollect {
                table: Table::MartWeatherAnomalies,
                source,
            })?;
        info!(
            "Built {} with {} anomalous rows",
            Table::MartWeatherAnomalies,
            anomalies.height()
        );
        tables::replace_table(&self.warehouse_dir, Table::MartWeatherAnomalies, &mut anomalies)?;

        let report = health::check(&self.warehouse_dir)?;
        report.log_summary();
        Ok(report)
    }

    /// Standalone read-only health check, without rebuilding anything.
    pub fn health_check(&self) -> Result<HealthReport, WarehouseError> {
        health::check(&self.warehouse_dir)
    }
}

fn count_raw_rows(raw: LazyFrame, granularity: Granularity) -> Result<u64, WarehouseError> {
    let counted = raw
        .select([len().alias("rows")])
        .collect()
        .map_err(|source| WarehouseError::RawCount {
            granularity,
            source,
        })?;
    let rows = counted
        .column("rows")
        .and_then(|c| c.u32())
        .map_err(|source| WarehouseError::RawCount {
            granularity,
            source,
        })?
        .get(0)
        .unwrap_or(0);
    Ok(u64::from(rows))
}
