use crate::types::Granularity;
use crate::warehouse::error::WarehouseError;
use log::warn;
use polars::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Snapshot files for one granularity, in deterministic (sorted) order.
///
/// A missing or empty data directory is a valid state: the raw table is simply
/// empty. Matching mirrors the `*_hourly_*.parquet` glob of the snapshot
/// naming scheme.
pub fn snapshot_paths(
    data_dir: &Path,
    granularity: Granularity,
) -> Result<Vec<PathBuf>, WarehouseError> {
    let marker = granularity.filename_marker();
    let mut paths = Vec::new();

    let entries = match fs::read_dir(data_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(paths),
        Err(e) => return Err(WarehouseError::DataDirRead(data_dir.to_path_buf(), e)),
    };

    for entry in entries {
        let entry = entry.map_err(|e| WarehouseError::DataDirRead(data_dir.to_path_buf(), e))?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.ends_with(".parquet") && name.contains(&marker) {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}

/// Unions all snapshots of one granularity into a single logical raw table.
///
/// This is read-time federation: nothing is copied or materialized, the union
/// is recomputed on every call and never cached. Returns the lazy table plus
/// the number of contributing snapshot files (zero files yields an empty
/// frame with the raw schema).
pub fn scan_raw_table(
    data_dir: &Path,
    granularity: Granularity,
) -> Result<(LazyFrame, usize), WarehouseError> {
    let paths = snapshot_paths(data_dir, granularity)?;
    if paths.is_empty() {
        warn!("No {} snapshot files found in {:?}", granularity, data_dir);
        let empty = empty_raw_frame().map_err(WarehouseError::EmptyRawFrame)?;
        return Ok((empty.lazy(), 0));
    }

    let frames = paths
        .iter()
        .map(|path| {
            LazyFrame::scan_parquet(path, ScanArgsParquet::default())
                .map_err(|e| WarehouseError::SnapshotScan(path.clone(), e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let unioned = concat(frames, UnionArgs::default()).map_err(WarehouseError::RawUnion)?;
    Ok((unioned, paths.len()))
}

/// The raw hourly schema, used when no snapshot files exist so that the
/// downstream rebuild still produces (empty) staging and mart tables.
fn empty_raw_frame() -> PolarsResult<DataFrame> {
    let datetime = DataType::Datetime(TimeUnit::Microseconds, None);
    DataFrame::new(vec![
        Column::new_empty("time".into(), &datetime),
        Column::new_empty("temperature_2m".into(), &DataType::Float64),
        Column::new_empty("relative_humidity_2m".into(), &DataType::Int32),
        Column::new_empty("precipitation".into(), &DataType::Float64),
        Column::new_empty("wind_speed_10m".into(), &DataType::Float64),
        Column::new_empty("cloud_cover".into(), &DataType::Int32),
        Column::new_empty("pressure_msl".into(), &DataType::Float64),
        Column::new_empty("city_id".into(), &DataType::String),
        Column::new_empty("city_name".into(), &DataType::String),
        Column::new_empty("latitude".into(), &DataType::Float64),
        Column::new_empty("longitude".into(), &DataType::Float64),
        Column::new_empty("timezone".into(), &DataType::String),
        Column::new_empty("ingestion_timestamp".into(), &datetime),
        Column::new_empty("batch_id".into(), &DataType::String),
    ])
}
