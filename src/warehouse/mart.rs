use polars::prelude::*;

/// Daily rollup: one row per (city, date), recomputed from scratch on every
/// build, sorted by date then city id for deterministic output.
///
/// Standard deviation uses the sample definition; groups with fewer than two
/// rows get a null stddev, never zero. `total_hours` counts every staging row
/// in the group, including hours whose measurements were coalesced defaults.
pub fn build_daily(staging: LazyFrame) -> LazyFrame {
    staging
        .group_by([col("city_id"), col("city_name"), col("date")])
        .agg([
            col("temperature_2m").min().alias("temp_min"),
            col("temperature_2m").max().alias("temp_max"),
            col("temperature_2m").mean().alias("temp_avg"),
            col("temperature_2m").std(1).alias("temp_stddev"),
            col("precipitation").sum().alias("precip_total"),
            col("precipitation").max().alias("precip_max"),
            col("precipitation")
                .gt(lit(0.0))
                .sum()
                .cast(DataType::Int64)
                .alias("hours_with_rain"),
            col("wind_speed_10m").mean().alias("wind_avg"),
            col("wind_speed_10m").max().alias("wind_max"),
            col("relative_humidity_2m").mean().alias("humidity_avg"),
            col("pressure_msl").mean().alias("pressure_avg"),
            col("cloud_cover").mean().alias("cloud_cover_avg"),
            len().cast(DataType::Int64).alias("total_hours"),
            col("has_missing_temp")
                .sum()
                .cast(DataType::Int64)
                .alias("missing_temp_count"),
            col("has_missing_precip")
                .sum()
                .cast(DataType::Int64)
                .alias("missing_precip_count"),
            col("ingestion_timestamp").max().alias("last_updated"),
        ])
        .sort(["date", "city_id"], SortMultipleOptions::default())
}

/// Temperature anomaly detection, two passes expressed as window functions:
/// per-city mean and sample stddev over the full staging set, then a z-score
/// per row. A zero or undefined stddev makes the z-score null (NULLIF-style
/// guard), and null-z rows are excluded from the table entirely rather than
/// flagged false. Only the anomalous subset (|z| strictly greater than 3) is
/// kept, ordered by timestamp.
pub fn build_anomalies(staging: LazyFrame) -> LazyFrame {
    let city_mean = col("temperature_2m").mean().over([col("city_id")]);
    let city_stddev = col("temperature_2m").std(1).over([col("city_id")]);
    let guarded_stddev = when(city_stddev.clone().eq(lit(0.0)))
        .then(lit(NULL))
        .otherwise(city_stddev);
    let zscore = ((col("temperature_2m") - city_mean) / guarded_stddev).alias("temp_zscore");

    staging
        .with_columns([zscore])
        .filter(col("temp_zscore").is_not_null())
        .filter(col("temp_zscore").abs().gt(lit(3.0)))
        .select([
            col("time"),
            col("city_id"),
            col("city_name"),
            col("temperature_2m"),
            col("precipitation"),
            col("temp_zscore"),
        ])
        .sort(["time"], SortMultipleOptions::default())
}
