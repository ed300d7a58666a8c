use polars::prelude::*;

/// The staging transform: a single declarative, row-wise, order-preserving
/// pass over the raw hourly table.
///
/// Adds calendar decomposition of `time` (`day_of_week` is numbered
/// Sunday = 0 through Saturday = 6), coalesces null measurements to
/// defaults, and records pre-coalesce nullity in `has_missing_temp` /
/// `has_missing_precip` so aggregates never silently drop hours while the
/// loss stays visible. All expressions are evaluated against the raw input,
/// so the missing flags see the original nulls, not the coalesced values.
pub fn build_staging(raw: LazyFrame) -> LazyFrame {
    raw.with_columns([
        col("time").cast(DataType::Date).alias("date"),
        col("time").dt().year().cast(DataType::Int32).alias("year"),
        col("time").dt().month().cast(DataType::Int32).alias("month"),
        col("time").dt().day().cast(DataType::Int32).alias("day"),
        col("time").dt().hour().cast(DataType::Int32).alias("hour"),
        // weekday() is ISO Mon=1..Sun=7; fold Sunday onto 0.
        (col("time").dt().weekday() % lit(7))
            .cast(DataType::Int32)
            .alias("day_of_week"),
        col("time")
            .dt()
            .quarter()
            .cast(DataType::Int32)
            .alias("quarter"),
        col("temperature_2m")
            .is_null()
            .cast(DataType::Int32)
            .alias("has_missing_temp"),
        col("precipitation")
            .is_null()
            .cast(DataType::Int32)
            .alias("has_missing_precip"),
        col("temperature_2m").fill_null(lit(0.0)),
        col("relative_humidity_2m").fill_null(lit(0i32)),
        col("precipitation").fill_null(lit(0.0)),
        col("wind_speed_10m").fill_null(lit(0.0)),
        col("cloud_cover").fill_null(lit(0i32)),
        col("pressure_msl").fill_null(lit(1013.25)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn ts(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").unwrap()
    }

    fn raw_fixture() -> DataFrame {
        df!(
            "time" => [ts("2024-03-15T00:00"), ts("2024-03-15T01:00"), ts("2024-07-01T23:00")],
            "temperature_2m" => [Some(4.5), None, Some(21.0)],
            "relative_humidity_2m" => [Some(80i32), Some(82), None],
            "precipitation" => [None, Some(0.3), Some(0.0)],
            "wind_speed_10m" => [Some(12.0), None, Some(3.5)],
            "cloud_cover" => [Some(100i32), None, Some(0)],
            "pressure_msl" => [None::<f64>, Some(1009.0), Some(1021.5)],
            "city_id" => ["amsterdam", "amsterdam", "amsterdam"],
            "city_name" => ["Amsterdam", "Amsterdam", "Amsterdam"],
            "latitude" => [52.36, 52.36, 52.36],
            "longitude" => [4.9, 4.9, 4.9],
            "timezone" => ["Europe/Amsterdam", "Europe/Amsterdam", "Europe/Amsterdam"],
            "ingestion_timestamp" => [ts("2024-07-02T12:00"), ts("2024-07-02T12:00"), ts("2024-07-02T12:00")],
            "batch_id" => ["20240702_120000", "20240702_120000", "20240702_120000"],
        )
        .unwrap()
    }

    #[test]
    fn calendar_decomposition() {
        let staged = build_staging(raw_fixture().lazy()).collect().unwrap();

        let years = staged.column("year").unwrap().i32().unwrap();
        assert_eq!(years.get(0), Some(2024));
        let months = staged.column("month").unwrap().i32().unwrap();
        assert_eq!(months.get(2), Some(7));
        let hours = staged.column("hour").unwrap().i32().unwrap();
        assert_eq!(hours.get(1), Some(1));
        assert_eq!(hours.get(2), Some(23));
        let quarters = staged.column("quarter").unwrap().i32().unwrap();
        assert_eq!(quarters.get(0), Some(1));
        assert_eq!(quarters.get(2), Some(3));
        // 2024-03-15 was a Friday.
        let dows = staged.column("day_of_week").unwrap().i32().unwrap();
        assert_eq!(dows.get(0), Some(5));
    }

    #[test]
    fn day_of_week_runs_sunday_zero_to_saturday_six() {
        // 2024-03-17 Sunday, 2024-03-18 Monday, 2024-03-23 Saturday.
        let df = df!(
            "time" => [ts("2024-03-17T12:00"), ts("2024-03-18T12:00"), ts("2024-03-23T12:00")],
            "temperature_2m" => vec![Some(1.0); 3],
            "relative_humidity_2m" => vec![Some(80i32); 3],
            "precipitation" => vec![Some(0.0); 3],
            "wind_speed_10m" => vec![Some(5.0); 3],
            "cloud_cover" => vec![Some(50i32); 3],
            "pressure_msl" => vec![Some(1013.0); 3],
        )
        .unwrap();

        let staged = build_staging(df.lazy()).collect().unwrap();
        let dows = staged.column("day_of_week").unwrap().i32().unwrap();
        assert_eq!(dows.get(0), Some(0));
        assert_eq!(dows.get(1), Some(1));
        assert_eq!(dows.get(2), Some(6));
    }

    #[test]
    fn missing_flag_iff_raw_value_was_null() {
        let staged = build_staging(raw_fixture().lazy()).collect().unwrap();

        let temps = staged.column("temperature_2m").unwrap().f64().unwrap();
        let temp_flags = staged.column("has_missing_temp").unwrap().i32().unwrap();
        assert_eq!(temp_flags.get(0), Some(0));
        assert_eq!(temp_flags.get(1), Some(1));
        assert_eq!(temp_flags.get(2), Some(0));
        // The coalesced default applies exactly where the flag is set.
        assert_eq!(temps.get(0), Some(4.5));
        assert_eq!(temps.get(1), Some(0.0));

        let precip_flags = staged.column("has_missing_precip").unwrap().i32().unwrap();
        assert_eq!(precip_flags.get(0), Some(1));
        // A genuine 0.0 reading is not a missing value.
        assert_eq!(precip_flags.get(2), Some(0));

        let pressure = staged.column("pressure_msl").unwrap().f64().unwrap();
        assert_eq!(pressure.get(0), Some(1013.25));

        // No nulls survive the coalesce pass for measurement columns.
        for column in [
            "temperature_2m",
            "relative_humidity_2m",
            "precipitation",
            "wind_speed_10m",
            "cloud_cover",
            "pressure_msl",
        ] {
            assert_eq!(staged.column(column).unwrap().null_count(), 0, "{column}");
        }
    }

    #[test]
    fn staging_is_deterministic() {
        let first = build_staging(raw_fixture().lazy()).collect().unwrap();
        let second = build_staging(raw_fixture().lazy()).collect().unwrap();
        assert!(first.equals_missing(&second));
    }
}
