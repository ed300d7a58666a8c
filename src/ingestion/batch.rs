use crate::config::City;
use crate::ingestion::error::IngestionError;
use crate::ingestion::response::WeatherResponse;
use chrono::{NaiveDateTime, ParseError};
use log::info;
use polars::prelude::*;

/// Generates a batch identifier from wall-clock time, second resolution.
pub fn generate_batch_id(now: NaiveDateTime) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// The API emits minute-resolution timestamps (`2024-01-01T13:00`); accept a
/// seconds suffix as well.
fn parse_time_index(value: &str) -> Result<NaiveDateTime, ParseError> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
}

/// Checks a measurement array against the time index length. An absent array
/// becomes an all-null column; a length mismatch is a defect, not recoverable.
fn aligned<T: Clone>(
    column: &str,
    values: Option<&Vec<Option<T>>>,
    expected: usize,
) -> Result<Vec<Option<T>>, IngestionError> {
    match values {
        Some(values) if values.len() == expected => Ok(values.clone()),
        Some(values) => Err(IngestionError::RowCountMismatch {
            column: column.to_string(),
            expected,
            found: values.len(),
        }),
        None => Ok(vec![None; expected]),
    }
}

/// Turns one validated API response into the normalized snapshot row-set:
/// one row per hourly time index entry, raw measurements plus the constant
/// identity and provenance columns.
pub fn batch_to_dataframe(
    response: &WeatherResponse,
    city: &City,
    batch_id: &str,
    ingested_at: NaiveDateTime,
) -> Result<DataFrame, IngestionError> {
    let hourly = response
        .hourly
        .as_ref()
        .ok_or_else(|| IngestionError::MissingHourlyBlock {
            city: city.id.clone(),
        })?;

    let rows = hourly.time.len();
    let time: Vec<NaiveDateTime> = hourly
        .time
        .iter()
        .map(|value| {
            parse_time_index(value).map_err(|source| IngestionError::TimestampParse {
                value: value.clone(),
                source,
            })
        })
        .collect::<Result<_, _>>()?;

    let df = df!(
        "time" => time,
        "temperature_2m" => aligned("temperature_2m", hourly.temperature_2m.as_ref(), rows)?,
        "relative_humidity_2m" =>
            aligned("relative_humidity_2m", hourly.relative_humidity_2m.as_ref(), rows)?,
        "precipitation" => aligned("precipitation", hourly.precipitation.as_ref(), rows)?,
        "wind_speed_10m" => aligned("wind_speed_10m", hourly.wind_speed_10m.as_ref(), rows)?,
        "cloud_cover" => aligned("cloud_cover", hourly.cloud_cover.as_ref(), rows)?,
        "pressure_msl" => aligned("pressure_msl", hourly.pressure_msl.as_ref(), rows)?,
        "city_id" => vec![city.id.clone(); rows],
        "city_name" => vec![city.name.clone(); rows],
        "latitude" => vec![response.latitude; rows],
        "longitude" => vec![response.longitude; rows],
        "timezone" => vec![response.timezone.clone(); rows],
        "ingestion_timestamp" => vec![ingested_at; rows],
        "batch_id" => vec![batch_id.to_string(); rows],
    )?;

    if df.height() != rows {
        return Err(IngestionError::RowCountMismatch {
            column: "time".to_string(),
            expected: rows,
            found: df.height(),
        });
    }

    info!("Transformed {} hourly records", df.height());
    Ok(df)
}
