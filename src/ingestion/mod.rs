//! Fetch-transform-store ingestion: one run covers one city and date range,
//! producing a single immutable snapshot file or a soft "no data" outcome.

pub mod batch;
pub mod client;
pub mod error;
pub mod response;
pub mod store;

use crate::config::PipelineConfig;
use crate::ingestion::batch::{batch_to_dataframe, generate_batch_id};
use crate::ingestion::client::FetchClient;
use crate::ingestion::error::IngestionError;
use crate::ingestion::store::SnapshotStore;
use crate::types::{ApiSource, Granularity};
use chrono::{Local, NaiveDate};
use log::{info, warn};
use std::path::PathBuf;

/// Runs the fetch → transform → store sequence for single cities.
///
/// Each `run` call is self-contained: it shares no mutable state with other
/// invocations beyond the data directory, into which every run writes its own
/// distinctly named snapshot.
pub struct Ingestor {
    config: PipelineConfig,
    client: FetchClient,
    store: SnapshotStore,
}

impl Ingestor {
    pub fn new(config: PipelineConfig) -> Result<Self, IngestionError> {
        let client = FetchClient::new(&config)?;
        let store = SnapshotStore::new(&config.data_dir);
        Ok(Self {
            config,
            client,
            store,
        })
    }

    /// Executes one ingestion run.
    ///
    /// Returns the written snapshot path, or `None` when the upstream data
    /// could not be fetched or validated (soft failure for this run). Hard
    /// failures (persistent HTTP rejection, contract violations, storage
    /// errors) surface as `Err`.
    pub fn run(
        &self,
        city_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        source: ApiSource,
    ) -> Result<Option<PathBuf>, IngestionError> {
        let city = self
            .config
            .city(city_id)
            .ok_or_else(|| IngestionError::UnknownCity(city_id.to_string()))?;

        let now = Local::now().naive_local();
        let batch_id = generate_batch_id(now);
        let url = match source {
            ApiSource::Historical => &self.config.historical_api_url,
            ApiSource::Forecast => &self.config.forecast_api_url,
        };

        info!(
            "Starting ingestion for {} ({} to {}), batch {}",
            city.name, start_date, end_date, batch_id
        );

        let response = match self.client.fetch(
            url,
            city,
            start_date,
            end_date,
            &self.config.hourly_variables,
        )? {
            Some(response) => response,
            None => {
                warn!("No valid data fetched for {}", city.name);
                return Ok(None);
            }
        };

        let df = batch_to_dataframe(&response, city, &batch_id, now)?;
        let rows = df.height();
        let path = self.store.write(
            df,
            &city.id,
            Granularity::Hourly,
            start_date,
            end_date,
            &batch_id,
        )?;

        info!(
            "Ingestion complete for {}: {} rows, {} to {}, snapshot {:?}",
            city.name, rows, start_date, end_date, path
        );
        Ok(Some(path))
    }
}
