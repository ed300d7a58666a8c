use crate::ingestion::error::IngestionError;
use crate::warehouse::error::WarehouseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeteoflowError {
    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),
}
