use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "parquet")]
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[cfg(feature = "parquet")]
    #[error("arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("schema error: {0}")]
    Schema(String),

    /// The requested subgroup does not exist in a record, or is not tabular.
    #[error("subgroup error: {0}")]
    Subgroup(String),
}

/// Reader failures surface to callers as engine execution errors.
impl From<Error> for tabscan_core::error::Error {
    fn from(e: Error) -> Self {
        tabscan_core::error::Error::EngineExecution(e.to_string())
    }
}
