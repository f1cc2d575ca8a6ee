use polars::error::PolarsError;
use povstats::error::PovStatsError;

#[derive(thiserror::Error, Debug)]
pub enum PovStatsCliError {
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
    #[error("serde JSON error")]
    SerdeJSONError(#[from] serde_json::Error),
    #[error("polars error")]
    PolarsError(#[from] PolarsError),
    #[error("povstats error: {0}")]
    PovStatsError(#[from] PovStatsError),
    #[error("std IO error")]
    IOError(#[from] std::io::Error),
}

pub type PovStatsCliResult<T> = Result<T, PovStatsCliError>;
