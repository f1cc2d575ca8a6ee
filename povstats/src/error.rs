//! Error types.

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum PovStatsError {
    #[error("Failed to load '{}': {reason}", .path.display())]
    Load { path: PathBuf, reason: String },
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    #[error("Duplicate key in {table}: {key}")]
    DuplicateKey { table: String, key: String },
    #[error("Wrapped polars error: {0}")]
    PolarsError(#[from] polars::error::PolarsError),
}

pub type Result<T> = std::result::Result<T, PovStatsError>;

impl PovStatsError {
    pub(crate) fn load<P: Into<PathBuf>, S: ToString>(path: P, reason: S) -> Self {
        Self::Load {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn duplicate_key<S: Into<String>, K: Into<String>>(table: S, key: K) -> Self {
        Self::DuplicateKey {
            table: table.into(),
            key: key.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use polars::error::PolarsError;

    use super::*;

    #[test]
    fn test_polars_error() {
        let polars_error = PolarsError::ComputeError("A polars error".into());
        let povstats_error: PovStatsError = polars_error.into();
        assert!(matches!(povstats_error, PovStatsError::PolarsError(_)));
        println!("{}", povstats_error);
    }

    #[test]
    fn load_error_should_name_the_path() {
        let err = PovStatsError::load("data/PovStatsData.csv", "file not found");
        assert_eq!(
            err.to_string(),
            "Failed to load 'data/PovStatsData.csv': file not found"
        );
    }
}
