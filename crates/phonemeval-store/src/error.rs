use std::path::PathBuf;

use thiserror::Error;

use crate::npy::NpyError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("metadata file not found: {0}")]
    MetadataNotFound(PathBuf),

    #[error("metadata error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid vector file {path}: {source}")]
    Npy {
        path: PathBuf,
        #[source]
        source: NpyError,
    },

    #[error("{path}: expected {expected} values, found {found}")]
    DimensionMismatch {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("{0}")]
    Other(String),
}
