use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("unsupported file type '{0}' (expected .csv, .tsv or .txt)")]
    UnsupportedFile(String),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write export: {0}")]
    Export(#[from] csv::Error),
    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),
}

pub type DashboardResult<T> = Result<T, DashboardError>;
