use std::path::PathBuf;
use thiserror::Error;

/// The main error type for detprep operations.
#[derive(Debug, Error)]
pub enum DetprepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("source directory not found: {path}")]
    SourceDirNotFound { path: PathBuf },

    #[error("required input file not found: {path}")]
    InputFileNotFound { path: PathBuf },

    #[error("invalid split ratios: {message}")]
    InvalidSplitRatios { message: String },

    #[error("no image/label pairs found in {path}")]
    EmptyDataset { path: PathBuf },

    #[error("class '{class_name}' not found in {path}")]
    ClassNotFound { class_name: String, path: PathBuf },

    #[error("failed to read CSV {path}: {source}")]
    CsvRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
