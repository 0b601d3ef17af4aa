//! Error kinds shared by every producer in the ground-track pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Cooperative cancellation. Not a failure: callers should treat this as
    /// a silent, user-invisible abort of the in-flight run.
    #[error("run cancelled")]
    Cancelled,

    #[error("propagation failed: {0}")]
    PropagationError(String),

    #[error("dataset load failed: {0}")]
    DatasetLoadError(String),

    #[error("time parse failed: {0}")]
    TimeParseError(String),

    #[error("export write failed: {0}")]
    ExportWriteError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
