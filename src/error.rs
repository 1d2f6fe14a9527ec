//! Error types for loading, modelling and charting station data.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("model serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Rendering failures from plotters carry backend-specific error types
    #[error("plotting error: {0}")]
    Plot(String),

    #[error("no usable rows left after cleaning {0}")]
    EmptyData(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("missing required columns: {0:?}")]
    MissingColumns(Vec<String>),

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("model file {} not found, train models first", .0.display())]
    ModelNotFound(PathBuf),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl<E: std::error::Error + Send + Sync> From<plotters::drawing::DrawingAreaErrorKind<E>> for Error {
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        Error::Plot(err.to_string())
    }
}
