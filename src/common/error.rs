//! Error types for grid_coverage

use thiserror::Error;

/// Main error type for coverage planning and execution
#[derive(Error, Debug)]
pub enum CoverageError {
    /// Grid is non-rectangular, empty, or has no free cell
    #[error("Malformed grid: {0}")]
    MalformedGrid(String),
    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// The external vehicle could not be reached or answered garbage
    #[error("Vehicle error: {0}")]
    Vehicle(String),
    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Visualization error
    #[error("Visualization error: {0}")]
    Visualization(String),
}

impl From<toml::de::Error> for CoverageError {
    fn from(e: toml::de::Error) -> Self {
        CoverageError::Config(e.to_string())
    }
}

/// Result type alias for coverage operations
pub type CoverageResult<T> = Result<T, CoverageError>;
