//! Error types for the trajectory analysis library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// `OpenCV` operation failed
    #[error("OpenCV error: {0}")]
    OpenCV(#[from] opencv::Error),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing or writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Coordinate sequences or table columns disagree in length
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Region-occupancy table violates the 0/1 one-hot contract
    #[error("ROI data error: {0}")]
    InvalidRoiData(String),

    /// No output artifact was requested from a render pass
    #[error("Output selection error: {0}")]
    NoOutput(String),

    /// Table cell or column could not be read
    #[error("Data error: {0}")]
    DataError(String),

    /// Video metadata registry lookup or parsing failed
    #[error("Video info error: {0}")]
    VideoInfoError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
