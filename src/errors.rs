//! Centralized error handling for arc_extract
//!
//! Every fallible operation in the crate returns [`Result`]. Pipelines decide
//! per call site whether an error aborts the job (opening inputs, writing
//! outputs) or is logged and skipped (a single point or a single raster file).

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for extraction operations
#[derive(Debug, Error)]
pub enum ExtractError {
    /// NetCDF file operation errors
    #[error("NetCDF error: {0}")]
    NetCDFError(#[from] netcdf::Error),

    /// GeoTIFF decoding errors
    #[error("TIFF error: {0}")]
    TiffError(#[from] tiff::TiffError),

    /// Coordinate table or output table errors
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Run file parsing errors
    #[error("Run file error: {0}")]
    ConfigError(#[from] serde_json::Error),

    /// I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Array shape or dimension error
    #[error("Array error: {0}")]
    ArrayError(#[from] ndarray::ShapeError),

    /// Variable not found in NetCDF file
    #[error("Variable '{var}' not found in file")]
    VariableNotFound { var: String },

    /// Dimension not found in variable
    #[error("Dimension '{dim}' not found in variable '{var}'")]
    DimensionNotFound { var: String, dim: String },

    /// Raster carries no usable georeferencing tags
    #[error("Missing geotransform in {}: {message}", path.display())]
    MissingGeotransform { path: PathBuf, message: String },

    /// Time coordinate units could not be decoded
    #[error("Invalid time units '{units}': {message}")]
    InvalidTimeUnits { units: String, message: String },

    /// A coordinate cannot be located on the grid
    #[error("Invalid coordinate ({lat}, {lon}): {message}")]
    InvalidCoordinate { lat: f64, lon: f64, message: String },

    /// Generic error
    #[error("{0}")]
    Generic(String),
}

impl From<String> for ExtractError {
    fn from(error: String) -> Self {
        ExtractError::Generic(error)
    }
}

impl From<&str> for ExtractError {
    fn from(error: &str) -> Self {
        ExtractError::Generic(error.to_string())
    }
}

/// Result type alias for extraction operations
pub type Result<T> = std::result::Result<T, ExtractError>;
