use crate::core::value::ValueType;
use thiserror::Error;

/// Fatal failures. Anything recoverable is reported as a
/// [`Diagnostic`](crate::engine::Diagnostic) instead.
#[derive(Error, Debug)]
pub enum FuzzError {
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("Could not parse data for: {0}")]
    EmptyInput(String),

    #[error("Construction error: {0}")]
    Construction(String),

    #[error("Column {0} could not be found!")]
    ColumnNotFound(String),

    #[error("You must define a percentage between 1 and 100 (got fraction {0})")]
    InvalidPercentage(f64),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, FuzzError>;

/// Failure of a single transform invocation on one cell.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("could not convert {from} to {to}: {value}")]
    Conversion {
        from: ValueType,
        to: ValueType,
        value: String,
    },

    #[error("{transform} does not accept {value_type} values")]
    Unsupported {
        transform: String,
        value_type: ValueType,
    },

    #[error("cannot draw a value from [{low}, {high}]")]
    InvalidRange { low: f64, high: f64 },
}
