//! Error types for the slicing engine

use thiserror::Error;

/// Main error type for the engine
#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("mismatched dimensions: {0}")]
    MismatchedDimensions(String),

    #[error("index-to-world transform is not invertible")]
    NonInvertibleTransform,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
