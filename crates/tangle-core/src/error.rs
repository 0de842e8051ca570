//! Error types for the core crate.

use thiserror::Error;

/// Errors raised while reading extractor output.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid batch JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed edge #{index}: {reason}")]
    MalformedEdge { index: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
