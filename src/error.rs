//! Crate error type.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BurdenError {
    /// An unresolved block had no resolved siblings to average over.
    #[error("no resolved blocks share type label {label:?} with unresolved block {block:?}")]
    NoSiblings { block: String, label: String },

    #[error("block {0:?} is not a column of the burden matrix")]
    BlockNotInMatrix(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type BurdenResult<T> = Result<T, BurdenError>;
