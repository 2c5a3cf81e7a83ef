//! Error type shared by every core operation.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Vector {0} not found")]
    NotFound(u64),
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl From<std::io::Error> for DbError {
    fn from(err: std::io::Error) -> Self {
        DbError::Persistence(err.to_string())
    }
}

impl From<bincode::Error> for DbError {
    fn from(err: bincode::Error) -> Self {
        DbError::Persistence(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
