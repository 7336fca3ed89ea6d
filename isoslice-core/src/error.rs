//! Error types for isoslice

use crate::field::FieldLocation;
use thiserror::Error;

/// Main error type for isoslice operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Field '{name}' not found ({location} values)")]
    FieldNotFound {
        name: String,
        location: FieldLocation,
    },

    #[error("Field '{name}' has {actual} values, expected {expected}")]
    FieldSize {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Algorithm error: {0}")]
    Algorithm(String),
}

/// Result type alias for isoslice operations
pub type Result<T> = std::result::Result<T, Error>;
