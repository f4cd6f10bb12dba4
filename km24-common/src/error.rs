//! Common error types for KM24 crates

use thiserror::Error;

/// Common result type for KM24 operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while bootstrapping
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
