//! Error types for km24-agent
//!
//! A small closed taxonomy so callers can pattern-match on the failure kind
//! instead of inspecting messages. Cleanup failures of ephemeral steps are
//! not represented here: they are logged and never returned.

use thiserror::Error;

/// Agent error type
#[derive(Debug, Error)]
pub enum Error {
    /// Platform answered with a non-2xx status, an unparseable payload, or
    /// could not be reached at all (`status` is `None` in that case)
    #[error("Upstream error{}: {message}", status_suffix(.status))]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    /// Platform reports the requested module/step does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Required credentials or settings missing
    #[error("Configuration error: {0}")]
    Config(String),

    /// Argument rejected before contacting the platform
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub(crate) fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Upstream {
            status,
            message: message.into(),
        }
    }

    /// True for failures that originated on the platform side
    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::Upstream { .. } | Error::NotFound(_))
    }
}

impl From<km24_common::Error> for Error {
    fn from(err: km24_common::Error) -> Self {
        match err {
            km24_common::Error::Config(msg) => Error::Config(msg),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" {}", s)).unwrap_or_default()
}

/// Result type for agent operations
pub type Result<T> = std::result::Result<T, Error>;
