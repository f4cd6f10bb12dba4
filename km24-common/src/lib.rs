//! # KM24 Common Library
//!
//! Shared code for the KM24 agent crates:
//! - Error type used by configuration loading
//! - TOML / environment configuration resolution
//! - Tracing subscriber initialisation

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
