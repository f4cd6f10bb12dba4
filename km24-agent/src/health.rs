//! Health report
//!
//! Liveness plus a probe of the platform connection via the module list.

use crate::platform::PlatformGateway;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Health check response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Service status, always "ok" while the process runs
    pub status: String,
    /// "ok" when the module list could be loaded, "error" otherwise
    pub km24_status: String,
    pub km24_modules_count: usize,
    /// Crate version from Cargo.toml
    pub version: String,
}

/// Probe the platform; never fails
pub async fn check(gateway: &dyn PlatformGateway) -> HealthReport {
    let (km24_status, km24_modules_count) = match gateway.list_modules(false).await {
        Ok(modules) => ("ok", modules.len()),
        Err(e) => {
            warn!("KM24 health probe failed: {}", e);
            ("error", 0)
        }
    };

    HealthReport {
        status: "ok".to_string(),
        km24_status: km24_status.to_string(),
        km24_modules_count,
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}
