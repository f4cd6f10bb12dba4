//! KM24 platform gateway
//!
//! [`PlatformGateway`] is the seam between the validation logic and the
//! live platform. [`Km24Client`] implements it over the REST API; tests
//! substitute their own implementation.

pub mod cache;
pub mod client;
pub mod types;

pub use cache::ModuleCache;
pub use client::Km24Client;
pub use types::{
    CompanyResult, HitsPage, HitsQuery, ModuleSchema, ModuleSummary, PartDescriptor, RawHit,
    Step, StepDraft, StepPart,
};

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Allowed `lookbackDays` range for step creation
pub const LOOKBACK_DAYS_RANGE: std::ops::RangeInclusive<u32> = 1..=90;

/// Typed access to the KM24 REST API
///
/// Every method surfaces platform failures as [`crate::Error::Upstream`] or
/// [`crate::Error::NotFound`]; nothing is retried.
#[async_trait]
pub trait PlatformGateway: Send + Sync {
    /// All modules; served from cache unless `force_refresh` or the cache is empty
    async fn list_modules(&self, force_refresh: bool) -> Result<Arc<Vec<ModuleSummary>>>;

    /// Module detail with its part schema, always fetched fresh
    async fn get_module(&self, module_id: i64) -> Result<ModuleSchema>;

    /// Create a monitoring step; the caller owns its deletion
    async fn create_step(&self, draft: &StepDraft) -> Result<Step>;

    async fn get_step_hits(&self, step_id: i64, query: &HitsQuery) -> Result<HitsPage>;

    /// Delete a step; an already absent step counts as success
    async fn delete_step(&self, step_id: i64) -> Result<()>;

    async fn search_companies(&self, query: &str) -> Result<Vec<CompanyResult>>;
}
