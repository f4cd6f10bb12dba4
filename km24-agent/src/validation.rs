//! Filter validation against live platform data
//!
//! A candidate filter set is probed by creating a short-lived step, reading
//! the first page of its hits and deleting it again. The hit count is turned
//! into a [`ValidationVerdict`] with warnings and suggestions.

use crate::error::Result;
use crate::filters::{translate, FilterSpec};
use crate::platform::{HitsQuery, PlatformGateway, RawHit, Step, StepDraft};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// Name prefix marking steps created only for probing
pub const TEMP_STEP_PREFIX: &str = "__temp_validation_";
pub const VALIDATION_LOOKBACK_DAYS: u32 = 30;
pub const VALIDATION_PAGE_SIZE: u32 = 10;
/// Maximum number of hits carried in a verdict
pub const SAMPLE_HIT_LIMIT: usize = 3;
/// Hit counts above this are flagged as too broad
pub const HIGH_HIT_RATE_THRESHOLD: u64 = 100;

const UNTITLED: &str = "Untitled";

/// Read-only projection of a platform hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub title: String,
    pub date: Option<String>,
    pub summary: Option<String>,
    pub url: Option<String>,
}

impl From<&RawHit> for Hit {
    fn from(raw: &RawHit) -> Self {
        Self {
            title: raw.title.clone().unwrap_or_else(|| UNTITLED.to_string()),
            date: raw.hit_datetime.clone(),
            summary: raw.summary.clone().or_else(|| raw.description.clone()),
            url: raw.url.clone(),
        }
    }
}

/// Outcome of probing a filter set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub is_valid: bool,
    pub sample_hits: Vec<Hit>,
    pub hit_count: u64,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

impl ValidationVerdict {
    /// Verdict for a filter set with no usable filter; no platform call behind it
    pub fn no_filters() -> Self {
        Self {
            is_valid: false,
            sample_hits: Vec::new(),
            hit_count: 0,
            warnings: vec!["no filters selected".to_string()],
            suggestions: vec!["add at least one filter".to_string()],
        }
    }

    pub fn from_hits(hit_count: u64, sample_hits: Vec<Hit>) -> Self {
        let (warnings, suggestions) = classify(hit_count);
        Self {
            is_valid: hit_count > 0,
            sample_hits,
            hit_count,
            warnings,
            suggestions,
        }
    }
}

/// Warnings and suggestions for a hit count
///
/// 0 is too narrow, above [`HIGH_HIT_RATE_THRESHOLD`] too broad.
pub fn classify(hit_count: u64) -> (Vec<String>, Vec<String>) {
    if hit_count == 0 {
        (
            vec!["no hits found".to_string()],
            vec!["broaden the search by removing some filters".to_string()],
        )
    } else if hit_count > HIGH_HIT_RATE_THRESHOLD {
        (
            vec![format!("very high hit rate ({} hits)", hit_count)],
            vec!["narrow with more specific filters".to_string()],
        )
    } else {
        (Vec::new(), Vec::new())
    }
}

/// Deletes its step when dropped while still armed
///
/// Only fires when the regular delete in [`with_ephemeral_step`] was never
/// reached: the future was cancelled or `body` panicked.
struct StepGuard {
    gateway: Arc<dyn PlatformGateway>,
    step_id: i64,
    armed: bool,
}

impl StepGuard {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for StepGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let step_id = self.step_id;
        match Handle::try_current() {
            Ok(handle) => {
                warn!(step_id, "Validation interrupted, deleting step {} in background", step_id);
                let gateway = Arc::clone(&self.gateway);
                handle.spawn(async move {
                    if let Err(e) = gateway.delete_step(step_id).await {
                        warn!(step_id, error = %e, "Failed to delete ephemeral step {}", step_id);
                    }
                });
            }
            Err(_) => {
                warn!(step_id, "No async runtime left, ephemeral step {} not deleted", step_id);
            }
        }
    }
}

/// Run `body` against a freshly created step, then delete the step
///
/// Deletion happens whether `body` succeeds, fails, panics or is cancelled.
/// A failed deletion is logged and never replaces the outcome of `body`. If
/// creation fails there is nothing to delete and the creation error is
/// returned.
pub async fn with_ephemeral_step<T, F, Fut>(
    gateway: &Arc<dyn PlatformGateway>,
    draft: &StepDraft,
    body: F,
) -> Result<T>
where
    F: FnOnce(Step) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let step = gateway.create_step(draft).await?;
    let guard = StepGuard {
        gateway: Arc::clone(gateway),
        step_id: step.id,
        armed: true,
    };

    let outcome = body(step).await;

    if let Err(e) = gateway.delete_step(guard.step_id).await {
        warn!(step_id = guard.step_id, error = %e, "Failed to delete ephemeral step {}", guard.step_id);
    }
    guard.disarm();

    outcome
}

/// Validates filter sets for a module against the platform
#[derive(Clone)]
pub struct Validator {
    gateway: Arc<dyn PlatformGateway>,
}

impl Validator {
    pub fn new(gateway: Arc<dyn PlatformGateway>) -> Self {
        Self { gateway }
    }

    /// Probe `filters` on `module_id` and judge the hit volume
    ///
    /// Module lookup and probe failures propagate unchanged.
    pub async fn validate(&self, module_id: i64, filters: &FilterSpec) -> Result<ValidationVerdict> {
        let schema = self.gateway.get_module(module_id).await?;

        let parts = translate(&schema, filters);
        if parts.is_empty() {
            debug!(module_id, requested = filters.len(), "No usable filters after translation");
            return Ok(ValidationVerdict::no_filters());
        }

        let draft = StepDraft {
            name: format!("{}{}", TEMP_STEP_PREFIX, module_id),
            module_id,
            lookback_days: VALIDATION_LOOKBACK_DAYS,
            parts,
        };

        let page = with_ephemeral_step(&self.gateway, &draft, |step| async move {
            self.gateway
                .get_step_hits(step.id, &HitsQuery::first_page(VALIDATION_PAGE_SIZE))
                .await
        })
        .await?;

        let sample_hits: Vec<Hit> = page.items.iter().take(SAMPLE_HIT_LIMIT).map(Hit::from).collect();
        let verdict = ValidationVerdict::from_hits(page.count, sample_hits);

        info!(
            module_id,
            hit_count = verdict.hit_count,
            is_valid = verdict.is_valid,
            "Validated filters for module {}",
            module_id
        );
        Ok(verdict)
    }

    /// Sample hits for a filter set, at most `limit` (and never more than
    /// [`SAMPLE_HIT_LIMIT`])
    pub async fn search_hits(
        &self,
        module_id: i64,
        filters: &FilterSpec,
        limit: usize,
    ) -> Result<Vec<Hit>> {
        let verdict = self.validate(module_id, filters).await?;
        Ok(verdict.sample_hits.into_iter().take(limit).collect())
    }
}
