//! Wire types of the KM24 REST API

use serde::{Deserialize, Serialize};

/// Shown when the platform does not provide an emoji for a module
pub const DEFAULT_MODULE_EMOJI: &str = "📊";

/// Default ordering for step hits (newest first)
pub const NEWEST_FIRST: &str = "-hitDatetime";

fn default_emoji() -> String {
    DEFAULT_MODULE_EMOJI.to_string()
}

/// Module entry from `GET /modules/basic`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModuleSummary {
    pub id: i64,
    pub title: String,
    #[serde(default = "default_emoji")]
    pub emoji: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Envelope of the module list endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct ModuleList {
    #[serde(default)]
    pub items: Vec<ModuleSummary>,
}

/// Module detail from `GET /modules/basic/{id}`, including its filter schema
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModuleSchema {
    pub id: i64,
    pub title: String,
    #[serde(default = "default_emoji")]
    pub emoji: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parts: Vec<PartDescriptor>,
}

/// One filterable dimension of a module
///
/// `slug` is the human-facing key, `id` the identifier the step API expects.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PartDescriptor {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub slug: String,
    #[serde(rename = "type", default)]
    pub part_type: String,
}

/// Translated filter as accepted by `POST /steps/main`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepPart {
    pub module_part_id: i64,
    pub values: Vec<String>,
}

/// Body of a step creation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDraft {
    pub name: String,
    pub module_id: i64,
    pub lookback_days: u32,
    pub parts: Vec<StepPart>,
}

/// Step as returned by the platform after creation
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Step {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// Pagination and ordering for `GET /steps/main/hits/{id}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitsQuery {
    pub page: u32,
    pub page_size: u32,
    pub ordering: String,
}

impl Default for HitsQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 50,
            ordering: NEWEST_FIRST.to_string(),
        }
    }
}

impl HitsQuery {
    /// First page, newest first, with the given page size
    pub fn first_page(page_size: u32) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }
}

/// One page of step hits
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct HitsPage {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub items: Vec<RawHit>,
}

/// Hit record as delivered by the platform (only the fields we project)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub hit_datetime: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Company lookup result, passed through untouched
pub type CompanyResult = serde_json::Value;

/// Envelope of the company search endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct CompanySearch {
    #[serde(default)]
    pub results: Vec<CompanyResult>,
}
