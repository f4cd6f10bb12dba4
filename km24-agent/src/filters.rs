//! Filter translation
//!
//! Callers describe filters by part slug (`"kommune" => "Aarhus"`); the step
//! API wants numeric part ids. [`translate`] bridges the two using the
//! module's part schema.

use crate::error::{Error, Result};
use crate::platform::{ModuleSchema, StepPart};
use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Value of one filter: a single string or a list of strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    One(String),
    Many(Vec<String>),
}

impl FilterValue {
    /// Empty string or empty list
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::One(value) => value.is_empty(),
            FilterValue::Many(values) => values.is_empty(),
        }
    }

    pub fn into_values(self) -> Vec<String> {
        match self {
            FilterValue::One(value) => vec![value],
            FilterValue::Many(values) => values,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::One(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::One(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        FilterValue::Many(values)
    }
}

/// Insertion-ordered mapping of part slug to filter value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec(IndexMap<String, FilterValue>);

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value for `slug`, replacing any previous one
    pub fn with(mut self, slug: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.0.insert(slug.into(), value.into());
        self
    }

    /// Add one value for `slug`; repeated slugs accumulate into a list
    pub fn push(&mut self, slug: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        match self.0.entry(slug.into()) {
            Entry::Occupied(mut entry) => {
                let slot = entry.get_mut();
                let mut values = std::mem::replace(slot, FilterValue::Many(Vec::new())).into_values();
                values.push(value);
                *slot = FilterValue::Many(values);
            }
            Entry::Vacant(entry) => {
                entry.insert(FilterValue::One(value));
            }
        }
    }

    /// Parse a JSON object of slug → string | [string]
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| Error::InvalidInput(format!("Invalid filter JSON: {}", e)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FilterValue)> {
        self.0.iter()
    }
}

impl FromIterator<(String, FilterValue)> for FilterSpec {
    fn from_iter<I: IntoIterator<Item = (String, FilterValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Parse a `slug=value` command-line assignment
pub fn parse_assignment(raw: &str) -> std::result::Result<(String, String), String> {
    let (slug, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected slug=value, got '{}'", raw))?;
    let slug = slug.trim();
    if slug.is_empty() {
        return Err(format!("missing slug in '{}'", raw));
    }
    Ok((slug.to_string(), value.to_string()))
}

/// Map slug-keyed filters onto the module's part ids
///
/// Empty values and slugs the module does not define are dropped. Output
/// order follows the input order. An empty result means no usable filter.
pub fn translate(schema: &ModuleSchema, filters: &FilterSpec) -> Vec<StepPart> {
    let part_ids: HashMap<&str, i64> = schema
        .parts
        .iter()
        .map(|part| (part.slug.as_str(), part.id))
        .collect();

    filters
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .filter_map(|(slug, value)| match part_ids.get(slug.as_str()) {
            Some(&module_part_id) => Some(StepPart {
                module_part_id,
                values: value.clone().into_values(),
            }),
            None => {
                debug!(module_id = schema.id, slug = %slug, "Dropping filter with unknown slug");
                None
            }
        })
        .collect()
}
