//! Process-wide module list cache
//!
//! Holds the whole collection behind an `Arc`; a refresh swaps the pointer
//! so readers never observe a partially populated list.

use super::types::ModuleSummary;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared, replace-on-refresh cache of `GET /modules/basic`
#[derive(Debug, Default)]
pub struct ModuleCache {
    modules: RwLock<Option<Arc<Vec<ModuleSummary>>>>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached list, `None` when never populated or empty
    pub async fn get(&self) -> Option<Arc<Vec<ModuleSummary>>> {
        self.modules
            .read()
            .await
            .as_ref()
            .filter(|modules| !modules.is_empty())
            .cloned()
    }

    /// Replace the cached list and return the new snapshot
    pub async fn replace(&self, modules: Vec<ModuleSummary>) -> Arc<Vec<ModuleSummary>> {
        let snapshot = Arc::new(modules);
        *self.modules.write().await = Some(Arc::clone(&snapshot));
        snapshot
    }

    pub async fn invalidate(&self) {
        *self.modules.write().await = None;
    }
}
