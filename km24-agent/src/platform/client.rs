//! KM24 REST API client
//!
//! Thin typed wrapper over the platform endpoints. Every request carries the
//! `X-API-Key` header and is bounded by the configured timeout.

use super::cache::ModuleCache;
use super::types::{
    CompanyResult, CompanySearch, HitsPage, HitsQuery, ModuleList, ModuleSchema, ModuleSummary,
    Step, StepDraft,
};
use super::{PlatformGateway, LOOKBACK_DAYS_RANGE};
use crate::error::{Error, Result};
use async_trait::async_trait;
use km24_common::config::PlatformConfig;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const USER_AGENT: &str = concat!("km24-agent/", env!("CARGO_PKG_VERSION"));
const API_KEY_HEADER: &str = "x-api-key";
/// Upstream error bodies are cut to this many characters
const MAX_ERROR_BODY_CHARS: usize = 512;

/// KM24 API client
pub struct Km24Client {
    http_client: reqwest::Client,
    base_url: String,
    modules: Arc<ModuleCache>,
}

impl Km24Client {
    /// Client with its own, initially empty module cache
    pub fn new(config: &PlatformConfig) -> Result<Self> {
        Self::with_cache(config, Arc::new(ModuleCache::new()))
    }

    /// Client sharing an existing module cache
    pub fn with_cache(config: &PlatformConfig, modules: Arc<ModuleCache>) -> Result<Self> {
        let mut api_key = HeaderValue::from_str(&config.api_key).map_err(|_| {
            Error::Config("KM24 API key contains characters not allowed in an HTTP header".to_string())
        })?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(API_KEY_HEADER), api_key);

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            modules,
        })
    }

    pub fn module_cache(&self) -> &Arc<ModuleCache> {
        &self.modules
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request; only transport failures are errors here
    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|e| upstream_failure(context, e.status().map(|s| s.as_u16()), e.to_string()))
    }
}

/// Log and build an upstream error
fn upstream_failure(context: &str, status: Option<u16>, message: String) -> Error {
    error!(status = ?status, "Error {}: {}", context, message);
    Error::upstream(status, message)
}

/// Turn a non-2xx response into [`Error::Upstream`]
async fn ensure_success(response: Response, context: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        abridge(body)
    };
    Err(upstream_failure(context, Some(status.as_u16()), message))
}

/// Cut an error body to [`MAX_ERROR_BODY_CHARS`], marking the cut
fn abridge(body: String) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => {
            let dropped = body[cut..].chars().count();
            format!("{}... [{} chars truncated]", &body[..cut], dropped)
        }
        None => body,
    }
}

/// Check status and decode the JSON body
async fn read_json<T: DeserializeOwned>(response: Response, context: &str) -> Result<T> {
    let response = ensure_success(response, context).await?;
    let status = response.status().as_u16();
    response
        .json::<T>()
        .await
        .map_err(|e| upstream_failure(context, Some(status), format!("Malformed payload: {}", e)))
}

#[async_trait]
impl PlatformGateway for Km24Client {
    async fn list_modules(&self, force_refresh: bool) -> Result<Arc<Vec<ModuleSummary>>> {
        if !force_refresh {
            if let Some(modules) = self.modules.get().await {
                debug!(count = modules.len(), "Serving modules from cache");
                return Ok(modules);
            }
        }

        let context = "fetching modules";
        let url = self.url("/modules/basic");
        debug!(url = %url, "Querying KM24 modules");

        let response = self.send(self.http_client.get(&url), context).await?;
        let list: ModuleList = read_json(response, context).await?;

        let modules = self.modules.replace(list.items).await;
        info!("Loaded {} modules from KM24", modules.len());
        Ok(modules)
    }

    async fn get_module(&self, module_id: i64) -> Result<ModuleSchema> {
        let context = format!("fetching module {}", module_id);
        let url = self.url(&format!("/modules/basic/{}", module_id));
        debug!(url = %url, "Querying KM24 module detail");

        let response = self.send(self.http_client.get(&url), &context).await?;
        if response.status() == StatusCode::NOT_FOUND {
            warn!(module_id, "KM24 module not found");
            return Err(Error::NotFound(format!("module {}", module_id)));
        }

        let module: ModuleSchema = read_json(response, &context).await?;
        info!(
            module_id,
            parts = module.parts.len(),
            "Loaded module {}: {}",
            module_id,
            module.title
        );
        Ok(module)
    }

    async fn create_step(&self, draft: &StepDraft) -> Result<Step> {
        if !LOOKBACK_DAYS_RANGE.contains(&draft.lookback_days) {
            return Err(Error::InvalidInput(format!(
                "lookbackDays must be within {}..={}, got {}",
                LOOKBACK_DAYS_RANGE.start(),
                LOOKBACK_DAYS_RANGE.end(),
                draft.lookback_days
            )));
        }

        let context = "creating step";
        let url = self.url("/steps/main");
        debug!(
            module_id = draft.module_id,
            parts = draft.parts.len(),
            "Creating KM24 step"
        );

        let response = self
            .send(self.http_client.post(&url).json(draft), context)
            .await?;
        let step: Step = read_json(response, context).await?;

        info!(step_id = step.id, "Created step {}: {}", step.id, draft.name);
        Ok(step)
    }

    async fn get_step_hits(&self, step_id: i64, query: &HitsQuery) -> Result<HitsPage> {
        let context = format!("fetching hits from step {}", step_id);
        let url = self.url(&format!("/steps/main/hits/{}", step_id));

        let request = self.http_client.get(&url).query(&[
            ("page", query.page.to_string()),
            ("pageSize", query.page_size.to_string()),
            ("ordering", query.ordering.clone()),
        ]);

        let response = self.send(request, &context).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("step {}", step_id)));
        }

        let page: HitsPage = read_json(response, &context).await?;
        info!(
            step_id,
            hit_count = page.count,
            "Fetched {} hits from step {}",
            page.items.len(),
            step_id
        );
        Ok(page)
    }

    async fn delete_step(&self, step_id: i64) -> Result<()> {
        let context = format!("deleting step {}", step_id);
        let url = self.url(&format!("/steps/main/{}", step_id));

        let response = self.send(self.http_client.delete(&url), &context).await?;
        if response.status() == StatusCode::NOT_FOUND {
            info!(step_id, "Step {} already absent", step_id);
            return Ok(());
        }

        ensure_success(response, &context).await?;
        info!(step_id, "Deleted step {}", step_id);
        Ok(())
    }

    async fn search_companies(&self, query: &str) -> Result<Vec<CompanyResult>> {
        let context = "searching companies";
        let url = self.url("/companies/add/search");

        let response = self
            .send(self.http_client.get(&url).query(&[("q", query)]), context)
            .await?;
        let search: CompanySearch = read_json(response, context).await?;

        info!("Found {} companies for query: {}", search.results.len(), query);
        Ok(search.results)
    }
}
