//! In-process fake of the KM24 REST API
//!
//! Serves the endpoints the gateway uses on an ephemeral localhost port and
//! records what it received. Canned behaviour:
//! - module 110 exists, 999 is missing (404), 500 fails, 777 returns non-JSON,
//!   503 returns an oversized HTML error page
//! - step creation for module 13 is rejected (400), otherwise id 42
//! - deleting an already deleted step answers 404

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use km24_common::config::PlatformConfig;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_API_KEY: &str = "test-key";
pub const CREATED_STEP_ID: i64 = 42;

#[derive(Default)]
pub struct PlatformLog {
    pub module_list_requests: usize,
    pub api_keys: Vec<Option<String>>,
    pub created_steps: Vec<Value>,
    pub hit_queries: Vec<(i64, HashMap<String, String>)>,
    pub deleted_steps: HashSet<i64>,
    pub delete_requests: Vec<i64>,
    pub company_queries: Vec<String>,
}

pub struct FakePlatform {
    pub base_url: String,
    log: Arc<Mutex<PlatformLog>>,
}

type Shared = Arc<Mutex<PlatformLog>>;

impl FakePlatform {
    /// Bind to 127.0.0.1:0 and serve in the background
    pub async fn start() -> Self {
        let log: Shared = Arc::new(Mutex::new(PlatformLog::default()));

        let app = Router::new()
            .route("/api/modules/basic", get(list_modules))
            .route("/api/modules/basic/:id", get(get_module))
            .route("/api/steps/main", post(create_step))
            .route("/api/steps/main/:id", axum::routing::delete(delete_step))
            .route("/api/steps/main/hits/:id", get(step_hits))
            .route("/api/companies/add/search", get(search_companies))
            .with_state(Arc::clone(&log));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            log,
        }
    }

    pub fn config(&self) -> PlatformConfig {
        self.config_with_key(TEST_API_KEY)
    }

    pub fn config_with_key(&self, api_key: &str) -> PlatformConfig {
        PlatformConfig {
            api_key: api_key.to_string(),
            base_url: self.base_url.clone(),
            request_timeout: Duration::from_secs(5),
        }
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, PlatformLog> {
        self.log.lock().unwrap()
    }
}

/// Record the key and report whether it is the expected one
fn check_key(log: &Shared, headers: &HeaderMap) -> bool {
    let key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let authorized = key.as_deref() == Some(TEST_API_KEY);
    log.lock().unwrap().api_keys.push(key);
    authorized
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Invalid API key"}))).into_response()
}

async fn list_modules(State(log): State<Shared>, headers: HeaderMap) -> Response {
    if !check_key(&log, &headers) {
        return unauthorized();
    }
    log.lock().unwrap().module_list_requests += 1;

    Json(json!({
        "items": [
            {"id": 110, "title": "Arbejdstilsyn", "emoji": "👷"},
            {"id": 280, "title": "Udbud", "description": "Offentlige udbud"}
        ]
    }))
    .into_response()
}

async fn get_module(State(log): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if !check_key(&log, &headers) {
        return unauthorized();
    }

    match id {
        110 => Json(json!({
            "id": 110,
            "title": "Arbejdstilsyn",
            "emoji": "👷",
            "parts": [
                {"id": 5, "name": "Kommune", "slug": "kommune", "type": "municipality"},
                {"id": 7, "name": "Branche", "slug": "branche", "type": "industry"}
            ]
        }))
        .into_response(),
        13 => Json(json!({
            "id": 13,
            "title": "Strict",
            "parts": [{"id": 1, "name": "Søgeord", "slug": "sogeord", "type": "text"}]
        }))
        .into_response(),
        500 => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        777 => (StatusCode::OK, "<html>maintenance</html>").into_response(),
        503 => {
            let page = format!("<html>{}</html>", "x".repeat(4000));
            (StatusCode::SERVICE_UNAVAILABLE, page).into_response()
        }
        _ => (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response(),
    }
}

async fn create_step(
    State(log): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !check_key(&log, &headers) {
        return unauthorized();
    }

    let module_id = body["moduleId"].as_i64().unwrap_or_default();
    let name = body["name"].clone();
    log.lock().unwrap().created_steps.push(body);

    if module_id == 13 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"parts": ["Invalid modulePartId"]})),
        )
            .into_response();
    }

    (
        StatusCode::CREATED,
        Json(json!({"id": CREATED_STEP_ID, "name": name})),
    )
        .into_response()
}

async fn step_hits(
    State(log): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !check_key(&log, &headers) {
        return unauthorized();
    }
    log.lock().unwrap().hit_queries.push((id, params));

    let items: Vec<Value> = (1..=5)
        .map(|i| {
            json!({
                "title": format!("Påbud {}", i),
                "hitDatetime": format!("2024-05-0{}T09:00:00Z", i),
                "description": format!("Beskrivelse {}", i),
                "url": format!("https://km24.dk/hits/{}", i)
            })
        })
        .collect();

    Json(json!({"count": 5, "items": items})).into_response()
}

async fn delete_step(State(log): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if !check_key(&log, &headers) {
        return unauthorized();
    }

    let mut log = log.lock().unwrap();
    log.delete_requests.push(id);
    if log.deleted_steps.insert(id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response()
    }
}

async fn search_companies(
    State(log): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !check_key(&log, &headers) {
        return unauthorized();
    }

    let query = params.get("q").cloned().unwrap_or_default();
    log.lock().unwrap().company_queries.push(query.clone());

    Json(json!({
        "results": [
            {"cvr": "12345678", "name": format!("{} A/S", query)}
        ]
    }))
    .into_response()
}
