//! The hosted per-device document store used for cross-device backup.

use crate::clock::Clock;
use crate::dates::parse_date_key;
use crate::errors::AppError;
use crate::models::{PutResponse, RemoteDocument};
use crate::sync::is_valid_device_id;
use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    http::{header, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch},
    Json, Router,
};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::{fs, sync::Mutex};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error};

pub type Documents = BTreeMap<String, RemoteDocument>;

#[derive(Clone)]
pub struct KvState {
    pub data_path: Option<PathBuf>,
    pub documents: Arc<Mutex<Documents>>,
    pub clock: Arc<dyn Clock>,
}

impl KvState {
    pub fn new(data_path: Option<PathBuf>, documents: Documents, clock: Arc<dyn Clock>) -> Self {
        Self {
            data_path,
            documents: Arc::new(Mutex::new(documents)),
            clock,
        }
    }
}

pub fn sync_router(state: KvState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::PUT, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .route("/state/:id", get(get_state).put(put_state))
        .route("/state/:id/daily/:date", patch(patch_day))
        .layer(middleware::from_fn(log_requests))
        .layer(cors)
        .with_state(state)
}

pub async fn load_documents(path: &FsPath) -> Documents {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(documents) => documents,
            Err(err) => {
                error!("failed to parse sync data file: {err}");
                Documents::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Documents::default(),
        Err(err) => {
            error!("failed to read sync data file: {err}");
            Documents::default()
        }
    }
}

async fn persist_documents(state: &KvState, documents: &Documents) -> Result<(), AppError> {
    let Some(path) = &state.data_path else {
        return Ok(());
    };
    let payload = serde_json::to_vec(documents).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(|err| {
        error!("failed to save sync data: {err}");
        AppError::internal(err)
    })
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    debug!(
        "{method} {path} - {}ms ({})",
        started.elapsed().as_millis(),
        response.status()
    );
    response
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

fn check_device_id(id: &str) -> Result<(), AppError> {
    if is_valid_device_id(id) {
        Ok(())
    } else {
        Err(AppError::bad_request("Invalid device ID"))
    }
}

fn parse_object(body: &[u8], message: &str) -> Result<Map<String, Value>, AppError> {
    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(AppError::bad_request(message)),
    }
}

async fn get_state(
    State(state): State<KvState>,
    Path(id): Path<String>,
) -> Result<Json<RemoteDocument>, AppError> {
    check_device_id(&id)?;
    let documents = state.documents.lock().await;
    documents
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found("Not found"))
}

async fn put_state(
    State(state): State<KvState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<PutResponse>, AppError> {
    check_device_id(&id)?;
    let body = parse_object(&body, "Invalid state data")?;

    let last_updated = state.clock.now_ms();
    let mut documents = state.documents.lock().await;
    documents.insert(
        id,
        RemoteDocument {
            state: Value::Object(body),
            last_updated,
        },
    );
    persist_documents(&state, &documents).await?;

    Ok(Json(PutResponse {
        ok: true,
        last_updated,
    }))
}

async fn patch_day(
    State(state): State<KvState>,
    Path((id, date)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<PutResponse>, AppError> {
    check_device_id(&id)?;
    if parse_date_key(&date).is_none() {
        return Err(AppError::bad_request("Invalid date, expected YYYY-MM-DD"));
    }
    let fields = parse_object(&body, "Invalid day data")?;

    let last_updated = state.clock.now_ms();
    let mut documents = state.documents.lock().await;
    let document = documents
        .get_mut(&id)
        .ok_or_else(|| AppError::not_found("Not found"))?;

    merge_day(&mut document.state, &date, fields);
    document.last_updated = last_updated;
    persist_documents(&state, &documents).await?;

    Ok(Json(PutResponse {
        ok: true,
        last_updated,
    }))
}

/// Merges `fields` into `state.dailyData[date]`, creating containers as needed.
fn merge_day(state: &mut Value, date: &str, fields: Map<String, Value>) {
    let root = ensure_object(state);
    let daily = ensure_object(root.entry("dailyData").or_insert_with(|| json!({})));
    let record = ensure_object(daily.entry(date).or_insert_with(|| json!({})));
    record.extend(fields);
    record.insert("date".to_string(), Value::String(date.to_string()));
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just made an object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use axum::body::Body;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const DEVICE: &str = "device-0123456789";

    fn test_app() -> Router {
        test_app_with_clock().0
    }

    fn test_app_with_clock() -> (Router, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_742_800_000_000));
        let app = sync_router(KvState::new(None, Documents::default(), clock.clone()));
        (app, clock)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = test_app();
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn put_then_get_returns_envelope() {
        let app = test_app();
        let state = json!({ "dayStart": 1, "bmr": 1800, "dailyData": {} });

        let (status, body) = send(&app, "PUT", &format!("/state/{DEVICE}"), Some(state.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["lastUpdated"], 1_742_800_000_000_i64);

        let (status, body) = send(&app, "GET", &format!("/state/{DEVICE}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], state);
        assert_eq!(body["lastUpdated"], 1_742_800_000_000_i64);
    }

    #[tokio::test]
    async fn rejects_short_ids_and_unknown_devices() {
        let app = test_app();
        let (status, body) = send(&app, "GET", "/state/short", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid device ID");

        let (status, body) = send(&app, "GET", &format!("/state/{DEVICE}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not found");
    }

    #[tokio::test]
    async fn put_rejects_non_objects() {
        let app = test_app();
        let (status, _) = send(&app, "PUT", &format!("/state/{DEVICE}"), Some(json!([1, 2]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn patch_merges_day_fields_and_forces_date() {
        let (app, clock) = test_app_with_clock();
        let state = json!({
            "dayStart": 1,
            "bmr": 1800,
            "dailyData": {
                "2025-03-23": { "date": "2025-03-23", "bmr": 1800, "manualCalories": 100, "netCalories": -1700 }
            }
        });
        send(&app, "PUT", &format!("/state/{DEVICE}"), Some(state)).await;
        clock.advance(5_000);

        let uri = format!("/state/{DEVICE}/daily/2025-03-23");
        let patch = json!({ "manualCalories": 2000, "netCalories": 200, "date": "1999-01-01" });
        let (status, body) = send(&app, "PATCH", &uri, Some(patch)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["lastUpdated"], 1_742_800_005_000_i64);

        let uri = format!("/state/{DEVICE}/daily/2025-03-24");
        let (status, _) = send(&app, "PATCH", &uri, Some(json!({ "bmr": 1900 }))).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, "GET", &format!("/state/{DEVICE}"), None).await;
        assert_eq!(body["lastUpdated"], 1_742_800_005_000_i64);
        let daily = &body["state"]["dailyData"];
        assert_eq!(daily["2025-03-23"]["date"], "2025-03-23");
        assert_eq!(daily["2025-03-23"]["manualCalories"], 2000);
        assert_eq!(daily["2025-03-23"]["bmr"], 1800);
        assert_eq!(daily["2025-03-24"]["date"], "2025-03-24");
        assert_eq!(daily["2025-03-24"]["bmr"], 1900);
    }

    #[tokio::test]
    async fn patch_validates_date_and_existing_state() {
        let app = test_app();
        let uri = format!("/state/{DEVICE}/daily/2025-03-24");
        let (status, _) = send(&app, "PATCH", &uri, Some(json!({ "bmr": 1900 }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        send(&app, "PUT", &format!("/state/{DEVICE}"), Some(json!({ "bmr": 1800 }))).await;
        let uri = format!("/state/{DEVICE}/daily/24-03-2025");
        let (status, body) = send(&app, "PATCH", &uri, Some(json!({ "bmr": 1900 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("YYYY-MM-DD"));
    }

    #[test]
    fn merge_day_repairs_missing_containers() {
        let mut state = json!({ "dailyData": "garbage" });
        let mut fields = Map::new();
        fields.insert("bmr".to_string(), json!(2000));
        merge_day(&mut state, "2025-01-02", fields);
        assert_eq!(state["dailyData"]["2025-01-02"], json!({ "bmr": 2000, "date": "2025-01-02" }));
    }
}
