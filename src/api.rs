// Asset Flow - REST API with Axum
//
// One process-wide session sits behind a mutex: registry edits and saves are
// applied one at a time, so concurrent submits cannot interleave.

use crate::categories::Category;
use crate::config::Config;
use crate::db::{Snapshot, SnapshotStore, SqliteSnapshotStore};
use crate::error::FinanceError;
use crate::form::FormSchema;
use crate::graph::RenderRequest;
use crate::record::AssetRecord;
use crate::session::{Dashboard, RecordSource};
use crate::summary::Summary;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, patch, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    dashboard: Arc<Mutex<Dashboard<SqliteSnapshotStore>>>,
    config: Arc<Config>,
}

impl AppState {
    pub fn new(dashboard: Dashboard<SqliteSnapshotStore>, config: Config) -> Self {
        Self {
            dashboard: Arc::new(Mutex::new(dashboard)),
            config: Arc::new(config),
        }
    }

    fn session(&self) -> Result<MutexGuard<'_, Dashboard<SqliteSnapshotStore>>, ApiError> {
        self.dashboard
            .lock()
            .map_err(|_| ApiError(FinanceError::Persistence("session lock poisoned".to_string())))
    }
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

/// Error mapped onto a status code and the response envelope.
pub struct ApiError(FinanceError);

impl From<FinanceError> for ApiError {
    fn from(err: FinanceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            FinanceError::Validation(_)
            | FinanceError::UnknownCategory(_)
            | FinanceError::UnknownField(_) => StatusCode::BAD_REQUEST,
            FinanceError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }

        let body = ApiResponse {
            success: false,
            data: serde_json::Value::Null,
            error: Some(self.0.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// JSON body whose rejection is reported through the envelope instead of axum's plain text.
type JsonBody<T> = Result<Json<T>, JsonRejection>;

fn json_body<T>(payload: JsonBody<T>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError(FinanceError::Validation(rejection.body_text())))
}

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Deserialize)]
pub struct NewItemRequest {
    pub name: String,
}

#[derive(Serialize)]
pub struct ItemsResponse {
    pub category: String,
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<String>,
    pub items: Vec<String>,
}

/// Form input: numbers are taken as-is, text goes through the amount parser.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

#[derive(Deserialize)]
pub struct FormSubmission {
    pub values: BTreeMap<String, RawAmount>,
}

#[derive(Serialize)]
pub struct GraphResponse {
    #[serde(flatten)]
    pub request: RenderRequest,
    /// The sample record is standing in for missing or all-zero data
    pub fallback: bool,
    /// Nothing to draw; show a "no data" state
    pub empty: bool,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub summary: Summary,
    pub source: &'static str,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/snapshots - All stored snapshots, newest first
async fn list_snapshots(State(state): State<AppState>) -> ApiResult<Vec<Snapshot>> {
    let session = state.session()?;
    Ok(Json(ApiResponse::ok(session.store().list()?)))
}

/// GET /api/snapshots/latest - Latest snapshot, 404 when nothing is stored
async fn latest_snapshot(State(state): State<AppState>) -> ApiResult<Snapshot> {
    let session = state.session()?;
    let snapshot = session
        .store()
        .latest()?
        .ok_or_else(|| FinanceError::NotFound("no snapshot stored yet".to_string()))?;
    Ok(Json(ApiResponse::ok(snapshot)))
}

/// POST /api/snapshots - Save the record as the latest snapshot (upsert)
async fn save_snapshot(
    State(state): State<AppState>,
    payload: JsonBody<AssetRecord>,
) -> ApiResult<Snapshot> {
    let record = json_body(payload)?;
    let mut session = state.session()?;
    Ok(Json(ApiResponse::ok(session.submit(record)?)))
}

/// PATCH /api/snapshots/:id - Overwrite one snapshot
async fn update_snapshot(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: JsonBody<AssetRecord>,
) -> ApiResult<Snapshot> {
    let record = json_body(payload)?;
    let mut session = state.session()?;
    Ok(Json(ApiResponse::ok(session.update_snapshot(id, record)?)))
}

/// DELETE /api/snapshots/:id
async fn delete_snapshot(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<&'static str> {
    let mut session = state.session()?;
    session.delete_snapshot(id)?;
    Ok(Json(ApiResponse::ok("Snapshot deleted")))
}

/// GET /api/categories - Registry with default and custom items
async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    let session = state.session()?;
    Ok(Json(ApiResponse::ok(session.registry().categories().to_vec())))
}

/// POST /api/categories/:category/items - Add a custom item
async fn add_item(
    State(state): State<AppState>,
    Path(category): Path<String>,
    payload: JsonBody<NewItemRequest>,
) -> ApiResult<ItemsResponse> {
    let body = json_body(payload)?;
    let mut session = state.session()?;
    let changed = session.add_custom_item(&category, &body.name)?;
    let items = session.registry().all_items(&category);

    Ok(Json(ApiResponse::ok(ItemsResponse {
        category,
        changed,
        removed: None,
        items,
    })))
}

/// DELETE /api/categories/:category/items/:index - Remove a custom item by custom-list index
async fn delete_item(
    State(state): State<AppState>,
    Path((category, index)): Path<(String, usize)>,
) -> ApiResult<ItemsResponse> {
    let mut session = state.session()?;
    let removed = session.delete_custom_item(&category, index)?;
    let items = session.registry().all_items(&category);

    Ok(Json(ApiResponse::ok(ItemsResponse {
        category,
        changed: removed.is_some(),
        removed,
        items,
    })))
}

/// GET /api/form - Editable fields seeded with the stored record
async fn get_form(State(state): State<AppState>) -> ApiResult<FormSchema> {
    let session = state.session()?;
    Ok(Json(ApiResponse::ok(session.form())))
}

/// POST /api/form - Apply raw inputs to the current form and save the result
async fn submit_form(
    State(state): State<AppState>,
    payload: JsonBody<FormSubmission>,
) -> ApiResult<Snapshot> {
    let body = json_body(payload)?;
    let mut session = state.session()?;
    let mut form = session.form();

    for (key, raw) in &body.values {
        match raw {
            RawAmount::Number(n) => form.set_value(key, *n)?,
            RawAmount::Text(text) => form.set_input(key, text)?,
        };
    }

    Ok(Json(ApiResponse::ok(session.submit_form(&form)?)))
}

/// GET /api/graph - Flow graph plus canvas size and palette for the renderer
async fn get_graph(State(state): State<AppState>) -> ApiResult<GraphResponse> {
    let session = state.session()?;
    let graph = session.graph();
    let empty = graph.is_empty();

    Ok(Json(ApiResponse::ok(GraphResponse {
        request: RenderRequest::new(graph, state.config.canvas_width, state.config.canvas_height),
        fallback: session.is_showing_fallback(),
        empty,
    })))
}

/// GET /api/summary - Total assets, net worth, liabilities
async fn get_summary(State(state): State<AppState>) -> ApiResult<SummaryResponse> {
    let session = state.session()?;
    let source = match session.source() {
        RecordSource::Sample => "sample",
        RecordSource::Stored => "stored",
    };

    Ok(Json(ApiResponse::ok(SummaryResponse {
        summary: session.summary(),
        source,
    })))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/snapshots", get(list_snapshots).post(save_snapshot))
        .route("/snapshots/latest", get(latest_snapshot))
        .route("/snapshots/:id", patch(update_snapshot).delete(delete_snapshot))
        .route("/categories", get(list_categories))
        .route("/categories/:category/items", post(add_item))
        .route("/categories/:category/items/:index", delete(delete_item))
        .route("/form", get(get_form).post(submit_form))
        .route("/graph", get(get_graph))
        .route("/summary", get(get_summary))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
