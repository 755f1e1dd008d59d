use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::airdrop::{Airdrop, AirdropInput, FilterStatus};
use crate::assist::{fields_to_input, Assistant};
use crate::login;
use crate::saving;
use crate::sheet;
use crate::store::AirdropStore;
use crate::telegram;

pub struct AppState {
    store: Mutex<AirdropStore>,
    assistant: Assistant,
}

#[derive(Deserialize)]
struct ViewQuery {
    search: Option<String>,
    status: Option<String>,
}

#[derive(Deserialize)]
struct TaskForm {
    text: String,
}

#[derive(Deserialize)]
struct ExtractRequest {
    text: String,
}

#[derive(Deserialize)]
struct ResearchRequest {
    query: String,
}

#[derive(Serialize)]
struct ApiResponse {
    status: String,
    message: Option<String>,
}

impl ApiResponse {
    fn ok() -> Json<Self> {
        Json(ApiResponse {
            status: "ok".to_string(),
            message: None,
        })
    }

    fn error(message: impl Into<String>) -> Json<Self> {
        Json(ApiResponse {
            status: "error".to_string(),
            message: Some(message.into()),
        })
    }
}

pub async fn run(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Prepare the account storage
    login::init_storage()?;

    // Setup app state
    let app_state = Arc::new(AppState {
        store: Mutex::new(AirdropStore::new()),
        assistant: Assistant::from_env(),
    });

    // Build router
    let app = Router::new()
        .route("/signup", post(login::handle_signup))
        .route("/login", post(login::handle_login))
        .route("/logout", post(login::handle_logout))
        .route("/api/session/guest", post(login::handle_guest_session))
        .route("/api/airdrops", get(list_airdrops).post(create_airdrop))
        .route(
            "/api/airdrops/:id",
            get(get_airdrop).put(update_airdrop).delete(delete_airdrop),
        )
        .route("/api/airdrops/:id/tasks", post(add_task))
        .route(
            "/api/airdrops/:id/tasks/:task_id",
            axum::routing::delete(remove_task),
        )
        .route("/api/airdrops/:id/tasks/:task_id/toggle", post(toggle_task))
        .route("/api/import/csv", post(import_csv))
        .route("/api/import/telegram", post(import_telegram))
        .route("/api/export/csv", get(export_csv))
        .route("/api/assist/extract", post(assist_extract))
        .route("/api/assist/research", post(assist_research))
        .route("/api/save", post(save_snapshot))
        .route("/api/load", post(load_snapshot))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    println!("Listening on http://127.0.0.1:{}", port);
    log::info!("airdrop tracker listening on port {}", port);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn list_airdrops(
    jar: CookieJar,
    Query(view): Query<ViewQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let owner = login::resolve_owner(&jar);
    let mut store = state.store.lock().unwrap();

    if let Some(search) = view.search {
        store.set_search_term(&search);
    }
    if let Some(status) = view.status {
        match FilterStatus::from_strng(&status) {
            Some(filter) => store.set_filter_status(filter),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    ApiResponse::error(format!("Unknown status filter: {}", status)),
                )
                    .into_response();
            }
        }
    }

    let visible: Vec<Airdrop> = store.visible_for(&owner).into_iter().cloned().collect();
    Json(visible).into_response()
}

async fn get_airdrop(
    jar: CookieJar,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let owner = login::resolve_owner(&jar);
    let store = state.store.lock().unwrap();

    match store.get(&id) {
        Some(record) if record.owner_id == owner => Json(record.clone()).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn create_airdrop(
    jar: CookieJar,
    State(state): State<Arc<AppState>>,
    Json(input): Json<AirdropInput>,
) -> Response {
    // Form boundary validation; the store itself accepts anything
    if let Err(e) = input.validate() {
        return (StatusCode::BAD_REQUEST, ApiResponse::error(e)).into_response();
    }

    let owner = login::resolve_owner(&jar);
    let mut store = state.store.lock().unwrap();
    let record = store.add(&owner, input).clone();
    (StatusCode::CREATED, Json(record)).into_response()
}

async fn update_airdrop(
    jar: CookieJar,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(mut airdrop): Json<Airdrop>,
) -> Response {
    let owner = login::resolve_owner(&jar);
    let mut store = state.store.lock().unwrap();

    // The path id wins over whatever the body carries
    airdrop.id = id.clone();
    match store.get(&id) {
        Some(existing) if existing.owner_id == owner => {}
        _ => return StatusCode::NOT_FOUND.into_response(),
    }

    match store.update(airdrop) {
        Ok(()) => Json(store.get(&id).unwrap().clone()).into_response(),
        Err(e) => (StatusCode::NOT_FOUND, ApiResponse::error(e)).into_response(),
    }
}

async fn delete_airdrop(
    jar: CookieJar,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let owner = login::resolve_owner(&jar);
    let mut store = state.store.lock().unwrap();

    // Deleting something that is not there (or not yours) is still a no-op
    if store.get(&id).map(|r| r.owner_id == owner).unwrap_or(false) {
        store.delete(&id);
    }
    ApiResponse::ok().into_response()
}

async fn add_task(
    jar: CookieJar,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(form): Json<TaskForm>,
) -> Response {
    let owner = login::resolve_owner(&jar);
    let mut store = state.store.lock().unwrap();

    match store.get(&id) {
        Some(existing) if existing.owner_id == owner => {}
        _ => return StatusCode::NOT_FOUND.into_response(),
    }

    match store.add_task(&id, &form.text) {
        Ok(task) => (StatusCode::CREATED, Json(task.clone())).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, ApiResponse::error(e)).into_response(),
    }
}

async fn remove_task(
    jar: CookieJar,
    Path((id, task_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let owner = login::resolve_owner(&jar);
    let mut store = state.store.lock().unwrap();

    match store.get(&id) {
        Some(existing) if existing.owner_id == owner => {}
        _ => return StatusCode::NOT_FOUND.into_response(),
    }

    match store.remove_task(&id, &task_id) {
        Ok(()) => ApiResponse::ok().into_response(),
        Err(e) => (StatusCode::NOT_FOUND, ApiResponse::error(e)).into_response(),
    }
}

async fn toggle_task(
    jar: CookieJar,
    Path((id, task_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let owner = login::resolve_owner(&jar);
    let mut store = state.store.lock().unwrap();

    match store.get(&id) {
        Some(existing) if existing.owner_id == owner => {}
        _ => return StatusCode::NOT_FOUND.into_response(),
    }

    match store.toggle_task(&id, &task_id) {
        Ok(status) => Json(serde_json::json!({ "status": status })).into_response(),
        Err(e) => (StatusCode::NOT_FOUND, ApiResponse::error(e)).into_response(),
    }
}

async fn import_csv(
    jar: CookieJar,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Response {
    // Process the multipart form data
    let mut file_data = Vec::new();

    while let Some(field) = multipart.next_field().await.unwrap_or(None) {
        if field.name().unwrap_or("unknown") == "file" {
            file_data = field.bytes().await.unwrap_or_default().to_vec();
        }
    }

    if file_data.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            ApiResponse::error("No file data received"),
        )
            .into_response();
    }

    let text = match String::from_utf8(file_data) {
        Ok(text) => text,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                ApiResponse::error("File is not valid UTF-8"),
            )
                .into_response();
        }
    };

    let rows = sheet::rows_from_csv_str(&text);
    let report = match sheet::rows_to_inputs(&rows) {
        Ok(report) => report,
        // Header mismatch rejects the whole batch
        Err(e) => return (StatusCode::BAD_REQUEST, ApiResponse::error(e)).into_response(),
    };

    let owner = login::resolve_owner(&jar);
    let mut store = state.store.lock().unwrap();
    let added = store.bulk_add(&owner, report.inputs);
    log::info!("csv import: {} added, {} skipped", added, report.skipped.len());

    Json(serde_json::json!({
        "status": "ok",
        "added": added,
        "skipped": report.skipped,
    }))
    .into_response()
}

async fn import_telegram(jar: CookieJar, State(state): State<Arc<AppState>>) -> Response {
    let owner = login::resolve_owner(&jar);
    let mut store = state.store.lock().unwrap();
    let added = store.bulk_add(&owner, telegram::sample_feed());

    Json(serde_json::json!({ "status": "ok", "added": added })).into_response()
}

async fn export_csv(jar: CookieJar, State(state): State<Arc<AppState>>) -> Response {
    let owner = login::resolve_owner(&jar);
    let store = state.store.lock().unwrap();

    // Full unfiltered order, not the visible view
    let records = store.records_for(&owner);
    let csv = sheet::to_csv(&records);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv")
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"airdrops.csv\"",
        )
        .body(axum::body::Body::from(csv))
        .unwrap()
}

async fn assist_extract(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExtractRequest>,
) -> Response {
    match state.assistant.extract(&request.text).await {
        Ok(fields) => {
            let input = fields_to_input(&fields);
            Json(serde_json::json!({ "fields": fields, "input": input })).into_response()
        }
        Err(e) => {
            log::warn!("extraction failed: {}", e);
            (StatusCode::BAD_GATEWAY, ApiResponse::error(e)).into_response()
        }
    }
}

async fn assist_research(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResearchRequest>,
) -> Response {
    match state.assistant.research(&request.query).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            log::warn!("research failed: {}", e);
            (StatusCode::BAD_GATEWAY, ApiResponse::error(e)).into_response()
        }
    }
}

async fn save_snapshot(jar: CookieJar, State(state): State<Arc<AppState>>) -> Response {
    let owner = login::resolve_owner(&jar);
    let path = login::snapshot_path(&owner);

    let records = {
        let store = state.store.lock().unwrap();
        store.records_for(&owner)
    };

    if let Some(parent) = path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiResponse::error("Failed to create snapshot directory"),
            )
                .into_response();
        }
    }

    match saving::save_collection(&records, &path) {
        Ok(()) => Json(serde_json::json!({ "status": "ok", "saved": records.len() })).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiResponse::error(format!("Failed to save snapshot: {}", e)),
        )
            .into_response(),
    }
}

async fn load_snapshot(jar: CookieJar, State(state): State<Arc<AppState>>) -> Response {
    let owner = login::resolve_owner(&jar);
    let path = login::snapshot_path(&owner);

    match saving::load_collection(&path) {
        Ok(records) => {
            let loaded = records.len();
            let mut store = state.store.lock().unwrap();
            store.restore(&owner, records);
            Json(serde_json::json!({ "status": "ok", "loaded": loaded })).into_response()
        }
        Err(e) => (
            StatusCode::NOT_FOUND,
            ApiResponse::error(format!("Failed to load snapshot: {}", e)),
        )
            .into_response(),
    }
}
