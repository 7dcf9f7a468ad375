#![cfg(not(tarpaulin_include))]

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::downloader::ExportFormat;
use crate::error::ExportError;
use crate::table::{DataTable, TableView};

pub struct AppState {
    table: Mutex<DataTable>,
}

impl AppState {
    pub fn new(table: DataTable) -> Self {
        Self {
            table: Mutex::new(table),
        }
    }

    // Poisoned by a panicking host callback; the table state is still consistent
    fn table(&self) -> MutexGuard<'_, DataTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Deserialize)]
struct SearchUpdate {
    term: String,
}

#[derive(Deserialize)]
struct FilterUpdate {
    key: String,
    #[serde(default)]
    value: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScrollUpdate {
    scroll_top: f64,
    client_height: f64,
}

#[derive(Deserialize)]
struct WidthUpdate {
    width: f64,
}

#[derive(Serialize)]
struct ActionResponse {
    status: String,
    message: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/table", get(get_table))
        .route("/api/search", post(set_search))
        .route("/api/filter", post(set_filter))
        .route("/api/sort/:key", post(toggle_sort))
        .route("/api/page/:page", post(go_to_page))
        .route("/api/scroll", post(scroll))
        .route("/api/rows/:id/toggle", post(toggle_row))
        .route("/api/rows/:id/click", post(click_row))
        .route("/api/select_all", post(toggle_select_all))
        .route("/api/columns/:key/toggle", post(toggle_column))
        .route("/api/columns/:key/width", post(set_column_width))
        .route("/api/bulk/:label", post(run_bulk_action))
        .route("/api/reset", post(reset_filters))
        .route("/api/export/:format", get(export_table))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(table: DataTable, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(Arc::new(AppState::new(table)));

    // Start server
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn get_table(State(state): State<Arc<AppState>>) -> Json<TableView> {
    Json(state.table().view())
}

async fn set_search(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SearchUpdate>,
) -> Json<TableView> {
    let mut table = state.table();
    table.set_search(&payload.term);
    Json(table.view())
}

async fn set_filter(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FilterUpdate>,
) -> Json<TableView> {
    let mut table = state.table();
    table.set_filter(&payload.key, &payload.value);
    Json(table.view())
}

async fn toggle_sort(
    Path(key): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Json<TableView> {
    let mut table = state.table();
    table.toggle_sort(&key);
    Json(table.view())
}

async fn go_to_page(
    Path(page): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Json<TableView> {
    let mut table = state.table();
    table.go_to_page_str(&page);
    Json(table.view())
}

async fn scroll(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ScrollUpdate>,
) -> Json<TableView> {
    let mut table = state.table();
    table.on_scroll(payload.scroll_top, payload.client_height);
    Json(table.view())
}

async fn toggle_row(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Json<TableView> {
    let mut table = state.table();
    table.toggle_row(&id);
    Json(table.view())
}

async fn click_row(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    if state.table().click_row(&id) {
        action_ok()
    } else {
        action_error(StatusCode::NOT_FOUND, format!("no clickable row '{}'", id))
    }
}

async fn toggle_select_all(State(state): State<Arc<AppState>>) -> Json<TableView> {
    let mut table = state.table();
    table.toggle_select_all();
    Json(table.view())
}

async fn toggle_column(
    Path(key): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Json<TableView> {
    let mut table = state.table();
    table.toggle_column(&key);
    Json(table.view())
}

async fn set_column_width(
    Path(key): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<WidthUpdate>,
) -> Json<TableView> {
    let mut table = state.table();
    table.set_column_width(&key, payload.width);
    Json(table.view())
}

async fn run_bulk_action(
    Path(label): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    if state.table().run_bulk_action(&label) {
        action_ok()
    } else {
        action_error(
            StatusCode::CONFLICT,
            format!("bulk action '{}' has nothing to run on", label),
        )
    }
}

async fn reset_filters(State(state): State<Arc<AppState>>) -> Json<TableView> {
    let mut table = state.table();
    table.reset_filters();
    Json(table.view())
}

async fn export_table(
    Path(format): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let format = match format.parse::<ExportFormat>() {
        Ok(format) => format,
        Err(message) => return action_error(StatusCode::BAD_REQUEST, message),
    };

    match state.table().export(format) {
        Ok(artifact) => (
            [
                (header::CONTENT_TYPE, artifact.content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", artifact.file_name),
                ),
            ],
            artifact.bytes,
        )
            .into_response(),
        Err(e @ ExportError::Empty) => action_error(StatusCode::CONFLICT, e.to_string()),
        Err(e @ ExportError::Disabled(_)) => action_error(StatusCode::FORBIDDEN, e.to_string()),
        Err(e) => {
            error!("export to {} failed: {}", format, e);
            action_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

fn action_ok() -> Response {
    Json(ActionResponse {
        status: "ok".to_string(),
        message: None,
    })
    .into_response()
}

fn action_error(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(ActionResponse {
            status: "error".to_string(),
            message: Some(message),
        }),
    )
        .into_response()
}
