mod static_files;
mod ws;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::{CatalogListing, SpaceCatalog};
use crate::engine::Engine;

/// Shared server state: the engine behind its single mutex, plus the
/// read-only bits the HTTP side serves directly.
pub struct AppState {
    pub engine: Mutex<Engine>,
    pub catalog: Arc<SpaceCatalog>,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(engine: Engine, catalog: Arc<SpaceCatalog>, static_dir: PathBuf) -> Self {
        Self {
            engine: Mutex::new(engine),
            catalog,
            static_dir,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(health))
        .route("/spaces", get(spaces))
        .fallback(get(static_files::spa_fallback))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    active_spaces: usize,
    total_participants: usize,
    connected_clients: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let stats = state.engine.lock().await.stats();
    Json(HealthResponse {
        status: "healthy",
        active_spaces: stats.active_spaces,
        total_participants: stats.total_participants,
        connected_clients: stats.connected_clients,
    })
}

async fn spaces(State(state): State<Arc<AppState>>) -> Json<CatalogListing> {
    Json(state.catalog.listing())
}
