use axum::{extract::State, Json};
use std::sync::Arc;

use super::AppState;

/// Health check endpoint
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "indexes": state.client.index_names().collect::<Vec<_>>(),
        "build_profile": if cfg!(debug_assertions) { "debug" } else { "release" },
    }))
}
