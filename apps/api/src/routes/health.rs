use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns a status object with service version and enabled features.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "jobapp-api",
        "cached_pages": state.fetcher.cache().len(),
        "enhanced_generation": state.polisher.is_some(),
        "storage_enabled": state.store.is_some(),
    }))
}
