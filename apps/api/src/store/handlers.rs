//! Axum route handlers for stored applications.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::ApplicationRecord;
use crate::state::AppState;
use crate::store::ApplicationStore;

#[derive(Debug, Serialize)]
pub struct ApplicationListResponse {
    pub applications: Vec<ApplicationRecord>,
    pub storage_enabled: bool,
}

fn require_store(state: &AppState) -> Result<&ApplicationStore, AppError> {
    state
        .store
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Application storage is disabled".to_string()))
}

/// GET /applications
///
/// Stored application metadata, newest first. Empty when storage is disabled.
pub async fn handle_list_applications(
    State(state): State<AppState>,
) -> Result<Json<ApplicationListResponse>, AppError> {
    let Some(store) = state.store.as_ref() else {
        return Ok(Json(ApplicationListResponse {
            applications: Vec::new(),
            storage_enabled: false,
        }));
    };

    Ok(Json(ApplicationListResponse {
        applications: store.list().await?,
        storage_enabled: true,
    }))
}

/// GET /download/:application_id/cover-letter
pub async fn handle_download_cover_letter(
    State(state): State<AppState>,
    Path(application_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let letter = require_store(&state)?.load_letter(&application_id).await?;
    let disposition = format!(
        "attachment; filename=\"cover_letter_{}.txt\"",
        application_id.trim()
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        letter,
    ))
}

/// DELETE /applications/:application_id
pub async fn handle_delete_application(
    State(state): State<AppState>,
    Path(application_id): Path<String>,
) -> Result<StatusCode, AppError> {
    require_store(&state)?.delete(&application_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
