//! Axum route handlers for generation and job previews.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::extraction::extract_job_posting;
use crate::generation::generator::generate_application;
use crate::models::{GeneratedApplication, GenerationRequest, JobPosting};
use crate::state::AppState;
use crate::validation::validate_request;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct JobPreviewResponse {
    pub job_details: JobPosting,
    pub from_cache: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /generate-application
///
/// Validates the whole request before any network access, then runs
/// fetch → extract → match → generate.
pub async fn handle_generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<GeneratedApplication>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::invalid("body", e.body_text()))?;
    let validated = validate_request(request)?;

    let application = generate_application(
        &state.fetcher,
        state.polisher.as_deref(),
        state.store.as_ref(),
        validated,
    )
    .await?;

    Ok(Json(application))
}

/// GET /job-preview?url=...
///
/// Fetches and extracts a posting without generating anything. Shares the
/// page cache with generation.
pub async fn handle_job_preview(
    State(state): State<AppState>,
    query: Result<Query<PreviewQuery>, QueryRejection>,
) -> Result<Json<JobPreviewResponse>, AppError> {
    let Query(query) = query.map_err(|e| AppError::invalid("url", e.body_text()))?;

    let page = state.fetcher.fetch(&query.url).await?;
    let job_details = extract_job_posting(&page.html, page.url.as_str());
    info!(
        "Previewed {} (cached page: {})",
        job_details.source_url, page.from_cache
    );

    Ok(Json(JobPreviewResponse {
        job_details,
        from_cache: page.from_cache,
    }))
}
