use super::{AppError, AppState};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use improve_types::{HealthStatus, ImproveRequest, ImproveResult};
use tracing::info;

/// Always healthy; engines are not contacted.
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus { ok: true })
}

pub async fn improve(
    State(state): State<AppState>,
    payload: Result<Json<Option<ImproveRequest>>, JsonRejection>,
) -> Result<Json<ImproveResult>, AppError> {
    // A `null` body carries no content rather than being malformed
    let Json(request) = payload?;
    let content = request
        .as_ref()
        .and_then(ImproveRequest::content)
        .ok_or(AppError::MissingContent)?;

    let improvement = state.improver.improve(content).await?;
    info!(
        engine = improvement.engine,
        format = %improvement.format,
        "Improved content"
    );

    Ok(Json(ImproveResult {
        suggestion: improvement.suggestion,
    }))
}
