use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use services::services::portfolio_sync::{SyncHealth, SyncPreview, SyncReport};
use utils::response::ApiResponse;

use crate::{error::ApiError, extract::SyncAuth, state::AppState};

/// GET /api/portfolio/sync/health
pub async fn sync_health(
    State(state): State<AppState>,
    _auth: SyncAuth,
) -> ResponseJson<ApiResponse<SyncHealth>> {
    let health = state.sync.health().await;
    if health.database && health.imagekit {
        ResponseJson(ApiResponse::success(health))
    } else {
        ResponseJson(ApiResponse::error_with_data(health, "Portfolio sync is degraded"))
    }
}

/// GET /api/portfolio/sync/preview
pub async fn sync_preview(
    State(state): State<AppState>,
    _auth: SyncAuth,
) -> Result<ResponseJson<ApiResponse<SyncPreview>>, ApiError> {
    let preview = state.sync.preview().await?;
    Ok(ResponseJson(ApiResponse::success(preview)))
}

/// POST /api/portfolio/sync
///
/// A run with per-action failures still answers 200, with `success: false`
/// and the report attached.
pub async fn run_sync(
    State(state): State<AppState>,
    _auth: SyncAuth,
) -> Result<ResponseJson<ApiResponse<SyncReport>>, ApiError> {
    let report = state.sync.run().await?;
    if report.is_clean() {
        let message = format!("Portfolio sync applied {} changes", report.changes());
        Ok(ResponseJson(ApiResponse::success_with_message(report, message)))
    } else {
        let message = format!("Portfolio sync finished with {} errors", report.errors.len());
        Ok(ResponseJson(ApiResponse::error_with_data(report, message)))
    }
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/portfolio/sync", post(run_sync))
        .route("/portfolio/sync/health", get(sync_health))
        .route("/portfolio/sync/preview", get(sync_preview))
}
