use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use serde::Deserialize;
use services::services::media_browser::{FolderImages, FolderSummary};
use utils::response::ApiResponse;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct FolderQuery {
    pub subfolder: Option<String>,
}

/// GET /api/media/folders
pub async fn list_folders(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<FolderSummary>>>, ApiError> {
    let folders = state.media.folders().await?;
    Ok(ResponseJson(ApiResponse::success(folders)))
}

/// GET /api/media/folders/{folder}?subfolder=
pub async fn folder_images(
    State(state): State<AppState>,
    Path(folder): Path<String>,
    Query(query): Query<FolderQuery>,
) -> Result<ResponseJson<ApiResponse<FolderImages>>, ApiError> {
    let subfolder = query.subfolder.as_deref().filter(|s| !s.trim().is_empty());
    let images = state.media.folder_images(&folder, subfolder).await?;
    Ok(ResponseJson(ApiResponse::success(images)))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/media/folders", get(list_folders))
        .route("/media/folders/{folder}", get(folder_images))
}
