use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use serde::{Deserialize, Serialize};
use services::services::portfolio_catalog::{
    CategoryGallery, CategorySummary, PortfolioStats, clamp_page,
};
use utils::response::ApiResponse;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Default, Deserialize)]
pub struct PortfolioQuery {
    pub action: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PortfolioResponse {
    Categories { categories: Vec<CategorySummary> },
    Stats { stats: PortfolioStats },
    Gallery(CategoryGallery),
}

/// GET /api/portfolio
///
/// `action=categories` and `action=stats` win over `category`; with neither
/// the category list is returned.
pub async fn get_portfolio(
    State(state): State<AppState>,
    Query(query): Query<PortfolioQuery>,
) -> Result<ResponseJson<ApiResponse<PortfolioResponse>>, ApiError> {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let response = match (query.action.as_deref(), category) {
        (Some("stats"), _) => PortfolioResponse::Stats {
            stats: Arc::unwrap_or_clone(state.catalog.stats().await?),
        },
        (Some("categories"), _) | (_, None) => PortfolioResponse::Categories {
            categories: Arc::unwrap_or_clone(state.catalog.categories().await?),
        },
        (_, Some(slug)) => {
            let (limit, offset) = clamp_page(query.limit, query.offset);
            let gallery = state
                .catalog
                .category_gallery(slug, query.subcategory.as_deref(), limit, offset)
                .await?;
            PortfolioResponse::Gallery(Arc::unwrap_or_clone(gallery))
        }
    };

    Ok(ResponseJson(ApiResponse::success(response)))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().route("/portfolio", get(get_portfolio))
}
