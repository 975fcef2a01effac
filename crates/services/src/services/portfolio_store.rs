//! Storage seam for the portfolio mirror.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use db::models::{
    portfolio_category::{NewCategory, PortfolioCategory},
    portfolio_item::{CategoryStats, GalleryFilter, GalleryRow, ItemPlacement, NewItem, PortfolioItem},
};
use sqlx::PgPool;
use uuid::Uuid;

/// Active row counts used by health reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MirrorCounts {
    pub categories: i64,
    pub items: i64,
    pub last_updated: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait PortfolioStore: Send + Sync {
    async fn categories(&self) -> Result<Vec<PortfolioCategory>, sqlx::Error>;
    async fn category_by_slug(&self, slug: &str) -> Result<Option<PortfolioCategory>, sqlx::Error>;
    async fn create_category(&self, data: &NewCategory) -> Result<PortfolioCategory, sqlx::Error>;
    async fn set_category_active(&self, id: Uuid, is_active: bool) -> Result<(), sqlx::Error>;

    async fn items(&self) -> Result<Vec<PortfolioItem>, sqlx::Error>;
    async fn item_by_file_id(&self, file_id: &str) -> Result<Option<PortfolioItem>, sqlx::Error>;
    async fn create_item(&self, data: &NewItem) -> Result<PortfolioItem, sqlx::Error>;
    async fn place_item(&self, id: Uuid, placement: &ItemPlacement) -> Result<(), sqlx::Error>;
    async fn set_item_active(&self, id: Uuid, is_active: bool) -> Result<(), sqlx::Error>;

    /// Recomputes `image_count` and `featured_image_url` from active items.
    async fn refresh_category_stats(&self, category_id: Uuid) -> Result<CategoryStats, sqlx::Error>;

    async fn counts(&self) -> Result<MirrorCounts, sqlx::Error>;

    async fn active_categories(&self) -> Result<Vec<PortfolioCategory>, sqlx::Error>;
    async fn has_subcategories(&self, category_slug: &str) -> Result<bool, sqlx::Error>;
    /// Distinct subcategory names of active items, sorted.
    async fn subcategory_names(&self, category_slug: &str) -> Result<Vec<String>, sqlx::Error>;
    async fn gallery(
        &self,
        category_slug: &str,
        filter: &GalleryFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<GalleryRow>, sqlx::Error>;
}

#[derive(Clone)]
pub struct PgPortfolioStore {
    pool: PgPool,
}

impl PgPortfolioStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PortfolioStore for PgPortfolioStore {
    async fn categories(&self) -> Result<Vec<PortfolioCategory>, sqlx::Error> {
        PortfolioCategory::find_all(&self.pool).await
    }

    async fn category_by_slug(&self, slug: &str) -> Result<Option<PortfolioCategory>, sqlx::Error> {
        PortfolioCategory::find_by_slug(&self.pool, slug).await
    }

    async fn create_category(&self, data: &NewCategory) -> Result<PortfolioCategory, sqlx::Error> {
        PortfolioCategory::create(&self.pool, data).await
    }

    async fn set_category_active(&self, id: Uuid, is_active: bool) -> Result<(), sqlx::Error> {
        PortfolioCategory::set_active(&self.pool, id, is_active).await
    }

    async fn items(&self) -> Result<Vec<PortfolioItem>, sqlx::Error> {
        PortfolioItem::find_all(&self.pool).await
    }

    async fn item_by_file_id(&self, file_id: &str) -> Result<Option<PortfolioItem>, sqlx::Error> {
        PortfolioItem::find_by_file_id(&self.pool, file_id).await
    }

    async fn create_item(&self, data: &NewItem) -> Result<PortfolioItem, sqlx::Error> {
        PortfolioItem::create(&self.pool, data).await
    }

    async fn place_item(&self, id: Uuid, placement: &ItemPlacement) -> Result<(), sqlx::Error> {
        PortfolioItem::update_placement(&self.pool, id, placement).await
    }

    async fn set_item_active(&self, id: Uuid, is_active: bool) -> Result<(), sqlx::Error> {
        PortfolioItem::set_active(&self.pool, id, is_active).await
    }

    async fn refresh_category_stats(&self, category_id: Uuid) -> Result<CategoryStats, sqlx::Error> {
        let stats = PortfolioItem::active_stats(&self.pool, category_id).await?;
        PortfolioCategory::update_stats(
            &self.pool,
            category_id,
            stats.image_count,
            stats.featured_image_url.as_deref(),
        )
        .await?;
        Ok(stats)
    }

    async fn counts(&self) -> Result<MirrorCounts, sqlx::Error> {
        Ok(MirrorCounts {
            categories: PortfolioCategory::count_active(&self.pool).await?,
            items: PortfolioItem::count_active(&self.pool).await?,
            last_updated: PortfolioItem::last_updated(&self.pool).await?,
        })
    }

    async fn active_categories(&self) -> Result<Vec<PortfolioCategory>, sqlx::Error> {
        PortfolioCategory::find_active(&self.pool).await
    }

    async fn has_subcategories(&self, category_slug: &str) -> Result<bool, sqlx::Error> {
        PortfolioItem::has_subcategories(&self.pool, category_slug).await
    }

    async fn subcategory_names(&self, category_slug: &str) -> Result<Vec<String>, sqlx::Error> {
        PortfolioItem::distinct_subcategories(&self.pool, category_slug).await
    }

    async fn gallery(
        &self,
        category_slug: &str,
        filter: &GalleryFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<GalleryRow>, sqlx::Error> {
        PortfolioItem::find_gallery(&self.pool, category_slug, filter, limit, offset).await
    }
}
