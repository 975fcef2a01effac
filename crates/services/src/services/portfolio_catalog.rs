//! Public read side of the portfolio mirror, cached in memory.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use db::models::{
    portfolio_category::PortfolioCategory,
    portfolio_item::{GalleryFilter, GalleryRow},
};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use ts_rs::TS;
use utils::text::looks_like_image_file;

use super::portfolio_store::PortfolioStore;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;
const MAX_CACHE_ENTRIES: u64 = 100;

#[derive(Debug, Error)]
pub enum PortfolioCatalogError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    /// The category slug.
    pub id: String,
    pub name: String,
    pub path: String,
    pub folder_name: String,
    pub image_count: i64,
    pub featured_image: Option<String>,
}

impl From<PortfolioCategory> for CategorySummary {
    fn from(category: PortfolioCategory) -> Self {
        Self {
            id: category.slug,
            folder_name: category.name.clone(),
            name: category.name,
            path: category.folder_path,
            image_count: category.image_count,
            featured_image: category.featured_image_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    pub thumbnail_url: String,
    pub full_url: String,
    pub alt: Option<String>,
    pub file_name: String,
    pub file_path: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub sort_order: i32,
}

impl From<GalleryRow> for GalleryImage {
    fn from(row: GalleryRow) -> Self {
        let file_path = row
            .metadata
            .get("file_path")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        Self {
            thumbnail_url: row.thumbnail_url,
            full_url: row.full_url,
            alt: row.alt_text,
            file_name: row.filename,
            file_path,
            category: row.category_name,
            subcategory: row.subcategory,
            sort_order: row.sort_order,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct Subfolder {
    pub id: String,
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CategoryGallery {
    pub images: Vec<GalleryImage>,
    pub subfolders: Option<Vec<Subfolder>>,
    pub category: String,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioStats {
    pub total_categories: i64,
    pub total_images: i64,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CatalogKey {
    Categories,
    Gallery {
        slug: String,
        subcategory: Option<String>,
        limit: i64,
        offset: i64,
    },
    Stats,
}

#[derive(Debug, Clone)]
enum CatalogEntry {
    Categories(Arc<Vec<CategorySummary>>),
    Gallery(Arc<CategoryGallery>),
    Stats(Arc<PortfolioStats>),
}

/// Picks the item filter for a gallery request. A requested subcategory always
/// wins; otherwise categories with subfolders show everything and flat
/// categories show their root-level images only.
pub fn gallery_filter(requested: Option<&str>, has_subfolders: bool) -> GalleryFilter {
    match requested {
        Some(name) => GalleryFilter::Subcategory(name.to_string()),
        None if has_subfolders => GalleryFilter::All,
        None => GalleryFilter::RootOnly,
    }
}

/// Distinct subcategory names that look like folders rather than stray file names.
pub fn visible_subfolders(category_slug: &str, names: Vec<String>) -> Vec<Subfolder> {
    let mut seen = std::collections::HashSet::new();
    names
        .into_iter()
        .filter(|name| !name.is_empty() && !looks_like_image_file(name))
        .filter(|name| seen.insert(name.clone()))
        .map(|name| Subfolder {
            path: format!("/{category_slug}/{name}"),
            id: name.clone(),
            name,
        })
        .collect()
}

pub fn clamp_page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

#[derive(Clone)]
pub struct PortfolioCatalog {
    store: Arc<dyn PortfolioStore>,
    cache: Cache<CatalogKey, CatalogEntry>,
}

impl PortfolioCatalog {
    pub fn new(store: Arc<dyn PortfolioStore>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_CACHE_ENTRIES)
            .time_to_live(ttl)
            .build();
        Self { store, cache }
    }

    pub async fn categories(&self) -> Result<Arc<Vec<CategorySummary>>, PortfolioCatalogError> {
        if let Some(CatalogEntry::Categories(hit)) = self.cache.get(&CatalogKey::Categories).await {
            debug!("Returning cached categories");
            return Ok(hit);
        }

        let categories: Vec<CategorySummary> = self
            .store
            .active_categories()
            .await?
            .into_iter()
            .map(CategorySummary::from)
            .collect();
        let categories = Arc::new(categories);
        self.cache
            .insert(CatalogKey::Categories, CatalogEntry::Categories(categories.clone()))
            .await;
        Ok(categories)
    }

    pub async fn category_gallery(
        &self,
        slug: &str,
        subcategory: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Arc<CategoryGallery>, PortfolioCatalogError> {
        let key = CatalogKey::Gallery {
            slug: slug.to_string(),
            subcategory: subcategory.map(str::to_string),
            limit,
            offset,
        };
        if let Some(CatalogEntry::Gallery(hit)) = self.cache.get(&key).await {
            debug!(category = slug, "Returning cached gallery");
            return Ok(hit);
        }

        let has_subfolders = self.store.has_subcategories(slug).await?;
        let filter = gallery_filter(subcategory, has_subfolders);
        let images: Vec<GalleryImage> = self
            .store
            .gallery(slug, &filter, limit, offset)
            .await?
            .into_iter()
            .map(GalleryImage::from)
            .collect();

        let subfolders = visible_subfolders(slug, self.store.subcategory_names(slug).await?);

        debug!(
            category = slug,
            images = images.len(),
            subfolders = subfolders.len(),
            "Loaded gallery"
        );

        let gallery = Arc::new(CategoryGallery {
            total: images.len(),
            images,
            subfolders: (!subfolders.is_empty()).then_some(subfolders),
            category: slug.to_string(),
        });
        self.cache
            .insert(key, CatalogEntry::Gallery(gallery.clone()))
            .await;
        Ok(gallery)
    }

    pub async fn stats(&self) -> Result<Arc<PortfolioStats>, PortfolioCatalogError> {
        if let Some(CatalogEntry::Stats(hit)) = self.cache.get(&CatalogKey::Stats).await {
            return Ok(hit);
        }

        let counts = self.store.counts().await?;
        let stats = Arc::new(PortfolioStats {
            total_categories: counts.categories,
            total_images: counts.items,
            last_updated: counts.last_updated,
        });
        self.cache
            .insert(CatalogKey::Stats, CatalogEntry::Stats(stats.clone()))
            .await;
        Ok(stats)
    }

    /// Drops every cached response; called after the mirror changes.
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }
}
