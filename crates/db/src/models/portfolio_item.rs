use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use ts_rs::TS;
use uuid::Uuid;

/// One image in the portfolio mirror, keyed by its image-host file id.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct PortfolioItem {
    pub id: Uuid,
    pub category_id: Uuid,
    pub subcategory: Option<String>,
    pub filename: String,
    pub imagekit_file_id: String,
    pub imagekit_url: String,
    pub thumbnail_url: String,
    pub full_url: String,
    pub alt_text: Option<String>,
    pub sort_order: i32,
    #[ts(type = "Record<string, unknown>")]
    pub metadata: serde_json::Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PortfolioItem {
    /// Path of the file on the image host, as recorded at sync time.
    pub fn file_path(&self) -> Option<&str> {
        self.metadata.get("file_path").and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct NewItem {
    pub category_id: Uuid,
    pub subcategory: Option<String>,
    pub filename: String,
    pub imagekit_file_id: String,
    pub imagekit_url: String,
    pub thumbnail_url: String,
    pub full_url: String,
    pub alt_text: Option<String>,
    pub sort_order: i32,
    pub metadata: serde_json::Value,
}

/// Where an existing item lives, how it is served and whether it is visible.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemPlacement {
    pub category_id: Uuid,
    pub subcategory: Option<String>,
    pub filename: String,
    pub imagekit_url: String,
    pub thumbnail_url: String,
    pub full_url: String,
    pub is_active: bool,
    pub metadata: serde_json::Value,
}

/// Item row joined with its category, as rendered by the gallery.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct GalleryRow {
    pub filename: String,
    pub thumbnail_url: String,
    pub full_url: String,
    pub alt_text: Option<String>,
    pub subcategory: Option<String>,
    pub sort_order: i32,
    #[ts(type = "Record<string, unknown>")]
    pub metadata: serde_json::Value,
    pub category_name: String,
}

/// Which items of a category a gallery request should see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryFilter {
    All,
    RootOnly,
    Subcategory(String),
}

impl GalleryFilter {
    /// Whether an item with this subcategory belongs in the filtered gallery.
    pub fn admits(&self, subcategory: Option<&str>) -> bool {
        match self {
            GalleryFilter::All => true,
            GalleryFilter::RootOnly => subcategory.is_none(),
            GalleryFilter::Subcategory(name) => subcategory == Some(name.as_str()),
        }
    }
}

/// Active image count and the thumbnail of the first item by sort order.
#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct CategoryStats {
    pub image_count: i64,
    pub featured_image_url: Option<String>,
}

fn gallery_query<'a>(
    category_slug: &'a str,
    filter: &'a GalleryFilter,
    limit: i64,
    offset: i64,
) -> QueryBuilder<'a, Postgres> {
    let mut query = QueryBuilder::<Postgres>::new(
        r#"SELECT i.filename, i.thumbnail_url, i.full_url, i.alt_text, i.subcategory,
                  i.sort_order, i.metadata, c.name AS category_name
           FROM portfolio_items i
           JOIN portfolio_categories c ON c.id = i.category_id
           WHERE i.is_active = TRUE AND c.slug = "#,
    );
    query.push_bind(category_slug);

    match filter {
        GalleryFilter::All => {}
        GalleryFilter::RootOnly => {
            query.push(" AND i.subcategory IS NULL");
        }
        GalleryFilter::Subcategory(name) => {
            query.push(" AND i.subcategory = ").push_bind(name.as_str());
        }
    }

    query
        .push(" ORDER BY i.sort_order ASC, i.created_at ASC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    query
}

const ITEM_COLUMNS: &str = r#"id, category_id, subcategory, filename, imagekit_file_id, imagekit_url,
    thumbnail_url, full_url, alt_text, sort_order, metadata, is_active, created_at, updated_at"#;

impl PortfolioItem {
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, PortfolioItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM portfolio_items ORDER BY category_id, sort_order"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_file_id(
        pool: &PgPool,
        imagekit_file_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PortfolioItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM portfolio_items WHERE imagekit_file_id = $1"
        ))
        .bind(imagekit_file_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &PgPool, data: &NewItem) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, PortfolioItem>(&format!(
            "INSERT INTO portfolio_items (
                category_id, subcategory, filename, imagekit_file_id, imagekit_url,
                thumbnail_url, full_url, alt_text, sort_order, metadata
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(data.category_id)
        .bind(&data.subcategory)
        .bind(&data.filename)
        .bind(&data.imagekit_file_id)
        .bind(&data.imagekit_url)
        .bind(&data.thumbnail_url)
        .bind(&data.full_url)
        .bind(&data.alt_text)
        .bind(data.sort_order)
        .bind(&data.metadata)
        .fetch_one(pool)
        .await
    }

    pub async fn update_placement(
        pool: &PgPool,
        id: Uuid,
        placement: &ItemPlacement,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"UPDATE portfolio_items
               SET category_id = $2,
                   subcategory = $3,
                   filename = $4,
                   imagekit_url = $5,
                   thumbnail_url = $6,
                   full_url = $7,
                   is_active = $8,
                   metadata = $9
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(placement.category_id)
        .bind(&placement.subcategory)
        .bind(&placement.filename)
        .bind(&placement.imagekit_url)
        .bind(&placement.thumbnail_url)
        .bind(&placement.full_url)
        .bind(placement.is_active)
        .bind(&placement.metadata)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn set_active(pool: &PgPool, id: Uuid, is_active: bool) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE portfolio_items SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn active_stats(pool: &PgPool, category_id: Uuid) -> Result<CategoryStats, sqlx::Error> {
        sqlx::query_as::<_, CategoryStats>(
            r#"SELECT
                 (SELECT COUNT(*) FROM portfolio_items
                   WHERE category_id = $1 AND is_active = TRUE) AS image_count,
                 (SELECT thumbnail_url FROM portfolio_items
                   WHERE category_id = $1 AND is_active = TRUE
                   ORDER BY sort_order ASC, created_at ASC
                   LIMIT 1) AS featured_image_url"#,
        )
        .bind(category_id)
        .fetch_one(pool)
        .await
    }

    pub async fn has_subcategories(pool: &PgPool, category_slug: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"SELECT EXISTS (
                 SELECT 1 FROM portfolio_items i
                 JOIN portfolio_categories c ON c.id = i.category_id
                 WHERE c.slug = $1 AND i.is_active = TRUE AND i.subcategory IS NOT NULL
               )"#,
        )
        .bind(category_slug)
        .fetch_one(pool)
        .await
    }

    pub async fn distinct_subcategories(
        pool: &PgPool,
        category_slug: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            r#"SELECT DISTINCT i.subcategory
               FROM portfolio_items i
               JOIN portfolio_categories c ON c.id = i.category_id
               WHERE c.slug = $1 AND i.is_active = TRUE AND i.subcategory IS NOT NULL
               ORDER BY i.subcategory"#,
        )
        .bind(category_slug)
        .fetch_all(pool)
        .await
    }

    pub async fn find_gallery(
        pool: &PgPool,
        category_slug: &str,
        filter: &GalleryFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<GalleryRow>, sqlx::Error> {
        let mut query = gallery_query(category_slug, filter, limit, offset);
        query.build_query_as::<GalleryRow>().fetch_all(pool).await
    }

    pub async fn count_active(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM portfolio_items WHERE is_active = TRUE")
            .fetch_one(pool)
            .await
    }

    pub async fn last_updated(pool: &PgPool) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
        sqlx::query_scalar("SELECT MAX(updated_at) FROM portfolio_items")
            .fetch_one(pool)
            .await
    }
}
