use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use ts_rs::TS;
use uuid::Uuid;

/// A portfolio gallery, mirroring one folder below the portfolio root.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct PortfolioCategory {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub folder_path: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub image_count: i64,
    pub featured_image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub folder_path: String,
    pub sort_order: i32,
}

const CATEGORY_COLUMNS: &str = r#"id, name, slug, folder_path, description, sort_order, image_count,
    featured_image_url, is_active, created_at, updated_at"#;

impl PortfolioCategory {
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, PortfolioCategory>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM portfolio_categories ORDER BY sort_order ASC, name ASC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_active(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, PortfolioCategory>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM portfolio_categories
             WHERE is_active = TRUE
             ORDER BY sort_order ASC, name ASC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PortfolioCategory>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM portfolio_categories WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &PgPool, data: &NewCategory) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, PortfolioCategory>(&format!(
            "INSERT INTO portfolio_categories (name, slug, folder_path, sort_order)
             VALUES ($1, $2, $3, $4)
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(&data.name)
        .bind(&data.slug)
        .bind(&data.folder_path)
        .bind(data.sort_order)
        .fetch_one(pool)
        .await
    }

    pub async fn set_active(pool: &PgPool, id: Uuid, is_active: bool) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE portfolio_categories SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn update_stats(
        pool: &PgPool,
        id: Uuid,
        image_count: i64,
        featured_image_url: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"UPDATE portfolio_categories
               SET image_count = $2,
                   featured_image_url = $3
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(image_count)
        .bind(featured_image_url)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn count_active(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM portfolio_categories WHERE is_active = TRUE")
            .fetch_one(pool)
            .await
    }
}
