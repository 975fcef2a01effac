use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "inquiry_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InquiryStatus {
    #[default]
    New,
    Read,
    Responded,
    Archived,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ContactInquiry {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub session_type: String,
    pub message: Option<String>,
    pub status: InquiryStatus,
    pub admin_notes: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewContactInquiry {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub session_type: String,
    pub message: Option<String>,
}

/// Admin-side changes; `None` fields keep their stored value.
#[derive(Debug, Clone)]
pub struct InquiryUpdate {
    pub status: InquiryStatus,
    pub admin_notes: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
}

const INQUIRY_COLUMNS: &str = r#"id, first_name, last_name, email, mobile, session_type, message,
    status, admin_notes, responded_at, created_at, updated_at"#;

impl ContactInquiry {
    pub async fn create(pool: &PgPool, data: &NewContactInquiry) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ContactInquiry>(&format!(
            "INSERT INTO contact_inquiries (first_name, last_name, email, mobile, session_type, message)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {INQUIRY_COLUMNS}"
        ))
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.email)
        .bind(&data.mobile)
        .bind(&data.session_type)
        .bind(&data.message)
        .fetch_one(pool)
        .await
    }

    /// Newest first; `status = None` means every status.
    pub async fn find_page(
        pool: &PgPool,
        status: Option<InquiryStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ContactInquiry>(&format!(
            "SELECT {INQUIRY_COLUMNS} FROM contact_inquiries
             WHERE ($1::inquiry_status IS NULL OR status = $1)
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &PgPool, status: Option<InquiryStatus>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM contact_inquiries WHERE ($1::inquiry_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: &InquiryUpdate,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ContactInquiry>(&format!(
            "UPDATE contact_inquiries
             SET status = $2,
                 admin_notes = COALESCE($3, admin_notes),
                 responded_at = COALESCE($4, responded_at)
             WHERE id = $1
             RETURNING {INQUIRY_COLUMNS}"
        ))
        .bind(id)
        .bind(data.status)
        .bind(&data.admin_notes)
        .bind(data.responded_at)
        .fetch_optional(pool)
        .await
    }
}
