use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Booking {
    pub id: i64,
    pub selected_package: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub event_date: Option<NaiveDate>,
    pub additional_notes: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub ip_address: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub selected_package: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub event_date: Option<NaiveDate>,
    pub additional_notes: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub ip_address: Option<String>,
}

const BOOKING_COLUMNS: &str = r#"id, selected_package, first_name, last_name, email, phone, event_date,
    additional_notes, submitted_at, ip_address, status, created_at, updated_at"#;

impl Booking {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whether the same email already requested the same package within `hours`.
    pub async fn exists_recent(
        pool: &PgPool,
        email: &str,
        selected_package: &str,
        hours: i32,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"SELECT EXISTS (
                 SELECT 1 FROM bookings
                 WHERE email = $1
                   AND selected_package = $2
                   AND created_at > NOW() - make_interval(hours => $3)
               )"#,
        )
        .bind(email)
        .bind(selected_package)
        .bind(hours)
        .fetch_one(pool)
        .await
    }

    pub async fn create(pool: &PgPool, data: &NewBooking) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            "INSERT INTO bookings (
                selected_package, first_name, last_name, email, phone,
                event_date, additional_notes, submitted_at, ip_address
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(&data.selected_package)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(data.event_date)
        .bind(&data.additional_notes)
        .bind(data.submitted_at)
        .bind(&data.ip_address)
        .fetch_one(pool)
        .await
    }

    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn update_status(
        pool: &PgPool,
        id: i64,
        status: BookingStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            "UPDATE bookings SET status = $2 WHERE id = $1 RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await
    }
}
