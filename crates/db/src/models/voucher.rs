use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display)]
#[sqlx(type_name = "voucher_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VoucherType {
    Gift,
    Sponsorship,
}

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "voucher_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VoucherStatus {
    #[default]
    PendingPayment,
    Paid,
    Redeemed,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Voucher {
    pub id: Uuid,
    pub voucher_code: String,
    pub package_type: String,
    pub package_name: String,
    pub amount_cents: i64,
    pub voucher_type: VoucherType,
    pub purchaser_name: String,
    pub purchaser_email: String,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub message: Option<String>,
    pub status: VoucherStatus,
    pub ip_address: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewVoucher {
    pub voucher_code: String,
    pub package_type: String,
    pub package_name: String,
    pub amount_cents: i64,
    pub voucher_type: VoucherType,
    pub purchaser_name: String,
    pub purchaser_email: String,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub message: Option<String>,
    pub ip_address: Option<String>,
    pub expires_at: DateTime<Utc>,
}

const VOUCHER_COLUMNS: &str = r#"id, voucher_code, package_type, package_name, amount_cents, voucher_type,
    purchaser_name, purchaser_email, recipient_name, recipient_email, message, status, ip_address,
    expires_at, created_at, updated_at"#;

impl Voucher {
    pub async fn code_exists(pool: &PgPool, code: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM vouchers WHERE voucher_code = $1)")
            .bind(code)
            .fetch_one(pool)
            .await
    }

    pub async fn create(pool: &PgPool, data: &NewVoucher) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Voucher>(&format!(
            "INSERT INTO vouchers (
                voucher_code, package_type, package_name, amount_cents, voucher_type,
                purchaser_name, purchaser_email, recipient_name, recipient_email, message,
                ip_address, expires_at
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {VOUCHER_COLUMNS}"
        ))
        .bind(&data.voucher_code)
        .bind(&data.package_type)
        .bind(&data.package_name)
        .bind(data.amount_cents)
        .bind(data.voucher_type)
        .bind(&data.purchaser_name)
        .bind(&data.purchaser_email)
        .bind(&data.recipient_name)
        .bind(&data.recipient_email)
        .bind(&data.message)
        .bind(&data.ip_address)
        .bind(data.expires_at)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Voucher>(&format!(
            "SELECT {VOUCHER_COLUMNS} FROM vouchers WHERE voucher_code = $1"
        ))
        .bind(code)
        .fetch_optional(pool)
        .await
    }
}
