//! Gift and sponsorship voucher orders.

use std::sync::Arc;

use chrono::{Duration, Utc};
use db::models::voucher::{NewVoucher, Voucher, VoucherStatus, VoucherType};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};
use ts_rs::TS;
use utils::validation::{is_valid_email, missing_fields, non_blank};
use uuid::Uuid;

use super::{
    email_templates::voucher_purchaser_confirmation, form_store::VoucherStore, mailer::Mailer,
};

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LENGTH: usize = 12;
const MAX_CODE_ATTEMPTS: usize = 10;
const VALIDITY_DAYS: i64 = 365;

/// Price for packages missing from the table, in cents.
const DEFAULT_PRICE_CENTS: i64 = 250_000;

const PACKAGE_PRICES: &[(&str, i64)] = &[
    ("Family Portrait Session", 250_000),
    ("Wedding Photography", 1_500_000),
    ("Lifestyle Photography", 350_000),
    ("NGO Storytelling", 200_000),
    ("Brand Photography", 400_000),
];

#[derive(Debug, Error)]
pub enum VoucherError {
    #[error("{0}")]
    Validation(String),
    #[error("voucher {0} not found")]
    NotFound(String),
    #[error("Failed to generate unique voucher code")]
    CodeExhausted,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateVoucher {
    pub package_type: Option<String>,
    /// `gift` or `sponsorship`.
    pub voucher_type: Option<String>,
    pub purchaser_name: Option<String>,
    pub purchaser_email: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub personal_message: Option<String>,
    pub organization_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct VoucherCreated {
    pub id: Uuid,
    pub voucher_code: String,
    pub package_type: String,
    pub voucher_type: VoucherType,
    pub status: VoucherStatus,
}

impl From<&Voucher> for VoucherCreated {
    fn from(v: &Voucher) -> Self {
        Self {
            id: v.id,
            voucher_code: v.voucher_code.clone(),
            package_type: v.package_type.clone(),
            voucher_type: v.voucher_type,
            status: v.status,
        }
    }
}

/// Package display name and price in cents.
pub fn package_price(package_type: &str) -> (String, i64) {
    PACKAGE_PRICES
        .iter()
        .find(|(name, _)| *name == package_type)
        .map(|(name, cents)| (name.to_string(), *cents))
        .unwrap_or_else(|| (package_type.to_string(), DEFAULT_PRICE_CENTS))
}

pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Validated order, waiting for a code and an expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoucherOrder {
    pub package_type: String,
    pub voucher_type: VoucherType,
    pub purchaser_name: String,
    pub purchaser_email: String,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub message: Option<String>,
}

pub fn validate_voucher(req: CreateVoucher) -> Result<VoucherOrder, VoucherError> {
    let missing = missing_fields(&[
        ("packageType", req.package_type.as_deref()),
        ("voucherType", req.voucher_type.as_deref()),
        ("purchaserName", req.purchaser_name.as_deref()),
        ("purchaserEmail", req.purchaser_email.as_deref()),
    ]);
    if !missing.is_empty() {
        return Err(VoucherError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let raw_type = req.voucher_type.unwrap_or_default();
    let voucher_type = raw_type
        .trim()
        .parse::<VoucherType>()
        .map_err(|_| VoucherError::Validation(format!("Unknown voucher type: {raw_type}")))?;

    let purchaser_email = req.purchaser_email.unwrap_or_default().trim().to_string();
    if !is_valid_email(&purchaser_email) {
        return Err(VoucherError::Validation("Invalid purchaser email format".into()));
    }

    let (recipient_name, recipient_email) = match voucher_type {
        VoucherType::Gift => {
            let name = non_blank(req.recipient_name);
            let email = non_blank(req.recipient_email);
            let (Some(name), Some(email)) = (name, email) else {
                return Err(VoucherError::Validation(
                    "Gift vouchers require recipientName and recipientEmail".into(),
                ));
            };
            if !is_valid_email(&email) {
                return Err(VoucherError::Validation("Invalid recipient email format".into()));
            }
            (Some(name), Some(email))
        }
        VoucherType::Sponsorship => {
            let Some(organization) = non_blank(req.organization_name) else {
                return Err(VoucherError::Validation(
                    "Sponsorship vouchers require organizationName".into(),
                ));
            };
            (Some(organization), None)
        }
    };

    Ok(VoucherOrder {
        package_type: req.package_type.unwrap_or_default().trim().to_string(),
        voucher_type,
        purchaser_name: req.purchaser_name.unwrap_or_default().trim().to_string(),
        purchaser_email,
        recipient_name,
        recipient_email,
        message: non_blank(req.personal_message),
    })
}

/// Draws codes from `next` until one is free, giving up after
/// `MAX_CODE_ATTEMPTS` collisions.
async fn pick_unused_code(
    store: &dyn VoucherStore,
    mut next: impl FnMut() -> String,
) -> Result<String, VoucherError> {
    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let code = next();
        if !store.code_exists(&code).await? {
            return Ok(code);
        }
        warn!(attempt, "Voucher code collision");
    }
    Err(VoucherError::CodeExhausted)
}

#[derive(Clone)]
pub struct VoucherService {
    store: Arc<dyn VoucherStore>,
    mailer: Arc<Mailer>,
}

impl VoucherService {
    pub fn new(store: Arc<dyn VoucherStore>, mailer: Arc<Mailer>) -> Self {
        Self { store, mailer }
    }

    pub async fn create(&self, req: CreateVoucher, ip: Option<String>) -> Result<Voucher, VoucherError> {
        let order = validate_voucher(req)?;
        let voucher_code = pick_unused_code(self.store.as_ref(), generate_code).await?;
        let (package_name, amount_cents) = package_price(&order.package_type);

        let voucher = self
            .store
            .create_voucher(&NewVoucher {
                voucher_code,
                package_type: order.package_type,
                package_name,
                amount_cents,
                voucher_type: order.voucher_type,
                purchaser_name: order.purchaser_name,
                purchaser_email: order.purchaser_email,
                recipient_name: order.recipient_name,
                recipient_email: order.recipient_email,
                message: order.message,
                ip_address: ip,
                expires_at: Utc::now() + Duration::days(VALIDITY_DAYS),
            })
            .await?;

        info!(
            voucher_code = %voucher.voucher_code,
            voucher_type = %voucher.voucher_type,
            package = %voucher.package_type,
            "Voucher created"
        );
        self.send_confirmation_in_background(voucher.clone());
        Ok(voucher)
    }

    fn send_confirmation_in_background(&self, voucher: Voucher) {
        let mailer = self.mailer.clone();
        tokio::spawn(async move {
            let email = voucher_purchaser_confirmation(mailer.identity(), &voucher);
            if let Err(e) = mailer.send(&email).await {
                error!(voucher_code = %voucher.voucher_code, "Voucher confirmation email failed: {}", e);
            }
        });
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Voucher, VoucherError> {
        let code = code.trim().to_uppercase();
        self.store
            .voucher_by_code(&code)
            .await?
            .ok_or(VoucherError::NotFound(code))
    }
}
