//! Session booking requests.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use db::models::booking::{Booking, BookingStatus, NewBooking};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};
use ts_rs::TS;
use utils::validation::{is_valid_email, missing_fields, non_blank};

use super::{
    email_templates::{booking_admin_notification, booking_customer_confirmation},
    form_store::BookingStore,
    mailer::Mailer,
};

/// Same email and package inside this many hours counts as a duplicate.
const DUPLICATE_WINDOW_HOURS: i32 = 24;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),
    #[error("A booking with this email and package already exists within the last 24 hours.")]
    Duplicate,
    #[error("booking {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateBooking {
    pub selected_package: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// `YYYY-MM-DD`.
    pub event_date: Option<String>,
    pub additional_notes: Option<String>,
    pub submitted_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct BookingCreated {
    pub booking_id: String,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct UpdateBookingStatus {
    pub status: BookingStatus,
}

fn parse_event_date(raw: &str) -> Result<NaiveDate, BookingError> {
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| BookingError::Validation(format!("Invalid event date: {raw}")))
}

/// Checks required fields and formats and builds the row to insert.
pub fn validate_booking(payload: CreateBooking, ip: Option<String>) -> Result<NewBooking, BookingError> {
    let missing = missing_fields(&[
        ("selectedPackage", payload.selected_package.as_deref()),
        ("firstName", payload.first_name.as_deref()),
        ("lastName", payload.last_name.as_deref()),
        ("email", payload.email.as_deref()),
        ("phone", payload.phone.as_deref()),
    ]);
    if !missing.is_empty() {
        return Err(BookingError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let email = payload.email.unwrap_or_default().trim().to_string();
    if !is_valid_email(&email) {
        return Err(BookingError::Validation("Invalid email format".into()));
    }

    let event_date = non_blank(payload.event_date)
        .map(|raw| parse_event_date(&raw))
        .transpose()?;
    let submitted_at = non_blank(payload.submitted_at)
        .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    Ok(NewBooking {
        selected_package: payload.selected_package.unwrap_or_default().trim().to_string(),
        first_name: payload.first_name.unwrap_or_default().trim().to_string(),
        last_name: payload.last_name.unwrap_or_default().trim().to_string(),
        email,
        phone: payload.phone.unwrap_or_default().trim().to_string(),
        event_date,
        additional_notes: non_blank(payload.additional_notes),
        submitted_at: Some(submitted_at),
        ip_address: ip,
    })
}

#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn BookingStore>,
    mailer: Arc<Mailer>,
}

impl BookingService {
    pub fn new(store: Arc<dyn BookingStore>, mailer: Arc<Mailer>) -> Self {
        Self { store, mailer }
    }

    pub async fn create(&self, payload: CreateBooking, ip: Option<String>) -> Result<Booking, BookingError> {
        let data = validate_booking(payload, ip)?;

        if self
            .store
            .exists_recent(&data.email, &data.selected_package, DUPLICATE_WINDOW_HOURS)
            .await?
        {
            return Err(BookingError::Duplicate);
        }

        let booking = self.store.create_booking(&data).await?;
        info!(
            booking_id = booking.id,
            package = %booking.selected_package,
            "New booking received"
        );

        self.send_emails_in_background(booking.clone());
        Ok(booking)
    }

    /// Email failures are logged; the booking is already stored.
    fn send_emails_in_background(&self, booking: Booking) {
        let mailer = self.mailer.clone();
        tokio::spawn(async move {
            let identity = mailer.identity();
            let emails = [
                booking_admin_notification(identity, &booking),
                booking_customer_confirmation(identity, &booking),
            ];
            for email in &emails {
                if let Err(e) = mailer.send(email).await {
                    error!(booking_id = booking.id, to = %email.to, "Booking email failed: {}", e);
                }
            }
        });
    }

    pub async fn list(&self) -> Result<Vec<Booking>, BookingError> {
        Ok(self.store.bookings().await?)
    }

    pub async fn update_status(&self, id: i64, status: BookingStatus) -> Result<Booking, BookingError> {
        let booking = self
            .store
            .set_booking_status(id, status)
            .await?
            .ok_or(BookingError::NotFound(id))?;
        info!(booking_id = id, status = %status, "Booking status updated");
        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{form_store::memory::MemoryFormStore, mailer::MailIdentity};

    fn service(store: &Arc<MemoryFormStore>) -> BookingService {
        let mailer = Mailer::log_only(MailIdentity {
            from_email: "studio@example.com".into(),
            admin_email: "admin@example.com".into(),
            studio_name: "Studio".into(),
        })
        .unwrap();
        BookingService::new(store.clone(), Arc::new(mailer))
    }

    fn payload() -> CreateBooking {
        CreateBooking {
            selected_package: Some("Wedding Photography".into()),
            first_name: Some(" Jane ".into()),
            last_name: Some("Doe".into()),
            email: Some("jane@example.com".into()),
            phone: Some("0820000000".into()),
            event_date: Some("2026-03-14".into()),
            additional_notes: Some("   ".into()),
            submitted_at: Some("2025-11-01T10:00:00Z".into()),
        }
    }

    #[test]
    fn valid_payload_becomes_a_row() {
        let row = validate_booking(payload(), Some("1.2.3.4".into())).unwrap();
        assert_eq!(row.first_name, "Jane");
        assert_eq!(row.event_date, NaiveDate::from_ymd_opt(2026, 3, 14));
        assert_eq!(row.additional_notes, None);
        assert_eq!(
            row.submitted_at.unwrap().to_rfc3339(),
            "2025-11-01T10:00:00+00:00"
        );
        assert_eq!(row.ip_address.as_deref(), Some("1.2.3.4"));
    }

    #[test]
    fn missing_fields_are_listed_in_order() {
        let err = validate_booking(
            CreateBooking {
                first_name: Some("".into()),
                phone: None,
                ..payload()
            },
            None,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: firstName, phone");
    }

    #[test]
    fn bad_email_and_date_are_rejected() {
        let err = validate_booking(
            CreateBooking {
                email: Some("jane@example".into()),
                ..payload()
            },
            None,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid email format");

        let err = validate_booking(
            CreateBooking {
                event_date: Some("next tuesday".into()),
                ..payload()
            },
            None,
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[test]
    fn iso_timestamps_are_accepted_as_event_dates() {
        let row = validate_booking(
            CreateBooking {
                event_date: Some("2026-03-14T00:00:00.000Z".into()),
                ..payload()
            },
            None,
        )
        .unwrap();
        assert_eq!(row.event_date, NaiveDate::from_ymd_opt(2026, 3, 14));
    }

    #[test]
    fn status_payload_uses_lowercase_names() {
        let update: UpdateBookingStatus = serde_json::from_str(r#"{"status":"confirmed"}"#).unwrap();
        assert_eq!(update.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn same_email_and_package_within_a_day_is_a_duplicate() {
        let store = Arc::new(MemoryFormStore::new());
        let bookings = service(&store);

        let first = bookings.create(payload(), None).await.unwrap();
        assert_eq!(first.status, BookingStatus::Pending);

        let err = bookings.create(payload(), None).await.unwrap_err();
        assert!(matches!(err, BookingError::Duplicate));
        assert_eq!(store.booking_count(), 1);

        let other_package = CreateBooking {
            selected_package: Some("Family Portrait Session".into()),
            ..payload()
        };
        bookings.create(other_package, None).await.unwrap();
        assert_eq!(store.booking_count(), 2);
    }

    #[tokio::test]
    async fn bookings_older_than_a_day_do_not_block() {
        let store = Arc::new(MemoryFormStore::new());
        let bookings = service(&store);

        bookings.create(payload(), None).await.unwrap();
        store.age_bookings(25);
        bookings.create(payload(), None).await.unwrap();
        assert_eq!(store.booking_count(), 2);
    }

    #[tokio::test]
    async fn status_update_on_unknown_booking_is_not_found() {
        let store = Arc::new(MemoryFormStore::new());
        let bookings = service(&store);

        let booking = bookings.create(payload(), None).await.unwrap();
        let updated = bookings
            .update_status(booking.id, BookingStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(updated.status, BookingStatus::Confirmed);

        let err = bookings
            .update_status(999, BookingStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::NotFound(999)));
    }
}
