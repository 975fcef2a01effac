//! Contact form submissions and the admin inquiry inbox.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use db::models::contact_inquiry::{
    ContactInquiry, InquiryStatus, InquiryUpdate, NewContactInquiry,
};
use futures::future::try_join;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};
use ts_rs::TS;
use utils::validation::{is_valid_email, missing_fields, non_blank};
use uuid::Uuid;

use super::{
    email_templates::{ContactDetails, contact_admin_notification, contact_auto_reply},
    form_store::InquiryStore,
    mailer::{Mailer, MailerError},
};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("{0}")]
    Validation(String),
    #[error("inquiry {0} not found")]
    NotFound(Uuid),
    #[error("failed to send message: {0}")]
    Email(#[from] MailerError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub session_type: Option<String>,
    pub message: Option<String>,
}

/// Human label for the session type keys the site sends.
pub fn session_label(session_type: &str) -> String {
    match session_type {
        "family" => "Family Portrait Session",
        "wedding" => "Wedding Photography",
        "lifestyle" => "Lifestyle Photography",
        "ngo" => "NGO Storytelling",
        "branding" => "Brand Photography",
        "other" => "Other",
        other => other,
    }
    .to_string()
}

pub fn validate_contact(form: ContactForm) -> Result<NewContactInquiry, ContactError> {
    let missing = missing_fields(&[
        ("firstName", form.first_name.as_deref()),
        ("lastName", form.last_name.as_deref()),
        ("email", form.email.as_deref()),
        ("mobile", form.mobile.as_deref()),
        ("sessionType", form.session_type.as_deref()),
    ]);
    if !missing.is_empty() {
        return Err(ContactError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let email = form.email.unwrap_or_default().trim().to_string();
    if !is_valid_email(&email) {
        return Err(ContactError::Validation("Invalid email format".into()));
    }

    Ok(NewContactInquiry {
        first_name: form.first_name.unwrap_or_default().trim().to_string(),
        last_name: form.last_name.unwrap_or_default().trim().to_string(),
        email,
        mobile: form.mobile.unwrap_or_default().trim().to_string(),
        session_type: form.session_type.unwrap_or_default().trim().to_string(),
        message: non_blank(form.message),
    })
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ContactReceipt {
    /// Absent when the inquiry could not be stored but the emails went out.
    pub inquiry_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct InquiryListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// A status name or `all`.
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            page,
            limit,
            total,
            pages: (total + limit - 1) / limit,
        }
    }

    /// Saturates for absurd page numbers; the query then returns no rows.
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct InquiryPage {
    pub inquiries: Vec<ContactInquiry>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct UpdateInquiry {
    pub id: Option<Uuid>,
    pub status: Option<InquiryStatus>,
    pub admin_notes: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
}

fn parse_status_filter(raw: Option<&str>) -> Result<Option<InquiryStatus>, ContactError> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(s) => s
            .parse::<InquiryStatus>()
            .map(Some)
            .map_err(|_| ContactError::Validation(format!("Unknown status: {s}"))),
    }
}

/// A `responded` status without an explicit time is stamped with `now`.
fn inquiry_update(
    status: InquiryStatus,
    admin_notes: Option<String>,
    responded_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> InquiryUpdate {
    let responded_at = match (status, responded_at) {
        (InquiryStatus::Responded, None) => Some(now),
        (_, at) => at,
    };
    InquiryUpdate {
        status,
        admin_notes,
        responded_at,
    }
}

#[derive(Clone)]
pub struct ContactService {
    store: Arc<dyn InquiryStore>,
    mailer: Arc<Mailer>,
}

impl ContactService {
    pub fn new(store: Arc<dyn InquiryStore>, mailer: Arc<Mailer>) -> Self {
        Self { store, mailer }
    }

    pub async fn submit(&self, form: ContactForm) -> Result<ContactReceipt, ContactError> {
        let data = validate_contact(form)?;
        info!(session_type = %data.session_type, "Processing contact form submission");

        let inquiry_id = match self.store.create_inquiry(&data).await {
            Ok(inquiry) => Some(inquiry.id),
            Err(e) => {
                error!("Failed to store contact inquiry, sending emails anyway: {}", e);
                None
            }
        };

        let details = ContactDetails {
            session_label: session_label(&data.session_type),
            first_name: data.first_name,
            last_name: data.last_name,
            email: data.email,
            mobile: data.mobile,
            message: data.message,
        };
        let identity = self.mailer.identity();
        let admin = contact_admin_notification(identity, &details);
        let reply = contact_auto_reply(identity, &details);
        try_join(self.mailer.send(&admin), self.mailer.send(&reply)).await?;

        info!(inquiry_id = ?inquiry_id, "Contact emails sent");
        Ok(ContactReceipt { inquiry_id })
    }

    pub async fn list(&self, query: &InquiryListQuery) -> Result<InquiryPage, ContactError> {
        let status = parse_status_filter(query.status.as_deref())?;
        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        let total = self.store.count_inquiries(status).await?;
        let pagination = Pagination::new(page, limit, total);
        let inquiries = self
            .store
            .inquiry_page(status, limit, pagination.offset())
            .await?;

        Ok(InquiryPage {
            inquiries,
            pagination,
        })
    }

    pub async fn update(&self, req: UpdateInquiry) -> Result<ContactInquiry, ContactError> {
        let (Some(id), Some(status)) = (req.id, req.status) else {
            return Err(ContactError::Validation(
                "Missing required fields: id and status".into(),
            ));
        };

        let update = inquiry_update(status, non_blank(req.admin_notes), req.responded_at, Utc::now());
        let inquiry = self
            .store
            .update_inquiry(id, &update)
            .await?
            .ok_or(ContactError::NotFound(id))?;
        info!(inquiry_id = %id, status = %status, "Contact inquiry updated");
        Ok(inquiry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{form_store::memory::MemoryFormStore, mailer::MailIdentity};

    fn service(store: &Arc<MemoryFormStore>) -> ContactService {
        let mailer = Mailer::log_only(MailIdentity {
            from_email: "studio@example.com".into(),
            admin_email: "admin@example.com".into(),
            studio_name: "Studio".into(),
        })
        .unwrap();
        ContactService::new(store.clone(), Arc::new(mailer))
    }

    fn form() -> ContactForm {
        ContactForm {
            first_name: Some("Sam".into()),
            last_name: Some("Lee".into()),
            email: Some(" sam@example.com ".into()),
            mobile: Some("0820000000".into()),
            session_type: Some("family".into()),
            message: Some("".into()),
        }
    }

    #[test]
    fn labels_known_session_types() {
        assert_eq!(session_label("ngo"), "NGO Storytelling");
        assert_eq!(session_label("branding"), "Brand Photography");
        assert_eq!(session_label("boudoir"), "boudoir");
    }

    #[test]
    fn validates_required_fields_and_email() {
        let row = validate_contact(form()).unwrap();
        assert_eq!(row.email, "sam@example.com");
        assert_eq!(row.message, None);

        let err = validate_contact(ContactForm {
            mobile: None,
            session_type: Some(" ".into()),
            ..form()
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: mobile, sessionType");

        let err = validate_contact(ContactForm {
            email: Some("sam at example".into()),
            ..form()
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid email format");
    }

    #[test]
    fn pagination_rounds_pages_up() {
        let p = Pagination::new(3, 20, 41);
        assert_eq!(p.pages, 3);
        assert_eq!(p.offset(), 40);
        assert_eq!(Pagination::new(1, 20, 0).pages, 0);
    }

    #[test]
    fn huge_page_numbers_do_not_overflow() {
        let p = Pagination::new(i64::MAX, 20, 3);
        assert_eq!(p.offset(), i64::MAX);
        assert_eq!(p.pages, 1);
    }

    #[test]
    fn status_filter_accepts_all() {
        assert_eq!(parse_status_filter(None).unwrap(), None);
        assert_eq!(parse_status_filter(Some("all")).unwrap(), None);
        assert_eq!(
            parse_status_filter(Some("responded")).unwrap(),
            Some(InquiryStatus::Responded)
        );
        assert!(parse_status_filter(Some("spam")).is_err());
    }

    #[test]
    fn responded_without_timestamp_is_stamped() {
        let now = Utc::now();
        let update = inquiry_update(InquiryStatus::Responded, None, None, now);
        assert_eq!(update.responded_at, Some(now));

        let earlier = now - chrono::Duration::hours(2);
        let update = inquiry_update(InquiryStatus::Responded, None, Some(earlier), now);
        assert_eq!(update.responded_at, Some(earlier));

        let update = inquiry_update(InquiryStatus::Read, Some("called back".into()), None, now);
        assert_eq!(update.responded_at, None);
    }

    #[tokio::test]
    async fn submit_stores_the_inquiry() {
        let store = Arc::new(MemoryFormStore::new());
        let receipt = service(&store).submit(form()).await.unwrap();
        assert!(receipt.inquiry_id.is_some());
        assert_eq!(store.inquiry_count(), 1);
    }

    #[tokio::test]
    async fn submit_still_succeeds_when_the_inquiry_cannot_be_stored() {
        let store = Arc::new(MemoryFormStore::new());
        store.fail_inquiry_inserts();

        let receipt = service(&store).submit(form()).await.unwrap();
        assert_eq!(receipt.inquiry_id, None);
        assert_eq!(store.inquiry_count(), 0);
    }

    #[tokio::test]
    async fn list_filters_and_pages_newest_first() {
        let store = Arc::new(MemoryFormStore::new());
        let contact = service(&store);
        for _ in 0..3 {
            contact.submit(form()).await.unwrap();
        }
        let first = contact.list(&InquiryListQuery::default()).await.unwrap();
        contact
            .update(UpdateInquiry {
                id: Some(first.inquiries[0].id),
                status: Some(InquiryStatus::Responded),
                admin_notes: None,
                responded_at: None,
            })
            .await
            .unwrap();

        let page = contact
            .list(&InquiryListQuery {
                page: Some(2),
                limit: Some(2),
                status: Some("all".into()),
            })
            .await
            .unwrap();
        assert_eq!(page.pagination, Pagination::new(2, 2, 3));
        assert_eq!(page.inquiries.len(), 1);

        let responded = contact
            .list(&InquiryListQuery {
                status: Some("responded".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(responded.pagination.total, 1);
        assert!(responded.inquiries[0].responded_at.is_some());

        let far_page = contact
            .list(&InquiryListQuery {
                page: Some(i64::MAX),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(far_page.inquiries.is_empty());
    }

    #[tokio::test]
    async fn update_requires_id_and_status() {
        let store = Arc::new(MemoryFormStore::new());
        let err = service(&store)
            .update(UpdateInquiry {
                id: None,
                status: Some(InquiryStatus::Read),
                admin_notes: None,
                responded_at: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: id and status");

        let missing = Uuid::new_v4();
        let err = service(&store)
            .update(UpdateInquiry {
                id: Some(missing),
                status: Some(InquiryStatus::Read),
                admin_notes: None,
                responded_at: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ContactError::NotFound(id) if id == missing));
    }
}
