//! Storage seams for the public forms: bookings, contact inquiries and vouchers.

use async_trait::async_trait;
use db::models::{
    booking::{Booking, BookingStatus, NewBooking},
    contact_inquiry::{ContactInquiry, InquiryStatus, InquiryUpdate, NewContactInquiry},
    voucher::{NewVoucher, Voucher},
};
use sqlx::PgPool;
use uuid::Uuid;

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Whether the same email already requested the same package within `hours`.
    async fn exists_recent(&self, email: &str, package: &str, hours: i32) -> Result<bool, sqlx::Error>;
    async fn create_booking(&self, data: &NewBooking) -> Result<Booking, sqlx::Error>;
    async fn bookings(&self) -> Result<Vec<Booking>, sqlx::Error>;
    async fn set_booking_status(
        &self,
        id: i64,
        status: BookingStatus,
    ) -> Result<Option<Booking>, sqlx::Error>;
}

#[async_trait]
pub trait InquiryStore: Send + Sync {
    async fn create_inquiry(&self, data: &NewContactInquiry) -> Result<ContactInquiry, sqlx::Error>;
    async fn count_inquiries(&self, status: Option<InquiryStatus>) -> Result<i64, sqlx::Error>;
    async fn inquiry_page(
        &self,
        status: Option<InquiryStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ContactInquiry>, sqlx::Error>;
    async fn update_inquiry(
        &self,
        id: Uuid,
        data: &InquiryUpdate,
    ) -> Result<Option<ContactInquiry>, sqlx::Error>;
}

#[async_trait]
pub trait VoucherStore: Send + Sync {
    async fn code_exists(&self, code: &str) -> Result<bool, sqlx::Error>;
    async fn create_voucher(&self, data: &NewVoucher) -> Result<Voucher, sqlx::Error>;
    async fn voucher_by_code(&self, code: &str) -> Result<Option<Voucher>, sqlx::Error>;
}

#[derive(Clone)]
pub struct PgFormStore {
    pool: PgPool,
}

impl PgFormStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for PgFormStore {
    async fn exists_recent(&self, email: &str, package: &str, hours: i32) -> Result<bool, sqlx::Error> {
        Booking::exists_recent(&self.pool, email, package, hours).await
    }

    async fn create_booking(&self, data: &NewBooking) -> Result<Booking, sqlx::Error> {
        Booking::create(&self.pool, data).await
    }

    async fn bookings(&self) -> Result<Vec<Booking>, sqlx::Error> {
        Booking::find_all(&self.pool).await
    }

    async fn set_booking_status(
        &self,
        id: i64,
        status: BookingStatus,
    ) -> Result<Option<Booking>, sqlx::Error> {
        Booking::update_status(&self.pool, id, status).await
    }
}

#[async_trait]
impl InquiryStore for PgFormStore {
    async fn create_inquiry(&self, data: &NewContactInquiry) -> Result<ContactInquiry, sqlx::Error> {
        ContactInquiry::create(&self.pool, data).await
    }

    async fn count_inquiries(&self, status: Option<InquiryStatus>) -> Result<i64, sqlx::Error> {
        ContactInquiry::count(&self.pool, status).await
    }

    async fn inquiry_page(
        &self,
        status: Option<InquiryStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ContactInquiry>, sqlx::Error> {
        ContactInquiry::find_page(&self.pool, status, limit, offset).await
    }

    async fn update_inquiry(
        &self,
        id: Uuid,
        data: &InquiryUpdate,
    ) -> Result<Option<ContactInquiry>, sqlx::Error> {
        ContactInquiry::update(&self.pool, id, data).await
    }
}

#[async_trait]
impl VoucherStore for PgFormStore {
    async fn code_exists(&self, code: &str) -> Result<bool, sqlx::Error> {
        Voucher::code_exists(&self.pool, code).await
    }

    async fn create_voucher(&self, data: &NewVoucher) -> Result<Voucher, sqlx::Error> {
        Voucher::create(&self.pool, data).await
    }

    async fn voucher_by_code(&self, code: &str) -> Result<Option<Voucher>, sqlx::Error> {
        Voucher::find_by_code(&self.pool, code).await
    }
}
