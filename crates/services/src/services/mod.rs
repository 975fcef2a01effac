pub mod bookings;
pub mod config;
pub mod contact;
pub mod email_templates;
pub mod form_store;
pub mod imagekit;
pub mod mailer;
pub mod media_browser;
pub mod portfolio_catalog;
pub mod portfolio_layout;
pub mod portfolio_store;
pub mod portfolio_sync;
pub mod portfolio_webhook;
pub mod rate_limiter;
pub mod vouchers;
