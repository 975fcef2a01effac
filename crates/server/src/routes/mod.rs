use axum::Router;

use crate::state::AppState;

pub mod bookings;
pub mod contact;
pub mod contact_inquiries;
pub mod health;
pub mod imagekit_webhook;
pub mod media;
pub mod portfolio;
pub mod portfolio_sync;
pub mod vouchers;

/// Every endpoint, relative to `/api`.
pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router(state))
        .merge(bookings::router(state))
        .merge(contact::router(state))
        .merge(contact_inquiries::router(state))
        .merge(vouchers::router(state))
        .merge(portfolio::router(state))
        .merge(portfolio_sync::router(state))
        .merge(imagekit_webhook::router(state))
        .merge(media::router(state))
}
