pub mod booking;
pub mod contact_inquiry;
pub mod portfolio_category;
pub mod portfolio_item;
pub mod voucher;
