//! Writes the TypeScript declarations shared with the front end.

use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use ts_rs::TS;

#[derive(Debug, Parser)]
struct Args {
    #[arg(long, default_value = "shared/types.ts")]
    output: PathBuf,
}

fn declarations() -> Vec<String> {
    use db::models::{
        booking::{Booking, BookingStatus},
        contact_inquiry::{ContactInquiry, InquiryStatus},
        voucher::{Voucher, VoucherStatus, VoucherType},
    };
    use services::services::{
        bookings::{BookingCreated, CreateBooking, UpdateBookingStatus},
        contact::{
            ContactForm, ContactReceipt, InquiryListQuery, InquiryPage, Pagination, UpdateInquiry,
        },
        media_browser::{BrowserImage, FolderImages, FolderSummary},
        portfolio_catalog::{
            CategoryGallery, CategorySummary, GalleryImage, PortfolioStats, Subfolder,
        },
        portfolio_sync::{SyncAction, SyncHealth, SyncPreview, SyncReport},
        portfolio_webhook::WebhookOutcome,
        vouchers::{CreateVoucher, VoucherCreated},
    };

    vec![
        BookingStatus::decl(),
        Booking::decl(),
        CreateBooking::decl(),
        BookingCreated::decl(),
        UpdateBookingStatus::decl(),
        InquiryStatus::decl(),
        ContactInquiry::decl(),
        ContactForm::decl(),
        ContactReceipt::decl(),
        InquiryListQuery::decl(),
        Pagination::decl(),
        InquiryPage::decl(),
        UpdateInquiry::decl(),
        VoucherType::decl(),
        VoucherStatus::decl(),
        Voucher::decl(),
        CreateVoucher::decl(),
        VoucherCreated::decl(),
        CategorySummary::decl(),
        GalleryImage::decl(),
        Subfolder::decl(),
        CategoryGallery::decl(),
        PortfolioStats::decl(),
        SyncAction::decl(),
        SyncReport::decl(),
        SyncPreview::decl(),
        SyncHealth::decl(),
        WebhookOutcome::decl(),
        FolderSummary::decl(),
        BrowserImage::decl(),
        FolderImages::decl(),
    ]
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut out = String::from("// This file was generated by `generate-types`. Do not edit.\n\n");
    for decl in declarations() {
        out.push_str("export ");
        out.push_str(&decl);
        out.push_str("\n\n");
    }

    if let Some(parent) = args.output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&args.output, out.trim_end().to_string() + "\n")
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!("Wrote {}", args.output.display());
    Ok(())
}
