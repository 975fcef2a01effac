//! HTML bodies for the transactional emails. Every user-supplied value is escaped.

use db::models::{booking::Booking, voucher::Voucher};
use utils::text::escape_html;

use super::mailer::{MailIdentity, OutgoingEmail};

/// Contact form fields as submitted, with the session type already labelled.
#[derive(Debug, Clone)]
pub struct ContactDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub session_label: String,
    pub message: Option<String>,
}

fn layout(heading: &str, body: &str, studio_name: &str) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #333;">{heading}</h2>
  {body}
  <hr style="margin: 30px 0; border: none; border-top: 1px solid #eee;">
  <p style="color: #666; font-size: 12px;">{studio}<br>Photography &amp; Visual Storytelling</p>
</div>"#,
        studio = escape_html(studio_name),
    )
}

fn row(label: &str, value: &str) -> String {
    format!("<p><strong>{label}:</strong> {}</p>", escape_html(value))
}

fn panel(inner: &str) -> String {
    format!(
        r#"<div style="background: #f9f9f9; padding: 20px; border-radius: 8px; margin: 20px 0;">{inner}</div>"#
    )
}

pub fn booking_admin_notification(identity: &MailIdentity, booking: &Booking) -> OutgoingEmail {
    let mut details = String::new();
    details.push_str(&row("Name", &booking.full_name()));
    details.push_str(&row("Email", &booking.email));
    details.push_str(&row("Phone", &booking.phone));
    details.push_str(&row("Package", &booking.selected_package));
    if let Some(date) = booking.event_date {
        details.push_str(&row("Preferred Date", &date.format("%Y-%m-%d").to_string()));
    }
    if let Some(notes) = &booking.additional_notes {
        details.push_str(&row("Additional Notes", notes));
    }

    let body = format!(
        "{}<p style=\"color: #666; font-size: 14px;\">Submitted: {}<br>Remember to respond within 24-48 hours.</p>",
        panel(&details),
        booking.created_at.format("%Y-%m-%d %H:%M UTC"),
    );

    OutgoingEmail {
        to: identity.admin_email.clone(),
        subject: format!(
            "New Booking Request #{} - {}",
            booking.id, booking.selected_package
        ),
        html: layout(
            &format!("New Booking Request #{}", booking.id),
            &body,
            &identity.studio_name,
        ),
        reply_to: Some(booking.email.clone()),
    }
}

pub fn booking_customer_confirmation(identity: &MailIdentity, booking: &Booking) -> OutgoingEmail {
    let mut summary = row("Package", &booking.selected_package);
    if let Some(date) = booking.event_date {
        summary.push_str(&row("Preferred Date", &date.format("%Y-%m-%d").to_string()));
    }
    summary.push_str(&row("Reference", &format!("#{}", booking.id)));

    let body = format!(
        "<p>Hi {name},</p>\
         <p>I've received your booking request for <strong>{package}</strong>.</p>\
         {next}{summary}<p>Looking forward to capturing your story!</p>",
        name = escape_html(&booking.first_name),
        package = escape_html(&booking.selected_package),
        next = panel(
            "<h3 style=\"color: #666; margin-top: 0;\">What happens next?</h3>\
             <ul><li>I'll get back to you within 24-48 hours</li>\
             <li>We'll discuss your vision and session details</li>\
             <li>I'll send you a detailed quote and next steps</li></ul>"
        ),
        summary = panel(&summary),
    );

    OutgoingEmail {
        to: booking.email.clone(),
        subject: format!("Booking Request Received - {}", identity.studio_name),
        html: layout(
            "Thank you for your booking request!",
            &body,
            &identity.studio_name,
        ),
        reply_to: Some(identity.admin_email.clone()),
    }
}

pub fn contact_admin_notification(identity: &MailIdentity, contact: &ContactDetails) -> OutgoingEmail {
    let mut details = String::new();
    details.push_str(&row(
        "Name",
        &format!("{} {}", contact.first_name, contact.last_name),
    ));
    details.push_str(&row("Email", &contact.email));
    details.push_str(&row("Mobile", &contact.mobile));
    details.push_str(&row("Session Type", &contact.session_label));
    if let Some(message) = &contact.message {
        details.push_str(&row("Message", message));
    }

    OutgoingEmail {
        to: identity.admin_email.clone(),
        subject: format!("New Contact Form Inquiry - {}", contact.session_label),
        html: layout("New Contact Inquiry", &panel(&details), &identity.studio_name),
        reply_to: Some(contact.email.clone()),
    }
}

pub fn contact_auto_reply(identity: &MailIdentity, contact: &ContactDetails) -> OutgoingEmail {
    let body = format!(
        "<p>Hi {name},</p>\
         <p>Thank you for reaching out about <strong>{session}</strong>! \
         I'm excited to learn more about your vision.</p>\
         <p>I'll get back to you within 24-48 hours.</p>",
        name = escape_html(&contact.first_name),
        session = escape_html(&contact.session_label),
    );

    OutgoingEmail {
        to: contact.email.clone(),
        subject: format!("Thank you for your inquiry - {}", identity.studio_name),
        html: layout("Thank you for getting in touch!", &body, &identity.studio_name),
        reply_to: Some(identity.admin_email.clone()),
    }
}

/// Formats cents as `R 2,500.00`.
pub fn format_amount(cents: i64) -> String {
    let units = cents / 100;
    let digits = units.abs().to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if cents < 0 { "-" } else { "" };
    format!("R {sign}{grouped}.{:02}", (cents % 100).abs())
}

pub fn voucher_purchaser_confirmation(identity: &MailIdentity, voucher: &Voucher) -> OutgoingEmail {
    let mut details = String::new();
    details.push_str(&row("Voucher Code", &voucher.voucher_code));
    details.push_str(&row("Package", &voucher.package_name));
    details.push_str(&row("Amount", &format_amount(voucher.amount_cents)));
    if let Some(recipient) = &voucher.recipient_name {
        details.push_str(&row("For", recipient));
    }
    details.push_str(&row(
        "Valid Until",
        &voucher.expires_at.format("%Y-%m-%d").to_string(),
    ));

    let body = format!(
        "<p>Hi {name},</p>\
         <p>Thank you for your voucher order. It will be activated once payment is received.</p>{details}",
        name = escape_html(&voucher.purchaser_name),
        details = panel(&details),
    );

    OutgoingEmail {
        to: voucher.purchaser_email.clone(),
        subject: format!("Your {} voucher - {}", voucher.package_name, identity.studio_name),
        html: layout("Voucher order received", &body, &identity.studio_name),
        reply_to: Some(identity.admin_email.clone()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use db::models::booking::BookingStatus;

    use super::*;

    fn identity() -> MailIdentity {
        MailIdentity {
            from_email: "hello@studio.test".into(),
            admin_email: "admin@studio.test".into(),
            studio_name: "Studio".into(),
        }
    }

    fn booking() -> Booking {
        let now = Utc::now();
        Booking {
            id: 42,
            selected_package: "Wedding Photography".into(),
            first_name: "<script>".into(),
            last_name: "Doe".into(),
            email: "jane@example.com".into(),
            phone: "+27 82 000 0000".into(),
            event_date: NaiveDate::from_ymd_opt(2026, 3, 14),
            additional_notes: Some("Sunset & beach".into()),
            submitted_at: None,
            ip_address: None,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn booking_emails_escape_user_input() {
        let admin = booking_admin_notification(&identity(), &booking());
        assert_eq!(admin.to, "admin@studio.test");
        assert_eq!(admin.subject, "New Booking Request #42 - Wedding Photography");
        assert!(admin.html.contains("&lt;script&gt; Doe"));
        assert!(admin.html.contains("Sunset &amp; beach"));
        assert!(admin.html.contains("2026-03-14"));
        assert!(!admin.html.contains("<script>"));

        let customer = booking_customer_confirmation(&identity(), &booking());
        assert_eq!(customer.to, "jane@example.com");
        assert!(customer.html.contains("#42"));
    }

    #[test]
    fn contact_emails_use_the_session_label() {
        let contact = ContactDetails {
            first_name: "Sam".into(),
            last_name: "Lee".into(),
            email: "sam@example.com".into(),
            mobile: "0820000000".into(),
            session_label: "Family Portrait Session".into(),
            message: None,
        };
        let admin = contact_admin_notification(&identity(), &contact);
        assert_eq!(admin.subject, "New Contact Form Inquiry - Family Portrait Session");
        assert_eq!(admin.reply_to.as_deref(), Some("sam@example.com"));

        let reply = contact_auto_reply(&identity(), &contact);
        assert_eq!(reply.to, "sam@example.com");
        assert!(reply.html.contains("Family Portrait Session"));
    }

    #[test]
    fn amounts_are_grouped() {
        assert_eq!(format_amount(250_000), "R 2,500.00");
        assert_eq!(format_amount(1_500_000), "R 15,000.00");
        assert_eq!(format_amount(99), "R 0.99");
    }
}
