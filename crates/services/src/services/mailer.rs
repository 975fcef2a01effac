//! Transactional email over SendGrid or Resend.

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{info, warn};

use super::config::{EmailConfig, EmailProvider};

const SENDGRID_URL: &str = "https://api.sendgrid.com/v3/mail/send";
const RESEND_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Clone, Error)]
pub enum MailerError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("email provider rejected the api key")]
    Unauthorized,
}

impl MailerError {
    /// Returns true if the error is transient and should be retried.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::RateLimited => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub reply_to: Option<String>,
}

/// Who mail is sent from and where admin notifications go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailIdentity {
    pub from_email: String,
    pub admin_email: String,
    pub studio_name: String,
}

enum Transport {
    SendGrid(SecretString),
    Resend(SecretString),
    Log,
}

pub struct Mailer {
    http: Client,
    transport: Transport,
    identity: MailIdentity,
}

impl Mailer {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

    pub fn from_config(config: &EmailConfig) -> Result<Self, MailerError> {
        let key = |k: &Option<SecretString>| {
            k.as_ref()
                .map(|s| SecretString::from(s.expose_secret().to_string()))
        };
        let transport = match config.provider {
            EmailProvider::SendGrid => key(&config.sendgrid_api_key).map(Transport::SendGrid),
            EmailProvider::Resend => key(&config.resend_api_key).map(Transport::Resend),
            EmailProvider::Log => None,
        }
        .unwrap_or(Transport::Log);

        Self::with_transport(transport, MailIdentity {
            from_email: config.from_email.clone(),
            admin_email: config.admin_email.clone(),
            studio_name: config.studio_name.clone(),
        })
    }

    /// A mailer that only logs what it would send.
    pub fn log_only(identity: MailIdentity) -> Result<Self, MailerError> {
        Self::with_transport(Transport::Log, identity)
    }

    fn with_transport(transport: Transport, identity: MailIdentity) -> Result<Self, MailerError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("studio-backend/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MailerError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            transport,
            identity,
        })
    }

    pub fn identity(&self) -> &MailIdentity {
        &self.identity
    }

    pub fn provider_name(&self) -> &'static str {
        match self.transport {
            Transport::SendGrid(_) => "sendgrid",
            Transport::Resend(_) => "resend",
            Transport::Log => "log",
        }
    }

    pub async fn send(&self, email: &OutgoingEmail) -> Result<(), MailerError> {
        let (url, api_key, body) = match &self.transport {
            Transport::SendGrid(key) => (SENDGRID_URL, key, sendgrid_body(&self.identity, email)),
            Transport::Resend(key) => (RESEND_URL, key, resend_body(&self.identity, email)),
            Transport::Log => {
                info!(to = %email.to, subject = %email.subject, "Email (log transport)");
                return Ok(());
            }
        };

        (|| async { self.post(url, api_key, &body).await })
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(500))
                    .with_max_delay(Duration::from_secs(10))
                    .with_max_times(3)
                    .with_jitter(),
            )
            .when(|e: &MailerError| e.should_retry())
            .notify(|e, dur| {
                warn!(
                    "Email send failed, retrying after {:.2}s: {}",
                    dur.as_secs_f64(),
                    e
                )
            })
            .await?;

        info!(to = %email.to, subject = %email.subject, provider = self.provider_name(), "Email sent");
        Ok(())
    }

    async fn post(&self, url: &str, api_key: &SecretString, body: &Value) -> Result<(), MailerError> {
        let res = self
            .http
            .post(url)
            .bearer_auth(api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(MailerError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => Err(MailerError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(MailerError::Http { status, body })
            }
        }
    }
}

fn sendgrid_body(identity: &MailIdentity, email: &OutgoingEmail) -> Value {
    let mut body = json!({
        "personalizations": [{ "to": [{ "email": email.to }] }],
        "from": { "email": identity.from_email, "name": identity.studio_name },
        "subject": email.subject,
        "content": [{ "type": "text/html", "value": email.html }],
    });
    if let Some(reply_to) = &email.reply_to {
        body["reply_to"] = json!({ "email": reply_to });
    }
    body
}

fn resend_body(identity: &MailIdentity, email: &OutgoingEmail) -> Value {
    let mut body = json!({
        "from": format!("{} <{}>", identity.studio_name, identity.from_email),
        "to": [email.to],
        "subject": email.subject,
        "html": email.html,
    });
    if let Some(reply_to) = &email.reply_to {
        body["reply_to"] = json!(reply_to);
    }
    body
}

fn map_reqwest_error(e: reqwest::Error) -> MailerError {
    if e.is_timeout() {
        MailerError::Timeout
    } else {
        MailerError::Transport(e.to_string())
    }
}
