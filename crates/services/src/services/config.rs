//! Process configuration read once from the environment.

use std::{str::FromStr, time::Duration};

use secrecy::SecretString;
use strum_macros::{Display, EnumString};
use thiserror::Error;

const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "https://www.kristinmathilde.com",
    "https://kristinmathilde.com",
    "https://kristin-with-an-eye.vercel.app",
    "http://localhost:5173",
    "http://localhost:3000",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EmailProvider {
    SendGrid,
    Resend,
    /// Emails are written to the log instead of being sent.
    Log,
}

#[derive(Debug)]
pub struct ImageKitConfig {
    pub private_key: Option<SecretString>,
    pub api_base: String,
    /// Always ends with `/`.
    pub public_url: String,
    pub portfolio_root: String,
    pub webhook_secret: Option<SecretString>,
}

#[derive(Debug)]
pub struct EmailConfig {
    pub provider: EmailProvider,
    pub sendgrid_api_key: Option<SecretString>,
    pub resend_api_key: Option<SecretString>,
    pub admin_email: String,
    pub from_email: String,
    pub studio_name: String,
}

#[derive(Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: SecretString,
    pub allowed_origins: Vec<String>,
    pub admin_api_key: Option<SecretString>,
    pub sync_secret: Option<SecretString>,
    pub imagekit: ImageKitConfig,
    pub email: EmailConfig,
    pub form_rate_limit: usize,
    pub form_rate_window: Duration,
    /// `None` disables the background sync loop.
    pub portfolio_sync_interval: Option<Duration>,
    pub catalog_cache_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let secret = |key: &str| get(key).map(SecretString::from);

        let database_url = secret("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let allowed_origins = match get("ALLOWED_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        let sendgrid_api_key = secret("SENDGRID_API_KEY");
        let resend_api_key = secret("RESEND_API_KEY");
        let provider = match get("EMAIL_PROVIDER") {
            Some(raw) => EmailProvider::from_str(&raw).map_err(|_| ConfigError::Invalid {
                key: "EMAIL_PROVIDER",
                reason: format!("expected sendgrid, resend or log, got {raw:?}"),
            })?,
            None if sendgrid_api_key.is_some() => EmailProvider::SendGrid,
            None if resend_api_key.is_some() => EmailProvider::Resend,
            None => EmailProvider::Log,
        };
        match provider {
            EmailProvider::SendGrid if sendgrid_api_key.is_none() => {
                return Err(ConfigError::Missing("SENDGRID_API_KEY"));
            }
            EmailProvider::Resend if resend_api_key.is_none() => {
                return Err(ConfigError::Missing("RESEND_API_KEY"));
            }
            _ => {}
        }

        let mut public_url =
            get("IMAGEKIT_PUBLIC_URL").unwrap_or_else(|| "https://ik.imagekit.io/skbxxrf9vm/".into());
        if !public_url.ends_with('/') {
            public_url.push('/');
        }

        let from_email = get("FROM_EMAIL").unwrap_or_else(|| "hello@kristinmathilde.com".into());

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or("PORT", get("PORT"), 3001)?,
            database_url,
            allowed_origins,
            admin_api_key: secret("ADMIN_API_KEY"),
            sync_secret: secret("SYNC_SECRET"),
            imagekit: ImageKitConfig {
                private_key: secret("IMAGEKIT_PRIVATE_KEY"),
                api_base: get("IMAGEKIT_API_BASE")
                    .unwrap_or_else(|| "https://api.imagekit.io/v1".into())
                    .trim_end_matches('/')
                    .to_string(),
                public_url,
                portfolio_root: get("PORTFOLIO_ROOT")
                    .map(|r| r.trim_matches('/').to_string())
                    .unwrap_or_else(|| "portfolio".into()),
                webhook_secret: secret("IMAGEKIT_WEBHOOK_SECRET"),
            },
            email: EmailConfig {
                provider,
                sendgrid_api_key,
                resend_api_key,
                admin_email: get("ADMIN_EMAIL").unwrap_or_else(|| from_email.clone()),
                from_email,
                studio_name: get("STUDIO_NAME").unwrap_or_else(|| "Kristin with an Eye".into()),
            },
            form_rate_limit: parse_or("FORM_RATE_LIMIT", get("FORM_RATE_LIMIT"), 5)?,
            form_rate_window: Duration::from_secs(parse_or(
                "FORM_RATE_WINDOW_SECS",
                get("FORM_RATE_WINDOW_SECS"),
                3600,
            )?),
            portfolio_sync_interval: match get("PORTFOLIO_SYNC_INTERVAL_SECS") {
                Some(raw) => match parse_or("PORTFOLIO_SYNC_INTERVAL_SECS", Some(raw), 0u64)? {
                    0 => None,
                    secs => Some(Duration::from_secs(secs)),
                },
                None => None,
            },
            catalog_cache_ttl: Duration::from_secs(parse_or(
                "CATALOG_CACHE_TTL_SECS",
                get("CATALOG_CACHE_TTL_SECS"),
                300,
            )?),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
