//! Request extractors for the client address, the bearer guards and form
//! rate limiting.

use std::{
    convert::Infallible,
    net::{IpAddr, SocketAddr},
};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::{error::ApiError, state::AppState};

/// Best-effort client address: first `x-forwarded-for` hop, then
/// `x-real-ip`, then the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header("x-forwarded-for")
        .and_then(|list| list.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header("x-real-ip"))
        .map(str::to_string)
        .or_else(|| peer.map(|ip| ip.to_string()))
}

fn peer_ip(parts: &Parts) -> Option<IpAddr> {
    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

#[derive(Debug, Clone)]
pub struct ClientIp(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(client_ip(&parts.headers, peer_ip(parts))))
    }
}

/// True when `Authorization: Bearer <token>` matches `expected`.
/// An unset secret never matches.
pub fn bearer_matches(headers: &HeaderMap, expected: Option<&SecretString>) -> bool {
    let Some(expected) = expected else {
        return false;
    };
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| {
            token
                .trim()
                .as_bytes()
                .ct_eq(expected.expose_secret().as_bytes())
                .into()
        })
}

/// Guard for the admin endpoints (`ADMIN_API_KEY`).
pub struct AdminAuth;

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if bearer_matches(&parts.headers, state.config.admin_api_key.as_ref()) {
            Ok(AdminAuth)
        } else {
            warn!(path = %parts.uri.path(), "Rejected admin request");
            Err(ApiError::Unauthorized)
        }
    }
}

/// Guard for the portfolio sync endpoints (`SYNC_SECRET`).
pub struct SyncAuth;

impl FromRequestParts<AppState> for SyncAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if bearer_matches(&parts.headers, state.config.sync_secret.as_ref()) {
            Ok(SyncAuth)
        } else {
            warn!(path = %parts.uri.path(), "Rejected sync request");
            Err(ApiError::Unauthorized)
        }
    }
}

/// Admits a public form submission under the per-IP, per-path limit.
/// Yields the client address for storage.
pub struct FormSlot(pub Option<String>);

impl FromRequestParts<AppState> for FormSlot {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let ip = client_ip(&parts.headers, peer_ip(parts));
        let key = format!(
            "{}:{}",
            parts.uri.path(),
            ip.as_deref().unwrap_or("unknown")
        );
        if !state.form_limiter.check(&key) {
            warn!(key = %key, "Form submission rate limited");
            return Err(ApiError::RateLimited);
        }
        Ok(FormSlot(ip))
    }
}
