//! ImageKit media API client.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::config::ImageKitConfig;

const PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone, Error)]
pub enum ImageKitError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("invalid private key")]
    Unauthorized,
    #[error("json error: {0}")]
    Serde(String),
    #[error("IMAGEKIT_PRIVATE_KEY is not configured")]
    NotConfigured,
}

impl ImageKitError {
    /// Returns true if the error is transient and should be retried.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::RateLimited => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub file_id: String,
    pub name: String,
    pub file_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFolder {
    pub name: String,
    #[serde(default, alias = "filePath")]
    pub folder_path: String,
}

/// One entry of a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MediaEntry {
    File(RemoteFile),
    Folder(RemoteFolder),
    /// File versions and other entry kinds the portfolio does not use.
    #[serde(other)]
    Other,
}

/// Read access to the remote folder tree.
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    /// Every entry directly inside `path` (e.g. `/portfolio/family`).
    async fn list_folder(&self, path: &str) -> Result<Vec<MediaEntry>, ImageKitError>;

    /// Cheap reachability check against `path`.
    async fn ping(&self, path: &str) -> Result<(), ImageKitError> {
        self.list_folder(path).await.map(|_| ())
    }
}

pub struct ImageKitClient {
    http: Client,
    api_base: String,
    auth_header: Option<SecretString>,
}

impl ImageKitClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn from_config(config: &ImageKitConfig) -> Result<Self, ImageKitError> {
        Self::new(
            config.api_base.clone(),
            config.private_key.as_ref().map(|k| k.expose_secret().to_string()),
        )
    }

    /// Without a private key every call fails with [`ImageKitError::NotConfigured`].
    pub fn new(api_base: String, private_key: Option<String>) -> Result<Self, ImageKitError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("studio-backend/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ImageKitError::Transport(e.to_string()))?;

        let auth_header = private_key
            .map(|key| SecretString::from(format!("Basic {}", STANDARD.encode(format!("{key}:")))));

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            auth_header,
        })
    }

    async fn fetch_page(
        &self,
        path: &str,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<MediaEntry>, ImageKitError> {
        (|| async { self.send_list_request(path, skip, limit).await })
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(500))
                    .with_max_delay(Duration::from_secs(10))
                    .with_max_times(3)
                    .with_jitter(),
            )
            .when(|e: &ImageKitError| e.should_retry())
            .notify(|e, dur| {
                warn!(
                    "ImageKit listing of {} failed, retrying after {:.2}s: {}",
                    path,
                    dur.as_secs_f64(),
                    e
                )
            })
            .await
    }

    async fn send_list_request(
        &self,
        path: &str,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<MediaEntry>, ImageKitError> {
        let auth = self.auth_header.as_ref().ok_or(ImageKitError::NotConfigured)?;

        let res = self
            .http
            .get(format!("{}/files", self.api_base))
            .header("authorization", auth.expose_secret())
            .query(&[
                ("path", path.to_string()),
                ("skip", skip.to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => res
                .json::<Vec<MediaEntry>>()
                .await
                .map_err(|e| ImageKitError::Serde(e.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ImageKitError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => Err(ImageKitError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(ImageKitError::Http { status, body })
            }
        }
    }
}

#[async_trait]
impl MediaLibrary for ImageKitClient {
    async fn list_folder(&self, path: &str) -> Result<Vec<MediaEntry>, ImageKitError> {
        let mut entries = Vec::new();
        let mut skip = 0;

        loop {
            let page = self.fetch_page(path, skip, PAGE_SIZE).await?;
            let len = page.len();
            entries.extend(page);
            if len < PAGE_SIZE {
                break;
            }
            skip += len;
        }

        debug!(path, count = entries.len(), "Listed ImageKit folder");
        Ok(entries)
    }

    async fn ping(&self, path: &str) -> Result<(), ImageKitError> {
        self.send_list_request(path, 0, 1).await.map(|_| ())
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ImageKitError {
    if e.is_timeout() {
        ImageKitError::Timeout
    } else {
        ImageKitError::Transport(e.to_string())
    }
}

/// Splits a listing into files and folders, dropping other entry kinds.
pub fn partition_entries(entries: Vec<MediaEntry>) -> (Vec<RemoteFile>, Vec<RemoteFolder>) {
    let mut files = Vec::new();
    let mut folders = Vec::new();
    for entry in entries {
        match entry {
            MediaEntry::File(file) => files.push(file),
            MediaEntry::Folder(folder) => folders.push(folder),
            MediaEntry::Other => {}
        }
    }
    (files, folders)
}

#[cfg(test)]
pub(crate) mod fake {
    use std::{collections::HashMap, sync::Mutex};

    use super::*;

    /// In-memory folder tree keyed by folder path without trailing slash.
    #[derive(Default)]
    pub struct FakeLibrary {
        folders: Mutex<HashMap<String, Vec<MediaEntry>>>,
    }

    impl FakeLibrary {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_folder(&self, parent: &str, name: &str) {
            let folder_path = format!("{}/{name}", parent.trim_end_matches('/'));
            let mut folders = self.folders.lock().unwrap();
            folders.entry(parent.to_string()).or_default().push(MediaEntry::Folder(RemoteFolder {
                name: name.to_string(),
                folder_path: folder_path.clone(),
            }));
            folders.entry(folder_path).or_default();
        }

        pub fn add_file(&self, folder: &str, file_id: &str, name: &str) {
            let file_path = format!("{}/{name}", folder.trim_end_matches('/'));
            self.folders
                .lock()
                .unwrap()
                .entry(folder.to_string())
                .or_default()
                .push(MediaEntry::File(RemoteFile {
                    file_id: file_id.to_string(),
                    name: name.to_string(),
                    file_path,
                }));
        }

        pub fn remove_file(&self, file_id: &str) {
            for entries in self.folders.lock().unwrap().values_mut() {
                entries.retain(|e| !matches!(e, MediaEntry::File(f) if f.file_id == file_id));
            }
        }
    }

    #[async_trait]
    impl MediaLibrary for FakeLibrary {
        async fn list_folder(&self, path: &str) -> Result<Vec<MediaEntry>, ImageKitError> {
            self.folders
                .lock()
                .unwrap()
                .get(path.trim_end_matches('/'))
                .cloned()
                .ok_or_else(|| ImageKitError::Http {
                    status: 404,
                    body: format!("no folder {path}"),
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_entries_deserialize_by_type() {
        let body = r#"[
            {"type": "folder", "name": "family", "folderPath": "/portfolio/family", "folderId": "f1"},
            {"type": "file", "name": "01.jpg", "fileId": "abc", "filePath": "/portfolio/01.jpg", "size": 10},
            {"type": "file-version", "name": "01.jpg"}
        ]"#;
        let entries: Vec<MediaEntry> = serde_json::from_str(body).unwrap();

        let (files, folders) = partition_entries(entries);
        assert_eq!(folders, vec![RemoteFolder {
            name: "family".into(),
            folder_path: "/portfolio/family".into(),
        }]);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_id, "abc");
    }

    #[test]
    fn only_transient_errors_are_retried() {
        assert!(ImageKitError::Timeout.should_retry());
        assert!(ImageKitError::RateLimited.should_retry());
        assert!(ImageKitError::Http { status: 503, body: String::new() }.should_retry());
        assert!(!ImageKitError::Http { status: 404, body: String::new() }.should_retry());
        assert!(!ImageKitError::Unauthorized.should_retry());
        assert!(!ImageKitError::NotConfigured.should_retry());
    }

    #[tokio::test]
    async fn unconfigured_client_fails_without_network() {
        let client = ImageKitClient::new("https://api.imagekit.io/v1/".into(), None).unwrap();
        let err = client.list_folder("/portfolio").await.unwrap_err();
        assert!(matches!(err, ImageKitError::NotConfigured));
    }
}
