//! Incremental mirror updates pushed by ImageKit webhooks.

use std::sync::Arc;

use db::models::{
    portfolio_category::{NewCategory, PortfolioCategory},
    portfolio_item::{ItemPlacement, NewItem},
};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, info};
use ts_rs::TS;
use utils::text::{display_name, slugify};

use super::{
    imagekit::{RemoteFile, RemoteFolder},
    portfolio_catalog::PortfolioCatalog,
    portfolio_layout::{
        ImageUrls, PortfolioFolder, PortfolioPath, alt_text, category_folder_path, item_metadata,
        item_sort_order,
    },
    portfolio_store::PortfolioStore,
};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum PortfolioWebhookError {
    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Checks `header` against the raw request body.
///
/// Accepts either a bare hex HMAC-SHA256 of the body or the
/// `t=<timestamp>,v1=<hex>` form, where the signed message is
/// `"<timestamp>.<body>"`. Comparison is constant time.
pub fn verify_signature(secret: &str, header: &str, body: &[u8]) -> bool {
    let header = header.trim();
    let mut timestamp = None;
    let mut signature = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signature = Some(value),
            _ => {}
        }
    }

    let (signature, message) = match (timestamp, signature) {
        (Some(ts), Some(sig)) => {
            let mut message = Vec::with_capacity(ts.len() + 1 + body.len());
            message.extend_from_slice(ts.as_bytes());
            message.push(b'.');
            message.extend_from_slice(body);
            (sig, message)
        }
        _ => (header, body.to_vec()),
    };

    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(&message);
    mac.verify_slice(&expected).is_ok()
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl WebhookEvent {
    /// Payloads carry the entity either nested under `key` or inline.
    fn entity<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<T, PortfolioWebhookError> {
        let value = self.data.get(key).unwrap_or(&self.data).clone();
        serde_json::from_value(value)
            .map_err(|e| PortfolioWebhookError::InvalidPayload(format!("{}: {e}", self.event_type)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileRef {
    file_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebhookOutcome {
    ItemAdded { category: String, filename: String },
    ItemUpdated { category: String, filename: String },
    ItemDeactivated { filename: String },
    CategoryEnsured { category: String },
    CategoryDeactivated { category: String },
    Ignored { reason: String },
}

impl WebhookOutcome {
    fn ignored(reason: impl Into<String>) -> Self {
        Self::Ignored {
            reason: reason.into(),
        }
    }
}

pub struct PortfolioWebhook {
    store: Arc<dyn PortfolioStore>,
    root: String,
    public_url: String,
    catalog: Option<PortfolioCatalog>,
}

impl PortfolioWebhook {
    pub fn new(
        store: Arc<dyn PortfolioStore>,
        root: impl Into<String>,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            root: root.into(),
            public_url: public_url.into(),
            catalog: None,
        }
    }

    pub fn with_catalog(mut self, catalog: PortfolioCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub async fn handle(&self, event: &WebhookEvent) -> Result<WebhookOutcome, PortfolioWebhookError> {
        info!(event_type = %event.event_type, "Processing ImageKit webhook");

        let outcome = match event.event_type.as_str() {
            "upload.complete" | "video.upload.complete" => {
                self.file_uploaded(event.entity("file")?).await?
            }
            "file.delete" => self.file_deleted(event.entity("file")?).await?,
            "folder.create" => self.folder_created(event.entity("folder")?).await?,
            "folder.delete" => self.folder_deleted(event.entity("folder")?).await?,
            other => WebhookOutcome::ignored(format!("unhandled event type {other}")),
        };

        if !matches!(outcome, WebhookOutcome::Ignored { .. }) {
            if let Some(catalog) = &self.catalog {
                catalog.invalidate();
            }
        }
        debug!(?outcome, "ImageKit webhook processed");
        Ok(outcome)
    }

    /// Finds the category for `folder_name`, creating or reactivating it.
    async fn ensure_category(&self, folder_name: &str) -> Result<PortfolioCategory, PortfolioWebhookError> {
        let slug = slugify(folder_name);
        if slug.is_empty() {
            return Err(PortfolioWebhookError::InvalidPayload(format!(
                "folder {folder_name:?} has no usable slug"
            )));
        }

        if let Some(mut category) = self.store.category_by_slug(&slug).await? {
            if !category.is_active {
                self.store.set_category_active(category.id, true).await?;
                category.is_active = true;
                info!(category = %slug, "Reactivated portfolio category");
            }
            return Ok(category);
        }

        let sort_order = self
            .store
            .categories()
            .await?
            .iter()
            .map(|c| c.sort_order)
            .max()
            .map_or(0, |max| max + 1);
        let category = self
            .store
            .create_category(&NewCategory {
                name: display_name(folder_name),
                slug: slug.clone(),
                folder_path: category_folder_path(&self.root, folder_name),
                sort_order,
            })
            .await?;
        info!(category = %slug, "Created portfolio category");
        Ok(category)
    }

    async fn file_uploaded(&self, file: RemoteFile) -> Result<WebhookOutcome, PortfolioWebhookError> {
        let Some(path) = PortfolioPath::parse(&self.root, &file.file_path) else {
            return Ok(WebhookOutcome::ignored(format!(
                "{} is outside the portfolio",
                file.file_path
            )));
        };

        let category = self.ensure_category(&path.category_folder).await?;
        let urls = ImageUrls::for_path(&self.public_url, &file.file_path);
        let metadata = item_metadata(&file.file_path, chrono::Utc::now());

        let outcome = match self.store.item_by_file_id(&file.file_id).await? {
            Some(existing) => {
                self.store
                    .place_item(existing.id, &ItemPlacement {
                        category_id: category.id,
                        subcategory: path.subcategory.clone(),
                        filename: file.name.clone(),
                        imagekit_url: urls.original,
                        thumbnail_url: urls.thumbnail,
                        full_url: urls.full,
                        is_active: true,
                        metadata,
                    })
                    .await?;
                if existing.category_id != category.id {
                    self.store.refresh_category_stats(existing.category_id).await?;
                }
                WebhookOutcome::ItemUpdated {
                    category: category.slug.clone(),
                    filename: file.name,
                }
            }
            None => {
                self.store
                    .create_item(&NewItem {
                        category_id: category.id,
                        subcategory: path.subcategory.clone(),
                        filename: file.name.clone(),
                        imagekit_file_id: file.file_id.clone(),
                        imagekit_url: urls.original,
                        thumbnail_url: urls.thumbnail,
                        full_url: urls.full,
                        alt_text: Some(alt_text(&category.name, &file.name)),
                        sort_order: item_sort_order(&file.name, 0),
                        metadata,
                    })
                    .await?;
                WebhookOutcome::ItemAdded {
                    category: category.slug.clone(),
                    filename: file.name,
                }
            }
        };

        self.store.refresh_category_stats(category.id).await?;
        Ok(outcome)
    }

    /// Soft-deletes the row; a later upload or sync of the same file revives it.
    async fn file_deleted(&self, file: FileRef) -> Result<WebhookOutcome, PortfolioWebhookError> {
        let Some(item) = self.store.item_by_file_id(&file.file_id).await? else {
            return Ok(WebhookOutcome::ignored(format!("unknown file {}", file.file_id)));
        };
        if item.is_active {
            self.store.set_item_active(item.id, false).await?;
            self.store.refresh_category_stats(item.category_id).await?;
        }
        Ok(WebhookOutcome::ItemDeactivated {
            filename: item.filename,
        })
    }

    async fn folder_created(&self, folder: RemoteFolder) -> Result<WebhookOutcome, PortfolioWebhookError> {
        let Some(parsed) = PortfolioFolder::parse(&self.root, &folder.folder_path) else {
            return Ok(WebhookOutcome::ignored(format!(
                "{} is outside the portfolio",
                folder.folder_path
            )));
        };
        let category = self.ensure_category(&parsed.category_folder).await?;
        Ok(WebhookOutcome::CategoryEnsured {
            category: category.slug,
        })
    }

    async fn folder_deleted(&self, folder: RemoteFolder) -> Result<WebhookOutcome, PortfolioWebhookError> {
        let Some(parsed) = PortfolioFolder::parse(&self.root, &folder.folder_path) else {
            return Ok(WebhookOutcome::ignored(format!(
                "{} is outside the portfolio",
                folder.folder_path
            )));
        };
        if parsed.nested {
            return Ok(WebhookOutcome::ignored(
                "subfolder removals are reconciled by the next sync",
            ));
        }

        let slug = slugify(&parsed.category_folder);
        match self.store.category_by_slug(&slug).await? {
            Some(category) => {
                self.store.set_category_active(category.id, false).await?;
                info!(category = %slug, "Deactivated portfolio category");
                Ok(WebhookOutcome::CategoryDeactivated { category: slug })
            }
            None => Ok(WebhookOutcome::ignored(format!("unknown category {slug}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::services::portfolio_store::memory::MemoryStore;

    fn sign(secret: &str, message: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(message);
        hex::encode(mac.finalize().into_bytes())
    }

    fn webhook(store: &Arc<MemoryStore>) -> PortfolioWebhook {
        PortfolioWebhook::new(store.clone(), "portfolio", "https://ik.imagekit.io/demo/")
    }

    fn event(value: serde_json::Value) -> WebhookEvent {
        serde_json::from_value(value).unwrap()
    }

    fn upload(file_id: &str, path: &str) -> WebhookEvent {
        let name = path.rsplit('/').next().unwrap();
        event(json!({
            "type": "upload.complete",
            "data": { "file": { "fileId": file_id, "name": name, "filePath": path } }
        }))
    }

    #[test]
    fn plain_hex_signature_over_body() {
        let body = br#"{"type":"file.delete"}"#;
        let signature = sign("whsec", body);
        assert!(verify_signature("whsec", &signature, body));
        assert!(!verify_signature("other", &signature, body));
        assert!(!verify_signature("whsec", &signature, b"tampered"));
        assert!(!verify_signature("whsec", "not-hex", body));
    }

    #[test]
    fn timestamped_signature_signs_timestamp_and_body() {
        let body = br#"{"type":"upload.complete"}"#;
        let mut message = b"1700000000.".to_vec();
        message.extend_from_slice(body);
        let header = format!("t=1700000000,v1={}", sign("whsec", &message));

        assert!(verify_signature("whsec", &header, body));
        assert!(!verify_signature("whsec", &header.replace("1700000000,", "1700000001,"), body));
    }

    #[tokio::test]
    async fn upload_creates_category_and_item() {
        let store = Arc::new(MemoryStore::new());
        let outcome = webhook(&store)
            .handle(&upload("abc", "/portfolio/ngo-stories/kenya/05.jpg"))
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::ItemAdded {
            category: "ngo-stories".into(),
            filename: "05.jpg".into(),
        });
        let category = store.category("ngo-stories").unwrap();
        assert_eq!(category.name, "Ngo Stories");
        assert_eq!(category.folder_path, "/portfolio/ngo-stories");
        assert_eq!(category.image_count, 1);

        let item = store.item("abc").unwrap();
        assert_eq!(item.subcategory.as_deref(), Some("kenya"));
        assert_eq!(item.sort_order, 5);
        assert_eq!(item.alt_text.as_deref(), Some("Ngo Stories photo 05"));
    }

    #[tokio::test]
    async fn repeated_upload_moves_the_existing_row() {
        let store = Arc::new(MemoryStore::new());
        let hook = webhook(&store);
        hook.handle(&upload("abc", "/portfolio/family/01.jpg")).await.unwrap();
        hook.handle(&upload("abc", "/portfolio/weddings/01.jpg")).await.unwrap();

        assert_eq!(store.item_count(), 1);
        let item = store.item("abc").unwrap();
        assert_eq!(item.category_id, store.category("weddings").unwrap().id);
        assert_eq!(store.category("family").unwrap().image_count, 0);
        assert_eq!(store.category("weddings").unwrap().image_count, 1);
    }

    #[tokio::test]
    async fn delete_soft_deletes_and_upload_revives() {
        let store = Arc::new(MemoryStore::new());
        let hook = webhook(&store);
        hook.handle(&upload("abc", "/portfolio/family/01.jpg")).await.unwrap();

        let outcome = hook
            .handle(&event(json!({"type": "file.delete", "data": {"fileId": "abc"}})))
            .await
            .unwrap();
        assert_eq!(outcome, WebhookOutcome::ItemDeactivated { filename: "01.jpg".into() });
        assert!(!store.item("abc").unwrap().is_active);
        let family = store.category("family").unwrap();
        assert_eq!(family.image_count, 0);
        assert_eq!(family.featured_image_url, None);

        hook.handle(&upload("abc", "/portfolio/family/01.jpg")).await.unwrap();
        assert!(store.item("abc").unwrap().is_active);
    }

    #[tokio::test]
    async fn folder_events_manage_categories() {
        let store = Arc::new(MemoryStore::new());
        let hook = webhook(&store);

        let created = hook
            .handle(&event(json!({
                "type": "folder.create",
                "data": {"folder": {"name": "Brand Work", "folderPath": "/portfolio/Brand Work"}}
            })))
            .await
            .unwrap();
        assert_eq!(created, WebhookOutcome::CategoryEnsured { category: "brand-work".into() });

        let nested = hook
            .handle(&event(json!({
                "type": "folder.delete",
                "data": {"folder": {"name": "2024", "folderPath": "/portfolio/Brand Work/2024"}}
            })))
            .await
            .unwrap();
        assert!(matches!(nested, WebhookOutcome::Ignored { .. }));
        assert!(store.category("brand-work").unwrap().is_active);

        hook.handle(&event(json!({
            "type": "folder.delete",
            "data": {"folder": {"name": "Brand Work", "folderPath": "/portfolio/Brand Work"}}
        })))
        .await
        .unwrap();
        assert!(!store.category("brand-work").unwrap().is_active);
    }

    #[tokio::test]
    async fn foreign_paths_and_unknown_events_are_ignored() {
        let store = Arc::new(MemoryStore::new());
        let hook = webhook(&store);

        let outside = hook.handle(&upload("x", "/blog/cover.jpg")).await.unwrap();
        assert!(matches!(outside, WebhookOutcome::Ignored { .. }));

        let unknown = hook
            .handle(&event(json!({"type": "file-version.delete", "data": {}})))
            .await
            .unwrap();
        assert!(matches!(unknown, WebhookOutcome::Ignored { .. }));
        assert!(store.category("blog").is_none());
    }

    #[tokio::test]
    async fn malformed_payload_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let err = webhook(&store)
            .handle(&event(json!({"type": "upload.complete", "data": {"file": {"name": 3}}})))
            .await
            .unwrap_err();
        assert!(matches!(err, PortfolioWebhookError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn applied_events_invalidate_the_attached_catalog() {
        let store = Arc::new(MemoryStore::new());
        let catalog = PortfolioCatalog::new(store.clone(), std::time::Duration::from_secs(300));
        let hook = webhook(&store).with_catalog(catalog.clone());
        assert!(catalog.categories().await.unwrap().is_empty());

        hook.handle(&upload("abc", "/portfolio/family/01.jpg")).await.unwrap();
        let categories = catalog.categories().await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].image_count, 1);

        let ignored = event(json!({ "type": "video.transformation.ready", "data": {} }));
        hook.handle(&ignored).await.unwrap();
        let cached = catalog.categories().await.unwrap();
        assert!(Arc::ptr_eq(&categories, &cached));
    }
}
