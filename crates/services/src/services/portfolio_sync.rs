//! Reconciles the remote portfolio folder tree with the relational mirror.
//!
//! A run is split in three steps so each can be reasoned about on its own:
//! [`RemoteSnapshot::collect`] reads the image host, [`plan`] diffs that
//! snapshot against the stored rows without side effects, and
//! [`PortfolioSync::apply`] executes the resulting actions. Rows are never
//! deleted: files that disappear are deactivated and come back to life when
//! they reappear.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use db::models::{
    portfolio_category::{NewCategory, PortfolioCategory},
    portfolio_item::{ItemPlacement, NewItem, PortfolioItem},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{
    sync::{Mutex, RwLock},
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, error, info, warn};
use ts_rs::TS;
use utils::text::{display_name, slugify};
use uuid::Uuid;

use super::{
    imagekit::{ImageKitError, MediaLibrary, RemoteFolder, partition_entries},
    portfolio_catalog::PortfolioCatalog,
    portfolio_layout::{ImageUrls, alt_text, item_metadata, item_sort_order},
    portfolio_store::PortfolioStore,
};

#[derive(Debug, Error)]
pub enum PortfolioSyncError {
    #[error("image host error: {0}")]
    ImageKit(#[from] ImageKitError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCategory {
    pub slug: String,
    pub name: String,
    pub folder_name: String,
    pub folder_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteImage {
    pub file_id: String,
    pub filename: String,
    pub file_path: String,
    pub category_slug: String,
    pub subcategory: Option<String>,
}

/// Everything below the portfolio root at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSnapshot {
    pub categories: Vec<RemoteCategory>,
    pub images: Vec<RemoteImage>,
}

impl RemoteSnapshot {
    /// Walks `/<root>`: its folders are categories, the folders directly below
    /// a category are subcategories and deeper folders fold into their
    /// subcategory. Files lying directly in the root are ignored.
    pub async fn collect(library: &dyn MediaLibrary, root: &str) -> Result<Self, ImageKitError> {
        let root_path = format!("/{root}");
        let (_, category_folders) = partition_entries(library.list_folder(&root_path).await?);

        let mut snapshot = Self::default();
        let mut seen_files = HashSet::new();

        for folder in category_folders {
            let slug = slugify(&folder.name);
            if slug.is_empty() {
                warn!(folder = %folder.name, "Skipping folder without a usable slug");
                continue;
            }

            let folder_path = child_path(&root_path, &folder);
            if snapshot.categories.iter().any(|c| c.slug == slug) {
                warn!(folder = %folder.name, slug = %slug, "Folder slug collides with an earlier folder, merging");
            } else {
                snapshot.categories.push(RemoteCategory {
                    slug: slug.clone(),
                    name: display_name(&folder.name),
                    folder_name: folder.name.clone(),
                    folder_path: folder_path.clone(),
                });
            }

            let mut pending: VecDeque<(String, Option<String>)> =
                VecDeque::from([(folder_path, None)]);
            while let Some((path, subcategory)) = pending.pop_front() {
                let (files, subfolders) = partition_entries(library.list_folder(&path).await?);

                for file in files {
                    if !seen_files.insert(file.file_id.clone()) {
                        continue;
                    }
                    snapshot.images.push(RemoteImage {
                        file_id: file.file_id,
                        filename: file.name,
                        file_path: file.file_path,
                        category_slug: slug.clone(),
                        subcategory: subcategory.clone(),
                    });
                }

                for sub in subfolders {
                    let next = subcategory.clone().or_else(|| Some(sub.name.clone()));
                    pending.push_back((child_path(&path, &sub), next));
                }
            }
        }

        debug!(
            categories = snapshot.categories.len(),
            images = snapshot.images.len(),
            "Collected remote portfolio snapshot"
        );
        Ok(snapshot)
    }
}

fn child_path(parent: &str, folder: &RemoteFolder) -> String {
    if folder.folder_path.is_empty() {
        format!("{}/{}", parent.trim_end_matches('/'), folder.name)
    } else {
        folder.folder_path.trim_end_matches('/').to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SyncAction {
    CreateCategory {
        name: String,
        slug: String,
        folder_path: String,
        sort_order: i32,
    },
    ReactivateCategory {
        id: Uuid,
        slug: String,
    },
    DeactivateCategory {
        id: Uuid,
        slug: String,
    },
    CreateItem {
        category_slug: String,
        subcategory: Option<String>,
        filename: String,
        file_id: String,
        file_path: String,
        alt_text: String,
        sort_order: i32,
    },
    UpdateItem {
        id: Uuid,
        category_slug: String,
        subcategory: Option<String>,
        filename: String,
        file_path: String,
        /// The row was inactive.
        reactivate: bool,
        /// Category or subcategory changed.
        moved: bool,
    },
    DeactivateItem {
        id: Uuid,
        filename: String,
        file_id: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct SyncPlan {
    pub actions: Vec<SyncAction>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// What applying the plan would report, assuming every action succeeds.
    pub fn summary(&self) -> SyncReport {
        let mut report = SyncReport {
            dry_run: true,
            ..SyncReport::default()
        };
        for action in &self.actions {
            report.record(action);
        }
        report
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub categories_added: u32,
    pub categories_reactivated: u32,
    pub categories_deactivated: u32,
    /// Categories whose image count and featured image were recomputed.
    pub categories_updated: u32,
    pub items_added: u32,
    pub items_updated: u32,
    pub items_moved: u32,
    pub items_reactivated: u32,
    pub items_removed: u32,
    pub errors: Vec<String>,
    #[ts(type = "number")]
    pub duration_ms: u64,
    pub dry_run: bool,
}

impl SyncReport {
    fn record(&mut self, action: &SyncAction) {
        match action {
            SyncAction::CreateCategory { .. } => self.categories_added += 1,
            SyncAction::ReactivateCategory { .. } => self.categories_reactivated += 1,
            SyncAction::DeactivateCategory { .. } => self.categories_deactivated += 1,
            SyncAction::CreateItem { .. } => self.items_added += 1,
            SyncAction::UpdateItem {
                reactivate, moved, ..
            } => {
                self.items_updated += 1;
                if *reactivate {
                    self.items_reactivated += 1;
                }
                if *moved {
                    self.items_moved += 1;
                }
            }
            SyncAction::DeactivateItem { .. } => self.items_removed += 1,
        }
    }

    pub fn changes(&self) -> u32 {
        self.categories_added
            + self.categories_reactivated
            + self.categories_deactivated
            + self.items_added
            + self.items_updated
            + self.items_removed
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct SyncPreview {
    pub summary: SyncReport,
    pub actions: Vec<SyncAction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct SyncHealth {
    pub database: bool,
    pub imagekit: bool,
    pub categories: i64,
    pub items: i64,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_sync: Option<DateTime<Utc>>,
    pub errors: Vec<String>,
}

/// Diffs a remote snapshot against the stored mirror.
///
/// Actions come out in execution order: category creations and
/// reactivations first so items can resolve their category, then item
/// inserts and updates, then soft-deletes.
pub fn plan(
    remote: &RemoteSnapshot,
    categories: &[PortfolioCategory],
    items: &[PortfolioItem],
) -> SyncPlan {
    let mut actions = Vec::new();

    let by_slug: HashMap<&str, &PortfolioCategory> =
        categories.iter().map(|c| (c.slug.as_str(), c)).collect();
    let by_id: HashMap<Uuid, &PortfolioCategory> = categories.iter().map(|c| (c.id, c)).collect();
    let mut next_sort_order = categories
        .iter()
        .map(|c| c.sort_order)
        .max()
        .map_or(0, |max| max + 1);

    let mut category_names: HashMap<&str, &str> = HashMap::new();
    for remote_category in &remote.categories {
        let slug = remote_category.slug.as_str();
        match by_slug.get(slug) {
            None => {
                actions.push(SyncAction::CreateCategory {
                    name: remote_category.name.clone(),
                    slug: remote_category.slug.clone(),
                    folder_path: remote_category.folder_path.clone(),
                    sort_order: next_sort_order,
                });
                next_sort_order += 1;
                category_names.insert(slug, remote_category.name.as_str());
            }
            Some(existing) => {
                if !existing.is_active {
                    actions.push(SyncAction::ReactivateCategory {
                        id: existing.id,
                        slug: existing.slug.clone(),
                    });
                }
                category_names.insert(slug, existing.name.as_str());
            }
        }
    }

    let rows_by_file: HashMap<&str, &PortfolioItem> = items
        .iter()
        .map(|i| (i.imagekit_file_id.as_str(), i))
        .collect();
    let mut positions: HashMap<&str, i32> = HashMap::new();

    for image in &remote.images {
        let position = positions.entry(image.category_slug.as_str()).or_insert(0);
        let fallback_order = *position;
        *position += 1;

        let Some(row) = rows_by_file.get(image.file_id.as_str()) else {
            let category_name = category_names
                .get(image.category_slug.as_str())
                .copied()
                .unwrap_or(image.category_slug.as_str());
            actions.push(SyncAction::CreateItem {
                category_slug: image.category_slug.clone(),
                subcategory: image.subcategory.clone(),
                filename: image.filename.clone(),
                file_id: image.file_id.clone(),
                file_path: image.file_path.clone(),
                alt_text: alt_text(category_name, &image.filename),
                sort_order: item_sort_order(&image.filename, fallback_order),
            });
            continue;
        };

        let current_slug = by_id.get(&row.category_id).map(|c| c.slug.as_str());
        let moved = current_slug != Some(image.category_slug.as_str())
            || row.subcategory != image.subcategory;
        let renamed =
            row.filename != image.filename || row.file_path() != Some(image.file_path.as_str());
        let reactivate = !row.is_active;

        if moved || renamed || reactivate {
            actions.push(SyncAction::UpdateItem {
                id: row.id,
                category_slug: image.category_slug.clone(),
                subcategory: image.subcategory.clone(),
                filename: image.filename.clone(),
                file_path: image.file_path.clone(),
                reactivate,
                moved,
            });
        }
    }

    let remote_files: HashSet<&str> = remote.images.iter().map(|i| i.file_id.as_str()).collect();
    for row in items {
        if row.is_active && !remote_files.contains(row.imagekit_file_id.as_str()) {
            actions.push(SyncAction::DeactivateItem {
                id: row.id,
                filename: row.filename.clone(),
                file_id: row.imagekit_file_id.clone(),
            });
        }
    }

    let remote_slugs: HashSet<&str> = remote.categories.iter().map(|c| c.slug.as_str()).collect();
    for category in categories {
        if category.is_active && !remote_slugs.contains(category.slug.as_str()) {
            actions.push(SyncAction::DeactivateCategory {
                id: category.id,
                slug: category.slug.clone(),
            });
        }
    }

    SyncPlan { actions }
}

pub struct PortfolioSync {
    store: Arc<dyn PortfolioStore>,
    library: Arc<dyn MediaLibrary>,
    root: String,
    public_url: String,
    catalog: Option<PortfolioCatalog>,
    run_lock: Mutex<()>,
    last_run: RwLock<Option<DateTime<Utc>>>,
}

impl PortfolioSync {
    pub fn new(
        store: Arc<dyn PortfolioStore>,
        library: Arc<dyn MediaLibrary>,
        root: impl Into<String>,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            library,
            root: root.into(),
            public_url: public_url.into(),
            catalog: None,
            run_lock: Mutex::new(()),
            last_run: RwLock::new(None),
        }
    }

    /// Cached catalog responses are dropped after every applied run.
    pub fn with_catalog(mut self, catalog: PortfolioCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    async fn current_plan(&self) -> Result<SyncPlan, PortfolioSyncError> {
        let remote = RemoteSnapshot::collect(self.library.as_ref(), &self.root).await?;
        let categories = self.store.categories().await?;
        let items = self.store.items().await?;
        debug!(
            db_categories = categories.len(),
            db_items = items.len(),
            remote_categories = remote.categories.len(),
            remote_images = remote.images.len(),
            "Planning portfolio sync"
        );
        Ok(plan(&remote, &categories, &items))
    }

    /// Full reconciliation. Runs never overlap.
    pub async fn run(&self) -> Result<SyncReport, PortfolioSyncError> {
        let _guard = self.run_lock.lock().await;
        let started = Instant::now();
        info!(root = %self.root, "Starting portfolio sync");

        let plan = self.current_plan().await?;
        let mut report = self.apply(&plan).await?;
        report.duration_ms = started.elapsed().as_millis() as u64;

        *self.last_run.write().await = Some(Utc::now());
        if let Some(catalog) = &self.catalog {
            catalog.invalidate();
        }

        info!(
            categories_added = report.categories_added,
            categories_reactivated = report.categories_reactivated,
            categories_deactivated = report.categories_deactivated,
            items_added = report.items_added,
            items_updated = report.items_updated,
            items_removed = report.items_removed,
            errors = report.errors.len(),
            duration_ms = report.duration_ms,
            "Portfolio sync finished"
        );
        Ok(report)
    }

    /// The actions a run would take right now, without writing anything.
    pub async fn preview(&self) -> Result<SyncPreview, PortfolioSyncError> {
        let plan = self.current_plan().await?;
        Ok(SyncPreview {
            summary: plan.summary(),
            actions: plan.actions,
        })
    }

    /// Executes `plan`. Failures of single actions are collected in the
    /// report and do not stop the remaining actions.
    pub async fn apply(&self, plan: &SyncPlan) -> Result<SyncReport, PortfolioSyncError> {
        let mut report = SyncReport::default();
        let mut category_ids: HashMap<String, Uuid> = self
            .store
            .categories()
            .await?
            .into_iter()
            .map(|c| (c.slug, c.id))
            .collect();
        let now = Utc::now();

        for action in &plan.actions {
            match self.apply_action(action, &mut category_ids, now).await {
                Ok(()) => report.record(action),
                Err(message) => {
                    warn!(error = %message, "Portfolio sync action failed");
                    report.errors.push(message);
                }
            }
        }

        match self.store.categories().await {
            Ok(categories) => {
                for category in categories {
                    match self.store.refresh_category_stats(category.id).await {
                        Ok(_) => report.categories_updated += 1,
                        Err(e) => report
                            .errors
                            .push(format!("Failed to refresh stats for {}: {e}", category.slug)),
                    }
                }
            }
            Err(e) => report
                .errors
                .push(format!("Failed to load categories for stats refresh: {e}")),
        }

        Ok(report)
    }

    async fn apply_action(
        &self,
        action: &SyncAction,
        category_ids: &mut HashMap<String, Uuid>,
        now: DateTime<Utc>,
    ) -> Result<(), String> {
        match action {
            SyncAction::CreateCategory {
                name,
                slug,
                folder_path,
                sort_order,
            } => {
                let created = self
                    .store
                    .create_category(&NewCategory {
                        name: name.clone(),
                        slug: slug.clone(),
                        folder_path: folder_path.clone(),
                        sort_order: *sort_order,
                    })
                    .await
                    .map_err(|e| format!("Failed to create category {slug}: {e}"))?;
                info!(category = %slug, "Created portfolio category");
                category_ids.insert(created.slug, created.id);
                Ok(())
            }
            SyncAction::ReactivateCategory { id, slug } => {
                self.store
                    .set_category_active(*id, true)
                    .await
                    .map_err(|e| format!("Failed to reactivate category {slug}: {e}"))?;
                info!(category = %slug, "Reactivated portfolio category");
                Ok(())
            }
            SyncAction::DeactivateCategory { id, slug } => {
                self.store
                    .set_category_active(*id, false)
                    .await
                    .map_err(|e| format!("Failed to deactivate category {slug}: {e}"))?;
                info!(category = %slug, "Deactivated orphaned portfolio category");
                Ok(())
            }
            SyncAction::CreateItem {
                category_slug,
                subcategory,
                filename,
                file_id,
                file_path,
                alt_text,
                sort_order,
            } => {
                let category_id = *category_ids
                    .get(category_slug)
                    .ok_or_else(|| format!("No category {category_slug} for item {filename}"))?;
                let urls = ImageUrls::for_path(&self.public_url, file_path);
                self.store
                    .create_item(&NewItem {
                        category_id,
                        subcategory: subcategory.clone(),
                        filename: filename.clone(),
                        imagekit_file_id: file_id.clone(),
                        imagekit_url: urls.original,
                        thumbnail_url: urls.thumbnail,
                        full_url: urls.full,
                        alt_text: Some(alt_text.clone()),
                        sort_order: *sort_order,
                        metadata: item_metadata(file_path, now),
                    })
                    .await
                    .map_err(|e| format!("Failed to add item {filename}: {e}"))?;
                debug!(category = %category_slug, filename = %filename, "Added portfolio item");
                Ok(())
            }
            SyncAction::UpdateItem {
                id,
                category_slug,
                subcategory,
                filename,
                file_path,
                ..
            } => {
                let category_id = *category_ids
                    .get(category_slug)
                    .ok_or_else(|| format!("No category {category_slug} for item {filename}"))?;
                let urls = ImageUrls::for_path(&self.public_url, file_path);
                self.store
                    .place_item(*id, &ItemPlacement {
                        category_id,
                        subcategory: subcategory.clone(),
                        filename: filename.clone(),
                        imagekit_url: urls.original,
                        thumbnail_url: urls.thumbnail,
                        full_url: urls.full,
                        is_active: true,
                        metadata: item_metadata(file_path, now),
                    })
                    .await
                    .map_err(|e| format!("Failed to update item {filename}: {e}"))?;
                debug!(category = %category_slug, filename = %filename, "Updated portfolio item");
                Ok(())
            }
            SyncAction::DeactivateItem { id, filename, .. } => {
                self.store
                    .set_item_active(*id, false)
                    .await
                    .map_err(|e| format!("Failed to remove item {filename}: {e}"))?;
                debug!(filename = %filename, "Soft-deleted portfolio item");
                Ok(())
            }
        }
    }

    pub async fn health(&self) -> SyncHealth {
        let mut health = SyncHealth::default();

        match self.store.counts().await {
            Ok(counts) => {
                health.database = true;
                health.categories = counts.categories;
                health.items = counts.items;
                health.last_updated = counts.last_updated;
            }
            Err(e) => health.errors.push(format!("Database error: {e}")),
        }

        match self.library.ping(&format!("/{}", self.root)).await {
            Ok(()) => health.imagekit = true,
            Err(e) => health.errors.push(format!("ImageKit error: {e}")),
        }

        health.last_sync = *self.last_run.read().await;
        health
    }
}

/// Background loop running [`PortfolioSync::run`] on a fixed interval.
pub struct PortfolioSyncService {
    sync: Arc<PortfolioSync>,
    poll_interval: Duration,
}

impl PortfolioSyncService {
    pub fn spawn(sync: Arc<PortfolioSync>, poll_interval: Duration) -> tokio::task::JoinHandle<()> {
        let service = Self {
            sync,
            poll_interval,
        };
        tokio::spawn(async move {
            service.start().await;
        })
    }

    async fn start(&self) {
        info!(
            "Starting portfolio sync service with interval {:?}",
            self.poll_interval
        );

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            match self.sync.run().await {
                Ok(report) if !report.is_clean() => {
                    warn!(errors = ?report.errors, "Scheduled portfolio sync finished with errors")
                }
                Ok(_) => {}
                Err(e) => error!("Scheduled portfolio sync failed: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{imagekit::fake::FakeLibrary, portfolio_store::memory::MemoryStore};

    const PUBLIC_URL: &str = "https://ik.imagekit.io/demo/";

    fn seeded_library() -> FakeLibrary {
        let library = FakeLibrary::new();
        library.add_folder("/portfolio", "family-portraits");
        library.add_file("/portfolio/family-portraits", "f2", "02.jpg");
        library.add_file("/portfolio/family-portraits", "f1", "01.jpg");
        library.add_folder("/portfolio", "Lifestyle");
        library.add_folder("/portfolio/Lifestyle", "beach");
        library.add_file("/portfolio/Lifestyle", "l0", "cover.jpg");
        library.add_file("/portfolio/Lifestyle/beach", "l3", "03.jpg");
        library.add_folder("/portfolio/Lifestyle/beach", "sunset");
        library.add_file("/portfolio/Lifestyle/beach/sunset", "l4", "04.jpg");
        library
    }

    fn engine(store: &Arc<MemoryStore>, library: &Arc<FakeLibrary>) -> PortfolioSync {
        PortfolioSync::new(store.clone(), library.clone(), "portfolio", PUBLIC_URL)
    }

    async fn replan(store: &Arc<MemoryStore>, library: &Arc<FakeLibrary>) -> SyncPlan {
        let remote = RemoteSnapshot::collect(&**library, "portfolio").await.unwrap();
        let categories = store.categories().await.unwrap();
        let items = store.items().await.unwrap();
        plan(&remote, &categories, &items)
    }

    #[tokio::test]
    async fn snapshot_walks_nested_folders() {
        let library = seeded_library();
        let snapshot = RemoteSnapshot::collect(&library, "portfolio").await.unwrap();

        let slugs: Vec<_> = snapshot.categories.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["family-portraits", "lifestyle"]);
        assert_eq!(snapshot.categories[1].name, "Lifestyle");
        assert_eq!(snapshot.categories[1].folder_path, "/portfolio/Lifestyle");

        let deep = snapshot.images.iter().find(|i| i.file_id == "l4").unwrap();
        assert_eq!(deep.category_slug, "lifestyle");
        assert_eq!(deep.subcategory.as_deref(), Some("beach"));
        assert_eq!(deep.file_path, "/portfolio/Lifestyle/beach/sunset/04.jpg");

        let root_level = snapshot.images.iter().find(|i| i.file_id == "l0").unwrap();
        assert_eq!(root_level.subcategory, None);
    }

    #[tokio::test]
    async fn colliding_folder_slugs_are_merged() {
        let library = FakeLibrary::new();
        library.add_folder("/portfolio", "Weddings");
        library.add_file("/portfolio/Weddings", "w1", "01.jpg");
        library.add_folder("/portfolio", "weddings ");
        library.add_file("/portfolio/weddings ", "w2", "02.jpg");

        let snapshot = RemoteSnapshot::collect(&library, "portfolio").await.unwrap();
        assert_eq!(snapshot.categories.len(), 1);
        assert_eq!(snapshot.images.len(), 2);
        assert!(snapshot.images.iter().all(|i| i.category_slug == "weddings"));
    }

    #[tokio::test]
    async fn first_run_mirrors_the_tree() {
        let store = Arc::new(MemoryStore::new());
        let library = Arc::new(seeded_library());

        let report = engine(&store, &library).run().await.unwrap();

        assert!(report.is_clean(), "{:?}", report.errors);
        assert_eq!(report.categories_added, 2);
        assert_eq!(report.items_added, 5);
        assert_eq!(report.categories_updated, 2);

        let family = store.category("family-portraits").unwrap();
        assert_eq!(family.name, "Family Portraits");
        assert_eq!(family.image_count, 2);
        assert_eq!(
            family.featured_image_url.as_deref(),
            Some(
                "https://ik.imagekit.io/demo/portfolio/family-portraits/01.jpg?tr=w-500,h-500,c-maintain_ar,q-90,e-sharpen,f-webp,f-auto,pr-true"
            )
        );

        let cover = store.item("l0").unwrap();
        assert_eq!(cover.sort_order, 0);
        assert_eq!(cover.alt_text.as_deref(), Some("Lifestyle photo cover"));
        assert_eq!(cover.file_path(), Some("/portfolio/Lifestyle/cover.jpg"));
        assert_eq!(store.item("l3").unwrap().subcategory.as_deref(), Some("beach"));
        assert_eq!(store.item("l4").unwrap().sort_order, 4);
    }

    #[tokio::test]
    async fn second_plan_is_empty() {
        let store = Arc::new(MemoryStore::new());
        let library = Arc::new(seeded_library());
        engine(&store, &library).run().await.unwrap();

        assert_eq!(replan(&store, &library).await, SyncPlan::default());

        let report = engine(&store, &library).run().await.unwrap();
        assert_eq!(report.changes(), 0);
    }

    #[tokio::test]
    async fn removed_files_are_soft_deleted_and_reactivated_on_return() {
        let store = Arc::new(MemoryStore::new());
        let library = Arc::new(seeded_library());
        let sync = engine(&store, &library);
        sync.run().await.unwrap();

        library.remove_file("f1");
        let report = sync.run().await.unwrap();
        assert_eq!(report.items_removed, 1);
        let removed = store.item("f1").unwrap();
        assert!(!removed.is_active);
        assert_eq!(store.item_count(), 5);
        let family = store.category("family-portraits").unwrap();
        assert_eq!(family.image_count, 1);
        assert!(family.featured_image_url.unwrap().contains("/02.jpg"));

        library.add_file("/portfolio/family-portraits", "f1", "01.jpg");
        let report = sync.run().await.unwrap();
        assert_eq!(report.items_reactivated, 1);
        assert_eq!(report.items_added, 0);
        let back = store.item("f1").unwrap();
        assert!(back.is_active);
        assert_eq!(back.id, removed.id);
    }

    #[tokio::test]
    async fn moved_files_update_their_placement() {
        let store = Arc::new(MemoryStore::new());
        let library = Arc::new(seeded_library());
        let sync = engine(&store, &library);
        sync.run().await.unwrap();

        library.remove_file("l0");
        library.add_file("/portfolio/Lifestyle/beach", "l0", "cover.jpg");
        let report = sync.run().await.unwrap();

        assert_eq!(report.items_moved, 1);
        let moved = store.item("l0").unwrap();
        assert_eq!(moved.subcategory.as_deref(), Some("beach"));
        assert_eq!(moved.file_path(), Some("/portfolio/Lifestyle/beach/cover.jpg"));
        assert!(moved.full_url.contains("/Lifestyle/beach/cover.jpg?tr="));
    }

    #[tokio::test]
    async fn orphaned_categories_are_deactivated_and_revived() {
        let store = Arc::new(MemoryStore::new());
        let library = Arc::new(seeded_library());
        engine(&store, &library).run().await.unwrap();

        let trimmed = Arc::new(FakeLibrary::new());
        trimmed.add_folder("/portfolio", "family-portraits");
        trimmed.add_file("/portfolio/family-portraits", "f1", "01.jpg");
        trimmed.add_file("/portfolio/family-portraits", "f2", "02.jpg");
        let report = engine(&store, &trimmed).run().await.unwrap();

        assert_eq!(report.categories_deactivated, 1);
        assert_eq!(report.items_removed, 3);
        let lifestyle = store.category("lifestyle").unwrap();
        assert!(!lifestyle.is_active);
        assert_eq!(lifestyle.image_count, 0);

        let report = engine(&store, &library).run().await.unwrap();
        assert_eq!(report.categories_reactivated, 1);
        assert_eq!(report.items_reactivated, 3);
        assert!(store.category("lifestyle").unwrap().is_active);
    }

    #[tokio::test]
    async fn row_failures_are_reported_without_aborting() {
        let store = Arc::new(MemoryStore::new());
        store.fail_inserts_for("f2");
        let library = Arc::new(seeded_library());

        let report = engine(&store, &library).run().await.unwrap();

        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("02.jpg"));
        assert_eq!(report.items_added, 4);
        assert!(store.item("f2").is_none());
    }

    #[tokio::test]
    async fn new_categories_sort_after_existing_ones() {
        let store = Arc::new(MemoryStore::new());
        store
            .create_category(&NewCategory {
                name: "Weddings".into(),
                slug: "weddings".into(),
                folder_path: "/portfolio/weddings".into(),
                sort_order: 7,
            })
            .await
            .unwrap();
        let library = Arc::new(seeded_library());
        library.add_folder("/portfolio", "weddings");

        let plan = replan(&store, &library).await;
        let created: Vec<(String, i32)> = plan
            .actions
            .iter()
            .filter_map(|a| match a {
                SyncAction::CreateCategory {
                    slug, sort_order, ..
                } => Some((slug.clone(), *sort_order)),
                _ => None,
            })
            .collect();
        assert_eq!(created, vec![
            ("family-portraits".to_string(), 8),
            ("lifestyle".to_string(), 9),
        ]);
    }

    #[tokio::test]
    async fn preview_does_not_write() {
        let store = Arc::new(MemoryStore::new());
        let library = Arc::new(seeded_library());

        let preview = engine(&store, &library).preview().await.unwrap();

        assert!(preview.summary.dry_run);
        assert_eq!(preview.summary.items_added, 5);
        assert_eq!(preview.actions.len(), 7);
        assert_eq!(store.item_count(), 0);
        assert!(store.category("lifestyle").is_none());
    }

    #[tokio::test]
    async fn health_reports_counts_and_reachability() {
        let store = Arc::new(MemoryStore::new());
        let library = Arc::new(seeded_library());
        let sync = engine(&store, &library);
        sync.run().await.unwrap();

        let health = sync.health().await;
        assert!(health.database);
        assert!(health.imagekit);
        assert_eq!(health.categories, 2);
        assert_eq!(health.items, 5);
        assert!(health.last_sync.is_some());

        let empty = engine(&store, &Arc::new(FakeLibrary::new())).health().await;
        assert!(!empty.imagekit);
        assert_eq!(empty.errors.len(), 1);
    }

    #[test]
    fn summary_counts_each_action_kind() {
        let plan = SyncPlan {
            actions: vec![
                SyncAction::UpdateItem {
                    id: Uuid::nil(),
                    category_slug: "family".into(),
                    subcategory: None,
                    filename: "01.jpg".into(),
                    file_path: "/portfolio/family/01.jpg".into(),
                    reactivate: true,
                    moved: false,
                },
                SyncAction::DeactivateItem {
                    id: Uuid::nil(),
                    filename: "02.jpg".into(),
                    file_id: "x".into(),
                },
            ],
        };
        let summary = plan.summary();
        assert_eq!(summary.items_updated, 1);
        assert_eq!(summary.items_reactivated, 1);
        assert_eq!(summary.items_moved, 0);
        assert_eq!(summary.items_removed, 1);
        assert_eq!(summary.changes(), 2);
    }

    #[tokio::test]
    async fn run_invalidates_the_attached_catalog() {
        let store = Arc::new(MemoryStore::new());
        let library = Arc::new(seeded_library());
        let catalog = PortfolioCatalog::new(store.clone(), std::time::Duration::from_secs(300));
        assert!(catalog.categories().await.unwrap().is_empty());

        engine(&store, &library)
            .with_catalog(catalog.clone())
            .run()
            .await
            .unwrap();

        let categories = catalog.categories().await.unwrap();
        let slugs: Vec<_> = categories.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(slugs, vec!["family-portraits", "lifestyle"]);
    }
}
