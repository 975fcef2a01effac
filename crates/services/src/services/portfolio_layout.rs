//! How image-host paths map onto categories, subcategories and delivery URLs.

use chrono::{DateTime, Utc};
use serde_json::json;
use utils::text::{leading_number, strip_extension};

const THUMBNAIL_TRANSFORM: &str = "tr=w-500,h-500,c-maintain_ar,q-90,e-sharpen,f-webp,f-auto,pr-true";
const FULL_TRANSFORM: &str = "tr=q-95,e-sharpen,f-webp,f-auto,pr-true";

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Location of a file below the portfolio root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioPath {
    pub category_folder: String,
    pub subcategory: Option<String>,
    pub filename: String,
}

impl PortfolioPath {
    /// Accepts `/<root>/<category>/<file>` and deeper paths. The subcategory is
    /// the folder directly below the category, whatever the depth of the file.
    pub fn parse(root: &str, file_path: &str) -> Option<Self> {
        let parts = segments(file_path);
        let (first, rest) = parts.split_first()?;
        if *first != root || rest.len() < 2 {
            return None;
        }
        let filename = rest.last()?.to_string();
        let subcategory = (rest.len() >= 3).then(|| rest[1].to_string());
        Some(Self {
            category_folder: rest[0].to_string(),
            subcategory,
            filename,
        })
    }
}

/// A folder below the portfolio root, as reported by folder events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioFolder {
    pub category_folder: String,
    /// True for subfolders of a category rather than the category itself.
    pub nested: bool,
}

impl PortfolioFolder {
    pub fn parse(root: &str, folder_path: &str) -> Option<Self> {
        let parts = segments(folder_path);
        match parts.as_slice() {
            [first, category, rest @ ..] if *first == root => Some(Self {
                category_folder: category.to_string(),
                nested: !rest.is_empty(),
            }),
            _ => None,
        }
    }
}

pub fn category_folder_path(root: &str, folder: &str) -> String {
    format!("/{root}/{folder}")
}

/// Delivery URLs for one stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUrls {
    pub original: String,
    pub thumbnail: String,
    pub full: String,
}

impl ImageUrls {
    /// `public_url` must end with `/`.
    pub fn for_path(public_url: &str, file_path: &str) -> Self {
        let original = format!("{public_url}{}", file_path.trim_start_matches('/'));
        Self {
            thumbnail: format!("{original}?{THUMBNAIL_TRANSFORM}"),
            full: format!("{original}?{FULL_TRANSFORM}"),
            original,
        }
    }
}

pub fn alt_text(category_name: &str, filename: &str) -> String {
    format!("{category_name} photo {}", strip_extension(filename))
}

pub fn item_sort_order(filename: &str, fallback: i32) -> i32 {
    leading_number(filename).unwrap_or(fallback)
}

pub fn item_metadata(file_path: &str, synced_at: DateTime<Utc>) -> serde_json::Value {
    json!({
        "file_path": file_path,
        "synced_at": synced_at.to_rfc3339(),
    })
}
