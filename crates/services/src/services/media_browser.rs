//! Live view of the portfolio folders straight from the image host.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utils::text::{display_name, leading_number};

use super::{
    imagekit::{ImageKitError, MediaLibrary, RemoteFile, RemoteFolder, partition_entries},
    portfolio_layout::ImageUrls,
};

#[derive(Debug, Error)]
pub enum MediaBrowserError {
    #[error("invalid folder name {0:?}")]
    InvalidFolder(String),
    #[error(transparent)]
    ImageKit(#[from] ImageKitError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct FolderSummary {
    pub id: String,
    pub name: String,
    pub path: String,
    pub folder_name: String,
}

impl FolderSummary {
    fn from_remote(folder: RemoteFolder) -> Self {
        Self {
            id: folder.name.to_lowercase(),
            name: display_name(&folder.name),
            path: folder.folder_path,
            folder_name: folder.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct BrowserImage {
    pub thumbnail_url: String,
    pub full_url: String,
    pub alt: String,
    pub file_name: String,
    pub file_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct FolderImages {
    pub images: Vec<BrowserImage>,
    pub subfolders: Option<Vec<FolderSummary>>,
    pub folder: String,
    pub subfolder: Option<String>,
}

fn check_segment(name: &str) -> Result<&str, MediaBrowserError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." || trimmed.contains('/') {
        return Err(MediaBrowserError::InvalidFolder(name.to_string()));
    }
    Ok(trimmed)
}

/// Files ordered by the number in their name; files without one come first.
fn sort_by_leading_number(files: &mut [RemoteFile]) {
    files.sort_by_key(|f| leading_number(&f.name).unwrap_or(0));
}

pub struct MediaBrowser {
    library: Arc<dyn MediaLibrary>,
    root: String,
    public_url: String,
}

impl MediaBrowser {
    pub fn new(
        library: Arc<dyn MediaLibrary>,
        root: impl Into<String>,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            library,
            root: root.into(),
            public_url: public_url.into(),
        }
    }

    pub async fn folders(&self) -> Result<Vec<FolderSummary>, MediaBrowserError> {
        let root_path = format!("/{}", self.root);
        let (_, folders) = partition_entries(self.library.list_folder(&root_path).await?);
        let mut folders: Vec<FolderSummary> = folders
            .into_iter()
            .map(|mut f| {
                if f.folder_path.is_empty() {
                    f.folder_path = format!("{root_path}/{}", f.name);
                }
                FolderSummary::from_remote(f)
            })
            .collect();
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(folders)
    }

    pub async fn folder_images(
        &self,
        folder: &str,
        subfolder: Option<&str>,
    ) -> Result<FolderImages, MediaBrowserError> {
        let folder = check_segment(folder)?;
        let subfolder = subfolder.map(check_segment).transpose()?;

        let path = match subfolder {
            Some(sub) => format!("/{}/{folder}/{sub}", self.root),
            None => format!("/{}/{folder}", self.root),
        };
        let (mut files, folders) = partition_entries(self.library.list_folder(&path).await?);
        sort_by_leading_number(&mut files);

        let label = subfolder.unwrap_or(folder);
        let images = files
            .into_iter()
            .map(|file| {
                let urls = ImageUrls::for_path(&self.public_url, &file.file_path);
                BrowserImage {
                    thumbnail_url: urls.thumbnail,
                    full_url: urls.full,
                    alt: format!("{label} photo {}", file.name),
                    file_name: file.name,
                    file_path: file.file_path,
                }
            })
            .collect();

        let subfolders = match subfolder {
            Some(_) => None,
            None => {
                let subfolders: Vec<FolderSummary> = folders
                    .into_iter()
                    .map(|mut f| {
                        if f.folder_path.is_empty() {
                            f.folder_path = format!("{path}/{}", f.name);
                        }
                        FolderSummary::from_remote(f)
                    })
                    .collect();
                (!subfolders.is_empty()).then_some(subfolders)
            }
        };

        Ok(FolderImages {
            images,
            subfolders,
            folder: folder.to_string(),
            subfolder: subfolder.map(str::to_string),
        })
    }
}
