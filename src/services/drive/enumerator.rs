use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::Result;
use crate::models::{DriveEntry, EntryFilter};
use super::client::StorageClient;
use super::config::PageMode;
use super::throttle::RequestLimiter;

/// Immediate contents of one folder, already ordered
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Children {
    /// Ascending by name, case-insensitive
    pub folders: Vec<DriveEntry>,
    /// Newest first; entries without a creation time last
    pub files: Vec<DriveEntry>,
    /// A continuation token was left unfollowed
    pub truncated: bool,
}

/// Sorts folders by name, ignoring case. Stable for equal names.
pub fn order_folders(folders: &mut [DriveEntry]) {
    folders.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
}

/// Sorts files by creation time, newest first. Stable for equal times.
pub fn order_files(files: &mut [DriveEntry]) {
    files.sort_by(|a, b| b.created_time.cmp(&a.created_time));
}

/// Lists and partitions the direct children of a folder. Does not recurse.
#[derive(Clone)]
pub struct ChildEnumerator {
    client: Arc<dyn StorageClient>,
    page_mode: PageMode,
    limiter: RequestLimiter,
}

impl ChildEnumerator {
    pub fn new(client: Arc<dyn StorageClient>, page_mode: PageMode, limiter: RequestLimiter) -> Self {
        Self {
            client,
            page_mode,
            limiter,
        }
    }

    pub async fn enumerate_children(&self, folder_id: &str) -> Result<Children> {
        let (entries, truncated) = self.collect_pages(folder_id, EntryFilter::All).await?;

        let (mut folders, mut files): (Vec<_>, Vec<_>) =
            entries.into_iter().partition(DriveEntry::is_folder);
        order_folders(&mut folders);
        order_files(&mut files);

        debug!(
            "Folder {}: {} folders, {} files{}",
            folder_id,
            folders.len(),
            files.len(),
            if truncated { " (truncated)" } else { "" }
        );

        Ok(Children {
            folders,
            files,
            truncated,
        })
    }

    /// Files directly inside `folder_id`, newest first
    pub async fn list_folder_files(&self, folder_id: &str) -> Result<Vec<DriveEntry>> {
        let (entries, truncated) = self.collect_pages(folder_id, EntryFilter::Files).await?;
        if truncated {
            warn!("File listing for folder {} stopped at the page cap", folder_id);
        }

        let mut files: Vec<DriveEntry> = entries.into_iter().filter(|e| !e.is_folder()).collect();
        order_files(&mut files);
        Ok(files)
    }

    async fn collect_pages(&self, folder_id: &str, filter: EntryFilter) -> Result<(Vec<DriveEntry>, bool)> {
        let max_pages = match self.page_mode {
            PageMode::SinglePage => 1,
            PageMode::FollowCursor { max_pages } => max_pages.max(1),
        };

        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0;

        loop {
            let page = {
                let _permit = self.limiter.acquire().await;
                self.client
                    .list_children(folder_id, filter, page_token.as_deref())
                    .await?
            };
            pages += 1;

            let next = page.continuation().map(str::to_string);
            entries.extend(page.entries.into_iter().filter(|e| filter.accepts(e)));

            match next {
                Some(token) if pages < max_pages => page_token = Some(token),
                Some(_) => return Ok((entries, true)),
                None => return Ok((entries, false)),
            }
        }
    }
}
