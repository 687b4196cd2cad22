use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::errors::{DriveError, Result};
use crate::models::{EntryFilter, EntryMetadata, ListPage, FOLDER_MIME_TYPE};
use super::config::DriveConfig;
use super::connection::DriveConnection;

const LIST_FIELDS: &str =
    "nextPageToken, files(id, name, mimeType, webViewLink, thumbnailLink, createdTime)";
const FIND_FIELDS: &str = "nextPageToken, files(id, name)";
const METADATA_FIELDS: &str = "id, name, mimeType";

/// Capabilities the archive core needs from a hierarchical storage backend.
///
/// Implementations are bound to one authenticated principal, hold no state
/// the core manages, and must tolerate concurrent calls from many branches
/// of the same traversal. No call is retried.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Lists one page of the children of `parent_id`
    async fn list_children(
        &self,
        parent_id: &str,
        filter: EntryFilter,
        page_token: Option<&str>,
    ) -> Result<ListPage>;

    /// Creates a folder and returns its id
    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String>;

    /// Fetches name and type of one entry; `DriveError::NotFound` if it does not exist
    async fn get_metadata(&self, id: &str) -> Result<EntryMetadata>;

    /// Finds a child folder by exact name, returning the first match.
    ///
    /// The default walks every page of the folder listing; backends with a
    /// name query should override it.
    async fn find_folder(&self, parent_id: &str, name: &str) -> Result<Option<String>> {
        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .list_children(parent_id, EntryFilter::Folders, page_token.as_deref())
                .await?;

            if let Some(found) = page.entries.iter().find(|entry| entry.is_folder() && entry.name == name) {
                return Ok(Some(found.id.clone()));
            }

            match page.continuation() {
                Some(next) => page_token = Some(next.to_string()),
                None => return Ok(None),
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedEntry {
    id: String,
}

/// `StorageClient` backed by the Google Drive v3 REST API
#[derive(Debug, Clone)]
pub struct DriveClient {
    connection: DriveConnection,
}

impl DriveClient {
    pub fn new(config: DriveConfig) -> Result<Self> {
        Ok(Self {
            connection: DriveConnection::new(config)?,
        })
    }

    pub fn config(&self) -> &DriveConfig {
        self.connection.config()
    }

    fn page_size(&self) -> String {
        self.connection.config().page_size.to_string()
    }
}

/// Escapes a value for use inside a single-quoted Drive query string
pub fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Drive query selecting the untrashed children of `parent_id`
pub fn children_query(parent_id: &str, filter: EntryFilter) -> String {
    let mut query = format!("'{}' in parents and trashed = false", escape_query_value(parent_id));
    match filter {
        EntryFilter::Folders => query.push_str(&format!(" and mimeType = '{}'", FOLDER_MIME_TYPE)),
        EntryFilter::Files => query.push_str(&format!(" and mimeType != '{}'", FOLDER_MIME_TYPE)),
        EntryFilter::All => {}
    }
    query
}

#[async_trait]
impl StorageClient for DriveClient {
    async fn list_children(
        &self,
        parent_id: &str,
        filter: EntryFilter,
        page_token: Option<&str>,
    ) -> Result<ListPage> {
        let order_by = match filter {
            EntryFilter::Files => "createdTime desc",
            EntryFilter::Folders | EntryFilter::All => "folder,name",
        };

        let mut query = vec![
            ("q", children_query(parent_id, filter)),
            ("fields", LIST_FIELDS.to_string()),
            ("orderBy", order_by.to_string()),
            ("pageSize", self.page_size()),
            ("spaces", "drive".to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }

        let page: ListPage = self
            .connection
            .get_json(&self.connection.config().files_url(), &query)
            .await?;

        debug!(
            "Listed {} entries under {} (more pages: {})",
            page.entries.len(),
            parent_id,
            page.continuation().is_some()
        );
        Ok(page)
    }

    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String> {
        let body = json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
            "parents": [parent_id],
        });

        let created: CreatedEntry = self
            .connection
            .post_json(
                &self.connection.config().files_url(),
                &[("fields", "id".to_string())],
                &body,
            )
            .await?;

        debug!("Created folder '{}' under {} with id {}", name, parent_id, created.id);
        Ok(created.id)
    }

    async fn get_metadata(&self, id: &str) -> Result<EntryMetadata> {
        self.connection
            .get_json(
                &self.connection.config().file_url(id),
                &[("fields", METADATA_FIELDS.to_string())],
            )
            .await
            .map_err(|e| match e {
                DriveError::RemoteApi { status: 404, .. } => DriveError::not_found(id),
                other => other,
            })
    }

    async fn find_folder(&self, parent_id: &str, name: &str) -> Result<Option<String>> {
        let query = format!(
            "name = '{}' and {}",
            escape_query_value(name),
            children_query(parent_id, EntryFilter::Folders)
        );

        let page: ListPage = self
            .connection
            .get_json(
                &self.connection.config().files_url(),
                &[
                    ("q", query),
                    ("fields", FIND_FIELDS.to_string()),
                    ("pageSize", self.page_size()),
                    ("spaces", "drive".to_string()),
                ],
            )
            .await?;

        Ok(page.entries.into_iter().next().map(|entry| entry.id))
    }
}
