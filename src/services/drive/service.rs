use std::sync::Arc;

use tracing::info;

use crate::errors::Result;
use crate::models::{ArchivePath, DriveEntry, FolderNode, ARCHIVE_ROOT_NAME, ROOT_FOLDER_ID};
use super::client::{DriveClient, StorageClient};
use super::config::{ConcurrencyConfig, DriveConfig};
use super::enumerator::{ChildEnumerator, Children};
use super::resolver::{PathResolver, SegmentLocks};
use super::throttle::RequestLimiter;
use super::tree::TreeBuilder;

/// Main archive service that coordinates the drive operations.
///
/// One instance wraps one authenticated client. All traversals started from
/// it share a single request limiter.
pub struct ArchiveService {
    resolver: PathResolver,
    enumerator: ChildEnumerator,
    tree_builder: TreeBuilder,
    concurrency_config: ConcurrencyConfig,
}

impl ArchiveService {
    /// Creates a service with default concurrency limits
    pub fn new(client: Arc<dyn StorageClient>) -> Self {
        Self::build(client, ConcurrencyConfig::default())
    }

    /// Creates a service with custom concurrency limits
    pub fn new_with_config(client: Arc<dyn StorageClient>, concurrency_config: ConcurrencyConfig) -> Result<Self> {
        concurrency_config.validate()?;
        Ok(Self::build(client, concurrency_config))
    }

    /// Creates a service talking to the Drive REST API
    pub fn from_drive_config(config: DriveConfig, concurrency_config: ConcurrencyConfig) -> Result<Self> {
        let client: Arc<dyn StorageClient> = Arc::new(DriveClient::new(config)?);
        Self::new_with_config(client, concurrency_config)
    }

    fn build(client: Arc<dyn StorageClient>, concurrency_config: ConcurrencyConfig) -> Self {
        let limiter = RequestLimiter::new(concurrency_config.max_in_flight_requests);
        let enumerator = ChildEnumerator::new(client.clone(), concurrency_config.page_mode, limiter.clone());
        let tree_builder = TreeBuilder::new(client.clone(), enumerator.clone(), limiter);

        Self {
            resolver: PathResolver::new(client),
            enumerator,
            tree_builder,
            concurrency_config,
        }
    }

    /// Serializes folder creation with every other resolver sharing `locks`
    pub fn with_segment_locks(mut self, locks: Arc<SegmentLocks>) -> Self {
        self.resolver = self.resolver.with_segment_locks(locks);
        self
    }

    pub fn concurrency_config(&self) -> &ConcurrencyConfig {
        &self.concurrency_config
    }

    /// Finds or creates each segment in turn below `parent_id`.
    ///
    /// May create folders as a side effect. Not safe to retry blindly: if a
    /// lookup fails after an earlier create succeeded, a retry can create the
    /// same folder again.
    pub async fn resolve_or_create_path<S: AsRef<str>>(&self, parent_id: &str, segments: &[S]) -> Result<String> {
        self.resolver.resolve_or_create_path(parent_id, segments).await
    }

    /// Files directly inside a folder, newest first
    pub async fn list_folder_files(&self, folder_id: &str) -> Result<Vec<DriveEntry>> {
        self.enumerator.list_folder_files(folder_id).await
    }

    /// Ordered folders and files directly inside a folder
    pub async fn enumerate_children(&self, folder_id: &str) -> Result<Children> {
        self.enumerator.enumerate_children(folder_id).await
    }

    pub async fn build_tree(&self, root_folder_id: &str, max_depth: usize) -> Result<FolderNode> {
        self.tree_builder.build_tree(root_folder_id, max_depth).await
    }

    /// Id of the archive root folder under the drive root, created on first use
    pub async fn archive_root_id(&self) -> Result<String> {
        self.resolve_or_create_path(ROOT_FOLDER_ID, &[ARCHIVE_ROOT_NAME]).await
    }

    /// Id of the document-type folder for `path`, creating missing levels
    pub async fn resolve_archive_folder(&self, path: &ArchivePath) -> Result<String> {
        info!("🔍 Resolving archive folder {}", path);
        let segments = path.segments();
        self.resolve_or_create_path(ROOT_FOLDER_ID, segments.as_slice()).await
    }

    /// Tree of the whole archive, starting at the archive root
    pub async fn archive_tree(&self, max_depth: usize) -> Result<FolderNode> {
        let archive_root = self.archive_root_id().await?;
        self.build_tree(&archive_root, max_depth).await
    }
}

/// Resolves `segments` below `parent_id` with a one-off service
pub async fn resolve_or_create_path<S: AsRef<str>>(
    client: Arc<dyn StorageClient>,
    parent_id: &str,
    segments: &[S],
) -> Result<String> {
    ArchiveService::new(client).resolve_or_create_path(parent_id, segments).await
}

/// Lists the files of a folder with a one-off service
pub async fn list_folder_files(client: Arc<dyn StorageClient>, folder_id: &str) -> Result<Vec<DriveEntry>> {
    ArchiveService::new(client).list_folder_files(folder_id).await
}

/// Builds a tree with a one-off service
pub async fn build_tree(client: Arc<dyn StorageClient>, root_folder_id: &str, max_depth: usize) -> Result<FolderNode> {
    ArchiveService::new(client).build_tree(root_folder_id, max_depth).await
}
