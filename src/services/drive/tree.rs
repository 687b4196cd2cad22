use std::sync::Arc;
use std::time::Instant;

use futures_util::future::{join_all, BoxFuture, FutureExt};
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::models::{DriveEntry, EntryMetadata, FolderNode, NodeStatus, ROOT_FOLDER_ID, UNKNOWN_FOLDER_NAME};
use super::client::StorageClient;
use super::enumerator::ChildEnumerator;
use super::throttle::RequestLimiter;

/// Materializes a depth-bounded folder tree.
///
/// Sibling folders are expanded concurrently. Every remote call takes a
/// permit from the shared limiter and releases it before recursing, so a
/// small limit cannot deadlock a deep tree. No failure propagates: a folder
/// whose metadata or listing fails keeps its place among its siblings with
/// status `errored`.
#[derive(Clone)]
pub struct TreeBuilder {
    client: Arc<dyn StorageClient>,
    enumerator: ChildEnumerator,
    limiter: RequestLimiter,
}

impl TreeBuilder {
    pub fn new(client: Arc<dyn StorageClient>, enumerator: ChildEnumerator, limiter: RequestLimiter) -> Self {
        Self {
            client,
            enumerator,
            limiter,
        }
    }

    /// Builds the tree rooted at `folder_id`, expanding at most `max_depth` levels.
    ///
    /// Failures are recorded on the node they affect, including a `folder_id`
    /// that no longer exists, which comes back as an `Unknown` folder.
    pub async fn build_tree(&self, folder_id: &str, max_depth: usize) -> Result<FolderNode> {
        let started = Instant::now();
        info!("🌳 Building folder tree from {} (max depth {})", folder_id, max_depth);

        let (node, metadata_failed) = if folder_id == ROOT_FOLDER_ID {
            (FolderNode::synthetic_root(), false)
        } else {
            match self.fetch_metadata(folder_id).await {
                Ok(metadata) => (FolderNode::from_metadata(metadata), false),
                Err(e) => {
                    warn!("⚠️ Failed to fetch metadata for folder {}: {}", folder_id, e);
                    (FolderNode::unknown_folder(folder_id), true)
                }
            }
        };

        let tree = self.expand(node, metadata_failed, max_depth, 0).await;
        info!(
            "✅ Built tree for {} with {} nodes in {:?}",
            folder_id,
            tree.node_count(),
            started.elapsed()
        );
        Ok(tree)
    }

    async fn fetch_metadata(&self, id: &str) -> Result<EntryMetadata> {
        let _permit = self.limiter.acquire().await;
        self.client.get_metadata(id).await
    }

    /// Builds the subtree for a folder discovered in its parent's listing.
    ///
    /// The name comes from the folder's own metadata; if that fetch fails the
    /// node is renamed `Unknown` like any other folder whose metadata is missing.
    async fn build_child(&self, entry: DriveEntry, max_depth: usize, depth: usize) -> FolderNode {
        let mut node = FolderNode::from_entry(entry);
        let metadata_failed = match self.fetch_metadata(&node.id).await {
            Ok(metadata) => {
                if !metadata.name.is_empty() {
                    node.name = metadata.name;
                }
                false
            }
            Err(e) => {
                warn!("⚠️ Failed to fetch metadata for folder '{}' ({}): {}", node.name, node.id, e);
                node.name = UNKNOWN_FOLDER_NAME.to_string();
                true
            }
        };

        self.expand(node, metadata_failed, max_depth, depth).await
    }

    /// Fills in `children` and `status` for a folder node at `depth`
    fn expand<'a>(
        &'a self,
        mut node: FolderNode,
        metadata_failed: bool,
        max_depth: usize,
        depth: usize,
    ) -> BoxFuture<'a, FolderNode> {
        async move {
            let degraded_status = if metadata_failed {
                NodeStatus::Errored
            } else {
                NodeStatus::Truncated
            };

            if depth >= max_depth {
                node.children = Some(Vec::new());
                node.status = Some(degraded_status);
                return node;
            }

            let children = match self.enumerator.enumerate_children(&node.id).await {
                Ok(children) => children,
                Err(e) => {
                    warn!("⚠️ Failed to list children of folder '{}' ({}): {}", node.name, node.id, e);
                    node.children = Some(Vec::new());
                    node.status = Some(NodeStatus::Errored);
                    return node;
                }
            };

            debug!(
                "Expanding '{}' at depth {}: {} subfolders",
                node.name,
                depth,
                children.folders.len()
            );

            // join_all keeps input order, so completion order never leaks into the result
            let mut expanded = join_all(
                children
                    .folders
                    .into_iter()
                    .map(|folder| self.build_child(folder, max_depth, depth + 1)),
            )
            .await;
            expanded.extend(children.files.into_iter().map(FolderNode::from_entry));

            node.children = Some(expanded);
            node.status = Some(if metadata_failed {
                NodeStatus::Errored
            } else if children.truncated {
                NodeStatus::Truncated
            } else {
                NodeStatus::Complete
            });
            node
        }
        .boxed()
    }
}
