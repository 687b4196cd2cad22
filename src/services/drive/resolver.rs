use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};

use crate::errors::{DriveError, Result};
use super::client::StorageClient;

type SegmentKey = (String, String);

/// In-process advisory locks keyed by `(parent_id, name)`.
///
/// Resolvers that share one registry serialize the find-then-create step for
/// the same segment, so they never create the same folder twice. Resolvers in
/// other processes are not covered. An entry lives only while some resolver
/// holds or waits for it.
#[derive(Debug, Default)]
pub struct SegmentLocks {
    locks: Mutex<HashMap<SegmentKey, Arc<tokio::sync::Mutex<()>>>>,
}

/// Held for the find-then-create of one segment; releases its entry on drop
struct SegmentGuard {
    guard: Option<OwnedMutexGuard<()>>,
    registry: Arc<SegmentLocks>,
    key: SegmentKey,
}

impl Drop for SegmentGuard {
    fn drop(&mut self) {
        self.guard.take();
        self.registry.release(&self.key);
    }
}

impl SegmentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<SegmentKey, Arc<tokio::sync::Mutex<()>>>> {
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn acquire(registry: &Arc<Self>, parent_id: &str, name: &str) -> SegmentGuard {
        let key = (parent_id.to_string(), name.to_string());
        let lock = registry.registry().entry(key.clone()).or_default().clone();

        SegmentGuard {
            guard: Some(lock.lock_owned().await),
            registry: Arc::clone(registry),
            key,
        }
    }

    /// Drops the entry for `key` once the registry holds the only reference
    fn release(&self, key: &SegmentKey) {
        let mut locks = self.registry();
        if locks.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(key);
        }
    }

    /// Number of segments currently locked or waited on
    pub fn len(&self) -> usize {
        self.registry().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Walks a chain of folder names, creating whatever is missing.
///
/// Each step depends on the id produced by the previous one, so the walk is
/// strictly sequential. Any failure aborts the whole resolution; folders
/// created before the failure stay in place, which makes naive retries able
/// to create duplicates when the lookup itself was what failed.
pub struct PathResolver {
    client: Arc<dyn StorageClient>,
    locks: Option<Arc<SegmentLocks>>,
}

impl PathResolver {
    pub fn new(client: Arc<dyn StorageClient>) -> Self {
        Self { client, locks: None }
    }

    pub fn with_segment_locks(mut self, locks: Arc<SegmentLocks>) -> Self {
        self.locks = Some(locks);
        self
    }

    /// Resolves `segments` below `parent_id` and returns the id of the last one
    pub async fn resolve_or_create_path<S: AsRef<str>>(
        &self,
        parent_id: &str,
        segments: &[S],
    ) -> Result<String> {
        if let Some(position) = segments.iter().position(|s| s.as_ref().trim().is_empty()) {
            return Err(DriveError::invalid_path(format!(
                "segment {} is empty",
                position + 1
            )));
        }

        let mut current = parent_id.to_string();
        for segment in segments {
            current = self.resolve_segment(&current, segment.as_ref()).await?;
        }

        debug!("Resolved {} segment(s) under {} to {}", segments.len(), parent_id, current);
        Ok(current)
    }

    async fn resolve_segment(&self, parent_id: &str, name: &str) -> Result<String> {
        let _guard = match &self.locks {
            Some(locks) => Some(SegmentLocks::acquire(locks, parent_id, name).await),
            None => None,
        };

        if let Some(existing) = self.client.find_folder(parent_id, name).await? {
            debug!("Found folder '{}' under {}: {}", name, parent_id, existing);
            return Ok(existing);
        }

        let created = self.client.create_folder(name, parent_id).await?;
        info!("📁 Created folder '{}' under {} ({})", name, parent_id, created);
        Ok(created)
    }
}
