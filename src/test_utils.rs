//! In-memory storage backend for unit and integration tests
//!
//! `InMemoryDrive` implements `StorageClient` over a flat entry table. It can
//! inject failures per folder or per name, simulate per-call latency, slice
//! listings into pages, and records every call so tests can assert on call
//! order and on the peak number of concurrent requests.
//!
//! Reads take their snapshot before the simulated latency and creates insert
//! after it, so two concurrent resolvers that both look up a missing folder
//! are guaranteed to both miss it.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::{DriveError, Result};
use crate::models::{DriveEntry, EntryFilter, EntryMetadata, ListPage, FOLDER_MIME_TYPE, ROOT_FOLDER_ID};
use crate::services::drive::StorageClient;

/// A call received by the in-memory drive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveCall {
    List {
        parent_id: String,
        page_token: Option<String>,
    },
    Create {
        name: String,
        parent_id: String,
        id: String,
    },
    Metadata {
        id: String,
    },
}

#[derive(Debug, Clone)]
struct StoredEntry {
    parent_id: String,
    entry: DriveEntry,
}

#[derive(Debug, Default)]
struct DriveState {
    entries: Vec<StoredEntry>,
    next_id: u64,
    failing_listings: HashSet<String>,
    failing_metadata: HashSet<String>,
    failing_creates: HashSet<String>,
    calls: Vec<DriveCall>,
}

impl DriveState {
    fn allocate_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct InMemoryDrive {
    state: Mutex<DriveState>,
    page_size: usize,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl Default for InMemoryDrive {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDrive {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DriveState::default()),
            page_size: 100,
            latency: None,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Every call sleeps this long before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn state(&self) -> MutexGuard<'_, DriveState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_folder(&self, parent_id: &str, name: &str) -> String {
        let mut state = self.state();
        let id = state.allocate_id("fld");
        state.entries.push(StoredEntry {
            parent_id: parent_id.to_string(),
            entry: DriveEntry::folder(id.clone(), name),
        });
        id
    }

    pub fn add_file(&self, parent_id: &str, name: &str, created_time: Option<DateTime<Utc>>) -> String {
        let mut state = self.state();
        let id = state.allocate_id("file");
        let mut entry = DriveEntry::file(id.clone(), name, "application/pdf", created_time);
        entry.web_view_link = Some(format!("https://drive.test/file/{}/view", id));
        state.entries.push(StoredEntry {
            parent_id: parent_id.to_string(),
            entry,
        });
        id
    }

    /// Listing children of `folder_id` fails with a 500
    pub fn fail_listing(&self, folder_id: &str) {
        self.state().failing_listings.insert(folder_id.to_string());
    }

    pub fn heal_listing(&self, folder_id: &str) {
        self.state().failing_listings.remove(folder_id);
    }

    /// Metadata lookups of `id` fail with a 503
    pub fn fail_metadata(&self, id: &str) {
        self.state().failing_metadata.insert(id.to_string());
    }

    /// Creating a folder called `name` fails with a 403
    pub fn fail_create(&self, name: &str) {
        self.state().failing_creates.insert(name.to_string());
    }

    pub fn heal_create(&self, name: &str) {
        self.state().failing_creates.remove(name);
    }

    pub fn calls(&self) -> Vec<DriveCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// `(name, parent_id, id)` of every folder created through the client, in order
    pub fn created_folders(&self) -> Vec<(String, String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DriveCall::Create { name, parent_id, id } => Some((name, parent_id, id)),
                _ => None,
            })
            .collect()
    }

    pub fn metadata_requests(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DriveCall::Metadata { id } => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn list_requests(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, DriveCall::List { .. }))
            .count()
    }

    /// Ids of every folder called `name` directly under `parent_id`
    pub fn folders_named(&self, parent_id: &str, name: &str) -> Vec<String> {
        self.state()
            .entries
            .iter()
            .filter(|stored| {
                stored.parent_id == parent_id && stored.entry.is_folder() && stored.entry.name == name
            })
            .map(|stored| stored.entry.id.clone())
            .collect()
    }

    /// Highest number of calls that were in progress at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(&self.in_flight)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn list_now(&self, parent_id: &str, filter: EntryFilter, page_token: Option<&str>) -> Result<ListPage> {
        let mut state = self.state();
        state.calls.push(DriveCall::List {
            parent_id: parent_id.to_string(),
            page_token: page_token.map(str::to_string),
        });

        if state.failing_listings.contains(parent_id) {
            return Err(DriveError::remote_api(500, format!("injected listing failure for {}", parent_id)));
        }

        let offset = match page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| DriveError::remote_api(400, "Invalid page token"))?,
            None => 0,
        };

        let matching: Vec<DriveEntry> = state
            .entries
            .iter()
            .filter(|stored| stored.parent_id == parent_id && filter.accepts(&stored.entry))
            .map(|stored| stored.entry.clone())
            .collect();

        let end = (offset + self.page_size).min(matching.len());
        let entries = matching.get(offset..end).map(<[DriveEntry]>::to_vec).unwrap_or_default();
        let next_page_token = (end < matching.len()).then(|| end.to_string());

        Ok(ListPage {
            entries,
            next_page_token,
        })
    }

    fn metadata_now(&self, id: &str) -> Result<EntryMetadata> {
        let mut state = self.state();
        state.calls.push(DriveCall::Metadata { id: id.to_string() });

        if state.failing_metadata.contains(id) {
            return Err(DriveError::remote_api(503, format!("injected metadata failure for {}", id)));
        }

        if id == ROOT_FOLDER_ID {
            return Ok(EntryMetadata {
                id: id.to_string(),
                name: "My Drive".to_string(),
                mime_type: FOLDER_MIME_TYPE.to_string(),
            });
        }

        state
            .entries
            .iter()
            .find(|stored| stored.entry.id == id)
            .map(|stored| EntryMetadata {
                id: stored.entry.id.clone(),
                name: stored.entry.name.clone(),
                mime_type: stored.entry.mime_type.clone(),
            })
            .ok_or_else(|| DriveError::not_found(id))
    }

    fn create_now(&self, name: &str, parent_id: &str) -> Result<String> {
        let mut state = self.state();
        if state.failing_creates.contains(name) {
            return Err(DriveError::remote_api(403, format!("injected create failure for {}", name)));
        }

        let id = state.allocate_id("fld");
        state.entries.push(StoredEntry {
            parent_id: parent_id.to_string(),
            entry: DriveEntry::folder(id.clone(), name),
        });
        state.calls.push(DriveCall::Create {
            name: name.to_string(),
            parent_id: parent_id.to_string(),
            id: id.clone(),
        });
        Ok(id)
    }
}

#[async_trait]
impl StorageClient for InMemoryDrive {
    async fn list_children(
        &self,
        parent_id: &str,
        filter: EntryFilter,
        page_token: Option<&str>,
    ) -> Result<ListPage> {
        let _in_flight = self.enter();
        let result = self.list_now(parent_id, filter, page_token);
        self.simulate_latency().await;
        result
    }

    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String> {
        let _in_flight = self.enter();
        self.simulate_latency().await;
        self.create_now(name, parent_id)
    }

    async fn get_metadata(&self, id: &str) -> Result<EntryMetadata> {
        let _in_flight = self.enter();
        let result = self.metadata_now(id);
        self.simulate_latency().await;
        result
    }
}
