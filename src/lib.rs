//! Archive folder taxonomy over Google Drive.
//!
//! Two operations sit on top of a narrow storage client:
//!
//! - **Path resolution**: find or create a chain of folders such as
//!   `facturas / 2024 / 01ENERO / facturas_emitidas` and return the last id.
//! - **Tree materialization**: expand a folder into an ordered, depth-bounded
//!   tree, with concurrent sibling expansion under a shared request cap and
//!   per-branch failure isolation.
//!
//! Credentials, HTTP routes and uploads live outside this crate; callers hand
//! in an authenticated [`StorageClient`](services::drive::StorageClient).

pub mod config;
pub mod errors;
pub mod models;
pub mod services;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use errors::{DriveError, Result};
pub use models::{
    ArchivePath, DocumentKind, DriveEntry, EntryFilter, EntryMetadata, FolderNode, ListPage,
    NodeStatus,
};
pub use services::drive::{
    ArchiveService, ConcurrencyConfig, DriveClient, DriveConfig, PageMode, SegmentLocks,
    StorageClient,
};
