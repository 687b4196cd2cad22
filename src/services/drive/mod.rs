// Drive service modules organized by functionality

pub mod client;
pub mod config;
pub mod connection;
pub mod enumerator;
pub mod resolver;
pub mod service;
pub mod throttle;
pub mod tree;

// Re-export main types for convenience
pub use client::{DriveClient, StorageClient};
pub use config::{ConcurrencyConfig, DriveConfig, PageMode};
pub use connection::DriveConnection;
pub use enumerator::{ChildEnumerator, Children};
pub use resolver::{PathResolver, SegmentLocks};
pub use service::{build_tree, list_folder_files, resolve_or_create_path, ArchiveService};
pub use throttle::RequestLimiter;
pub use tree::TreeBuilder;
