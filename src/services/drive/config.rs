use std::time::Duration;

use crate::errors::{DriveError, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/drive/v3";

/// Largest page the Drive API accepts for `files.list`
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Connection settings for one authenticated drive session.
///
/// Built once by the caller and handed to the client; nothing in the library
/// reads process-global state.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub api_base_url: String,
    pub access_token: String,
    pub page_size: u32,
    pub timeout_seconds: u64,
}

/// How many pages a single folder listing may consume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    /// Only the first page is read; larger folders are reported as truncated
    SinglePage,
    /// Follow continuation tokens, stopping after `max_pages`
    FollowCursor { max_pages: usize },
}

/// Concurrency and pagination limits for a traversal
#[derive(Debug, Clone)]
pub struct ConcurrencyConfig {
    /// Cap on remote requests in flight at once, shared by every branch
    pub max_in_flight_requests: usize,
    pub page_mode: PageMode,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_in_flight_requests: 8,
            page_mode: PageMode::FollowCursor { max_pages: 50 },
        }
    }
}

impl ConcurrencyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_in_flight_requests == 0 {
            return Err(DriveError::config("max_in_flight_requests must be at least 1"));
        }

        if let PageMode::FollowCursor { max_pages: 0 } = self.page_mode {
            return Err(DriveError::config("max_pages must be at least 1"));
        }

        Ok(())
    }
}

impl DriveConfig {
    /// Creates a configuration for the public Drive v3 endpoint
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            access_token: access_token.into(),
            page_size: 100,
            timeout_seconds: 30,
        }
    }

    pub fn with_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.access_token.trim().is_empty() {
            return Err(DriveError::config("Access token cannot be empty"));
        }

        let url = url::Url::parse(&self.api_base_url)
            .map_err(|e| DriveError::config(format!("Invalid API base URL '{}': {}", self.api_base_url, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(DriveError::config("API base URL must start with http:// or https://"));
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(DriveError::config(format!(
                "Page size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        if self.timeout_seconds == 0 {
            return Err(DriveError::config("Timeout must be at least one second"));
        }

        Ok(())
    }

    /// URL of the `files` collection
    pub fn files_url(&self) -> String {
        format!("{}/files", self.api_base_url.trim_end_matches('/'))
    }

    /// URL of a single file resource
    pub fn file_url(&self, id: &str) -> String {
        format!("{}/{}", self.files_url(), urlencoding::encode(id))
    }

    /// Gets the timeout duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
