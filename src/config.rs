use anyhow::{anyhow, Result};
use std::env;

use crate::services::drive::{ConcurrencyConfig, DriveConfig, PageMode};
use crate::services::drive::config::DEFAULT_API_BASE_URL;

/// Settings for the command-line front end, read from the environment.
///
/// The library itself never reads the environment; this struct is turned
/// into explicit `DriveConfig` and `ConcurrencyConfig` values at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub access_token: String,
    pub api_base_url: String,
    pub page_size: u32,
    pub timeout_seconds: u64,
    pub max_in_flight_requests: usize,
    pub max_pages: Option<usize>,
    pub request_deadline_seconds: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `max_pages = 1` means single-page listings
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_token = lookup("DRIVE_ACCESS_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| anyhow!("DRIVE_ACCESS_TOKEN must be set"))?;

        Ok(Config {
            access_token,
            api_base_url: lookup("DRIVE_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            page_size: parse_or(&lookup, "DRIVE_PAGE_SIZE", 100)?,
            timeout_seconds: parse_or(&lookup, "DRIVE_TIMEOUT_SECONDS", 30)?,
            max_in_flight_requests: parse_or(&lookup, "DRIVE_MAX_IN_FLIGHT", 8)?,
            max_pages: lookup("DRIVE_MAX_PAGES")
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| anyhow!("Invalid DRIVE_MAX_PAGES: {}", e))?,
            request_deadline_seconds: lookup("DRIVE_REQUEST_DEADLINE_SECONDS")
                .map(|s| s.trim().parse())
                .transpose()
                .map_err(|e| anyhow!("Invalid DRIVE_REQUEST_DEADLINE_SECONDS: {}", e))?,
        })
    }

    pub fn drive_config(&self) -> DriveConfig {
        DriveConfig {
            api_base_url: self.api_base_url.clone(),
            access_token: self.access_token.clone(),
            page_size: self.page_size,
            timeout_seconds: self.timeout_seconds,
        }
    }

    pub fn concurrency_config(&self) -> ConcurrencyConfig {
        let page_mode = match self.max_pages {
            Some(1) => PageMode::SinglePage,
            Some(max_pages) => PageMode::FollowCursor { max_pages },
            None => ConcurrencyConfig::default().page_mode,
        };

        ConcurrencyConfig {
            max_in_flight_requests: self.max_in_flight_requests,
            page_mode,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid {}: {}", key, e)),
        None => Ok(default),
    }
}
