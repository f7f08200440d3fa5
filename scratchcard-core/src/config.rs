use crate::error::{Result, ScratchError};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_STORE_SLUG: &str = "default";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the remote store; `None` runs local-only.
    pub remote_url: Option<String>,
    pub remote_key: Option<String>,
    /// Which store's records to read and write.
    pub store_slug: String,
    pub poll_interval: Duration,
    /// Upper bound on one remote request; a stalled read counts as failed.
    pub request_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote_url: None,
            remote_key: None,
            store_slug: DEFAULT_STORE_SLUG.to_string(),
            poll_interval: Duration::from_secs(15),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("SCRATCH_REMOTE_URL") {
            config.remote_url = Some(url).filter(|u| !u.is_empty());
        }
        if let Ok(key) = std::env::var("SCRATCH_REMOTE_KEY") {
            config.remote_key = Some(key).filter(|k| !k.is_empty());
        }
        if let Ok(store) = std::env::var("SCRATCH_STORE") {
            if !store.is_empty() {
                config.store_slug = store;
            }
        }
        if let Ok(secs) = std::env::var("SCRATCH_POLL_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) => config.poll_interval = Duration::from_secs(secs),
                Err(_) => tracing::warn!("Ignoring invalid SCRATCH_POLL_SECS: {}", secs),
            }
        }
        if let Ok(secs) = std::env::var("SCRATCH_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) => config.request_timeout = Duration::from_secs(secs),
                Err(_) => tracing::warn!("Ignoring invalid SCRATCH_TIMEOUT_SECS: {}", secs),
            }
        }

        config
    }

    pub fn has_remote(&self) -> bool {
        self.remote_url.is_some() && self.remote_key.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        if self.store_slug.trim().is_empty() {
            return Err(ScratchError::config("Store slug cannot be empty"));
        }

        if self.poll_interval.is_zero() {
            return Err(ScratchError::config("Poll interval must be greater than 0"));
        }

        if self.request_timeout.is_zero() {
            return Err(ScratchError::config("Request timeout must be greater than 0"));
        }

        match (&self.remote_url, &self.remote_key) {
            (Some(url), Some(_)) => {
                Url::parse(url).map_err(ScratchError::invalid_url)?;
            }
            (Some(_), None) => {
                return Err(ScratchError::config("Remote URL set without an API key"));
            }
            _ => {}
        }

        Ok(())
    }
}

/// Store slug for a page URL: `?store=SLUG`, then the first host label
/// (hosting suffixes removed), then the default.
pub fn store_slug_from_url(url: &str) -> String {
    let Ok(url) = Url::parse(url) else {
        return DEFAULT_STORE_SLUG.to_string();
    };

    if let Some((_, slug)) = url.query_pairs().find(|(k, v)| k == "store" && !v.is_empty()) {
        return slug.into_owned();
    }

    let host = url.host_str().unwrap_or_default();
    let cleaned = host.replace(".netlify.app", "").replace(".vercel.app", "");

    match cleaned.split('.').next() {
        Some(first) if !first.is_empty() => first.to_string(),
        _ => DEFAULT_STORE_SLUG.to_string(),
    }
}
