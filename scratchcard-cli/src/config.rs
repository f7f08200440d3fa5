use scratchcard_core::config::store_slug_from_url;
use scratchcard_core::SyncConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub data_dir: PathBuf,
    pub verbose: bool,
    pub sync: SyncConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("scratchcard"),
            verbose: false,
            sync: SyncConfig::default(),
        }
    }
}

impl CliConfig {
    /// Environment first, then command-line flags on top.
    pub fn resolve(
        data_dir: Option<PathBuf>,
        verbose: bool,
        store: Option<String>,
        remote_url: Option<String>,
    ) -> Self {
        let mut config = Self {
            sync: SyncConfig::from_env(),
            verbose,
            ..Self::default()
        };

        if let Some(data_dir) = data_dir {
            config.data_dir = data_dir;
        }
        if let Some(store) = store {
            config.sync.store_slug = if store.contains("://") {
                store_slug_from_url(&store)
            } else {
                store
            };
        }
        if let Some(url) = remote_url {
            config.sync.remote_url = Some(url);
        }

        config
    }
}
