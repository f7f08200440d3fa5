//! Scratch card core - data model, local cache and remote synchronization
//!
//! This library owns the records a scratch card store works with (store
//! configuration, prize pool, winner ledger), keeps a durable local copy of
//! them and mirrors that copy to a remote store.

pub mod config;
pub mod error;
pub mod identity;
pub mod remote;
pub mod schema;
pub mod share;
pub mod storage;
pub mod sync;
pub mod types;

pub use config::SyncConfig;
pub use error::{Result, ScratchError};
pub use remote::{MemoryRemote, RemoteStore, RestRemote};
pub use storage::Storage;
pub use sync::{PersistenceSync, SyncStatus};
pub use types::{Collection, Prize, StoreConfig, StoreSnapshot, Winner};

use std::path::Path;
use std::sync::Arc;

/// Open the local database under `data_dir` and wire the remote described
/// by `config` (none when no remote is configured). A configured remote gets
/// its change poller started here.
pub async fn open_store(data_dir: &Path, config: &SyncConfig) -> Result<Arc<PersistenceSync>> {
    config.validate()?;

    let db_path = data_dir.join("scratchcard.db");
    let storage = Arc::new(Storage::new(&db_path).await?);

    let remote: Option<Arc<dyn RemoteStore>> = if config.has_remote() {
        let rest = Arc::new(RestRemote::new(config)?);
        rest.clone().spawn_change_poller(config.poll_interval);
        Some(rest as Arc<dyn RemoteStore>)
    } else {
        tracing::info!("No remote store configured, running local-only");
        None
    };

    Ok(Arc::new(PersistenceSync::open(storage, remote).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_open_local_store() {
        let temp_dir = tempdir().unwrap();
        let sync = open_store(temp_dir.path(), &SyncConfig::default())
            .await
            .unwrap();

        assert!(sync.is_local_only());
        assert!(!sync.prizes().is_empty());
        assert!(temp_dir.path().join("scratchcard.db").exists());
    }
}
