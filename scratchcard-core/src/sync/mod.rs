pub mod cache;

pub use cache::LocalCache;

use crate::error::{Result, ScratchError};
use crate::remote::RemoteStore;
use crate::storage::Storage;
use crate::types::{Collection, Prize, StoreConfig, StoreSnapshot, Winner};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Persistence state exposed to whoever reports it to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    Idle,
    LocalOnly,
    Loading,
    Loaded,
    /// Some collections could not be read and are served from the cache.
    ReadDegraded { failed: Vec<Collection> },
    Saved,
    WriteFailed { reason: String },
}

/// Keeps the local cache and the remote store in step.
///
/// No lock is held across a remote call: an `append` issued while a `load`
/// is in flight goes straight to the remote, and the load may briefly
/// overwrite the ledger without it until the next notification.
pub struct PersistenceSync {
    cache: LocalCache,
    remote: Option<Arc<dyn RemoteStore>>,
    status: watch::Sender<SyncStatus>,
}

impl PersistenceSync {
    pub async fn open(
        storage: Arc<Storage>,
        remote: Option<Arc<dyn RemoteStore>>,
    ) -> Result<Self> {
        let cache = LocalCache::open(storage).await?;
        let initial = if remote.is_some() {
            SyncStatus::Idle
        } else {
            SyncStatus::LocalOnly
        };
        let (status, _) = watch::channel(initial);

        Ok(Self {
            cache,
            remote,
            status,
        })
    }

    pub fn is_local_only(&self) -> bool {
        self.remote.is_none()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.cache.get()
    }

    pub fn config(&self) -> StoreConfig {
        self.cache.config()
    }

    pub fn prizes(&self) -> Vec<Prize> {
        self.cache.prizes()
    }

    pub fn winners(&self) -> Vec<Winner> {
        self.cache.winners()
    }

    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn current_status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    fn set_status(&self, status: SyncStatus) {
        self.status.send_replace(status);
    }

    /// Read all three collections from the remote. A failed read leaves
    /// that collection's cached copy in place; the others are replaced.
    pub async fn load(&self) -> StoreSnapshot {
        let Some(remote) = &self.remote else {
            self.set_status(SyncStatus::LocalOnly);
            return self.cache.get();
        };

        self.set_status(SyncStatus::Loading);

        let (config, prizes, winners) = tokio::join!(
            remote.fetch_config(),
            remote.fetch_prizes(),
            remote.fetch_winners()
        );

        let mut failed = Vec::new();

        match config {
            Ok(Some(config)) => {
                if let Err(e) = self.cache.set_config(config).await {
                    tracing::warn!("Failed to cache config: {}", e);
                }
            }
            Ok(None) => tracing::debug!("No remote config record, keeping cached one"),
            Err(e) => {
                tracing::warn!("Remote config read failed, using cache: {}", e);
                failed.push(Collection::Config);
            }
        }

        match prizes {
            Ok(prizes) => {
                if let Err(e) = self.cache.set_prizes(prizes).await {
                    tracing::warn!("Failed to cache prizes: {}", e);
                }
            }
            Err(e) => {
                tracing::warn!("Remote prize read failed, using cache: {}", e);
                failed.push(Collection::Prizes);
            }
        }

        match winners {
            Ok(winners) => {
                if let Err(e) = self.cache.set_winners(winners).await {
                    tracing::warn!("Failed to cache ledger: {}", e);
                }
            }
            Err(e) => {
                tracing::warn!("Remote ledger read failed, using cache: {}", e);
                failed.push(Collection::Winners);
            }
        }

        if failed.is_empty() {
            tracing::info!("Loaded all collections from remote");
            self.set_status(SyncStatus::Loaded);
        } else {
            self.set_status(SyncStatus::ReadDegraded { failed });
        }

        self.cache.get()
    }

    /// Write one ledger record. The cache only learns about the record once
    /// the remote accepted it. Failures are reported, never retried.
    pub async fn append(&self, winner: Winner) -> Result<()> {
        let Some(remote) = &self.remote else {
            self.cache.merge_winner(winner).await?;
            return Ok(());
        };

        match remote.insert_winner(&winner).await {
            Ok(()) => {
                tracing::info!("Appended winner {} to remote ledger", winner.id);
                if let Err(e) = self.cache.merge_winner(winner).await {
                    tracing::warn!("Remote append succeeded but cache write failed: {}", e);
                }
                self.set_status(SyncStatus::Saved);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Remote append of winner {} failed: {}", winner.id, e);
                self.set_status(SyncStatus::WriteFailed {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Reload everything whenever the remote reports a change. Returns
    /// `None` in local-only mode.
    pub fn subscribe<F>(self: &Arc<Self>, on_change: F) -> Option<JoinHandle<()>>
    where
        F: Fn(&StoreSnapshot) + Send + Sync + 'static,
    {
        let mut changes = self.remote.as_ref()?.subscribe();
        let sync = Arc::clone(self);

        Some(tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(collection) => tracing::debug!("Remote change in {}", collection),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("Missed {} change notifications", skipped)
                    }
                    Err(RecvError::Closed) => break,
                }

                let snapshot = sync.load().await;
                on_change(&snapshot);
            }
        }))
    }

    pub async fn set_local_config(&self, config: StoreConfig) -> Result<()> {
        self.cache.set_config(config).await
    }

    pub async fn set_local_prizes(&self, prizes: Vec<Prize>) -> Result<()> {
        self.cache.set_prizes(prizes).await
    }

    /// Push the cached configuration and prize pool to the remote.
    pub async fn publish(&self) -> Result<()> {
        let remote = self.remote.as_ref().ok_or(ScratchError::RemoteUnavailable)?;
        let snapshot = self.cache.get();

        let result = match remote.upsert_config(&snapshot.config).await {
            Ok(()) => remote.replace_prizes(&snapshot.prizes).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(()) => {
                tracing::info!("Published store configuration and {} prizes", snapshot.prizes.len());
                self.set_status(SyncStatus::Saved);
            }
            Err(e) => {
                tracing::warn!("Publishing store configuration failed: {}", e);
                self.set_status(SyncStatus::WriteFailed {
                    reason: e.to_string(),
                });
            }
        }

        result
    }
}
