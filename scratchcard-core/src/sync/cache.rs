use crate::error::Result;
use crate::schema;
use crate::storage::{KvStore, Storage};
use crate::types::{default_prizes, Collection, Prize, StoreConfig, StoreSnapshot, Winner};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-memory copy of the three collections, written through to the
/// key-value store on every change.
///
/// Writers hold `write_gate` across the snapshot update and the blob write,
/// so the stored blobs land in the same order the snapshot changed.
pub struct LocalCache {
    storage: Arc<Storage>,
    snapshot: RwLock<StoreSnapshot>,
    write_gate: Mutex<()>,
}

impl LocalCache {
    /// Cold start: read each blob once. Missing or unreadable blobs fall back
    /// to defaults.
    pub async fn open(storage: Arc<Storage>) -> Result<Self> {
        let kv = KvStore::new(&storage);

        let config = match read_blob(&kv, Collection::Config).await? {
            Some(value) => schema::parse_config(value).unwrap_or_else(|e| {
                tracing::warn!("Cached config unreadable, using defaults: {}", e);
                StoreConfig::default()
            }),
            None => StoreConfig::default(),
        };

        let prizes = match read_blob(&kv, Collection::Prizes).await? {
            Some(value) => schema::parse_prizes(value).unwrap_or_else(|e| {
                tracing::warn!("Cached prizes unreadable, using defaults: {}", e);
                default_prizes()
            }),
            None => default_prizes(),
        };

        let winners = match read_blob(&kv, Collection::Winners).await? {
            Some(value) => schema::parse_winners(value).unwrap_or_else(|e| {
                tracing::warn!("Cached ledger unreadable, starting empty: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        };

        tracing::debug!(
            "Local cache opened: {} prizes, {} winners",
            prizes.len(),
            winners.len()
        );

        Ok(Self {
            storage,
            snapshot: RwLock::new(StoreSnapshot {
                config,
                prizes,
                winners,
            }),
            write_gate: Mutex::new(()),
        })
    }

    pub fn get(&self) -> StoreSnapshot {
        self.snapshot.read().clone()
    }

    pub fn config(&self) -> StoreConfig {
        self.snapshot.read().config.clone()
    }

    pub fn prizes(&self) -> Vec<Prize> {
        self.snapshot.read().prizes.clone()
    }

    pub fn winners(&self) -> Vec<Winner> {
        self.snapshot.read().winners.clone()
    }

    pub async fn set_config(&self, config: StoreConfig) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        let blob = to_blob(&config)?;
        self.snapshot.write().config = config;
        self.persist(Collection::Config, blob).await
    }

    pub async fn set_prizes(&self, prizes: Vec<Prize>) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        let blob = to_blob(&prizes)?;
        self.snapshot.write().prizes = prizes;
        self.persist(Collection::Prizes, blob).await
    }

    pub async fn set_winners(&self, winners: Vec<Winner>) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        let blob = to_blob(&winners)?;
        self.snapshot.write().winners = winners;
        self.persist(Collection::Winners, blob).await
    }

    /// Add one ledger record unless a record with the same id is present.
    /// Returns whether the ledger changed.
    pub async fn merge_winner(&self, winner: Winner) -> Result<bool> {
        let _gate = self.write_gate.lock().await;
        let blob = {
            let mut snapshot = self.snapshot.write();
            if snapshot.winners.iter().any(|w| w.id == winner.id) {
                return Ok(false);
            }
            snapshot.winners.push(winner);
            to_blob(&snapshot.winners)?
        };

        self.persist(Collection::Winners, blob).await?;
        Ok(true)
    }

    async fn persist(&self, collection: Collection, blob: String) -> Result<()> {
        KvStore::new(&self.storage)
            .put(collection.cache_key(), &blob)
            .await
    }
}

async fn read_blob(kv: &KvStore<'_>, collection: Collection) -> Result<Option<Value>> {
    let Some(text) = kv.get(collection.cache_key()).await? else {
        return Ok(None);
    };

    match serde_json::from_str(&text) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!("Ignoring malformed {} blob: {}", collection.cache_key(), e);
            Ok(None)
        }
    }
}

fn to_blob<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}
