pub mod memory;
pub mod rest;

pub use memory::MemoryRemote;
pub use rest::RestRemote;

use crate::error::Result;
use crate::types::{Collection, Prize, StoreConfig, Winner};
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Remote source of truth for the three collections.
///
/// Implementations return canonical records; field-name drift in stored rows
/// is resolved with [`crate::schema`] before anything leaves the backend.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// `Ok(None)` when the store has no configuration record yet.
    async fn fetch_config(&self) -> Result<Option<StoreConfig>>;

    async fn fetch_prizes(&self) -> Result<Vec<Prize>>;

    async fn fetch_winners(&self) -> Result<Vec<Winner>>;

    async fn insert_winner(&self, winner: &Winner) -> Result<()>;

    async fn upsert_config(&self, config: &StoreConfig) -> Result<()>;

    async fn replace_prizes(&self, prizes: &[Prize]) -> Result<()>;

    /// Change notifications, one message per touched collection.
    fn subscribe(&self) -> broadcast::Receiver<Collection>;
}
