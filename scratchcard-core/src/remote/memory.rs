use crate::error::Result;
use crate::remote::RemoteStore;
use crate::schema;
use crate::types::{Collection, Prize, StoreConfig, Winner};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::broadcast;

#[derive(Debug, Default)]
struct Tables {
    config: Option<Value>,
    prizes: Vec<Value>,
    winners: Vec<Value>,
}

/// In-process remote. Rows are kept as raw JSON so that records in any of
/// the historical casings can be seeded and read back through the schema
/// adapter, exactly like rows coming from a database.
pub struct MemoryRemote {
    tables: RwLock<Tables>,
    changes: broadcast::Sender<Collection>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            tables: RwLock::new(Tables::default()),
            changes,
        }
    }

    /// Store a raw row as if another client had written it, and notify.
    pub fn insert_raw(&self, collection: Collection, row: Value) {
        {
            let mut tables = self.tables.write();
            match collection {
                Collection::Config => tables.config = Some(row),
                Collection::Prizes => tables.prizes.push(row),
                Collection::Winners => tables.winners.push(row),
            }
        }
        self.notify(collection);
    }

    pub fn row_count(&self, collection: Collection) -> usize {
        let tables = self.tables.read();
        match collection {
            Collection::Config => usize::from(tables.config.is_some()),
            Collection::Prizes => tables.prizes.len(),
            Collection::Winners => tables.winners.len(),
        }
    }

    fn notify(&self, collection: Collection) {
        // no subscribers is fine
        let _ = self.changes.send(collection);
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn fetch_config(&self) -> Result<Option<StoreConfig>> {
        let row = self.tables.read().config.clone();
        row.map(schema::parse_config).transpose()
    }

    async fn fetch_prizes(&self) -> Result<Vec<Prize>> {
        let rows = self.tables.read().prizes.clone();
        schema::parse_prizes(Value::Array(rows))
    }

    async fn fetch_winners(&self) -> Result<Vec<Winner>> {
        let rows = self.tables.read().winners.clone();
        schema::parse_winners(Value::Array(rows))
    }

    async fn insert_winner(&self, winner: &Winner) -> Result<()> {
        let row = serde_json::to_value(winner)?;
        self.tables.write().winners.push(row);
        self.notify(Collection::Winners);
        Ok(())
    }

    async fn upsert_config(&self, config: &StoreConfig) -> Result<()> {
        let row = serde_json::to_value(config)?;
        self.tables.write().config = Some(row);
        self.notify(Collection::Config);
        Ok(())
    }

    async fn replace_prizes(&self, prizes: &[Prize]) -> Result<()> {
        let rows = prizes
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.tables.write().prizes = rows;
        self.notify(Collection::Prizes);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<Collection> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_legacy_rows_are_normalized() {
        let remote = MemoryRemote::new();
        remote.insert_raw(
            Collection::Prizes,
            json!({"id": 1, "name": "Brinde", "description": "", "iswinning": true}),
        );
        remote.insert_raw(
            Collection::Prizes,
            json!({"id": "2", "name": "Nada", "description": "", "isWinning": false}),
        );

        let prizes = remote.fetch_prizes().await.unwrap();
        assert_eq!(prizes.len(), 2);
        assert!(prizes[0].is_winning);
        assert!(!prizes[1].is_winning);
    }

    #[tokio::test]
    async fn test_writes_notify_subscribers() {
        let remote = MemoryRemote::new();
        let mut changes = remote.subscribe();

        remote.upsert_config(&StoreConfig::default()).await.unwrap();
        assert_eq!(changes.recv().await.unwrap(), Collection::Config);
        assert!(remote.fetch_config().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_empty_remote() {
        let remote = MemoryRemote::new();
        assert!(remote.fetch_config().await.unwrap().is_none());
        assert!(remote.fetch_winners().await.unwrap().is_empty());
        assert_eq!(remote.row_count(Collection::Winners), 0);
    }
}
