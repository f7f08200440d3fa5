use crate::error::Result;
use crate::storage::Storage;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

/// Durable text blobs keyed by name.
pub struct KvStore<'a> {
    storage: &'a Storage,
}

impl<'a> KvStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn put(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.storage.get_connection().await;

        conn.execute(
            "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, Utc::now().timestamp()],
        )?;

        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.storage.get_connection().await;

        let value = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_overwrites() {
        let temp_dir = tempdir().unwrap();
        let storage = Storage::new(&temp_dir.path().join("kv.db")).await.unwrap();
        let kv = KvStore::new(&storage);

        assert_eq!(kv.get("scratch_prizes").await.unwrap(), None);

        kv.put("scratch_prizes", "[]").await.unwrap();
        kv.put("scratch_prizes", "[1]").await.unwrap();
        assert_eq!(kv.get("scratch_prizes").await.unwrap().as_deref(), Some("[1]"));
    }
}
