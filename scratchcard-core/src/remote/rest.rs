use crate::config::SyncConfig;
use crate::error::{Result, ScratchError};
use crate::remote::RemoteStore;
use crate::schema;
use crate::types::{Collection, Prize, StoreConfig, Winner};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// PostgREST-style remote (`/rest/v1/<table>`).
///
/// The configuration row uses the store slug as its id; prize and winner
/// rows carry a `store` column with the slug.
pub struct RestRemote {
    client: Client,
    base_url: Url,
    api_key: String,
    store: String,
    changes: broadcast::Sender<Collection>,
}

impl RestRemote {
    pub fn new(config: &SyncConfig) -> Result<Self> {
        config.validate()?;
        let (Some(url), Some(key)) = (&config.remote_url, &config.remote_key) else {
            return Err(ScratchError::RemoteUnavailable);
        };

        let mut base_url = Url::parse(url).map_err(ScratchError::invalid_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let (changes, _) = broadcast::channel(64);

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key: key.clone(),
            store: config.store_slug.clone(),
            changes,
        })
    }

    pub fn store(&self) -> &str {
        &self.store
    }

    fn table_url(&self, collection: Collection) -> Result<Url> {
        self.base_url
            .join(&format!("rest/v1/{}", collection.table()))
            .map_err(ScratchError::invalid_url)
    }

    /// Filter selecting this store's rows in `collection`.
    fn scope(&self, collection: Collection) -> (&'static str, String) {
        match collection {
            Collection::Config => ("id", format!("eq.{}", self.store)),
            Collection::Prizes | Collection::Winners => ("store", format!("eq.{}", self.store)),
        }
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn get_rows(&self, collection: Collection) -> Result<Vec<Value>> {
        let mut url = self.table_url(collection)?;
        let (column, filter) = self.scope(collection);
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair(column, &filter);

        let response = self.request(Method::GET, url).send().await?;
        if !response.status().is_success() {
            return Err(ScratchError::remote(format!(
                "read {} returned {}",
                collection,
                response.status()
            )));
        }

        Ok(response.json::<Vec<Value>>().await?)
    }

    async fn post_rows(
        &self,
        collection: Collection,
        rows: Vec<Value>,
        prefer: &str,
        on_conflict: Option<&str>,
    ) -> Result<()> {
        let mut url = self.table_url(collection)?;
        if let Some(column) = on_conflict {
            url.query_pairs_mut().append_pair("on_conflict", column);
        }

        let response = self
            .request(Method::POST, url)
            .header("Prefer", prefer)
            .json(&rows)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ScratchError::remote(format!(
                "write {} returned {}",
                collection,
                response.status()
            )));
        }
        Ok(())
    }

    fn scoped_row<T: serde::Serialize>(&self, record: &T, column: &str) -> Result<Value> {
        let mut row = serde_json::to_value(record)?;
        let Value::Object(fields) = &mut row else {
            return Err(ScratchError::internal("record did not serialize to an object"));
        };
        fields.insert(column.to_string(), Value::String(self.store.clone()));
        Ok(row)
    }

    async fn digest(&self, collection: Collection) -> Result<String> {
        let rows = self.get_rows(collection).await?;
        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_vec(&rows)?);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Poll every collection and broadcast the ones whose content changed.
    /// The first round only records a baseline; rounds with no subscriber
    /// are skipped.
    pub fn spawn_change_poller(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut seen: HashMap<Collection, String> = HashMap::new();

            loop {
                ticker.tick().await;
                if self.changes.receiver_count() == 0 {
                    continue;
                }

                for collection in Collection::ALL {
                    let digest = match self.digest(collection).await {
                        Ok(digest) => digest,
                        Err(e) => {
                            tracing::debug!("Change poll of {} failed: {}", collection, e);
                            continue;
                        }
                    };

                    if let Some(previous) = seen.insert(collection, digest.clone()) {
                        if previous != digest {
                            tracing::debug!("Remote change detected in {}", collection);
                            let _ = self.changes.send(collection);
                        }
                    }
                }
            }
        })
    }
}

#[async_trait]
impl RemoteStore for RestRemote {
    async fn fetch_config(&self) -> Result<Option<StoreConfig>> {
        let rows = self.get_rows(Collection::Config).await?;
        rows.into_iter().next().map(schema::parse_config).transpose()
    }

    async fn fetch_prizes(&self) -> Result<Vec<Prize>> {
        let rows = self.get_rows(Collection::Prizes).await?;
        schema::parse_prizes(Value::Array(rows))
    }

    async fn fetch_winners(&self) -> Result<Vec<Winner>> {
        let rows = self.get_rows(Collection::Winners).await?;
        schema::parse_winners(Value::Array(rows))
    }

    async fn insert_winner(&self, winner: &Winner) -> Result<()> {
        let row = self.scoped_row(winner, "store")?;
        self.post_rows(Collection::Winners, vec![row], "return=minimal", None)
            .await
    }

    async fn upsert_config(&self, config: &StoreConfig) -> Result<()> {
        let row = self.scoped_row(config, "id")?;
        self.post_rows(
            Collection::Config,
            vec![row],
            "resolution=merge-duplicates,return=minimal",
            Some("id"),
        )
        .await
    }

    async fn replace_prizes(&self, prizes: &[Prize]) -> Result<()> {
        let mut url = self.table_url(Collection::Prizes)?;
        let (column, filter) = self.scope(Collection::Prizes);
        url.query_pairs_mut().append_pair(column, &filter);

        let response = self.request(Method::DELETE, url).send().await?;
        if !response.status().is_success() {
            return Err(ScratchError::remote(format!(
                "clear prizes returned {}",
                response.status()
            )));
        }

        if prizes.is_empty() {
            return Ok(());
        }

        let rows = prizes
            .iter()
            .map(|prize| self.scoped_row(prize, "store"))
            .collect::<Result<Vec<_>>>()?;
        self.post_rows(Collection::Prizes, rows, "return=minimal", None)
            .await
    }

    fn subscribe(&self) -> broadcast::Receiver<Collection> {
        self.changes.subscribe()
    }
}
