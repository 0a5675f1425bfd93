use anyhow::{Context, Result, bail};
use reqwest::StatusCode;

use tally_core::models::Snapshot;
use tally_core::sync::CloudSync;

/// HTTP client for the snapshot sync service. One snapshot per account,
/// fetched and upserted whole.
pub struct HttpSyncClient {
    client: reqwest::Client,
    rt: tokio::runtime::Handle,
    base_url: String,
}

impl HttpSyncClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "tally-cli/{} (fitness tracker)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(std::time::Duration::from_secs(30))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            rt: tokio::runtime::Handle::current(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn snapshot_url(&self, account: &str) -> String {
        let base = &self.base_url;
        format!("{base}/v1/snapshots/{account}")
    }

    pub async fn fetch_async(&self, account: &str) -> Result<Option<Snapshot>> {
        let resp = self
            .client
            .get(self.snapshot_url(account))
            .send()
            .await
            .context("Failed to reach the sync server")?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            let status = resp.status();
            bail!("Sync server returned {status}");
        }

        let snapshot: Snapshot = resp
            .json()
            .await
            .context("Failed to parse the remote snapshot")?;
        Ok(Some(snapshot))
    }

    pub async fn upsert_async(&self, account: &str, snapshot: &Snapshot) -> Result<()> {
        let resp = self
            .client
            .put(self.snapshot_url(account))
            .json(snapshot)
            .send()
            .await
            .context("Failed to reach the sync server")?;

        if !resp.status().is_success() {
            let status = resp.status();
            bail!("Sync server returned {status}");
        }
        Ok(())
    }
}

impl CloudSync for HttpSyncClient {
    fn fetch(&self, account: &str) -> Result<Option<Snapshot>> {
        self.rt.block_on(self.fetch_async(account))
    }

    fn upsert(&self, account: &str, snapshot: &Snapshot) -> Result<()> {
        self.rt.block_on(self.upsert_async(account, snapshot))
    }
}
