// crates/verinet-store/src/ipfs.rs
//
// IPFS client for content-addressed claim archival.
// Uses reqwest to communicate with a Kubo/IPFS daemon HTTP API.

use async_trait::async_trait;

use verinet_core::error::VeriNetError;
use verinet_core::traits::Archive;

/// IPFS client for interacting with a Kubo / IPFS daemon.
#[derive(Debug, Clone)]
pub struct IpfsClient {
    /// Base URL of the IPFS HTTP API (e.g., "http://127.0.0.1:5001").
    pub base_url: String,
    client: reqwest::Client,
}

impl IpfsClient {
    /// Create a new IPFS client pointing at the given API base URL.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Store raw bytes on IPFS (pinned) and return the resulting CID.
    ///
    /// POST /api/v0/add?pin=true with multipart form data.
    pub async fn put(&self, data: &[u8]) -> Result<String, VeriNetError> {
        let url = format!("{}/api/v0/add?pin=true", self.base_url);

        let part = reqwest::multipart::Part::bytes(data.to_vec()).file_name("claim.json");
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| VeriNetError::Storage(format!("IPFS put request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VeriNetError::Storage(format!(
                "IPFS put failed ({}): {}",
                status, body
            )));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            VeriNetError::Serialization(format!("IPFS add response parse failed: {}", e))
        })?;

        let cid = body["Hash"]
            .as_str()
            .ok_or_else(|| {
                VeriNetError::Serialization("IPFS add response missing 'Hash' field".to_string())
            })?
            .to_string();

        Ok(cid)
    }
}

#[async_trait]
impl Archive for IpfsClient {
    async fn store(&self, document: &serde_json::Value) -> Result<String, VeriNetError> {
        let bytes = serde_json::to_vec(document)?;
        self.put(&bytes).await
    }
}
