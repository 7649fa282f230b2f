//! Async REST client for a Postchain node.
//!
//! One HTTP request per call; no retries. The only loop is
//! [`RestClient::wait_confirmation`], which polls the status endpoint with a
//! fixed delay until the transaction leaves the `waiting` state.

use crate::error::RpcError;
use crate::query;
use crate::status::{validate_tx_rid, StatusResponse, TxStatus};
use crate::transaction::PostchainTransaction;
use log::{debug, warn};
use postchain_gtv::Gtv;
use postchain_tx::Gtx;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(511);

/// Configuration for a REST client.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Base URL (e.g., `http://localhost:7740`).
    pub url: String,
    /// Hex RID of the chain; may be resolved later from a chain IID.
    pub blockchain_rid: Option<String>,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Delay between status polls while a transaction is waiting.
    pub poll_interval: Duration,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:7740".to_string(),
            blockchain_rid: None,
            timeout: Some(DEFAULT_TIMEOUT),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Async client for one node, optionally bound to a chain.
pub struct RestClient {
    client: reqwest::Client,
    config: RestConfig,
}

impl RestClient {
    /// Create a client for `url`, optionally bound to a chain.
    pub fn new(url: &str, blockchain_rid: Option<&str>) -> Result<Self, RpcError> {
        Self::with_config(RestConfig {
            url: url.to_string(),
            blockchain_rid: blockchain_rid.map(str::to_string),
            ..Default::default()
        })
    }

    /// Create a client with full configuration.
    pub fn with_config(mut config: RestConfig) -> Result<Self, RpcError> {
        config.url = config.url.trim_end_matches('/').to_string();

        let mut builder = reqwest::Client::builder().pool_max_idle_per_host(4);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(RpcError::Client)?;

        Ok(Self { client, config })
    }

    /// Get the configured base URL.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Get the active configuration.
    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    /// Blockchain RID this client posts to, if bound.
    pub fn blockchain_rid(&self) -> Option<&str> {
        self.config.blockchain_rid.as_deref()
    }

    /// Bind the client to a chain.
    pub fn set_blockchain_rid(&mut self, blockchain_rid: impl Into<String>) {
        self.config.blockchain_rid = Some(blockchain_rid.into());
    }

    fn brid(&self) -> Result<&str, RpcError> {
        self.blockchain_rid().ok_or(RpcError::MissingBlockchainRid)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url, path)
    }

    // ─── HTTP plumbing ──────────────────────────────────────────────────────

    async fn checked(
        resp: reqwest::Response,
        method: &'static str,
        url: &str,
    ) -> Result<String, RpcError> {
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| RpcError::Http {
            method,
            url: url.to_string(),
            source: e,
        })?;

        if status >= 400 {
            return Err(RpcError::HttpStatus {
                method,
                url: url.to_string(),
                status,
                body: body.chars().take(500).collect(),
            });
        }
        Ok(body)
    }

    async fn get_text(&self, path: &str) -> Result<String, RpcError> {
        let url = self.endpoint(path);
        let resp = self.client.get(&url).send().await.map_err(|e| RpcError::Http {
            method: "GET",
            url: url.clone(),
            source: e,
        })?;
        Self::checked(resp, "GET", &url).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<String, RpcError> {
        let url = self.endpoint(path);
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = self
            .client
            .post(&url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| RpcError::Http {
                method: "POST",
                url: url.clone(),
                source: e,
            })?;
        Self::checked(resp, "POST", &url).await
    }

    // ─── Node API ───────────────────────────────────────────────────────────

    /// Resolve the blockchain RID of the node-local chain `iid` and bind this
    /// client to it.
    pub async fn initialize_brid_from_chain_id(&mut self, iid: i64) -> Result<String, RpcError> {
        let text = self.get_text(&format!("brid/iid_{}", iid)).await?;
        let brid = text.trim().trim_matches('"').to_string();
        debug!("chain iid {} resolved to blockchain RID {}", iid, brid);
        self.set_blockchain_rid(brid.clone());
        Ok(brid)
    }

    /// Submit a serialized (hex) transaction.
    pub async fn post_transaction(&self, serialized: &str) -> Result<(), RpcError> {
        let path = format!("tx/{}", self.brid()?);
        debug!("posting {} byte transaction to {}", serialized.len() / 2, path);
        self.post_json(&path, &serde_json::json!({ "tx": serialized }))
            .await?;
        Ok(())
    }

    /// Fetch the current status of a transaction (`GET tx/<brid>/<rid>/status`).
    pub async fn status(&self, tx_rid: &str) -> Result<StatusResponse, RpcError> {
        validate_tx_rid(tx_rid)?;
        let path = format!("tx/{}/{}/status", self.brid()?, tx_rid);
        let body = self.get_text(&path).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Poll until the transaction is confirmed or reaches another final
    /// status. Has no deadline of its own; drop the future to stop waiting.
    pub async fn wait_confirmation(&self, tx_rid: &str) -> Result<(), RpcError> {
        loop {
            let response = self.status(tx_rid).await?;
            debug!("transaction {} status: {}", tx_rid, response.status);

            let status = response.tx_status()?;
            if !status.is_final() {
                tokio::time::sleep(self.config.poll_interval).await;
                continue;
            }
            match status {
                TxStatus::Confirmed => return Ok(()),
                TxStatus::Waiting => continue,
                TxStatus::Rejected | TxStatus::Unknown => {
                    warn!(
                        "transaction {} {}: {}",
                        tx_rid,
                        response.status,
                        response.reject_reason.as_deref().unwrap_or("no reason given")
                    );
                    return Err(RpcError::Rejected {
                        tx_rid: tx_rid.to_string(),
                        status: response.status,
                    });
                }
                TxStatus::Exception => {
                    return Err(RpcError::NodeException(
                        response.message.unwrap_or_default(),
                    ))
                }
            }
        }
    }

    /// Post a transaction, then wait for it to be confirmed.
    pub async fn post_and_wait_confirmation(
        &self,
        serialized: &str,
        tx_rid: &str,
    ) -> Result<(), RpcError> {
        self.post_transaction(serialized).await?;
        self.wait_confirmation(tx_rid).await
    }

    /// Run a read-only query.
    pub async fn query(&self, name: &str, args: &[(&str, Gtv)]) -> Result<Value, RpcError> {
        let path = format!("query/{}", self.brid()?);
        let body = self.post_json(&path, &query::query_body(name, args)).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Run a query and deserialize its result into `T`.
    pub async fn query_as<T: DeserializeOwned>(
        &self,
        name: &str,
        args: &[(&str, Gtv)],
    ) -> Result<T, RpcError> {
        let value = self.query(name, args).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Start a transaction for this client's chain.
    pub fn new_transaction(&self) -> Result<PostchainTransaction<'_>, RpcError> {
        let gtx = Gtx::new(self.brid()?)?;
        Ok(PostchainTransaction::new(gtx, self))
    }
}
