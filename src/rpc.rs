//! Bridge to the ledger node's procedure-call interface.
//!
//! Prefer a node reachable over a local or private network: every repository
//! operation that reaches the node pays a full round trip per call, and the
//! node's RPC interface should never be exposed to unrestricted access.

use crate::config::RpcConfig;
use crate::error::{RepositoryError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Issues one named remote call.
///
/// Implementations own transport concerns (connections, deadlines); any
/// failure they report surfaces to callers as [`RepositoryError::Rpc`].
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Performs `method` with positional `params` and returns the raw result.
    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value>;
}

#[async_trait]
impl<T: RpcClient + ?Sized> RpcClient for Arc<T> {
    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        (**self).request(method, params).await
    }
}

/// Calls `method` and decodes the result into `T`.
pub async fn call<T, C>(client: &C, method: &str, params: Vec<Value>) -> Result<T>
where
    T: DeserializeOwned,
    C: RpcClient + ?Sized,
{
    let value = client.request(method, params).await?;
    serde_json::from_value(value)
        .map_err(|e| RepositoryError::Rpc(format!("can not decode {} response: {}", method, e)))
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a [Value],
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC 2.0 over HTTP.
///
/// Method names are sent as `<namespace>_<method>`.
#[derive(Debug)]
pub struct HttpRpcClient {
    http: reqwest::Client,
    url: String,
    namespace: String,
    next_id: AtomicU64,
}

impl HttpRpcClient {
    /// Builds a client; `timeout` bounds each whole request when set.
    pub fn new(url: impl Into<String>, namespace: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            url: url.into(),
            namespace: namespace.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(config: &RpcConfig) -> Result<Self> {
        Self::new(
            config.url.clone(),
            config.namespace.clone(),
            config.timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn qualified_method(&self, method: &str) -> String {
        format!("{}_{}", self.namespace, method)
    }
}

#[async_trait]
impl RpcClient for HttpRpcClient {
    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let method = self.qualified_method(method);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(%method, id, "sending rpc request");

        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method: &method,
            params: &params,
        };

        let response: RpcResponse = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(RepositoryError::Rpc(format!(
                "{} failed with code {}: {}",
                method, err.code, err.message
            )));
        }

        Ok(response.result)
    }
}
