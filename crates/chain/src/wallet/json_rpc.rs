//! Wallet bridge speaking JSON-RPC 2.0 over HTTP.
//!
//! Desktop wallets such as Frame expose the EIP-1193 surface on a local HTTP
//! port. Requests are forwarded verbatim and JSON-RPC error objects are kept
//! intact (code, message, nested `originalError.code`) so the caller can
//! classify them.

use super::WalletProvider;
use crate::error::WalletError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, instrument};

/// Default local wallet endpoint.
pub const DEFAULT_WALLET_URL: &str = "http://127.0.0.1:1248";

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl RpcErrorObject {
    fn nested_code(&self) -> Option<i64> {
        self.data
            .as_ref()?
            .get("originalError")?
            .get("code")?
            .as_i64()
    }
}

/// HTTP JSON-RPC wallet client.
pub struct JsonRpcWallet {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl std::fmt::Debug for JsonRpcWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcWallet")
            .field("url", &self.url)
            .finish()
    }
}

impl JsonRpcWallet {
    /// Create a wallet client for `url`.
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let parsed: reqwest::Url = url
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid wallet URL '{}': {}", url, e))?;

        Ok(Self {
            client: reqwest::Client::new(),
            url: parsed.to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Create a wallet client for the default local endpoint.
    pub fn local() -> anyhow::Result<Self> {
        Self::new(DEFAULT_WALLET_URL)
    }

    fn map_send_error(&self, err: reqwest::Error) -> WalletError {
        if err.is_connect() {
            WalletError::Unavailable(self.url.clone())
        } else {
            WalletError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl WalletProvider for JsonRpcWallet {
    #[instrument(skip(self, params), fields(url = %self.url))]
    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!(id, method, "Sending wallet request");

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let payload: RpcResponse = response
            .json()
            .await
            .map_err(|e| WalletError::Transport(format!("HTTP {status}: {e}")))?;

        if let Some(error) = payload.error {
            debug!(id, method, code = error.code, message = %error.message, "Wallet returned error");
            let nested_code = error.nested_code();
            return Err(WalletError::Rpc {
                code: error.code,
                message: error.message,
                nested_code,
            });
        }

        Ok(payload.result.unwrap_or(Value::Null))
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
