//! Read transports used by the contract session.
//!
//! Two implementations exist:
//! - [`WalletTransport`]: routes `eth_getCode`/`eth_call` through the wallet
//! - [`RpcTransport`]: talks to a network's public RPC endpoint with Alloy

use crate::error::{PriceFeedError, WalletError};
use crate::wallet::{methods, WalletProvider};
use alloy::primitives::{Address, Bytes};
use alloy::providers::{Provider, ProviderBuilder};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;

/// Which kind of transport a contract handle is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Requests go through the wallet.
    Wallet,
    /// Requests go to the network's configured public RPC.
    Rpc,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Wallet => write!(f, "wallet"),
            TransportKind::Rpc => write!(f, "rpc"),
        }
    }
}

/// Read-only access to chain state.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Transport kind, for logging and handle provenance.
    fn kind(&self) -> TransportKind;

    /// Deployed bytecode at `address` (empty when nothing is deployed).
    async fn get_code(&self, address: Address) -> Result<Bytes, PriceFeedError>;

    /// Execute a read-only call against `to` with ABI-encoded `data`.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, PriceFeedError>;

    /// Chain id as seen by this transport.
    async fn chain_id(&self) -> Result<u64, PriceFeedError>;
}

/// Transport derived from the wallet provider.
#[derive(Debug, Clone)]
pub struct WalletTransport {
    wallet: Arc<dyn WalletProvider>,
}

impl WalletTransport {
    pub fn new(wallet: Arc<dyn WalletProvider>) -> Self {
        Self { wallet }
    }
}

fn decode_hex_result(method: &str, value: Value) -> Result<Bytes, PriceFeedError> {
    let text = value.as_str().ok_or_else(|| {
        PriceFeedError::UnknownTransport(format!("{method} returned non-string {value}"))
    })?;
    let stripped = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(stripped)
        .map(Bytes::from)
        .map_err(|e| PriceFeedError::UnknownTransport(format!("{method} returned bad hex: {e}")))
}

#[async_trait]
impl Transport for WalletTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Wallet
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, PriceFeedError> {
        let raw = self
            .wallet
            .request(methods::GET_CODE, json!([address, "latest"]))
            .await?;
        decode_hex_result(methods::GET_CODE, raw)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, PriceFeedError> {
        let raw = self
            .wallet
            .request(methods::CALL, json!([{ "to": to, "data": data }, "latest"]))
            .await?;
        decode_hex_result(methods::CALL, raw)
    }

    async fn chain_id(&self) -> Result<u64, PriceFeedError> {
        Ok(self.wallet.chain_id().await?)
    }
}

/// Transport talking directly to a public JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct RpcTransport {
    url: String,
}

impl RpcTransport {
    /// Create a transport for `url`. No request is made until first use.
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let _: reqwest::Url = url
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid RPC URL '{}': {}", url, e))?;
        Ok(Self {
            url: url.to_string(),
        })
    }

    /// Get the RPC URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn provider(&self) -> Result<impl Provider, PriceFeedError> {
        let url = self
            .url
            .parse()
            .map_err(|e| PriceFeedError::UnknownTransport(format!("bad RPC URL: {e}")))?;
        Ok(ProviderBuilder::new().on_http(url))
    }
}

fn map_rpc_error<E: std::fmt::Display>(err: E) -> PriceFeedError {
    let message = err.to_string();
    let as_wallet = WalletError::Rpc {
        code: 0,
        message: message.clone(),
        nested_code: None,
    };
    if as_wallet.is_revert() {
        PriceFeedError::CallReverted(message)
    } else {
        PriceFeedError::UnknownTransport(message)
    }
}

#[async_trait]
impl Transport for RpcTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Rpc
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, PriceFeedError> {
        let provider = self.provider()?;
        let code = provider.get_code_at(address).await.map_err(map_rpc_error)?;
        debug!(url = %self.url, address = %address, len = code.len(), "Fetched code via RPC");
        Ok(code)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, PriceFeedError> {
        let provider = self.provider()?;
        let params = json!([{ "to": to, "data": data }, "latest"]);
        provider
            .raw_request::<_, Bytes>(methods::CALL.into(), params)
            .await
            .map_err(map_rpc_error)
    }

    async fn chain_id(&self) -> Result<u64, PriceFeedError> {
        let provider = self.provider()?;
        provider.get_chain_id().await.map_err(map_rpc_error)
    }
}
