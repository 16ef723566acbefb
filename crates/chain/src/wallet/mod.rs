//! Wallet access through the EIP-1193 request/response surface.
//!
//! The client never holds keys. Every account, chain and approval decision is
//! delegated to an external wallet reached through [`WalletProvider`].
//!
//! # Example
//!
//! ```rust,ignore
//! use pricefeed_chain::wallet::{JsonRpcWallet, WalletProvider};
//!
//! let wallet = JsonRpcWallet::new("http://127.0.0.1:1248")?;
//! let chain_id = wallet.chain_id().await?;
//! ```

mod json_rpc;

pub use json_rpc::{JsonRpcWallet, DEFAULT_WALLET_URL};

use crate::error::{parse_chain_id, WalletError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt::Debug;

/// Wallet methods consumed by the client.
pub mod methods {
    pub const CHAIN_ID: &str = "eth_chainId";
    pub const ACCOUNTS: &str = "eth_accounts";
    pub const REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    pub const SWITCH_CHAIN: &str = "wallet_switchEthereumChain";
    pub const ADD_CHAIN: &str = "wallet_addEthereumChain";
    pub const GET_CODE: &str = "eth_getCode";
    pub const CALL: &str = "eth_call";
    pub const NET_VERSION: &str = "net_version";
}

/// EIP-1193 style provider.
///
/// Implementations forward a method name and JSON params and return the raw
/// JSON result. Typed helpers are provided on top of [`request`](Self::request).
#[async_trait]
pub trait WalletProvider: Send + Sync + Debug {
    /// Issue a single request.
    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError>;

    /// Human-readable endpoint description for messages.
    fn endpoint(&self) -> &str;

    /// Current chain id reported by the wallet.
    async fn chain_id(&self) -> Result<u64, WalletError> {
        let raw = self.request(methods::CHAIN_ID, json!([])).await?;
        let text = raw
            .as_str()
            .ok_or_else(|| WalletError::Transport(format!("eth_chainId returned {raw}")))?;
        parse_chain_id(text)
            .ok_or_else(|| WalletError::Transport(format!("unparsable chain id {text}")))
    }

    /// Accounts already authorized for this client (no prompt).
    async fn accounts(&self) -> Result<Vec<String>, WalletError> {
        let raw = self.request(methods::ACCOUNTS, json!([])).await?;
        Ok(string_list(&raw))
    }

    /// Ask the wallet to authorize accounts (may prompt the user).
    async fn request_accounts(&self) -> Result<Vec<String>, WalletError> {
        let raw = self.request(methods::REQUEST_ACCOUNTS, json!([])).await?;
        Ok(string_list(&raw))
    }

    /// Network version string (`net_version`).
    async fn net_version(&self) -> Result<String, WalletError> {
        let raw = self.request(methods::NET_VERSION, json!([])).await?;
        Ok(match raw {
            Value::String(s) => s,
            other => other.to_string(),
        })
    }
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use crate::testing::ScriptedWallet;
    use super::*;

    #[tokio::test]
    async fn test_chain_id_parses_hex() {
        let wallet = ScriptedWallet::new();
        wallet.always(methods::CHAIN_ID, Ok(json!("0x4e454153")));
        assert_eq!(wallet.chain_id().await.unwrap(), 1313161555);
    }

    #[tokio::test]
    async fn test_accounts_ignores_non_strings() {
        let wallet = ScriptedWallet::new();
        wallet.always(
            methods::ACCOUNTS,
            Ok(json!(["0x00000000000000000000000000000000000000aa", 7])),
        );
        let accounts = wallet.accounts().await.unwrap();
        assert_eq!(accounts, vec!["0x00000000000000000000000000000000000000aa"]);
    }

    #[tokio::test]
    async fn test_malformed_chain_id_is_transport_error() {
        let wallet = ScriptedWallet::new();
        wallet.always(methods::CHAIN_ID, Ok(json!(12)));
        assert!(matches!(
            wallet.chain_id().await,
            Err(WalletError::Transport(_))
        ));
    }
}
