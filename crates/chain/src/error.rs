//! Error taxonomy for wallet, network and contract interactions.

use alloy::primitives::Address;
use thiserror::Error;

/// EIP-1193 code: the user rejected the request.
pub const CODE_USER_REJECTED: i64 = 4001;

/// EIP-1193 code: the wallet does not know the requested chain.
pub const CODE_UNRECOGNIZED_CHAIN: i64 = 4902;

/// JSON-RPC code used by nodes for `execution reverted`.
pub const CODE_EXECUTION_REVERTED: i64 = 3;

/// Raw failure reported by a wallet or RPC endpoint.
#[derive(Debug, Clone, Error)]
pub enum WalletError {
    /// Nothing answered at the wallet endpoint.
    #[error("no wallet provider reachable at {0}")]
    Unavailable(String),

    /// The endpoint answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        /// Code nested under `data.originalError.code`, as some wallets
        /// wrap 4902 inside a generic internal error.
        nested_code: Option<i64>,
    },

    /// The request could not be delivered or the response was malformed.
    #[error("transport error: {0}")]
    Transport(String),
}

impl WalletError {
    /// Whether the wallet reported that it does not know the chain.
    pub fn is_unrecognized_chain(&self) -> bool {
        matches!(
            self,
            WalletError::Rpc { code, nested_code, .. }
                if *code == CODE_UNRECOGNIZED_CHAIN
                    || *nested_code == Some(CODE_UNRECOGNIZED_CHAIN)
        )
    }

    /// Whether the user declined the request in the wallet.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, WalletError::Rpc { code, .. } if *code == CODE_USER_REJECTED)
    }

    /// Whether the failure is a contract revert.
    pub fn is_revert(&self) -> bool {
        match self {
            WalletError::Rpc { code, message, .. } => {
                *code == CODE_EXECUTION_REVERTED || message.to_lowercase().contains("revert")
            }
            _ => false,
        }
    }
}

/// Errors surfaced by the price feed client.
#[derive(Debug, Clone, Error)]
pub enum PriceFeedError {
    #[error("wallet unavailable: {0}")]
    WalletUnavailable(String),

    #[error("request rejected in wallet: {0}")]
    UserRejected(String),

    #[error(
        "wrong network: connected to {} ({observed}), expected {} ({expected})",
        hex_ref(.observed),
        hex_ref(.expected)
    )]
    WrongNetwork { observed: u64, expected: u64 },

    #[error("chain {} ({chain_id}) is not registered in the wallet", hex_ref(.chain_id))]
    ChainUnregistered { chain_id: u64 },

    #[error("no contract found at {address} on chain {chain_id}")]
    ContractNotFound { address: Address, chain_id: u64 },

    #[error("contract call failed: {0}")]
    CallReverted(String),

    #[error("transport error: {0}")]
    UnknownTransport(String),
}

impl PriceFeedError {
    /// Short machine-friendly code for logs and notices.
    pub fn code(&self) -> &'static str {
        match self {
            Self::WalletUnavailable(_) => "wallet_unavailable",
            Self::UserRejected(_) => "user_rejected",
            Self::WrongNetwork { .. } => "wrong_network",
            Self::ChainUnregistered { .. } => "chain_unregistered",
            Self::ContractNotFound { .. } => "contract_not_found",
            Self::CallReverted(_) => "call_reverted",
            Self::UnknownTransport(_) => "unknown_transport",
        }
    }
}

impl From<WalletError> for PriceFeedError {
    fn from(err: WalletError) -> Self {
        if err.is_user_rejection() {
            return Self::UserRejected(err.to_string());
        }
        if err.is_revert() {
            return Self::CallReverted(err.to_string());
        }
        match err {
            WalletError::Unavailable(url) => Self::WalletUnavailable(url),
            other => Self::UnknownTransport(other.to_string()),
        }
    }
}

/// Format a chain id the way wallets report it (`0x` lowercase hex).
pub fn chain_id_hex(chain_id: u64) -> String {
    format!("{chain_id:#x}")
}

fn hex_ref(chain_id: &u64) -> String {
    chain_id_hex(*chain_id)
}

/// Parse a wallet-reported chain id (`0x`-prefixed hex or decimal).
pub fn parse_chain_id(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}
