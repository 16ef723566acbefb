//! Price feed chain interaction layer.
//!
//! This crate provides:
//! - Wallet access over the EIP-1193 request surface (JSON-RPC bridge)
//! - Read transports: wallet-routed and direct public RPC
//! - Price consumer contract bindings (legacy and with-source ABIs)
//! - Network detection, switching and chain registration
//! - Contract binding with wallet-then-RPC fallback and price reads
//!
//! Works against any EVM chain reachable through a wallet and a public RPC.

mod contracts;
pub mod error;
mod network;
mod session;
mod transport;
pub mod wallet;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use contracts::{PriceFeedAbi, RawPrice};
pub use error::{chain_id_hex, parse_chain_id, PriceFeedError, WalletError};
pub use network::{match_network, NetworkDebugInfo, NetworkDescriptor, NetworkManager, DEFAULT_SETTLE};
pub use session::{
    locate_contract, ContractHandle, ContractLocation, ContractSession, ConvenienceReading,
    PriceReading, TokenPair,
};
pub use transport::{RpcTransport, Transport, TransportKind, WalletTransport};
pub use wallet::{JsonRpcWallet, WalletProvider, DEFAULT_WALLET_URL};
