//! Connection state of the client.

use alloy::primitives::Address;
use std::fmt;
use tracing::debug;

/// Where the client is in the connect → switch → bind → fetch flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionPhase {
    Disconnected,
    WalletPending,
    WalletConnected,
    NetworkChecking,
    NetworkOk,
    NetworkWrong,
    ContractLoading,
    ContractReady,
    ContractNotFound,
    FetchingPrices,
    PricesDisplayed,
}

impl ConnectionPhase {
    /// Phases a failed step may fall back to.
    pub fn is_stable(&self) -> bool {
        matches!(
            self,
            ConnectionPhase::Disconnected
                | ConnectionPhase::WalletConnected
                | ConnectionPhase::NetworkOk
        )
    }
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionPhase::Disconnected => "disconnected",
            ConnectionPhase::WalletPending => "wallet-pending",
            ConnectionPhase::WalletConnected => "wallet-connected",
            ConnectionPhase::NetworkChecking => "network-checking",
            ConnectionPhase::NetworkOk => "network-ok",
            ConnectionPhase::NetworkWrong => "network-wrong",
            ConnectionPhase::ContractLoading => "contract-loading",
            ConnectionPhase::ContractReady => "contract-ready",
            ConnectionPhase::ContractNotFound => "contract-not-found",
            ConnectionPhase::FetchingPrices => "fetching-prices",
            ConnectionPhase::PricesDisplayed => "prices-displayed",
        };
        write!(f, "{s}")
    }
}

/// Mutable session state, changed only by the client's action handlers.
#[derive(Debug, Clone)]
pub struct ConnectionState {
    /// Logical key of the selected network
    pub selected_network: String,
    pub contract_address: Option<Address>,
    pub wallet_account: Option<String>,
    pub contract_bound: bool,
    /// Whether the wallet was last confirmed on `selected_network`
    pub network_confirmed: bool,
    phase: ConnectionPhase,
}

impl ConnectionState {
    pub fn new(selected_network: &str, contract_address: Option<Address>) -> Self {
        Self {
            selected_network: selected_network.to_string(),
            contract_address,
            wallet_account: None,
            contract_bound: false,
            network_confirmed: false,
            phase: ConnectionPhase::Disconnected,
        }
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub(crate) fn enter(&mut self, phase: ConnectionPhase) {
        if self.phase != phase {
            debug!(from = %self.phase, to = %phase, "Connection phase");
        }
        self.phase = phase;
    }

    /// Nearest stable phase given what is currently known.
    pub fn stable_phase(&self) -> ConnectionPhase {
        if self.wallet_account.is_none() {
            ConnectionPhase::Disconnected
        } else if self.network_confirmed {
            ConnectionPhase::NetworkOk
        } else {
            ConnectionPhase::WalletConnected
        }
    }

    /// Return to the nearest stable phase after a failed step.
    pub(crate) fn fall_back(&mut self) -> ConnectionPhase {
        let phase = self.stable_phase();
        self.enter(phase);
        phase
    }

    /// Switch to `network`, resetting everything bound to the old one.
    pub(crate) fn select_network(&mut self, network: &str, default_contract: Option<Address>) {
        self.selected_network = network.to_string();
        self.contract_address = default_contract;
        self.contract_bound = false;
    }
}
