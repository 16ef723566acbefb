//! Price feed client: the state holder behind every user action.
//!
//! Each action handler drives one step of the connect → switch → bind →
//! fetch flow, updates [`ConnectionState`], and reports the outcome as a
//! [`Notice`]. Failures never escape a handler; the state falls back to the
//! nearest stable phase and the notice carries the message.

use crate::config::{NetworkRegistry, ResolvedNetwork};
use crate::normalizer::{format_price, format_timestamp, normalize};
use crate::state::{ConnectionPhase, ConnectionState};
use alloy::primitives::Address;
use pricefeed_chain::{
    chain_id_hex, locate_contract, ContractHandle, ContractLocation, ContractSession,
    ConvenienceReading, NetworkDebugInfo, NetworkDescriptor, NetworkManager, PriceFeedError,
    PriceReading, RpcTransport, Transport, WalletProvider, WalletTransport,
};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Builds the secondary (public RPC) transport for a network.
pub type SecondaryFactory =
    Arc<dyn Fn(&NetworkDescriptor) -> anyhow::Result<Arc<dyn Transport>> + Send + Sync>;

/// Outcome kind of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// User-visible outcome of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NoticeKind::Success => write!(f, "{}", self.message),
            NoticeKind::Error => write!(f, "Error: {}", self.message),
        }
    }
}

/// One displayed row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedPrice {
    pub pair: String,
    /// Formatted price with provenance tag, or the error
    pub price: String,
    pub timestamp: String,
    pub succeeded: bool,
    pub reading: PriceReading,
}

impl DisplayedPrice {
    fn from_reading(reading: PriceReading) -> Self {
        match (reading.succeeded, reading.raw_price) {
            (true, Some(raw)) => {
                let normalized = normalize(raw, reading.exponent.unwrap_or_default());
                let formatted = format_price(normalized.value, reading.provenance.as_deref());
                Self {
                    pair: reading.pair.display_name.clone(),
                    price: formatted.to_string(),
                    timestamp: format_timestamp(reading.observed_at_unix_secs),
                    succeeded: true,
                    reading,
                }
            }
            _ => Self {
                pair: reading.pair.display_name.clone(),
                price: format!(
                    "Error: {}",
                    reading.error.as_deref().unwrap_or("unknown failure")
                ),
                timestamp: "N/A".to_string(),
                succeeded: false,
                reading,
            },
        }
    }
}

/// Registry address and per-pair feed presence.
#[derive(Debug, Clone)]
pub struct FeedInspection {
    pub registry: Result<Address, PriceFeedError>,
    pub pairs: Vec<(String, Result<bool, PriceFeedError>)>,
}

/// Client state holder.
pub struct PriceFeedClient {
    registry: NetworkRegistry,
    wallet: Arc<dyn WalletProvider>,
    manager: NetworkManager,
    secondary: SecondaryFactory,
    state: ConnectionState,
    session: Option<ContractSession>,
    handle: Option<ContractHandle>,
    prices: Vec<DisplayedPrice>,
}

impl fmt::Debug for PriceFeedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriceFeedClient")
            .field("wallet", &self.wallet.endpoint())
            .field("state", &self.state)
            .field("handle", &self.handle)
            .field("prices", &self.prices.len())
            .finish()
    }
}

fn rpc_secondary() -> SecondaryFactory {
    Arc::new(
        |network: &NetworkDescriptor| -> anyhow::Result<Arc<dyn Transport>> {
            Ok(Arc::new(RpcTransport::new(&network.rpc_url)?))
        },
    )
}

impl PriceFeedClient {
    /// Client on the registry's default network.
    pub fn new(registry: NetworkRegistry, wallet: Arc<dyn WalletProvider>) -> Self {
        let default = registry.default_network();
        let state = ConnectionState::new(default.key(), default.contract);
        let manager = NetworkManager::new(wallet.clone()).with_settle(registry.settle());

        Self {
            registry,
            wallet,
            manager,
            secondary: rpc_secondary(),
            state,
            session: None,
            handle: None,
            prices: Vec::new(),
        }
    }

    /// Replace how secondary transports are built.
    pub fn with_secondary(mut self, factory: SecondaryFactory) -> Self {
        self.secondary = factory;
        self
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.state.phase()
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    /// Rows from the last completed fetch.
    pub fn prices(&self) -> &[DisplayedPrice] {
        &self.prices
    }

    pub fn handle(&self) -> Option<&ContractHandle> {
        self.handle.as_ref()
    }

    /// The selected network.
    pub fn current_network(&self) -> &ResolvedNetwork {
        self.registry
            .get(&self.state.selected_network)
            .unwrap_or_else(|| self.registry.default_network())
    }

    fn fail(&mut self, action: &str, message: impl fmt::Display) -> Notice {
        let phase = self.state.fall_back();
        warn!(action, error = %message, phase = %phase, "Action failed");
        Notice::error(message.to_string())
    }

    /// Probe the wallet for authorized accounts and the current chain.
    ///
    /// Does not prompt. Selects the configured network matching the wallet's
    /// chain, if any.
    pub async fn initialize(&mut self) -> Notice {
        let accounts = match self.wallet.accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                self.state.wallet_account = None;
                return self.fail("initialize", PriceFeedError::from(e));
            }
        };

        self.state.wallet_account = accounts.first().cloned();
        let Some(account) = self.state.wallet_account.clone() else {
            self.state.enter(ConnectionPhase::Disconnected);
            return Notice::success("Wallet reachable, no account authorized yet");
        };
        self.state.enter(ConnectionPhase::WalletConnected);

        let chain_id = match self.manager.detect_current_chain().await {
            Ok(id) => id,
            Err(e) => return self.fail("initialize", e),
        };
        self.adopt_chain(chain_id);

        match self.registry.by_chain_id(chain_id) {
            Some(network) => {
                info!(account = %account, network = %network.key(), "Wallet connected");
                Notice::success(format!(
                    "Connected {account} on {}",
                    network.descriptor.name
                ))
            }
            None => Notice::success(format!(
                "Connected {account}; wallet is on unsupported chain {} ({chain_id})",
                chain_id_hex(chain_id)
            )),
        }
    }

    /// Ask the wallet to authorize an account (may prompt).
    pub async fn connect_wallet(&mut self) -> Notice {
        self.state.enter(ConnectionPhase::WalletPending);

        let account = match self.wallet.request_accounts().await {
            Ok(accounts) => match accounts.into_iter().next() {
                Some(account) => account,
                None => return self.fail("connect_wallet", "wallet returned no accounts"),
            },
            Err(e) => return self.fail("connect_wallet", PriceFeedError::from(e)),
        };

        self.state.wallet_account = Some(account.clone());
        self.state.enter(ConnectionPhase::WalletConnected);
        info!(account = %account, "Wallet connected");

        // Chain detection failure leaves the wallet connected.
        match self.manager.detect_current_chain().await {
            Ok(chain_id) => {
                let expected = self.current_network().descriptor.chain_id;
                self.state.network_confirmed = chain_id == expected;
                self.state.enter(self.state.stable_phase());
            }
            Err(e) => warn!(error = %e, "Chain detection after connect failed"),
        }

        Notice::success(format!("Connected {account}"))
    }

    /// Move the wallet to `network` and make it the selected network.
    pub async fn switch_network(&mut self, network: &str) -> Notice {
        let Some(target) = self.registry.get(network).cloned() else {
            return Notice::error(format!("Unknown network {network}"));
        };

        self.state.enter(ConnectionPhase::NetworkChecking);
        match self.manager.ensure_chain(&target.descriptor).await {
            Ok(()) => {
                if self.state.selected_network != target.key() {
                    self.reset_contract();
                    self.prices.clear();
                }
                self.state.select_network(target.key(), target.contract);
                self.state.network_confirmed = true;
                self.state.enter(ConnectionPhase::NetworkOk);
                Notice::success(format!(
                    "On {} ({})",
                    target.descriptor.name,
                    target.descriptor.chain_id_hex()
                ))
            }
            Err(e) => {
                if matches!(e, PriceFeedError::WrongNetwork { .. }) {
                    self.state.network_confirmed = false;
                    self.state.enter(ConnectionPhase::NetworkWrong);
                }
                self.fail("switch_network", e)
            }
        }
    }

    /// Confirm the wallet is on the selected network without switching.
    pub async fn check_network(&mut self) -> Notice {
        let target = self.current_network().descriptor.clone();

        self.state.enter(ConnectionPhase::NetworkChecking);
        match self.manager.check_chain(&target).await {
            Ok(()) => {
                self.state.network_confirmed = true;
                self.state.enter(ConnectionPhase::NetworkOk);
                Notice::success(format!("Wallet is on {}", target.name))
            }
            Err(e) => {
                if matches!(e, PriceFeedError::WrongNetwork { .. }) {
                    self.state.network_confirmed = false;
                    self.state.enter(ConnectionPhase::NetworkWrong);
                }
                self.fail("check_network", e)
            }
        }
    }

    /// What the wallet reports, against the configured networks.
    pub async fn debug_network(&self) -> Result<NetworkDebugInfo, PriceFeedError> {
        self.manager
            .debug_network(&self.registry.descriptors())
            .await
    }

    /// Select `network` without talking to the wallet.
    pub fn select_network(&mut self, network: &str) -> Notice {
        let Some(target) = self.registry.get(network).cloned() else {
            return Notice::error(format!("Unknown network {network}"));
        };
        if self.state.selected_network != target.key() {
            self.reset_contract();
            self.prices.clear();
            self.state.network_confirmed = false;
        }
        self.state.select_network(target.key(), target.contract);
        Notice::success(format!("Selected {}", target.descriptor.name))
    }

    /// Use `address` for the next contract load.
    pub fn set_contract_address(&mut self, address: &str) -> Notice {
        match address.trim().parse::<Address>() {
            Ok(address) => {
                self.reset_contract();
                self.state.contract_address = Some(address);
                Notice::success(format!("Contract address set to {address}"))
            }
            Err(e) => Notice::error(format!("Invalid contract address {address:?}: {e}")),
        }
    }

    /// Bind the configured contract through the wallet, falling back to
    /// the network's public RPC.
    pub async fn load_contract(&mut self) -> Notice {
        let network = self.current_network().clone();
        let Some(address) = self.state.contract_address else {
            return Notice::error(format!("No contract configured for {}", network.key()));
        };

        self.state.enter(ConnectionPhase::ContractLoading);
        let session = match (self.secondary)(&network.descriptor) {
            Ok(secondary) => ContractSession::with_transports(
                network.descriptor.clone(),
                Some(Arc::new(WalletTransport::new(self.wallet.clone())) as Arc<dyn Transport>),
                secondary,
            ),
            Err(e) => return self.fail("load_contract", e),
        };

        let bound = session.bind_contract(address, network.abi).await;
        if bound.is_ok() {
            // Binding checks the wallet chain first.
            self.state.network_confirmed = true;
        }
        self.finish_load(session, bound)
    }

    /// Bind the configured contract through the public RPC only.
    pub async fn load_contract_direct(&mut self) -> Notice {
        let network = self.current_network().clone();
        let Some(address) = self.state.contract_address else {
            return Notice::error(format!("No contract configured for {}", network.key()));
        };

        self.state.enter(ConnectionPhase::ContractLoading);
        let session = match (self.secondary)(&network.descriptor) {
            Ok(secondary) => {
                ContractSession::with_transports(network.descriptor.clone(), None, secondary)
            }
            Err(e) => return self.fail("load_contract_direct", e),
        };

        let bound = session.bind_direct(address, network.abi).await;
        self.finish_load(session, bound)
    }

    fn finish_load(
        &mut self,
        session: ContractSession,
        bound: Result<ContractHandle, PriceFeedError>,
    ) -> Notice {
        match bound {
            Ok(handle) => {
                let message = format!(
                    "Contract loaded at {} via {}",
                    handle.address(),
                    handle.transport_kind()
                );
                self.state.contract_bound = true;
                self.session = Some(session);
                self.handle = Some(handle);
                self.state.enter(ConnectionPhase::ContractReady);
                Notice::success(message)
            }
            Err(e) => {
                self.reset_contract();
                match e {
                    PriceFeedError::ContractNotFound { .. } => {
                        self.state.enter(ConnectionPhase::ContractNotFound)
                    }
                    PriceFeedError::WrongNetwork { .. } => {
                        self.state.network_confirmed = false;
                        self.state.enter(ConnectionPhase::NetworkWrong)
                    }
                    _ => {}
                }
                self.fail("load_contract", e)
            }
        }
    }

    /// Read every configured pair and replace the displayed rows.
    pub async fn fetch_prices(&mut self) -> Notice {
        let (Some(session), Some(handle)) = (self.session.clone(), self.handle.clone()) else {
            return Notice::error("Load the contract before fetching prices");
        };
        let pairs = self.current_network().pairs.clone();

        self.state.enter(ConnectionPhase::FetchingPrices);
        let readings = session.read_multiple(&handle, &pairs).await;
        let rows: Vec<DisplayedPrice> = readings.into_iter().map(DisplayedPrice::from_reading).collect();

        let failed = rows.iter().filter(|r| !r.succeeded).count();
        let total = rows.len();
        self.prices = rows;
        self.state.enter(ConnectionPhase::PricesDisplayed);

        info!(total, failed, "Fetch cycle complete");
        if total > 0 && failed == total {
            Notice::error(format!("All {total} price reads failed"))
        } else if failed > 0 {
            Notice::success(format!(
                "Fetched {} of {total} prices ({failed} failed)",
                total - failed
            ))
        } else {
            Notice::success("Prices fetched successfully")
        }
    }

    /// Read the selected network's convenience getters.
    pub async fn read_convenience(&self) -> Result<Vec<ConvenienceReading>, PriceFeedError> {
        let (session, handle) = self.bound()?;
        let getters = &self.current_network().convenience;
        Ok(session.read_convenience(handle, getters).await)
    }

    /// Registry address and feed presence for each configured pair.
    pub async fn inspect_feeds(&self) -> Result<FeedInspection, PriceFeedError> {
        let (session, handle) = self.bound()?;
        let registry = session.feed_registry(handle).await;

        let mut pairs = Vec::new();
        for pair in &self.current_network().pairs {
            let exists = session.price_feed_exists(handle, pair.base, pair.quote).await;
            pairs.push((pair.display_name.clone(), exists));
        }
        Ok(FeedInspection { registry, pairs })
    }

    /// Bytecode presence of `address` on every configured network.
    pub async fn locate(&self, address: Address) -> Vec<ContractLocation> {
        locate_contract(address, &self.registry.descriptors()).await
    }

    fn bound(&self) -> Result<(&ContractSession, &ContractHandle), PriceFeedError> {
        match (&self.session, &self.handle) {
            (Some(session), Some(handle)) => Ok((session, handle)),
            _ => Err(PriceFeedError::UnknownTransport(
                "no contract loaded".to_string(),
            )),
        }
    }

    fn reset_contract(&mut self) {
        self.state.contract_bound = false;
        self.session = None;
        self.handle = None;
    }

    /// Select the configured network matching `chain_id`, if any.
    fn adopt_chain(&mut self, chain_id: u64) {
        let matched = self
            .registry
            .by_chain_id(chain_id)
            .map(|n| (n.key().to_string(), n.contract));

        if let Some(disputed) = self.registry.disputed_owner(chain_id) {
            warn!(
                chain_id,
                network = %disputed.key(),
                "Wallet reports a chain id disputed for this network"
            );
        }

        match matched {
            Some((key, contract)) => {
                if key != self.state.selected_network {
                    self.reset_contract();
                    self.prices.clear();
                    self.state.select_network(&key, contract);
                }
                self.state.network_confirmed = true;
                self.state.enter(ConnectionPhase::NetworkOk);
            }
            None => {
                self.state.network_confirmed = false;
                self.state.enter(ConnectionPhase::WalletConnected);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricefeed_chain::testing::{legacy_price_return, ScriptedTransport, ScriptedWallet};
    use pricefeed_chain::wallet::methods;
    use pricefeed_chain::{PriceFeedAbi, TransportKind, WalletError};
    use serde_json::{json, Value};
    use std::time::Duration;

    const ACCOUNT: &str = "0x00000000000000000000000000000000000000aa";

    struct Harness {
        client: PriceFeedClient,
        wallet: Arc<ScriptedWallet>,
        rpc: Arc<ScriptedTransport>,
    }

    fn harness(wallet_chain: &str) -> Harness {
        let wallet = Arc::new(ScriptedWallet::new());
        wallet.always(methods::ACCOUNTS, Ok(json!([ACCOUNT])));
        wallet.always(methods::REQUEST_ACCOUNTS, Ok(json!([ACCOUNT])));
        wallet.always(methods::CHAIN_ID, Ok(json!(wallet_chain)));
        wallet.always(methods::GET_CODE, Ok(json!("0x")));

        let rpc = Arc::new(ScriptedTransport::new(TransportKind::Rpc, 1313161555));
        let secondary = rpc.clone();
        let factory: SecondaryFactory = Arc::new(
            move |_: &NetworkDescriptor| -> anyhow::Result<Arc<dyn Transport>> {
                Ok(secondary.clone())
            },
        );

        let mut client = PriceFeedClient::new(NetworkRegistry::builtin().unwrap(), wallet.clone())
            .with_secondary(factory);
        client.manager = NetworkManager::new(wallet.clone()).with_settle(Duration::ZERO);

        Harness { client, wallet, rpc }
    }

    fn testnet_contract(client: &PriceFeedClient) -> Address {
        client.registry().require("aurora-testnet").unwrap().contract.unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_testnet_via_rpc_fallback() {
        let Harness { mut client, wallet, rpc } = harness("0x4e454153");
        let contract = testnet_contract(&client);
        rpc.deploy(contract);

        let testnet = client.registry().require("aurora-testnet").unwrap().clone();
        let abi = testnet.abi;
        let price_of = |symbol: &str| testnet.tokens[symbol];
        rpc.on_call(
            abi.encode_latest_price(price_of("ETH"), price_of("USDC")),
            Ok(legacy_price_return(350_000_000_000, 8, 1_700_000_000)),
        );
        rpc.on_call(
            abi.encode_latest_price(price_of("AURORA"), price_of("USDC")),
            Ok(legacy_price_return(15_000_000, 8, 1_700_000_000)),
        );
        // ETH/AURORA is unscripted and reverts.

        let notice = client.initialize().await;
        assert!(!notice.is_error(), "{notice}");
        assert_eq!(client.phase(), ConnectionPhase::NetworkOk);

        let notice = client.switch_network("aurora-testnet").await;
        assert!(!notice.is_error(), "{notice}");
        assert_eq!(wallet.count(methods::SWITCH_CHAIN), 0);

        let notice = client.load_contract().await;
        assert!(!notice.is_error(), "{notice}");
        assert_eq!(client.phase(), ConnectionPhase::ContractReady);
        assert_eq!(client.handle().unwrap().transport_kind(), TransportKind::Rpc);
        assert!(client.state().contract_bound);

        let notice = client.fetch_prices().await;
        assert!(!notice.is_error(), "{notice}");
        assert_eq!(client.phase(), ConnectionPhase::PricesDisplayed);

        let rows = client.prices();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].pair, "ETH/USDC");
        assert_eq!(rows[0].price, "$3,500.00 (Realistic Data)");
        assert_eq!(rows[0].timestamp, "2023-11-14 22:13:20 UTC");
        assert_eq!(rows[1].price, "$0.15 (Realistic Data)");
        assert!(!rows[2].succeeded);
        assert!(rows[2].price.starts_with("Error:"));
        assert_eq!(rows[2].timestamp, "N/A");
    }

    #[tokio::test]
    async fn test_initialize_without_wallet() {
        let Harness { mut client, wallet, .. } = harness("0x4e454153");
        wallet.always(
            methods::ACCOUNTS,
            Err(WalletError::Unavailable("http://127.0.0.1:1248".into())),
        );

        let notice = client.initialize().await;
        assert!(notice.is_error());
        assert!(notice.message.contains("wallet unavailable"));
        assert_eq!(client.phase(), ConnectionPhase::Disconnected);
    }

    #[tokio::test]
    async fn test_initialize_adopts_wallet_network() {
        let Harness { mut client, .. } = harness("0x4e454152");

        client.initialize().await;
        assert_eq!(client.state().selected_network, "aurora-mainnet");
        assert_eq!(client.state().contract_address, None);
        assert_eq!(client.phase(), ConnectionPhase::NetworkOk);
    }

    #[tokio::test]
    async fn test_initialize_on_virtual_chain_selects_it_not_mainnet() {
        let Harness { mut client, .. } = harness("0x4e4542a2");

        client.initialize().await;
        assert_eq!(client.state().selected_network, "aurora-virtual");
        assert!(client.registry().disputed_owner(1313161890).is_none());
        assert_eq!(client.phase(), ConnectionPhase::NetworkOk);
    }

    #[tokio::test]
    async fn test_rejected_connect_falls_back() {
        let Harness { mut client, wallet, .. } = harness("0x4e454153");
        wallet.always(
            methods::REQUEST_ACCOUNTS,
            Err(WalletError::Rpc {
                code: 4001,
                message: "User rejected the request.".to_string(),
                nested_code: None,
            }),
        );

        let notice = client.connect_wallet().await;
        assert!(notice.is_error());
        assert!(notice.message.contains("rejected"));
        assert_eq!(client.phase(), ConnectionPhase::Disconnected);
    }

    #[tokio::test]
    async fn test_switch_failure_falls_back_to_wallet_connected() {
        let Harness { mut client, wallet, .. } = harness("0x1");
        wallet.always(methods::SWITCH_CHAIN, Ok(Value::Null));

        client.connect_wallet().await;
        assert_eq!(client.phase(), ConnectionPhase::WalletConnected);

        let notice = client.switch_network("aurora-mainnet").await;
        assert!(notice.is_error());
        assert!(notice.message.contains("0x4e454152 (1313161554)"));
        assert_eq!(client.phase(), ConnectionPhase::WalletConnected);
        assert_eq!(client.state().selected_network, "aurora-testnet");
    }

    #[tokio::test]
    async fn test_switch_resets_contract_to_network_default() {
        let Harness { mut client, wallet, .. } = harness("0x4e454153");
        wallet.push(methods::CHAIN_ID, Ok(json!("0x4e454153")));
        wallet.push(methods::CHAIN_ID, Ok(json!("0x4e4542a2")));
        wallet.always(methods::SWITCH_CHAIN, Ok(Value::Null));

        client.set_contract_address("0x00000000000000000000000000000000000000bb");
        let notice = client.switch_network("aurora-virtual").await;
        assert!(!notice.is_error(), "{notice}");
        assert_eq!(client.state().selected_network, "aurora-virtual");
        assert_eq!(client.state().contract_address, None);
        assert_eq!(client.current_network().abi, PriceFeedAbi::WithSource);
    }

    #[tokio::test]
    async fn test_contract_not_found_settles_to_stable_phase() {
        let Harness { mut client, .. } = harness("0x4e454153");
        client.initialize().await;

        let notice = client.load_contract().await;
        assert!(notice.is_error());
        assert!(notice.message.contains("no contract found"));
        assert_eq!(client.phase(), ConnectionPhase::NetworkOk);
        assert!(!client.state().contract_bound);
    }

    #[tokio::test]
    async fn test_fetch_requires_loaded_contract() {
        let Harness { mut client, .. } = harness("0x4e454153");
        let notice = client.fetch_prices().await;
        assert!(notice.is_error());
        assert!(client.prices().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_contract_address() {
        let Harness { mut client, .. } = harness("0x4e454153");
        let before = client.state().contract_address;
        assert!(client.set_contract_address("0x1234").is_error());
        assert_eq!(client.state().contract_address, before);
    }

    #[test]
    fn test_select_network_offline() {
        let Harness { mut client, wallet, .. } = harness("0x4e454153");
        assert!(client.select_network("aurora-nowhere").is_error());

        let notice = client.select_network("aurora-virtual");
        assert!(!notice.is_error());
        assert_eq!(client.current_network().key(), "aurora-virtual");
        assert!(wallet.calls().is_empty());
    }

    #[tokio::test]
    async fn test_direct_load_skips_wallet() {
        let Harness { mut client, wallet, rpc } = harness("0x4e454153");
        rpc.deploy(testnet_contract(&client));

        let notice = client.load_contract_direct().await;
        assert!(!notice.is_error(), "{notice}");
        assert_eq!(client.handle().unwrap().transport_kind(), TransportKind::Rpc);
        assert!(wallet.calls().is_empty());
    }
}
