//! Network detection and switching through the wallet.

use crate::error::{chain_id_hex, PriceFeedError};
use crate::wallet::{methods, WalletProvider};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Default wait after a switch or add before re-reading the chain id.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(1000);

/// Static description of one supported chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDescriptor {
    /// Logical key in the network table (e.g. `aurora-testnet`)
    pub key: String,
    pub chain_id: u64,
    /// Display name passed to the wallet when adding the chain
    pub name: String,
    pub rpc_url: String,
    pub explorer_url: String,
    /// Native currency symbol
    pub native_currency: String,
    /// Chain ids also seen for this network in the wild. Observing one is
    /// reported, never treated as a match.
    pub disputed_chain_ids: Vec<u64>,
}

impl NetworkDescriptor {
    /// Chain id as `0x` hex, derived from the decimal id.
    pub fn chain_id_hex(&self) -> String {
        chain_id_hex(self.chain_id)
    }

    /// Whether `chain_id` is one of this network's disputed ids.
    pub fn is_disputed(&self, chain_id: u64) -> bool {
        self.disputed_chain_ids.contains(&chain_id)
    }

    /// Parameters for `wallet_addEthereumChain`.
    pub fn add_chain_params(&self) -> Value {
        json!({
            "chainId": self.chain_id_hex(),
            "chainName": self.name,
            "nativeCurrency": {
                "name": self.native_currency,
                "symbol": self.native_currency,
                "decimals": 18,
            },
            "rpcUrls": [self.rpc_url],
            "blockExplorerUrls": [self.explorer_url],
        })
    }
}

/// Find the network whose chain id equals `chain_id`.
pub fn match_network(chain_id: u64, networks: &[NetworkDescriptor]) -> Option<&NetworkDescriptor> {
    networks.iter().find(|n| n.chain_id == chain_id)
}

/// Result of [`NetworkManager::debug_network`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDebugInfo {
    pub chain_id: u64,
    pub chain_id_hex: String,
    /// `net_version`, when the wallet supports it
    pub net_version: Option<String>,
    /// Key of the configured network with this chain id
    pub matched: Option<String>,
    /// Keys of networks that list this chain id as disputed
    pub disputed_by: Vec<String>,
}

/// Detects the wallet's chain and moves it to a target network.
#[derive(Debug, Clone)]
pub struct NetworkManager {
    wallet: Arc<dyn WalletProvider>,
    settle: Duration,
}

impl NetworkManager {
    pub fn new(wallet: Arc<dyn WalletProvider>) -> Self {
        Self {
            wallet,
            settle: DEFAULT_SETTLE,
        }
    }

    /// Override the post-switch settle delay.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Chain id currently reported by the wallet.
    pub async fn detect_current_chain(&self) -> Result<u64, PriceFeedError> {
        let chain_id = self.wallet.chain_id().await?;
        debug!(chain_id, chain_hex = %chain_id_hex(chain_id), "Detected wallet chain");
        Ok(chain_id)
    }

    /// Make sure the wallet is on `target`.
    ///
    /// Already on target: returns immediately without a switch request.
    /// Otherwise asks the wallet to switch; if the wallet does not know the
    /// chain, adds it and waits once for the wallet to settle. Success is
    /// judged only by the chain id reported afterwards.
    #[instrument(skip(self, target), fields(network = %target.key, chain_id = target.chain_id))]
    pub async fn ensure_chain(&self, target: &NetworkDescriptor) -> Result<(), PriceFeedError> {
        let current = self.detect_current_chain().await?;
        if current == target.chain_id {
            debug!("Wallet already on target network");
            return Ok(());
        }
        self.warn_if_disputed(current, target);

        info!(
            from = %chain_id_hex(current),
            to = %target.chain_id_hex(),
            "Requesting network switch"
        );

        let switch = self
            .wallet
            .request(
                methods::SWITCH_CHAIN,
                json!([{ "chainId": target.chain_id_hex() }]),
            )
            .await;

        match switch {
            Ok(_) => {}
            Err(e) if e.is_unrecognized_chain() => {
                warn!("Wallet does not know the network, adding it");
                self.wallet
                    .request(methods::ADD_CHAIN, json!([target.add_chain_params()]))
                    .await
                    .map_err(|e| {
                        if e.is_user_rejection() {
                            PriceFeedError::from(e)
                        } else {
                            warn!(error = %e, "Adding network failed");
                            PriceFeedError::ChainUnregistered {
                                chain_id: target.chain_id,
                            }
                        }
                    })?;
            }
            Err(e) => return Err(e.into()),
        }

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        let observed = self.detect_current_chain().await?;
        if observed != target.chain_id {
            self.warn_if_disputed(observed, target);
            return Err(PriceFeedError::WrongNetwork {
                observed,
                expected: target.chain_id,
            });
        }

        info!("Switched network");
        Ok(())
    }

    /// Fail with `WrongNetwork` unless the wallet is on `target`.
    pub async fn check_chain(&self, target: &NetworkDescriptor) -> Result<(), PriceFeedError> {
        let observed = self.detect_current_chain().await?;
        if observed == target.chain_id {
            return Ok(());
        }
        self.warn_if_disputed(observed, target);
        Err(PriceFeedError::WrongNetwork {
            observed,
            expected: target.chain_id,
        })
    }

    /// Diagnostic snapshot of what the wallet reports.
    pub async fn debug_network(
        &self,
        networks: &[NetworkDescriptor],
    ) -> Result<NetworkDebugInfo, PriceFeedError> {
        let chain_id = self.detect_current_chain().await?;
        let net_version = match self.wallet.net_version().await {
            Ok(v) => Some(v),
            Err(e) => {
                debug!(error = %e, "net_version unavailable");
                None
            }
        };

        let disputed_by: Vec<String> = networks
            .iter()
            .filter(|n| n.is_disputed(chain_id))
            .map(|n| n.key.clone())
            .collect();
        let matched = match_network(chain_id, networks).map(|n| n.key.clone());
        if matched.is_none() {
            for key in &disputed_by {
                warn!(chain_id, network = %key, "Wallet reports a disputed chain id");
            }
        }

        Ok(NetworkDebugInfo {
            chain_id,
            chain_id_hex: chain_id_hex(chain_id),
            net_version,
            matched,
            disputed_by,
        })
    }

    fn warn_if_disputed(&self, observed: u64, target: &NetworkDescriptor) {
        if target.is_disputed(observed) {
            warn!(
                observed,
                canonical = target.chain_id,
                network = %target.key,
                "Wallet reports a disputed chain id for this network"
            );
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::NetworkDescriptor;

    pub fn testnet() -> NetworkDescriptor {
        NetworkDescriptor {
            key: "aurora-testnet".to_string(),
            chain_id: 1313161555,
            name: "Aurora Testnet".to_string(),
            rpc_url: "https://testnet.aurora.dev".to_string(),
            explorer_url: "https://testnet.aurora.dev".to_string(),
            native_currency: "ETH".to_string(),
            disputed_chain_ids: vec![],
        }
    }

    pub fn mainnet() -> NetworkDescriptor {
        NetworkDescriptor {
            key: "aurora-mainnet".to_string(),
            chain_id: 1313161554,
            name: "Aurora Mainnet".to_string(),
            rpc_url: "https://mainnet.aurora.dev".to_string(),
            explorer_url: "https://aurorascan.dev".to_string(),
            native_currency: "ETH".to_string(),
            disputed_chain_ids: vec![1313161890],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::error::WalletError;
    use crate::testing::ScriptedWallet;

    fn manager(wallet: Arc<ScriptedWallet>) -> NetworkManager {
        NetworkManager::new(wallet).with_settle(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_already_on_target_issues_no_switch() {
        for network in [testnet(), mainnet()] {
            let wallet = Arc::new(ScriptedWallet::new());
            wallet.always(methods::CHAIN_ID, Ok(json!(network.chain_id_hex())));

            manager(wallet.clone()).ensure_chain(&network).await.unwrap();

            assert_eq!(wallet.count(methods::SWITCH_CHAIN), 0);
            assert_eq!(wallet.count(methods::ADD_CHAIN), 0);
        }
    }

    #[tokio::test]
    async fn test_switch_then_recheck() {
        let wallet = Arc::new(ScriptedWallet::new());
        wallet.push(methods::CHAIN_ID, Ok(json!("0x1")));
        wallet.push(methods::CHAIN_ID, Ok(json!("0x4e454153")));
        wallet.always(methods::SWITCH_CHAIN, Ok(Value::Null));

        manager(wallet.clone()).ensure_chain(&testnet()).await.unwrap();

        let calls = wallet.calls();
        let (_, params) = calls
            .iter()
            .find(|(m, _)| m == methods::SWITCH_CHAIN)
            .unwrap();
        assert_eq!(params[0]["chainId"], "0x4e454153");
    }

    #[tokio::test]
    async fn test_unrecognized_chain_adds_then_succeeds() {
        let wallet = Arc::new(ScriptedWallet::new());
        wallet.push(methods::CHAIN_ID, Ok(json!("0x1")));
        wallet.push(methods::CHAIN_ID, Ok(json!("0x4e454153")));
        wallet.always(
            methods::SWITCH_CHAIN,
            Err(WalletError::Rpc {
                code: -32603,
                message: "Unrecognized chain ID".to_string(),
                nested_code: Some(4902),
            }),
        );
        wallet.always(methods::ADD_CHAIN, Ok(Value::Null));

        manager(wallet.clone()).ensure_chain(&testnet()).await.unwrap();

        assert_eq!(wallet.count(methods::ADD_CHAIN), 1);
        let calls = wallet.calls();
        let (_, params) = calls.iter().find(|(m, _)| m == methods::ADD_CHAIN).unwrap();
        assert_eq!(params[0]["chainName"], "Aurora Testnet");
        assert_eq!(params[0]["nativeCurrency"]["decimals"], 18);
        assert_eq!(params[0]["rpcUrls"][0], "https://testnet.aurora.dev");
    }

    #[tokio::test]
    async fn test_mismatch_after_switch_is_wrong_network() {
        let wallet = Arc::new(ScriptedWallet::new());
        wallet.always(methods::CHAIN_ID, Ok(json!("0x1")));
        wallet.always(methods::SWITCH_CHAIN, Ok(Value::Null));

        let err = manager(wallet).ensure_chain(&testnet()).await.unwrap_err();
        match &err {
            PriceFeedError::WrongNetwork { observed, expected } => {
                assert_eq!(*observed, 1);
                assert_eq!(*expected, 1313161555);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let msg = err.to_string();
        assert!(msg.contains("0x1 (1)"));
        assert!(msg.contains("0x4e454153 (1313161555)"));
    }

    #[tokio::test]
    async fn test_rejected_switch_is_user_rejected() {
        let wallet = Arc::new(ScriptedWallet::new());
        wallet.always(methods::CHAIN_ID, Ok(json!("0x1")));
        wallet.always(
            methods::SWITCH_CHAIN,
            Err(WalletError::Rpc {
                code: 4001,
                message: "User rejected the request.".to_string(),
                nested_code: None,
            }),
        );

        let err = manager(wallet.clone()).ensure_chain(&testnet()).await.unwrap_err();
        assert!(matches!(err, PriceFeedError::UserRejected(_)));
        assert_eq!(wallet.count(methods::ADD_CHAIN), 0);
    }

    #[tokio::test]
    async fn test_failed_add_is_chain_unregistered() {
        let wallet = Arc::new(ScriptedWallet::new());
        wallet.always(methods::CHAIN_ID, Ok(json!("0x1")));
        wallet.always(
            methods::SWITCH_CHAIN,
            Err(WalletError::Rpc {
                code: 4902,
                message: "Unrecognized chain".to_string(),
                nested_code: None,
            }),
        );
        wallet.always(
            methods::ADD_CHAIN,
            Err(WalletError::Rpc {
                code: -32602,
                message: "invalid rpcUrls".to_string(),
                nested_code: None,
            }),
        );

        let err = manager(wallet).ensure_chain(&testnet()).await.unwrap_err();
        assert!(matches!(
            err,
            PriceFeedError::ChainUnregistered { chain_id: 1313161555 }
        ));
    }

    #[tokio::test]
    async fn test_debug_network_reports_disputed_id() {
        let wallet = Arc::new(ScriptedWallet::new());
        wallet.always(methods::CHAIN_ID, Ok(json!("0x4e4542a2")));
        wallet.always(methods::NET_VERSION, Ok(json!("1313161890")));

        let info = manager(wallet)
            .debug_network(&[testnet(), mainnet()])
            .await
            .unwrap();
        assert_eq!(info.chain_id, 1313161890);
        assert_eq!(info.chain_id_hex, "0x4e4542a2");
        assert_eq!(info.net_version.as_deref(), Some("1313161890"));
        assert_eq!(info.matched, None);
        assert_eq!(info.disputed_by, vec!["aurora-mainnet".to_string()]);
    }

    #[tokio::test]
    async fn test_unavailable_wallet() {
        let wallet = Arc::new(ScriptedWallet::new());
        wallet.always(
            methods::CHAIN_ID,
            Err(WalletError::Unavailable("http://127.0.0.1:1248".into())),
        );
        let err = manager(wallet).detect_current_chain().await.unwrap_err();
        assert!(matches!(err, PriceFeedError::WalletUnavailable(_)));
    }
}
