//! Network registry: the validated, resolved form of the network table.
//!
//! The registry is the single source of network descriptors, token pairs
//! and default contracts. It is built from `config/networks.toml` (or the
//! built-in copy) and optionally overlaid with deployment records.

use super::{DeploymentRecord, NetworkConfig, NetworksFile};
use alloy::primitives::Address;
use anyhow::{bail, Context, Result};
use pricefeed_chain::{NetworkDescriptor, PriceFeedAbi, TokenPair};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Built-in network table, used when no config directory is present.
const BUILTIN_NETWORKS: &str = include_str!("../../../../config/networks.toml");

/// File name of the network table inside a config directory.
pub const NETWORKS_FILE: &str = "networks.toml";

/// A network with everything needed to read prices from it.
#[derive(Debug, Clone)]
pub struct ResolvedNetwork {
    pub descriptor: NetworkDescriptor,
    /// Default contract (deployment record, else network table)
    pub contract: Option<Address>,
    pub abi: PriceFeedAbi,
    pub tokens: BTreeMap<String, Address>,
    /// Pairs in configured order
    pub pairs: Vec<TokenPair>,
    pub convenience: Vec<String>,
}

impl ResolvedNetwork {
    pub fn key(&self) -> &str {
        &self.descriptor.key
    }

    fn resolve(key: &str, config: &NetworkConfig) -> Result<Self> {
        let mut tokens = BTreeMap::new();
        for (symbol, raw) in &config.tokens {
            let address: Address = raw
                .parse()
                .with_context(|| format!("Invalid address for token {symbol} on {key}: {raw}"))?;
            tokens.insert(symbol.clone(), address);
        }

        let mut pairs = Vec::with_capacity(config.pairs.len());
        for pair in &config.pairs {
            let lookup = |symbol: &str| {
                tokens.get(symbol).copied().with_context(|| {
                    format!("Pair {} on {key} references unknown token {symbol}", pair.name)
                })
            };
            pairs.push(TokenPair {
                display_name: pair.name.clone(),
                base: lookup(&pair.base)?,
                quote: lookup(&pair.quote)?,
            });
        }

        let contract = match &config.contract {
            Some(raw) => {
                let address: Address = raw
                    .parse()
                    .with_context(|| format!("Invalid contract address on {key}: {raw}"))?;
                // Zero address is a "not deployed yet" placeholder.
                (!address.is_zero()).then_some(address)
            }
            None => None,
        };

        if config.disputed_chain_ids.contains(&config.chain_id) {
            bail!("Network {key} lists its own chain id {} as disputed", config.chain_id);
        }

        Ok(Self {
            descriptor: NetworkDescriptor {
                key: key.to_string(),
                chain_id: config.chain_id,
                name: config.name.clone(),
                rpc_url: config.rpc_url.clone(),
                explorer_url: config.explorer_url.clone(),
                native_currency: config.native_currency.clone(),
                disputed_chain_ids: config.disputed_chain_ids.clone(),
            },
            contract,
            abi: config.abi,
            tokens,
            pairs,
            convenience: config.convenience.clone(),
        })
    }
}

/// Validated set of configured networks.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    /// Networks in key order
    networks: Vec<ResolvedNetwork>,
    /// Index of the default network in `networks`
    default_index: usize,
    settle: Duration,
}

impl NetworkRegistry {
    /// Build a registry from a parsed network table.
    pub fn from_file_config(file: &NetworksFile) -> Result<Self> {
        let mut networks = Vec::with_capacity(file.networks.len());
        let mut seen_chain_ids: HashMap<u64, &str> = HashMap::new();

        for (key, config) in &file.networks {
            if let Some(other) = seen_chain_ids.insert(config.chain_id, key) {
                bail!(
                    "Networks {other} and {key} share chain id {}",
                    config.chain_id
                );
            }
            let network = ResolvedNetwork::resolve(key, config)?;
            debug!(
                network = %key,
                chain_id = config.chain_id,
                pairs = network.pairs.len(),
                "Resolved network"
            );
            networks.push(network);
        }

        let default_index = networks
            .iter()
            .position(|n| n.key() == file.default_network)
            .with_context(|| {
                format!("Default network {} is not configured", file.default_network)
            })?;

        Ok(Self {
            networks,
            default_index,
            settle: Duration::from_millis(file.switch_settle_ms),
        })
    }

    /// Parse and validate TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file = NetworksFile::from_toml(content).context("Failed to parse network table")?;
        Self::from_file_config(&file)
    }

    /// The compiled-in network table.
    pub fn builtin() -> Result<Self> {
        Self::from_toml(BUILTIN_NETWORKS)
    }

    /// Load `<config_dir>/networks.toml`, or the built-in table when the
    /// directory has none.
    pub fn load(config_dir: Option<&Path>) -> Result<Self> {
        let path = config_dir.map(|dir| dir.join(NETWORKS_FILE));
        let registry = match path {
            Some(path) if path.exists() => {
                let file = NetworksFile::from_file(&path)
                    .with_context(|| format!("Failed to load {}", path.display()))?;
                let registry = Self::from_file_config(&file)?;
                info!(path = %path.display(), networks = registry.networks.len(), "Loaded network table");
                registry
            }
            Some(path) => {
                warn!(path = %path.display(), "Network table not found, using built-in table");
                Self::builtin()?
            }
            None => Self::builtin()?,
        };
        Ok(registry)
    }

    /// Overlay deployment records from `dir` onto default contracts.
    ///
    /// Records whose chain id disagrees with the network are skipped.
    pub fn apply_deployments(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        let mut applied = 0;

        for network in &mut self.networks {
            let Some(record) = DeploymentRecord::load(dir, network.key())? else {
                continue;
            };
            if record.chain_id != network.descriptor.chain_id {
                warn!(
                    network = %network.key(),
                    record_chain_id = record.chain_id,
                    expected = network.descriptor.chain_id,
                    "Deployment record is for another chain, ignoring"
                );
                continue;
            }
            let address = record.address()?;
            info!(network = %network.key(), contract = %address, "Using recorded deployment");
            network.contract = Some(address);
            applied += 1;
        }

        Ok(applied)
    }

    /// Look up a network by key.
    pub fn get(&self, key: &str) -> Option<&ResolvedNetwork> {
        self.networks.iter().find(|n| n.key() == key)
    }

    /// Look up a network by key, with an error naming the known keys.
    pub fn require(&self, key: &str) -> Result<&ResolvedNetwork> {
        self.get(key).with_context(|| {
            let known: Vec<&str> = self.networks.iter().map(|n| n.key()).collect();
            format!("Unknown network {key} (configured: {})", known.join(", "))
        })
    }

    /// Network whose canonical chain id is `chain_id`.
    pub fn by_chain_id(&self, chain_id: u64) -> Option<&ResolvedNetwork> {
        self.networks
            .iter()
            .find(|n| n.descriptor.chain_id == chain_id)
    }

    /// Network listing `chain_id` as disputed, unless another network owns
    /// that id outright.
    pub fn disputed_owner(&self, chain_id: u64) -> Option<&ResolvedNetwork> {
        if self.by_chain_id(chain_id).is_some() {
            return None;
        }
        self.networks
            .iter()
            .find(|n| n.descriptor.is_disputed(chain_id))
    }

    pub fn default_network(&self) -> &ResolvedNetwork {
        &self.networks[self.default_index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedNetwork> {
        self.networks.iter()
    }

    pub fn descriptors(&self) -> Vec<NetworkDescriptor> {
        self.networks.iter().map(|n| n.descriptor.clone()).collect()
    }

    /// Settle delay after a wallet switch.
    pub fn settle(&self) -> Duration {
        self.settle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use pricefeed_chain::testing::ScriptedWallet;
    use pricefeed_chain::wallet::methods;
    use pricefeed_chain::NetworkManager;
    use serde_json::json;
    use std::sync::Arc;

    const MINIMAL: &str = r#"
        default_network = "alpha"
        switch_settle_ms = 0

        [networks.alpha]
        chain_id = 1
        name = "Alpha"
        rpc_url = "http://127.0.0.1:8545"
        explorer_url = "http://127.0.0.1"
        native_currency = "ETH"
        contract = "0x3B77e4E8782b6033DF4a967F3Ed77726648457eF"

        [networks.alpha.tokens]
        ETH = "0x0000000000000000000000000000000000000000"
        USDC = "0x901fb725c106E182614105335ad0E230c91B67C8"

        [[networks.alpha.pairs]]
        name = "ETH/USDC"
        base = "ETH"
        quote = "USDC"
    "#;

    #[test]
    fn test_builtin_table() {
        let registry = NetworkRegistry::builtin().unwrap();
        assert_eq!(registry.default_network().key(), "aurora-testnet");
        assert_eq!(registry.settle(), Duration::from_millis(1000));

        let testnet = registry.require("aurora-testnet").unwrap();
        assert_eq!(testnet.descriptor.chain_id, 1313161555);
        assert_eq!(testnet.descriptor.chain_id_hex(), "0x4e454153");
        let names: Vec<_> = testnet.pairs.iter().map(|p| p.display_name.as_str()).collect();
        assert_eq!(names, ["ETH/USDC", "AURORA/USDC", "ETH/AURORA"]);
        assert!(testnet.contract.is_some());

        let mainnet = registry.require("aurora-mainnet").unwrap();
        assert_eq!(mainnet.descriptor.chain_id, 1313161554);
        assert!(mainnet.descriptor.is_disputed(1313161890));
        assert!(mainnet.contract.is_none());

        let virtual_chain = registry.by_chain_id(1313161890).unwrap();
        assert_eq!(virtual_chain.abi, PriceFeedAbi::WithSource);
        assert_eq!(virtual_chain.pairs.len(), 4);
    }

    #[test]
    fn test_disputed_owner_skips_owned_ids() {
        let registry = NetworkRegistry::builtin().unwrap();
        assert!(registry.disputed_owner(1313161890).is_none());
        assert!(registry.disputed_owner(1313161554).is_none());

        let toml = MINIMAL.replace(
            "native_currency = \"ETH\"\n",
            "native_currency = \"ETH\"\n        disputed_chain_ids = [99]\n",
        );
        let registry = NetworkRegistry::from_toml(&toml).unwrap();
        assert_eq!(registry.disputed_owner(99).unwrap().key(), "alpha");
    }

    #[tokio::test]
    async fn test_builtin_networks_need_no_switch_when_already_on_target() {
        let registry = NetworkRegistry::builtin().unwrap();
        let networks = registry.descriptors();
        assert_eq!(networks.len(), 3);

        for network in networks {
            let wallet = Arc::new(ScriptedWallet::new());
            wallet.always(methods::CHAIN_ID, Ok(json!(network.chain_id_hex())));

            NetworkManager::new(wallet.clone())
                .with_settle(Duration::ZERO)
                .ensure_chain(&network)
                .await
                .unwrap();

            assert_eq!(wallet.count(methods::SWITCH_CHAIN), 0, "{}", network.key);
            assert_eq!(wallet.count(methods::ADD_CHAIN), 0, "{}", network.key);
        }
    }

    #[test]
    fn test_unknown_token_in_pair() {
        let toml = MINIMAL.replace("quote = \"USDC\"", "quote = \"DAI\"");
        let err = NetworkRegistry::from_toml(&toml).unwrap_err();
        assert!(format!("{err:#}").contains("unknown token DAI"));
    }

    #[test]
    fn test_bad_token_address() {
        let toml = MINIMAL.replace(
            "0x901fb725c106E182614105335ad0E230c91B67C8",
            "0x901fb725",
        );
        assert!(NetworkRegistry::from_toml(&toml).is_err());
    }

    #[test]
    fn test_missing_default_network() {
        let toml = MINIMAL.replace("default_network = \"alpha\"", "default_network = \"beta\"");
        let err = NetworkRegistry::from_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("beta"));
    }

    #[test]
    fn test_duplicate_chain_id() {
        let toml = format!(
            "{MINIMAL}\n{}",
            r#"
            [networks.beta]
            chain_id = 1
            name = "Beta"
            rpc_url = "http://127.0.0.1:8546"
            explorer_url = "http://127.0.0.1"
            native_currency = "ETH"
            "#
        );
        let err = NetworkRegistry::from_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("share chain id 1"));
    }

    #[test]
    fn test_deployment_record_overrides_contract() {
        let mut registry = NetworkRegistry::from_toml(MINIMAL).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let recorded = address!("EeC71DF7453614b5EcaB9514FAA523d1C554Ad15");
        DeploymentRecord::new("alpha", 1, recorded, "0xabc")
            .save(dir.path())
            .unwrap();

        assert_eq!(registry.apply_deployments(dir.path()).unwrap(), 1);
        assert_eq!(registry.require("alpha").unwrap().contract, Some(recorded));
    }

    #[test]
    fn test_deployment_record_for_other_chain_is_ignored() {
        let mut registry = NetworkRegistry::from_toml(MINIMAL).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let recorded = address!("EeC71DF7453614b5EcaB9514FAA523d1C554Ad15");
        DeploymentRecord::new("alpha", 2, recorded, "0xabc")
            .save(dir.path())
            .unwrap();

        assert_eq!(registry.apply_deployments(dir.path()).unwrap(), 0);
        assert_ne!(registry.require("alpha").unwrap().contract, Some(recorded));
    }

    #[test]
    fn test_load_without_dir_uses_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let registry = NetworkRegistry::load(Some(dir.path())).unwrap();
        assert!(registry.get("aurora-testnet").is_some());

        std::fs::write(dir.path().join(NETWORKS_FILE), MINIMAL).unwrap();
        let registry = NetworkRegistry::load(Some(dir.path())).unwrap();
        assert_eq!(registry.default_network().key(), "alpha");
        assert!(registry.get("aurora-testnet").is_none());
    }
}
