//! Network table schema (`config/networks.toml`).

use pricefeed_chain::PriceFeedAbi;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Root of the network table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworksFile {
    /// Network selected when nothing else is requested
    pub default_network: String,
    /// Wait after a wallet switch/add before re-reading the chain id
    #[serde(default = "default_settle_ms")]
    pub switch_settle_ms: u64,
    /// Networks keyed by logical name
    pub networks: BTreeMap<String, NetworkConfig>,
}

fn default_settle_ms() -> u64 {
    1000
}

/// One `[networks.<key>]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Decimal chain id
    pub chain_id: u64,
    /// Human-readable name
    pub name: String,
    /// Public JSON-RPC endpoint
    pub rpc_url: String,
    /// Block explorer base URL
    pub explorer_url: String,
    /// Native currency symbol (e.g., "ETH")
    pub native_currency: String,
    /// Default price consumer contract
    #[serde(default)]
    pub contract: Option<String>,
    /// Return shape of `getLatestPrice`
    #[serde(default)]
    pub abi: PriceFeedAbi,
    /// Chain ids also attributed to this network elsewhere
    #[serde(default)]
    pub disputed_chain_ids: Vec<u64>,
    /// Token symbol -> address
    #[serde(default)]
    pub tokens: BTreeMap<String, String>,
    /// Pairs to read, by token symbol
    #[serde(default)]
    pub pairs: Vec<PairConfig>,
    /// Zero-argument getters such as `getETHUSDPrice`
    #[serde(default)]
    pub convenience: Vec<String>,
}

/// One `[[networks.<key>.pairs]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairConfig {
    pub name: String,
    pub base: String,
    pub quote: String,
}

impl NetworksFile {
    /// Parse a network table from TOML text.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let mut file: NetworksFile = toml::from_str(content)?;
        file.expand_env_vars();
        Ok(file)
    }

    /// Load a network table from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Expand environment variables in URL values.
    pub fn expand_env_vars(&mut self) {
        for network in self.networks.values_mut() {
            network.rpc_url = expand_env(&network.rpc_url);
            network.explorer_url = expand_env(&network.explorer_url);
        }
    }
}

/// Expand ${VAR_NAME} patterns with environment variable values.
fn expand_env(s: &str) -> String {
    let Ok(re) = regex_lite::Regex::new(r"\$\{([^}]+)\}") else {
        return s.to_string();
    };
    let mut result = s.to_string();

    for cap in re.captures_iter(s) {
        if let (Some(full_match), Some(var_match)) = (cap.get(0), cap.get(1)) {
            let var_name = var_match.as_str();
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(full_match.as_str(), &value);
            }
        }
    }

    result
}
