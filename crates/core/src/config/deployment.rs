//! Deployment records (`deployments/<network>.json`).
//!
//! A record remembers where the price consumer was deployed on a network.
//! When present it overrides the contract configured in the network table.

use alloy::primitives::Address;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use pricefeed_chain::parse_chain_id;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default directory for deployment records.
pub const DEFAULT_DEPLOYMENTS_DIR: &str = "deployments";

/// A recorded deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    /// Deployed contract address
    pub contract_address: String,
    /// Logical network key
    pub network: String,
    /// Chain id; accepted as a number or a string on read
    #[serde(deserialize_with = "chain_id_from_number_or_string")]
    pub chain_id: u64,
    /// Deploying account
    #[serde(default)]
    pub deployer: String,
    /// Deployment time
    pub timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ChainIdRepr {
    Number(u64),
    Text(String),
}

fn chain_id_from_number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match ChainIdRepr::deserialize(deserializer)? {
        ChainIdRepr::Number(n) => Ok(n),
        ChainIdRepr::Text(s) => parse_chain_id(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid chainId {s:?}"))),
    }
}

impl DeploymentRecord {
    /// Record a deployment made now.
    pub fn new(network: &str, chain_id: u64, contract_address: Address, deployer: &str) -> Self {
        Self {
            contract_address: contract_address.to_checksum(None),
            network: network.to_string(),
            chain_id,
            deployer: deployer.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Parsed contract address.
    pub fn address(&self) -> Result<Address> {
        self.contract_address
            .parse()
            .with_context(|| format!("Invalid contractAddress {:?}", self.contract_address))
    }

    /// `<dir>/<network>.json`
    pub fn path_for(dir: impl AsRef<Path>, network: &str) -> PathBuf {
        dir.as_ref().join(format!("{network}.json"))
    }

    /// Load the record for `network`, if one exists.
    pub fn load(dir: impl AsRef<Path>, network: &str) -> Result<Option<Self>> {
        let path = Self::path_for(dir, network);
        if !path.exists() {
            debug!(path = %path.display(), "No deployment record");
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let record: DeploymentRecord = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        record.address()?;

        debug!(
            path = %path.display(),
            contract = %record.contract_address,
            chain_id = record.chain_id,
            "Loaded deployment record"
        );
        Ok(Some(record))
    }

    /// Write the record to `<dir>/<network>.json`, creating `dir` if needed.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let path = Self::path_for(dir, &self.network);
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!(path = %path.display(), contract = %self.contract_address, "Saved deployment record");
        Ok(path)
    }
}
