//! Single entry point for loading client configuration.
//!
//! Resolves the network table (config directory or built-in copy) and
//! overlays any deployment records.

use super::{NetworkRegistry, DEFAULT_DEPLOYMENTS_DIR};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable names.
pub mod env {
    pub const CONFIG_DIR: &str = "CONFIG_DIR";
    pub const DEPLOYMENTS_DIR: &str = "DEPLOYMENTS_DIR";
    pub const WALLET_RPC_URL: &str = "WALLET_RPC_URL";
    pub const PRICEFEED_NETWORK: &str = "PRICEFEED_NETWORK";
}

/// Where configuration is read from.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Directory containing `networks.toml`; `None` uses the built-in table
    pub config_dir: Option<PathBuf>,
    /// Directory containing `<network>.json` deployment records
    pub deployments_dir: PathBuf,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self {
            config_dir: Some(PathBuf::from("config")),
            deployments_dir: PathBuf::from(DEFAULT_DEPLOYMENTS_DIR),
        }
    }
}

/// Load the network registry and apply deployment records.
pub fn load_registry(paths: &ConfigPaths) -> Result<NetworkRegistry> {
    let mut registry = NetworkRegistry::load(paths.config_dir.as_deref())
        .context("Failed to load network registry")?;

    let applied = apply_deployments_if_present(&mut registry, &paths.deployments_dir)?;

    info!(
        networks = registry.iter().count(),
        default = %registry.default_network().key(),
        deployments = applied,
        "Configuration loaded"
    );
    Ok(registry)
}

fn apply_deployments_if_present(registry: &mut NetworkRegistry, dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    registry
        .apply_deployments(dir)
        .with_context(|| format!("Failed to apply deployment records from {}", dir.display()))
}
