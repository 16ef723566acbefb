//! Configuration for the price feed client.
//!
//! This module provides:
//! - Network table schema (chains, tokens, pairs, contracts)
//! - Network registry (validated, resolved networks)
//! - Deployment records (per-network contract overrides)
//! - Loader tying the above together from disk and environment

mod deployment;
mod loader;
mod network;
mod registry;

pub use deployment::{DeploymentRecord, DEFAULT_DEPLOYMENTS_DIR};
pub use loader::{env, load_registry, ConfigPaths};
pub use network::{NetworkConfig, NetworksFile, PairConfig};
pub use registry::{NetworkRegistry, ResolvedNetwork, NETWORKS_FILE};
