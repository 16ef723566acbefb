//! Price feed core logic.
//!
//! This crate provides the client side of the price feed reader:
//! - Network table, registry and deployment records
//! - Price normalization and display formatting
//! - Connection state machine
//! - Client state holder with named action handlers
//!
//! Chain access (wallet, transports, contract calls) lives in `pricefeed-chain`.

mod client;
pub mod config;
pub mod normalizer;
mod state;

pub use client::{
    DisplayedPrice, FeedInspection, Notice, NoticeKind, PriceFeedClient, SecondaryFactory,
};
pub use config::{load_registry, ConfigPaths, DeploymentRecord, NetworkRegistry, ResolvedNetwork};
pub use normalizer::{format_price, normalize, FormattedPrice, NormalizedPrice, DISPLAY_EXPONENT};
pub use state::{ConnectionPhase, ConnectionState};
