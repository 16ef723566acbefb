//! Contract binding and price reads.
//!
//! A [`ContractSession`] owns two transports for one network: the wallet
//! (primary) and the network's public RPC (secondary). Binding probes the
//! primary for bytecode and falls back to the secondary when the wallet sees
//! nothing at the address, which happens when the wallet's node lags behind
//! or serves a different chain view than the public endpoint.

use crate::contracts::{self, PriceFeedAbi, RawPrice};
use crate::error::PriceFeedError;
use crate::network::NetworkDescriptor;
use crate::transport::{RpcTransport, Transport, TransportKind};
use alloy::primitives::{Address, I256};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, instrument, warn};

/// A trading pair to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// e.g. `ETH/USDC`
    pub display_name: String,
    pub base: Address,
    pub quote: Address,
}

/// Outcome of reading one pair in a fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceReading {
    pub pair: TokenPair,
    pub raw_price: Option<I256>,
    /// Exponent reported by the contract
    pub exponent: Option<u8>,
    /// Contract timestamp on success, local clock on failure
    pub observed_at_unix_secs: u64,
    pub provenance: Option<String>,
    pub succeeded: bool,
    pub error: Option<String>,
}

impl PriceReading {
    fn success(pair: TokenPair, raw: RawPrice) -> Self {
        Self {
            pair,
            raw_price: Some(raw.price),
            exponent: Some(raw.decimals),
            observed_at_unix_secs: raw.timestamp,
            provenance: raw.source,
            succeeded: true,
            error: None,
        }
    }

    fn failure(pair: TokenPair, err: &PriceFeedError) -> Self {
        Self {
            pair,
            raw_price: None,
            exponent: None,
            observed_at_unix_secs: unix_now(),
            provenance: None,
            succeeded: false,
            error: Some(err.to_string()),
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// A contract address bound to the transport that can see it.
#[derive(Debug, Clone)]
pub struct ContractHandle {
    address: Address,
    abi: PriceFeedAbi,
    chain_id: u64,
    transport: Arc<dyn Transport>,
}

impl ContractHandle {
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn abi(&self) -> PriceFeedAbi {
        self.abi
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Which transport the handle is bound to.
    pub fn transport_kind(&self) -> TransportKind {
        self.transport.kind()
    }
}

/// Convenience getter result.
#[derive(Debug, Clone)]
pub struct ConvenienceReading {
    pub getter: String,
    pub result: Result<I256, PriceFeedError>,
}

/// Bytecode presence of one address on one network.
#[derive(Debug, Clone)]
pub struct ContractLocation {
    pub network: String,
    pub chain_id: u64,
    /// Bytecode length, or the lookup error
    pub code_len: Result<usize, PriceFeedError>,
}

impl ContractLocation {
    pub fn found(&self) -> bool {
        matches!(self.code_len, Ok(len) if len > 0)
    }
}

/// Contract access for one network.
#[derive(Debug, Clone)]
pub struct ContractSession {
    network: NetworkDescriptor,
    primary: Option<Arc<dyn Transport>>,
    secondary: Arc<dyn Transport>,
}

impl ContractSession {
    /// Session without a wallet; only [`bind_direct`](Self::bind_direct) works.
    pub fn direct(network: NetworkDescriptor) -> anyhow::Result<Self> {
        let secondary = RpcTransport::new(&network.rpc_url)?;
        Ok(Self {
            network,
            primary: None,
            secondary: Arc::new(secondary),
        })
    }

    /// Session over explicit transports.
    pub fn with_transports(
        network: NetworkDescriptor,
        primary: Option<Arc<dyn Transport>>,
        secondary: Arc<dyn Transport>,
    ) -> Self {
        Self {
            network,
            primary,
            secondary,
        }
    }

    pub fn network(&self) -> &NetworkDescriptor {
        &self.network
    }

    /// Bind `address` through the wallet, falling back to the public RPC.
    ///
    /// Fails with `WrongNetwork` before any bytecode lookup when the wallet
    /// is on another chain, and with `ContractNotFound` only when both
    /// transports report empty bytecode.
    #[instrument(skip(self), fields(network = %self.network.key))]
    pub async fn bind_contract(
        &self,
        address: Address,
        abi: PriceFeedAbi,
    ) -> Result<ContractHandle, PriceFeedError> {
        let primary = self.primary.as_ref().ok_or_else(|| {
            PriceFeedError::WalletUnavailable("session has no wallet transport".to_string())
        })?;

        let observed = primary.chain_id().await?;
        if observed != self.network.chain_id {
            return Err(PriceFeedError::WrongNetwork {
                observed,
                expected: self.network.chain_id,
            });
        }

        let primary_lookup = primary.get_code(address).await;
        match &primary_lookup {
            Ok(code) if !code.is_empty() => {
                info!(len = code.len(), transport = %primary.kind(), "Contract bound");
                return Ok(self.handle(address, abi, primary.clone()));
            }
            Ok(_) => warn!("Wallet reports no bytecode, trying public RPC"),
            Err(e) => warn!(error = %e, "Wallet bytecode lookup failed, trying public RPC"),
        }

        match self.secondary.get_code(address).await {
            Ok(code) if !code.is_empty() => {
                info!(len = code.len(), transport = %self.secondary.kind(), "Contract bound");
                Ok(self.handle(address, abi, self.secondary.clone()))
            }
            Ok(_) => match primary_lookup {
                Ok(_) => Err(PriceFeedError::ContractNotFound {
                    address,
                    chain_id: self.network.chain_id,
                }),
                Err(e) => Err(e),
            },
            Err(secondary_err) => match primary_lookup {
                Ok(_) => Err(secondary_err),
                Err(e) => {
                    debug!(error = %secondary_err, "Public RPC lookup failed as well");
                    Err(e)
                }
            },
        }
    }

    /// Bind `address` through the public RPC only.
    #[instrument(skip(self), fields(network = %self.network.key))]
    pub async fn bind_direct(
        &self,
        address: Address,
        abi: PriceFeedAbi,
    ) -> Result<ContractHandle, PriceFeedError> {
        let code = self.secondary.get_code(address).await?;
        if code.is_empty() {
            return Err(PriceFeedError::ContractNotFound {
                address,
                chain_id: self.network.chain_id,
            });
        }
        info!(len = code.len(), transport = %self.secondary.kind(), "Contract bound");
        Ok(self.handle(address, abi, self.secondary.clone()))
    }

    fn handle(
        &self,
        address: Address,
        abi: PriceFeedAbi,
        transport: Arc<dyn Transport>,
    ) -> ContractHandle {
        ContractHandle {
            address,
            abi,
            chain_id: self.network.chain_id,
            transport,
        }
    }

    /// `getLatestPrice(base, quote)`. No retry.
    pub async fn read_price(
        &self,
        handle: &ContractHandle,
        base: Address,
        quote: Address,
    ) -> Result<RawPrice, PriceFeedError> {
        let data = handle.abi.encode_latest_price(base, quote);
        let ret = handle.transport.call(handle.address, data).await?;
        handle.abi.decode_latest_price(&ret)
    }

    /// Read every pair in order. A failing pair only fails its own reading.
    pub async fn read_multiple(
        &self,
        handle: &ContractHandle,
        pairs: &[TokenPair],
    ) -> Vec<PriceReading> {
        let mut readings = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let reading = match self.read_price(handle, pair.base, pair.quote).await {
                Ok(raw) => {
                    debug!(pair = %pair.display_name, price = %raw.price, decimals = raw.decimals, "Price read");
                    PriceReading::success(pair.clone(), raw)
                }
                Err(e) => {
                    warn!(pair = %pair.display_name, code = e.code(), error = %e, "Price read failed");
                    PriceReading::failure(pair.clone(), &e)
                }
            };
            readings.push(reading);
        }
        readings
    }

    /// Call each zero-argument convenience getter.
    pub async fn read_convenience(
        &self,
        handle: &ContractHandle,
        getters: &[String],
    ) -> Vec<ConvenienceReading> {
        let mut readings = Vec::with_capacity(getters.len());
        for getter in getters {
            let data = contracts::encode_convenience_getter(getter);
            let result = match handle.transport.call(handle.address, data).await {
                Ok(ret) => contracts::decode_int256(&ret),
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                warn!(getter = %getter, error = %e, "Convenience getter failed");
            }
            readings.push(ConvenienceReading {
                getter: getter.clone(),
                result,
            });
        }
        readings
    }

    /// Address of the registry the consumer reads from.
    pub async fn feed_registry(&self, handle: &ContractHandle) -> Result<Address, PriceFeedError> {
        let ret = handle
            .transport
            .call(handle.address, contracts::encode_feed_registry())
            .await?;
        contracts::decode_feed_registry(&ret)
    }

    /// Whether the registry has a feed for `base`/`quote`.
    pub async fn price_feed_exists(
        &self,
        handle: &ContractHandle,
        base: Address,
        quote: Address,
    ) -> Result<bool, PriceFeedError> {
        let ret = handle
            .transport
            .call(
                handle.address,
                contracts::encode_price_feed_exists(base, quote),
            )
            .await?;
        contracts::decode_price_feed_exists(&ret)
    }
}

/// Check bytecode at `address` on every network's public RPC.
pub async fn locate_contract(
    address: Address,
    networks: &[NetworkDescriptor],
) -> Vec<ContractLocation> {
    let mut targets: Vec<(&NetworkDescriptor, Result<Arc<dyn Transport>, PriceFeedError>)> =
        Vec::with_capacity(networks.len());
    for network in networks {
        let transport = RpcTransport::new(&network.rpc_url)
            .map(|t| Arc::new(t) as Arc<dyn Transport>)
            .map_err(|e| PriceFeedError::UnknownTransport(e.to_string()));
        targets.push((network, transport));
    }
    locate_with(address, targets).await
}

async fn locate_with(
    address: Address,
    targets: Vec<(&NetworkDescriptor, Result<Arc<dyn Transport>, PriceFeedError>)>,
) -> Vec<ContractLocation> {
    let mut locations = Vec::with_capacity(targets.len());
    for (network, transport) in targets {
        let code_len = match transport {
            Ok(t) => t.get_code(address).await.map(|code| code.len()),
            Err(e) => Err(e),
        };
        match &code_len {
            Ok(len) => debug!(network = %network.key, len, "Located bytecode"),
            Err(e) => warn!(network = %network.key, error = %e, "Bytecode lookup failed"),
        }
        locations.push(ContractLocation {
            network: network.key.clone(),
            chain_id: network.chain_id,
            code_len,
        });
    }
    locations
}
