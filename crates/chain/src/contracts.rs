//! Price consumer contract interfaces.
//!
//! The deployed consumer contracts come in two shapes that differ only in the
//! return tuple of `getLatestPrice`:
//!
//! - legacy: `(int256 price, uint8 decimals, uint256 timestamp)`
//! - with-source: the same tuple followed by a `string source` label
//!
//! Calls are ABI-encoded here and sent as raw `eth_call`s so the same code
//! path works through the wallet and through a direct RPC endpoint.

use crate::error::PriceFeedError;
use alloy::primitives::{keccak256, Address, Bytes, I256, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use serde::{Deserialize, Serialize};

sol! {
    /// Price consumer interface (legacy return tuple)
    interface IPriceConsumer {
        function getLatestPrice(address base, address quote) external view returns (
            int256 price,
            uint8 decimals,
            uint256 timestamp
        );

        function feedRegistry() external view returns (address);

        function priceFeedExists(address base, address quote) external view returns (bool);
    }
}

sol! {
    /// Price consumer interface that also reports where the price came from
    interface IPriceConsumerWithSource {
        function getLatestPrice(address base, address quote) external view returns (
            int256 price,
            uint8 decimals,
            uint256 timestamp,
            string source
        );
    }
}

/// Which `getLatestPrice` return shape the deployed contract uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceFeedAbi {
    /// `(price, decimals, timestamp)`
    #[default]
    Legacy,
    /// `(price, decimals, timestamp, source)`
    WithSource,
}

impl std::fmt::Display for PriceFeedAbi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceFeedAbi::Legacy => write!(f, "legacy"),
            PriceFeedAbi::WithSource => write!(f, "with-source"),
        }
    }
}

/// Undecoded price as returned by the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPrice {
    /// Integer price
    pub price: I256,
    /// Exponent the contract claims for `price`
    pub decimals: u8,
    /// Contract-reported update time (unix seconds)
    pub timestamp: u64,
    /// Source label, when the contract reports one
    pub source: Option<String>,
}

impl PriceFeedAbi {
    /// Encode `getLatestPrice(base, quote)`.
    pub fn encode_latest_price(&self, base: Address, quote: Address) -> Bytes {
        // Both variants share the selector; the argument encoding is identical.
        Bytes::from(IPriceConsumer::getLatestPriceCall { base, quote }.abi_encode())
    }

    /// Decode the `getLatestPrice` return data.
    pub fn decode_latest_price(&self, data: &[u8]) -> Result<RawPrice, PriceFeedError> {
        match self {
            PriceFeedAbi::Legacy => {
                let ret = IPriceConsumer::getLatestPriceCall::abi_decode_returns(data, true)
                    .map_err(decode_error)?;
                Ok(RawPrice {
                    price: ret.price,
                    decimals: ret.decimals,
                    timestamp: saturating_u64(ret.timestamp),
                    source: None,
                })
            }
            PriceFeedAbi::WithSource => {
                let ret =
                    IPriceConsumerWithSource::getLatestPriceCall::abi_decode_returns(data, true)
                        .map_err(decode_error)?;
                Ok(RawPrice {
                    price: ret.price,
                    decimals: ret.decimals,
                    timestamp: saturating_u64(ret.timestamp),
                    source: Some(ret.source),
                })
            }
        }
    }
}

/// Encode `feedRegistry()`.
pub fn encode_feed_registry() -> Bytes {
    Bytes::from(IPriceConsumer::feedRegistryCall {}.abi_encode())
}

/// Decode `feedRegistry()`.
pub fn decode_feed_registry(data: &[u8]) -> Result<Address, PriceFeedError> {
    IPriceConsumer::feedRegistryCall::abi_decode_returns(data, true)
        .map(|ret| ret._0)
        .map_err(decode_error)
}

/// Encode `priceFeedExists(base, quote)`.
pub fn encode_price_feed_exists(base: Address, quote: Address) -> Bytes {
    Bytes::from(IPriceConsumer::priceFeedExistsCall { base, quote }.abi_encode())
}

/// Decode `priceFeedExists(base, quote)`.
pub fn decode_price_feed_exists(data: &[u8]) -> Result<bool, PriceFeedError> {
    IPriceConsumer::priceFeedExistsCall::abi_decode_returns(data, true)
        .map(|ret| ret._0)
        .map_err(decode_error)
}

/// Encode a zero-argument convenience getter such as `getETHUSDPrice()`.
///
/// The getter set differs between contract versions, so the selector is
/// derived from the configured name instead of a fixed binding.
pub fn encode_convenience_getter(name: &str) -> Bytes {
    let signature = format!("{name}()");
    let hash = keccak256(signature.as_bytes());
    Bytes::copy_from_slice(&hash[..4])
}

/// Decode a single `int256` return word.
pub fn decode_int256(data: &[u8]) -> Result<I256, PriceFeedError> {
    let word = data.get(..32).ok_or_else(|| {
        PriceFeedError::CallReverted(format!("expected 32 return bytes, got {}", data.len()))
    })?;
    U256::try_from_be_slice(word)
        .map(I256::from_raw)
        .ok_or_else(|| PriceFeedError::CallReverted("malformed int256 return".to_string()))
}

fn decode_error(err: alloy::sol_types::Error) -> PriceFeedError {
    PriceFeedError::CallReverted(format!("undecodable return data: {err}"))
}

fn saturating_u64(value: U256) -> u64 {
    if value > U256::from(u64::MAX) {
        u64::MAX
    } else {
        value.to::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{legacy_price_return, with_source_price_return};

    #[test]
    fn test_latest_price_selector() {
        // getLatestPrice(address,address)
        let data = PriceFeedAbi::Legacy.encode_latest_price(Address::ZERO, Address::ZERO);
        assert_eq!(data.len(), 4 + 64);
        assert_eq!(
            &data[..4],
            &keccak256("getLatestPrice(address,address)".as_bytes())[..4]
        );
        // Same selector regardless of return shape.
        assert_eq!(
            data,
            PriceFeedAbi::WithSource.encode_latest_price(Address::ZERO, Address::ZERO)
        );
    }

    #[test]
    fn test_decode_legacy() {
        let data = legacy_price_return(350_000_000_000, 8, 1_700_000_000);
        let raw = PriceFeedAbi::Legacy.decode_latest_price(&data).unwrap();
        assert_eq!(raw.price, I256::try_from(350_000_000_000i64).unwrap());
        assert_eq!(raw.decimals, 8);
        assert_eq!(raw.timestamp, 1_700_000_000);
        assert!(raw.source.is_none());
    }

    #[test]
    fn test_legacy_return_uses_full_words() {
        let data = legacy_price_return(-1, 18, 7);
        assert_eq!(data.len(), 96);
        assert_eq!(&data[32..63], &[0u8; 31][..]);
        assert_eq!(data[63], 18);

        let raw = PriceFeedAbi::Legacy.decode_latest_price(&data).unwrap();
        assert_eq!(raw.price, I256::MINUS_ONE);
        assert_eq!(raw.decimals, 18);
    }

    #[test]
    fn test_decode_with_source() {
        let data = with_source_price_return(100_000_000, 8, 1_700_000_000, "Simulated Blocksense Feed");
        let raw = PriceFeedAbi::WithSource.decode_latest_price(&data).unwrap();
        assert_eq!(raw.source.as_deref(), Some("Simulated Blocksense Feed"));
    }

    #[test]
    fn test_decode_truncated_is_error() {
        let result = PriceFeedAbi::Legacy.decode_latest_price(&[0u8; 16]);
        assert!(matches!(result, Err(PriceFeedError::CallReverted(_))));
    }

    #[test]
    fn test_convenience_getter_selector() {
        let data = encode_convenience_getter("getETHUSDPrice");
        assert_eq!(data.len(), 4);
        assert_eq!(&data[..], &keccak256(b"getETHUSDPrice()")[..4]);
    }

    #[test]
    fn test_decode_negative_int256() {
        let word = I256::try_from(-5i64).unwrap().to_be_bytes::<32>();
        assert_eq!(decode_int256(&word).unwrap(), I256::try_from(-5i64).unwrap());
        assert!(decode_int256(&word[..8]).is_err());
    }

    #[test]
    fn test_abi_parses_kebab_case() {
        let abi: PriceFeedAbi = serde_json::from_str("\"with-source\"").unwrap();
        assert_eq!(abi, PriceFeedAbi::WithSource);
        assert_eq!(PriceFeedAbi::default(), PriceFeedAbi::Legacy);
    }
}
