//! In-memory wallet and transport doubles.
//!
//! Compiled for this crate's tests and, through the `test-utils` feature, for
//! downstream crates' tests.

use crate::error::{PriceFeedError, WalletError};
use crate::transport::{Transport, TransportKind};
use crate::wallet::WalletProvider;
use alloy::primitives::{Address, Bytes, I256, U256};
use alloy::sol_types::SolValue;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

/// Wallet double that answers from per-method scripts and records calls.
#[derive(Debug, Default)]
pub struct ScriptedWallet {
    queued: Mutex<HashMap<String, VecDeque<Result<Value, WalletError>>>>,
    sticky: Mutex<HashMap<String, Result<Value, WalletError>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedWallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a one-shot response for `method`.
    pub fn push(&self, method: &str, response: Result<Value, WalletError>) {
        self.queued
            .lock()
            .entry(method.to_string())
            .or_default()
            .push_back(response);
    }

    /// Response returned whenever the queue for `method` is empty.
    pub fn always(&self, method: &str, response: Result<Value, WalletError>) {
        self.sticky.lock().insert(method.to_string(), response);
    }

    /// Every request seen so far, in order.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    /// Number of requests seen for `method`.
    pub fn count(&self, method: &str) -> usize {
        self.calls.lock().iter().filter(|(m, _)| m == method).count()
    }
}

#[async_trait]
impl WalletProvider for ScriptedWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        self.calls.lock().push((method.to_string(), params));

        let queued = self
            .queued
            .lock()
            .get_mut(method)
            .and_then(VecDeque::pop_front);
        if let Some(response) = queued {
            return response;
        }

        self.sticky
            .lock()
            .get(method)
            .cloned()
            .unwrap_or_else(|| {
                Err(WalletError::Rpc {
                    code: 4200,
                    message: format!("unsupported method {method}"),
                    nested_code: None,
                })
            })
    }

    fn endpoint(&self) -> &str {
        "scripted://wallet"
    }
}

/// Transport double keyed by calldata.
#[derive(Debug)]
pub struct ScriptedTransport {
    kind: TransportKind,
    chain_id: u64,
    code: Mutex<HashMap<Address, Bytes>>,
    code_errors: Mutex<HashMap<Address, PriceFeedError>>,
    call_results: Mutex<HashMap<Bytes, Result<Bytes, PriceFeedError>>>,
    call_log: Mutex<Vec<Bytes>>,
}

impl ScriptedTransport {
    pub fn new(kind: TransportKind, chain_id: u64) -> Self {
        Self {
            kind,
            chain_id,
            code: Mutex::new(HashMap::new()),
            code_errors: Mutex::new(HashMap::new()),
            call_results: Mutex::new(HashMap::new()),
            call_log: Mutex::new(Vec::new()),
        }
    }

    /// Pretend a contract is deployed at `address`.
    pub fn deploy(&self, address: Address) {
        self.code
            .lock()
            .insert(address, Bytes::from_static(&[0x60, 0x80, 0x60, 0x40]));
    }

    /// Make bytecode lookups for `address` fail with `err`.
    pub fn fail_code(&self, address: Address, err: PriceFeedError) {
        self.code_errors.lock().insert(address, err);
    }

    /// Answer calls with exactly this calldata.
    pub fn on_call(&self, calldata: Bytes, result: Result<Bytes, PriceFeedError>) {
        self.call_results.lock().insert(calldata, result);
    }

    /// Calldata of every call, in order.
    pub fn call_log(&self) -> Vec<Bytes> {
        self.call_log.lock().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, PriceFeedError> {
        if let Some(err) = self.code_errors.lock().get(&address) {
            return Err(err.clone());
        }
        Ok(self.code.lock().get(&address).cloned().unwrap_or_default())
    }

    async fn call(&self, _to: Address, data: Bytes) -> Result<Bytes, PriceFeedError> {
        self.call_log.lock().push(data.clone());
        self.call_results
            .lock()
            .get(&data)
            .cloned()
            .unwrap_or_else(|| Err(PriceFeedError::CallReverted("execution reverted".into())))
    }

    async fn chain_id(&self) -> Result<u64, PriceFeedError> {
        Ok(self.chain_id)
    }
}

/// `getLatestPrice` return data in the legacy shape.
pub fn legacy_price_return(price: i64, decimals: u8, timestamp: u64) -> Bytes {
    let price = I256::try_from(price).unwrap_or(I256::ZERO);
    Bytes::from((price, U256::from(decimals), U256::from(timestamp)).abi_encode_params())
}

/// `getLatestPrice` return data in the with-source shape.
pub fn with_source_price_return(price: i64, decimals: u8, timestamp: u64, source: &str) -> Bytes {
    let price = I256::try_from(price).unwrap_or(I256::ZERO);
    let values = (price, U256::from(decimals), U256::from(timestamp), source.to_string());
    Bytes::from(values.abi_encode_params())
}
