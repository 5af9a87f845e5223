//! Common test utilities for transaction context integration tests
//!
//! This module provides shared test infrastructure including:
//! - An in-memory wallet provider emulating the `Transactions` contract
//! - Test environment setup with a temporary count cache
//! - Logging and address helpers
#![allow(dead_code)]

use alloy_sol_types::SolCall;
use async_trait::async_trait;
use ledger_transfers::provider::{ProviderError, TransactionRequest};
use ledger_transfers::{
    Address, ContextConfig, RpcRequest, Transactions, TransactionContext, WalletProvider, B256,
    U256,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub fn contract() -> Address {
    Address::repeat_byte(0xcc)
}

/// Initialize logging (only once, subsequent calls are no-ops)
///
/// A `.env` file in the crate root may override `RUST_LOG`.
pub fn init_logging() {
    dotenv::dotenv().ok();
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

pub fn sender() -> Address {
    Address::repeat_byte(0x12)
}

pub fn random_address() -> Address {
    Address::from(rand::random::<[u8; 20]>())
}

/// Lower-case rendering used by the UI
pub fn lower_hex(address: Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

pub fn transfer_record(message: &str, amount_wei: u64, timestamp: u64) -> Transactions::TransferStruct {
    Transactions::TransferStruct {
        sender: sender(),
        receiver: random_address(),
        amount: U256::from(amount_wei),
        message: message.to_string(),
        timestamp: U256::from(timestamp),
        keyword: "seed".to_string(),
    }
}

/// State behind the mock provider: wallet accounts plus contract storage
#[derive(Default)]
pub struct MockLedger {
    /// Accounts returned by `eth_accounts`
    pub authorized: Vec<Address>,
    /// Accounts granted when the user approves `eth_requestAccounts`
    pub grant_on_request: Vec<Address>,
    pub reject_connection: bool,
    pub reject_transfer: bool,
    pub reject_record: bool,
    pub revert_record: bool,
    pub fail_reads: bool,
    /// Number of receipt polls answered with `null` before inclusion
    pub pending_polls: u32,
    /// Number of receipt polls answered with a transport error before any other answer
    pub failing_polls: u32,
    pub records: Vec<Transactions::TransferStruct>,
    /// Every method called, in order
    pub calls: Vec<String>,
    /// Raw params of each native value transfer
    pub transfers: Vec<Value>,
    pub nonce: u64,
    pub clock: u64,
}

impl MockLedger {
    pub fn with_records(records: Vec<Transactions::TransferStruct>) -> Self {
        Self {
            records,
            clock: 1_700_000_000,
            ..Default::default()
        }
    }

    pub fn authorized(mut self, account: Address) -> Self {
        self.authorized = vec![account];
        self
    }

    fn next_hash(&mut self) -> B256 {
        self.nonce += 1;
        alloy_primitives::keccak256(self.nonce.to_be_bytes())
    }

    fn send_transaction(&mut self, params: &Value) -> Result<Value, ProviderError> {
        let tx: TransactionRequest = serde_json::from_value(params[0].clone())
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        match tx.data {
            None => {
                if self.reject_transfer {
                    return Err(rejected());
                }
                self.transfers.push(params[0].clone());
            }
            Some(data) => {
                if self.reject_record {
                    return Err(rejected());
                }
                let call = Transactions::addToBlockchainCall::abi_decode(&data, true)
                    .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
                self.clock += 12;
                self.records.push(Transactions::TransferStruct {
                    sender: tx.from.unwrap_or_default(),
                    receiver: call.receiver,
                    amount: call.amount,
                    message: call.message,
                    timestamp: U256::from(self.clock),
                    keyword: call.keyword,
                });
            }
        }

        let hash = self.next_hash();
        Ok(serde_json::to_value(hash).unwrap())
    }

    fn call(&mut self, params: &Value) -> Result<Value, ProviderError> {
        if self.fail_reads {
            return Err(ProviderError::Rpc {
                code: -32000,
                message: "header not found".to_string(),
            });
        }
        let tx: TransactionRequest = serde_json::from_value(params[0].clone())
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        let data = tx.data.unwrap_or_default();

        let output = if data.starts_with(&Transactions::getAllTransactionsCall::SELECTOR) {
            Transactions::getAllTransactionsCall::abi_encode_returns(&(self.records.clone(),))
        } else if data.starts_with(&Transactions::getTransactionCountCall::SELECTOR) {
            Transactions::getTransactionCountCall::abi_encode_returns(&(U256::from(
                self.records.len(),
            ),))
        } else {
            return Err(ProviderError::Rpc {
                code: 3,
                message: "execution reverted".to_string(),
            });
        };

        Ok(serde_json::to_value(alloy_primitives::Bytes::from(output)).unwrap())
    }

    fn receipt(&mut self, params: &Value) -> Result<Value, ProviderError> {
        if self.failing_polls > 0 {
            self.failing_polls -= 1;
            return Err(ProviderError::Transport("connection reset".to_string()));
        }
        if self.pending_polls > 0 {
            self.pending_polls -= 1;
            return Ok(Value::Null);
        }
        let status = if self.revert_record { "0x0" } else { "0x1" };
        Ok(json!({
            "transactionHash": params[0],
            "blockNumber": "0x2a",
            "status": status,
        }))
    }
}

fn rejected() -> ProviderError {
    ProviderError::Rpc {
        code: 4001,
        message: "User rejected the request.".to_string(),
    }
}

/// Wallet provider double answering from a [`MockLedger`]
pub struct MockProvider {
    pub ledger: Mutex<MockLedger>,
}

impl MockProvider {
    pub fn new(ledger: MockLedger) -> Arc<Self> {
        Arc::new(Self {
            ledger: Mutex::new(ledger),
        })
    }

    /// How many times `method` was requested
    pub fn calls(&self, method: &str) -> usize {
        self.ledger
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|m| m.as_str() == method)
            .count()
    }

    pub fn record_count(&self) -> usize {
        self.ledger.lock().unwrap().records.len()
    }

    pub fn transfer_count(&self) -> usize {
        self.ledger.lock().unwrap().transfers.len()
    }

    pub fn update(&self, f: impl FnOnce(&mut MockLedger)) {
        f(&mut self.ledger.lock().unwrap());
    }
}

#[async_trait]
impl WalletProvider for MockProvider {
    async fn request(&self, request: RpcRequest) -> Result<Value, ProviderError> {
        let mut ledger = self.ledger.lock().unwrap();
        ledger.calls.push(request.method.clone());

        match request.method.as_str() {
            "eth_accounts" => Ok(json!(ledger.authorized)),
            "eth_requestAccounts" => {
                if ledger.reject_connection {
                    return Err(rejected());
                }
                ledger.authorized = ledger.grant_on_request.clone();
                Ok(json!(ledger.authorized))
            }
            "eth_sendTransaction" => ledger.send_transaction(&request.params),
            "eth_call" => ledger.call(&request.params),
            "eth_getTransactionReceipt" => ledger.receipt(&request.params),
            other => Err(ProviderError::Rpc {
                code: -32601,
                message: format!("method {} not found", other),
            }),
        }
    }
}

/// Test environment with a temporary cache directory
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub provider: Arc<MockProvider>,
    pub context: TransactionContext,
}

impl TestEnvironment {
    pub fn new(ledger: MockLedger) -> anyhow::Result<Self> {
        init_logging();
        let temp_dir = TempDir::new()?;
        log::info!("📁 Test cache directory: {:?}", temp_dir.path());

        let provider = MockProvider::new(ledger);
        let injected: Arc<dyn WalletProvider> = provider.clone();
        let context = TransactionContext::new(test_config(&temp_dir), Some(injected));

        Ok(Self {
            temp_dir,
            provider,
            context,
        })
    }

    /// Environment whose cache already holds `count`
    pub fn with_cached_count(ledger: MockLedger, count: u64) -> anyhow::Result<Self> {
        init_logging();
        let temp_dir = TempDir::new()?;
        ledger_transfers::Storage::new(temp_dir.path()).save_transaction_count(count)?;

        let provider = MockProvider::new(ledger);
        let injected: Arc<dyn WalletProvider> = provider.clone();
        let context = TransactionContext::new(test_config(&temp_dir), Some(injected));

        Ok(Self {
            temp_dir,
            provider,
            context,
        })
    }

    pub fn cached_count(&self) -> Option<u64> {
        ledger_transfers::Storage::new(self.temp_dir.path())
            .load_transaction_count()
            .unwrap()
    }
}

pub fn test_config(temp_dir: &TempDir) -> ContextConfig {
    ContextConfig {
        contract_address: contract(),
        provider_url: None,
        cache_dir: temp_dir.path().to_path_buf(),
        confirmation_poll_interval: Duration::from_millis(5),
        ..Default::default()
    }
}

/// Draw every event currently queued on `rx`
pub fn drain<T: Clone>(rx: &mut tokio::sync::broadcast::Receiver<T>) -> Vec<T> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
