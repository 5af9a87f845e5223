// Wallet provider request/response types

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A provider request: `{ method, params }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcRequest {
    pub method: String,
    pub params: Value,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Accounts already authorized for this origin (never prompts)
    pub fn accounts() -> Self {
        Self::new("eth_accounts", json!([]))
    }

    /// Ask the user to authorize accounts (prompts)
    pub fn request_accounts() -> Self {
        Self::new("eth_requestAccounts", json!([]))
    }

    pub fn send_transaction(tx: &TransactionRequest) -> Self {
        Self::new("eth_sendTransaction", json!([tx]))
    }

    /// Read-only contract call against the latest block
    pub fn call(tx: &TransactionRequest) -> Self {
        Self::new("eth_call", json!([tx, "latest"]))
    }

    pub fn transaction_receipt(hash: B256) -> Self {
        Self::new("eth_getTransactionReceipt", json!([hash]))
    }
}

/// Transaction object for `eth_sendTransaction` and `eth_call`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<U64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
}

impl TransactionRequest {
    /// Native value transfer with a fixed gas allowance
    pub fn transfer(from: Address, to: Address, value: U256, gas: u64) -> Self {
        Self {
            from: Some(from),
            to,
            gas: Some(U64::from(gas)),
            value: Some(value),
            data: None,
        }
    }

    /// Contract invocation carrying ABI-encoded calldata
    pub fn contract_call(from: Option<Address>, to: Address, data: Vec<u8>) -> Self {
        Self {
            from,
            to,
            gas: None,
            value: None,
            data: Some(Bytes::from(data)),
        }
    }
}

/// Subset of a transaction receipt the submitter relies on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<U64>,
    /// 1 for success, 0 for a reverted transaction
    #[serde(default)]
    pub status: Option<U64>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status.map_or(true, |status| status == U64::from(1))
    }

    pub fn block_number(&self) -> Option<u64> {
        self.block_number.map(|n| n.to::<u64>())
    }
}

/// JSON-RPC 2.0 request envelope
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: &'a Value,
}

/// JSON-RPC 2.0 response envelope
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}
