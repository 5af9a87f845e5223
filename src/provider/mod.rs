// Wallet provider boundary
// EIP-1193 style request interface plus a JSON-RPC over HTTP implementation

pub mod http;
pub mod types;

pub use http::HttpProvider;
pub use types::*;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// EIP-1193 error code for a request the user rejected in the wallet
pub const USER_REJECTED_REQUEST: i64 = 4001;

/// JSON-RPC error code for an unknown method
pub const METHOD_NOT_FOUND: i64 = -32601;

#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::Rpc { code, .. } if *code == USER_REJECTED_REQUEST)
    }

    pub fn is_method_not_found(&self) -> bool {
        matches!(self, Self::Rpc { code, .. } if *code == METHOD_NOT_FOUND)
    }
}

/// An injected wallet provider
///
/// Holds the user's keys and signs on their behalf. Requests that need the
/// user's approval (`eth_requestAccounts`, `eth_sendTransaction`) may suspend
/// until the user answers the prompt.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request(&self, request: RpcRequest) -> Result<Value, ProviderError>;
}
