use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

use super::types::{JsonRpcRequest, JsonRpcResponse, RpcRequest};
use super::{ProviderError, WalletProvider};

/// Wallet provider backed by a JSON-RPC node that manages its own accounts
///
/// Suitable for development nodes with unlocked accounts. Such nodes treat
/// their accounts as already authorized, so `eth_requestAccounts` falls back
/// to `eth_accounts` when the node does not implement it.
pub struct HttpProvider {
    url: String,
    http_client: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpProvider {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http_client: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send(&self, method: &str, params: &Value) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        log::debug!("JSON-RPC #{} -> {} {}", id, self.url, method);

        let response = self
            .http_client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Transport(format!(
                "HTTP {} from {}",
                response.status(),
                self.url
            )));
        }

        let envelope: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        decode_envelope(envelope)
    }
}

fn decode_envelope(envelope: JsonRpcResponse) -> Result<Value, ProviderError> {
    if let Some(error) = envelope.error {
        return Err(ProviderError::Rpc {
            code: error.code,
            message: error.message,
        });
    }
    Ok(envelope.result.unwrap_or(Value::Null))
}

#[async_trait]
impl WalletProvider for HttpProvider {
    async fn request(&self, request: RpcRequest) -> Result<Value, ProviderError> {
        match self.send(&request.method, &request.params).await {
            Err(e) if e.is_method_not_found() && request.method == "eth_requestAccounts" => {
                log::info!("Node has no eth_requestAccounts, using managed accounts");
                let fallback = RpcRequest::accounts();
                self.send(&fallback.method, &fallback.params).await
            }
            other => other,
        }
    }
}
