// Provider gateway
//
// Binds the injected wallet provider, the current signing identity and the
// `Transactions` contract into a short-lived ledger client. Handles are built
// fresh for every operation so they always carry the current signer.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::DEFAULT_POLL_INTERVAL_MS;
use crate::contract::{ContractBinding, Transactions};
use crate::error::TransactionError;
use crate::identity::WalletIdentity;
use crate::provider::{RpcRequest, TransactionReceipt, TransactionRequest, WalletProvider};

/// Bind a ledger client to `provider`, `signer` and `contract`
///
/// Fails with `ProviderUnavailable` when no provider is injected. Purely
/// constructs the handle; no request is made.
pub fn bind_client(
    provider: Option<&Arc<dyn WalletProvider>>,
    signer: Option<WalletIdentity>,
    contract: ContractBinding,
) -> Result<LedgerClientHandle, TransactionError> {
    let provider = provider.ok_or(TransactionError::ProviderUnavailable)?;
    Ok(LedgerClientHandle {
        provider: Arc::clone(provider),
        signer,
        contract,
        poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
    })
}

/// Contract-bound client for one operation
pub struct LedgerClientHandle {
    provider: Arc<dyn WalletProvider>,
    signer: Option<WalletIdentity>,
    contract: ContractBinding,
    poll_interval: Duration,
}

impl LedgerClientHandle {
    /// Set the receipt polling interval used by writes from this handle
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn signer(&self) -> Option<WalletIdentity> {
        self.signer
    }

    pub fn contract(&self) -> ContractBinding {
        self.contract
    }

    pub fn provider(&self) -> &Arc<dyn WalletProvider> {
        &self.provider
    }

    /// All transfer records in ledger order
    pub async fn get_all_transactions(
        &self,
    ) -> Result<Vec<Transactions::TransferStruct>, TransactionError> {
        let output = self
            .call(Transactions::getAllTransactionsCall {}.abi_encode())
            .await?;
        let decoded = Transactions::getAllTransactionsCall::abi_decode_returns(&output, true)
            .map_err(|e| {
                TransactionError::InvalidResponse(format!("getAllTransactions: {}", e))
            })?;
        Ok(decoded._0)
    }

    /// Number of records held by the contract
    pub async fn get_transaction_count(&self) -> Result<U256, TransactionError> {
        let output = self
            .call(Transactions::getTransactionCountCall {}.abi_encode())
            .await?;
        let decoded = Transactions::getTransactionCountCall::abi_decode_returns(&output, true)
            .map_err(|e| {
                TransactionError::InvalidResponse(format!("getTransactionCount: {}", e))
            })?;
        Ok(decoded._0)
    }

    /// Record a transfer in the contract (a separately signed transaction)
    pub async fn add_to_blockchain(
        &self,
        receiver: Address,
        amount: U256,
        message: &str,
        keyword: &str,
    ) -> Result<PendingWrite, TransactionError> {
        let signer = self.signer.ok_or(TransactionError::SignerRequired)?;
        let data = Transactions::addToBlockchainCall {
            receiver,
            amount,
            message: message.to_string(),
            keyword: keyword.to_string(),
        }
        .abi_encode();

        let tx = TransactionRequest::contract_call(
            Some(signer.address()),
            self.contract.address,
            data,
        );
        let result = self
            .provider
            .request(RpcRequest::send_transaction(&tx))
            .await
            .map_err(TransactionError::from_provider)?;
        let hash: B256 = serde_json::from_value(result).map_err(|e| {
            TransactionError::InvalidResponse(format!("transaction hash: {}", e))
        })?;

        log::debug!("addToBlockchain accepted: {}", hash);

        Ok(PendingWrite {
            hash,
            provider: Arc::clone(&self.provider),
            poll_interval: self.poll_interval,
        })
    }

    async fn call(&self, data: Vec<u8>) -> Result<Bytes, TransactionError> {
        let tx = TransactionRequest::contract_call(
            self.signer.map(|s| s.address()),
            self.contract.address,
            data,
        );
        let result = self
            .provider
            .request(RpcRequest::call(&tx))
            .await
            .map_err(|e| TransactionError::LedgerRead(e.to_string()))?;
        serde_json::from_value(result)
            .map_err(|e| TransactionError::InvalidResponse(format!("call output: {}", e)))
    }
}

/// A write accepted by the network but not yet included in a block
pub struct PendingWrite {
    pub hash: B256,
    provider: Arc<dyn WalletProvider>,
    poll_interval: Duration,
}

impl PendingWrite {
    /// Wait until the provider reports the write included
    ///
    /// Polls indefinitely. Failed polls are retried; only a reverted receipt
    /// ends the wait with an error.
    pub async fn wait(&self) -> Result<TransactionReceipt, TransactionError> {
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            match self
                .provider
                .request(RpcRequest::transaction_receipt(self.hash))
                .await
            {
                Ok(Value::Null) => {
                    log::debug!("{} not yet included (attempt {})", self.hash, attempt);
                }
                Ok(result) => match serde_json::from_value::<TransactionReceipt>(result) {
                    Ok(receipt) if receipt.succeeded() => return Ok(receipt),
                    Ok(_) => {
                        return Err(TransactionError::InvalidResponse(format!(
                            "transaction {} reverted",
                            self.hash
                        )));
                    }
                    Err(e) => {
                        log::warn!("Unreadable receipt for {}: {} (will retry)", self.hash, e);
                    }
                },
                Err(e) => {
                    log::warn!("Receipt poll for {} failed: {} (will retry)", self.hash, e);
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
