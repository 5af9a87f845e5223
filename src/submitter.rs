// Transaction submitter
//
// A submission is two independent signed operations executed strictly in order:
//   1. a native value transfer from the sender to the receiver
//   2. an `addToBlockchain` write recording the same transfer in the contract
// followed by waiting for the write to be included and refreshing the count.
// Nothing is rolled back; a failure after step 1 is reported with the transfer
// hash so the caller can see that value already moved. Each leg pays its own fee.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{StorageError, SubmissionFailure, SubmissionStage, TransactionError};
use crate::events::{ContextEvent, EventSink};
use crate::gateway::LedgerClientHandle;
use crate::identity::{WalletIdentity, INSTALL_WALLET_NOTICE};
use crate::provider::{RpcRequest, TransactionRequest, WalletProvider};
use crate::storage::Storage;
use crate::units;

/// Form input for a transfer, edited field by field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    pub address_to: String,
    /// Decimal amount in display units, e.g. `"0.5"`
    pub amount: String,
    pub keyword: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DraftField {
    AddressTo,
    Amount,
    Keyword,
    Message,
}

impl TransactionDraft {
    pub fn set(&mut self, field: DraftField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DraftField::AddressTo => self.address_to = value,
            DraftField::Amount => self.amount = value,
            DraftField::Keyword => self.keyword = value,
            DraftField::Message => self.message = value,
        }
    }
}

impl FromStr for DraftField {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "addressTo" => Ok(Self::AddressTo),
            "amount" => Ok(Self::Amount),
            "keyword" => Ok(Self::Keyword),
            "message" => Ok(Self::Message),
            other => Err(TransactionError::UnknownDraftField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmissionState {
    Idle,
    AwaitingWalletApproval,
    PendingConfirmation,
    Confirmed,
    Failed,
}

impl SubmissionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed)
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::AwaitingWalletApproval => "awaiting wallet approval",
            Self::PendingConfirmation => "pending confirmation",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of a confirmed submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub state: SubmissionState,
    pub transfer_hash: B256,
    pub record_hash: B256,
    pub block_number: Option<u64>,
    /// Count after the post-confirmation refresh, if that read succeeded
    pub transaction_count: Option<u64>,
}

/// Cached mirror of the ledger's transaction count
pub struct TransactionCounter {
    value: RwLock<Option<u64>>,
    storage: Storage,
    events: EventSink,
}

impl TransactionCounter {
    /// Seed the counter from the durable cache
    pub fn load(storage: Storage, events: EventSink) -> Self {
        let cached = match storage.load_transaction_count() {
            Ok(cached) => cached,
            Err(e) => {
                log::warn!("Ignoring unreadable count cache: {}", e);
                None
            }
        };
        Self {
            value: RwLock::new(cached),
            storage,
            events,
        }
    }

    pub async fn get(&self) -> Option<u64> {
        *self.value.read().await
    }

    /// Replace the cached value with the ledger's count
    ///
    /// Failures are logged and leave the stale value in place.
    pub async fn refresh(&self, client: &LedgerClientHandle) -> Option<u64> {
        match self.read_ledger(client).await {
            Ok(count) => {
                *self.value.write().await = Some(count);
                if let Err(e) = self.persist(count) {
                    log::warn!("Failed to cache transaction count: {}", e);
                }
                self.events.emit(ContextEvent::CountUpdated { count });
                Some(count)
            }
            Err(e) => {
                log::warn!("Failed to refresh transaction count: {}", e);
                None
            }
        }
    }

    async fn read_ledger(&self, client: &LedgerClientHandle) -> Result<u64, TransactionError> {
        let count = client.get_transaction_count().await?;
        u64::try_from(count).map_err(|_| {
            TransactionError::InvalidResponse(format!("transaction count {} out of range", count))
        })
    }

    fn persist(&self, count: u64) -> Result<(), StorageError> {
        self.storage.save_transaction_count(count)
    }
}

/// Drives one submission through its states and publishes each transition
struct SubmissionTracker<'a> {
    state: SubmissionState,
    loading: &'a AtomicBool,
    events: &'a EventSink,
}

impl<'a> SubmissionTracker<'a> {
    fn new(loading: &'a AtomicBool, events: &'a EventSink) -> Self {
        Self {
            state: SubmissionState::Idle,
            loading,
            events,
        }
    }

    fn transition(&mut self, next: SubmissionState) {
        log::debug!("submission {} -> {}", self.state, next);
        self.state = next;
        match next {
            SubmissionState::PendingConfirmation => self.loading.store(true, Ordering::SeqCst),
            SubmissionState::Confirmed | SubmissionState::Failed => {
                self.loading.store(false, Ordering::SeqCst)
            }
            _ => {}
        }
        self.events.emit(ContextEvent::SubmissionStateChanged(next));
    }

    fn fail(&mut self, err: TransactionError) -> TransactionError {
        log::error!("Transaction submission failed: {}", err);
        self.transition(SubmissionState::Failed);
        err
    }
}

pub struct TransactionSubmitter {
    loading: AtomicBool,
    transfer_gas: u64,
    events: EventSink,
}

impl TransactionSubmitter {
    pub fn new(transfer_gas: u64, events: EventSink) -> Self {
        Self {
            loading: AtomicBool::new(false),
            transfer_gas,
            events,
        }
    }

    /// True while a record write waits for confirmation
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Send `draft` from `sender` and record it on-chain
    ///
    /// `client` must be freshly bound to the same provider and to `sender`.
    /// Concurrent calls are not serialized.
    pub async fn submit(
        &self,
        provider: Option<&Arc<dyn WalletProvider>>,
        client: &LedgerClientHandle,
        draft: &TransactionDraft,
        sender: Option<WalletIdentity>,
        counter: &TransactionCounter,
    ) -> Result<SubmissionReceipt, TransactionError> {
        let (provider, sender) = match (provider, sender) {
            (Some(provider), Some(sender)) => (provider, sender),
            (None, _) => return Err(self.notice(INSTALL_WALLET_NOTICE)),
            (Some(_), None) => return Err(self.notice("Connect a wallet before sending")),
        };

        let mut tracker = SubmissionTracker::new(&self.loading, &self.events);

        let amount = units::parse_amount(&draft.amount).map_err(|e| tracker.fail(e))?;
        let receiver = parse_receiver(&draft.address_to).map_err(|e| tracker.fail(e))?;

        tracker.transition(SubmissionState::AwaitingWalletApproval);
        let transfer_hash = self
            .send_value(provider, sender, receiver, amount)
            .await
            .map_err(|e| tracker.fail(e))?;
        log::info!("Value transfer accepted: {}", transfer_hash);

        let pending = client
            .add_to_blockchain(receiver, amount, &draft.message, &draft.keyword)
            .await
            .map_err(|e| {
                tracker.fail(
                    SubmissionFailure {
                        stage: SubmissionStage::RecordWrite,
                        transfer_hash: Some(transfer_hash),
                        record_hash: None,
                        denied: e.is_authorization_denied(),
                        reason: e.to_string(),
                    }
                    .into(),
                )
            })?;

        tracker.transition(SubmissionState::PendingConfirmation);
        log::info!("Loading - {}", pending.hash);
        self.events
            .emit(ContextEvent::PendingTransaction { hash: pending.hash });

        let receipt = pending.wait().await.map_err(|e| {
            tracker.fail(
                SubmissionFailure {
                    stage: SubmissionStage::Confirmation,
                    transfer_hash: Some(transfer_hash),
                    record_hash: Some(pending.hash),
                    denied: false,
                    reason: e.to_string(),
                }
                .into(),
            )
        })?;

        tracker.transition(SubmissionState::Confirmed);
        log::info!("Success - {}", pending.hash);

        let transaction_count = counter.refresh(client).await;

        Ok(SubmissionReceipt {
            state: tracker.state,
            transfer_hash,
            record_hash: pending.hash,
            block_number: receipt.block_number(),
            transaction_count,
        })
    }

    async fn send_value(
        &self,
        provider: &Arc<dyn WalletProvider>,
        sender: WalletIdentity,
        receiver: Address,
        amount: U256,
    ) -> Result<B256, TransactionError> {
        let tx = TransactionRequest::transfer(sender.address(), receiver, amount, self.transfer_gas);
        let result = provider
            .request(RpcRequest::send_transaction(&tx))
            .await
            .map_err(|e| {
                if e.is_user_rejection() {
                    TransactionError::AuthorizationDenied(e.to_string())
                } else {
                    SubmissionFailure {
                        stage: SubmissionStage::ValueTransfer,
                        transfer_hash: None,
                        record_hash: None,
                        denied: false,
                        reason: e.to_string(),
                    }
                    .into()
                }
            })?;

        serde_json::from_value::<B256>(result).map_err(|e| {
            TransactionError::from(SubmissionFailure {
                stage: SubmissionStage::ValueTransfer,
                transfer_hash: None,
                record_hash: None,
                denied: false,
                reason: format!("invalid transaction hash: {}", e),
            })
        })
    }

    fn notice(&self, message: &str) -> TransactionError {
        self.events.emit(ContextEvent::Notice(message.to_string()));
        TransactionError::WalletProviderMissing(message.to_string())
    }
}

fn parse_receiver(raw: &str) -> Result<Address, TransactionError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|e| TransactionError::InvalidAddress(format!("'{}': {}", raw, e)))
}
