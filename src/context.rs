//! Shared transaction context
//!
//! The single store a UI reads from: connected identity, the transfer draft,
//! the loading flag, transaction history and the transaction count. All
//! mutation goes through the operations on [`TransactionContext`].
//!
//! Startup runs once: check for an existing authorization (which refreshes
//! history and count when an account is found), then refresh the count.

use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tokio::sync::{broadcast, OnceCell, RwLock};

use crate::config::ContextConfig;
use crate::contract::ContractBinding;
use crate::error::TransactionError;
use crate::events::{ContextEvent, EventSink};
use crate::gateway::{self, LedgerClientHandle};
use crate::history::{HistoryReader, TransactionRecord};
use crate::identity::{IdentitySession, WalletIdentity, INSTALL_WALLET_NOTICE};
use crate::provider::WalletProvider;
use crate::storage::Storage;
use crate::submitter::{
    DraftField, SubmissionReceipt, TransactionCounter, TransactionDraft, TransactionSubmitter,
};

static GLOBAL_CONTEXT: OnceLock<Arc<TransactionContext>> = OnceLock::new();

/// Install `context` as the process-wide instance and run its startup
///
/// A second install fails with `AlreadyInitialized`.
pub async fn install_global(
    context: TransactionContext,
) -> Result<Arc<TransactionContext>, TransactionError> {
    let context = Arc::new(context);
    GLOBAL_CONTEXT
        .set(Arc::clone(&context))
        .map_err(|_| TransactionError::AlreadyInitialized)?;
    context.initialize().await;
    Ok(context)
}

/// The process-wide instance, if one was installed
pub fn global() -> Option<Arc<TransactionContext>> {
    GLOBAL_CONTEXT.get().cloned()
}

/// Everything a UI renders, captured at one point in time
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnapshot {
    pub identity: Option<WalletIdentity>,
    pub draft: TransactionDraft,
    pub is_loading: bool,
    pub transactions: Vec<TransactionRecord>,
    pub transaction_count: Option<u64>,
}

pub struct TransactionContext {
    config: ContextConfig,
    provider: Option<Arc<dyn WalletProvider>>,
    session: IdentitySession,
    history: HistoryReader,
    counter: TransactionCounter,
    submitter: TransactionSubmitter,
    draft: RwLock<TransactionDraft>,
    events: EventSink,
    initialized: OnceCell<()>,
}

impl TransactionContext {
    /// Build a context from environment configuration
    pub fn from_env() -> Self {
        let config = ContextConfig::from_env();
        let provider = config.provider();
        Self::new(config, provider)
    }

    /// Build a context around an injected provider (or none)
    ///
    /// Reads the cached transaction count from `config.cache_dir`.
    pub fn new(config: ContextConfig, provider: Option<Arc<dyn WalletProvider>>) -> Self {
        let events = EventSink::new();
        let storage = Storage::new(config.cache_dir.clone());

        Self {
            session: IdentitySession::new(events.clone()),
            history: HistoryReader::new(events.clone()),
            counter: TransactionCounter::load(storage, events.clone()),
            submitter: TransactionSubmitter::new(config.transfer_gas, events.clone()),
            draft: RwLock::new(TransactionDraft::default()),
            initialized: OnceCell::new(),
            config,
            provider,
            events,
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Run the startup sequence; later calls are no-ops
    pub async fn initialize(&self) {
        self.initialized
            .get_or_init(|| async {
                log::info!("Initializing transaction context");
                if let Err(e) = self.check_existing_authorization().await {
                    log::warn!("Startup authorization check failed: {}", e);
                }
                self.refresh_count().await;
            })
            .await;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.initialized()
    }

    // ========================================================================
    // Identity
    // ========================================================================

    /// Adopt an already-authorized account without prompting
    ///
    /// When one is found, history and count are refreshed.
    pub async fn check_existing_authorization(
        &self,
    ) -> Result<Option<WalletIdentity>, TransactionError> {
        let identity = self
            .session
            .check_existing_authorization(self.provider.as_ref())
            .await?;
        if identity.is_some() {
            self.refresh_history().await;
            self.refresh_count().await;
        }
        Ok(identity)
    }

    /// Prompt the user to connect a wallet
    pub async fn connect(&self) -> Result<WalletIdentity, TransactionError> {
        self.session.request_connection(self.provider.as_ref()).await
    }

    pub async fn identity(&self) -> Option<WalletIdentity> {
        self.session.current().await
    }

    // ========================================================================
    // Draft
    // ========================================================================

    pub async fn update_draft_field(&self, field: DraftField, value: impl Into<String>) {
        self.draft.write().await.set(field, value);
    }

    pub async fn draft(&self) -> TransactionDraft {
        self.draft.read().await.clone()
    }

    // ========================================================================
    // Ledger reads
    // ========================================================================

    /// Re-read the full history; failures keep the previous snapshot
    pub async fn refresh_history(&self) -> Vec<TransactionRecord> {
        match self.bind(self.identity().await) {
            Ok(client) => self.history.fetch_all(&client).await,
            Err(e) => {
                log::info!("Skipping history refresh: {}", e);
                self.history.records().await
            }
        }
    }

    /// Re-read the count from the ledger and cache it; failures keep the old value
    pub async fn refresh_count(&self) -> Option<u64> {
        match self.bind(self.identity().await) {
            Ok(client) => {
                self.counter.refresh(&client).await;
            }
            Err(e) => log::info!("Skipping count refresh: {}", e),
        }
        self.counter.get().await
    }

    pub async fn transactions(&self) -> Vec<TransactionRecord> {
        self.history.records().await
    }

    pub async fn transaction_count(&self) -> Option<u64> {
        self.counter.get().await
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Submit the current draft from the connected identity
    ///
    /// The draft is left as is afterwards.
    pub async fn submit(&self) -> Result<SubmissionReceipt, TransactionError> {
        let draft = self.draft().await;
        let sender = self.identity().await;

        let client = match self.bind(sender) {
            Ok(client) => client,
            Err(TransactionError::ProviderUnavailable) => {
                self.events
                    .emit(ContextEvent::Notice(INSTALL_WALLET_NOTICE.to_string()));
                return Err(TransactionError::WalletProviderMissing(
                    INSTALL_WALLET_NOTICE.to_string(),
                ));
            }
            Err(e) => return Err(e),
        };

        self.submitter
            .submit(
                self.provider.as_ref(),
                &client,
                &draft,
                sender,
                &self.counter,
            )
            .await
    }

    pub fn is_loading(&self) -> bool {
        self.submitter.is_loading()
    }

    // ========================================================================
    // Observation
    // ========================================================================

    pub fn subscribe(&self) -> broadcast::Receiver<ContextEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            identity: self.identity().await,
            draft: self.draft().await,
            is_loading: self.is_loading(),
            transactions: self.transactions().await,
            transaction_count: self.transaction_count().await,
        }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    fn bind(&self, signer: Option<WalletIdentity>) -> Result<LedgerClientHandle, TransactionError> {
        let client = gateway::bind_client(
            self.provider.as_ref(),
            signer,
            ContractBinding::new(self.config.contract_address),
        )?;
        Ok(client.with_poll_interval(self.config.confirmation_poll_interval))
    }
}
