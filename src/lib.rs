//! Ledger Transfers: wallet-driven value transfers with on-chain records
//!
//! This crate holds the application state behind a transfer UI. It talks to
//! an injected wallet provider, sends native value transfers, records each
//! transfer in the `Transactions` contract and keeps a local view of the
//! contract's history and transaction count.
//!
//! # Architecture
//!
//! - **Provider Gateway**: binds provider, signer and contract into a ledger client
//! - **Identity Session**: wallet connection handshake and the authorized address
//! - **History Reader**: full snapshots of on-chain transfer records
//! - **Transaction Submitter**: two-phase submission with confirmation waiting
//! - **Transaction Context**: the shared store with one-time initialization
//!
//! # Example
//!
//! ```ignore
//! use ledger_transfers::{DraftField, TransactionContext};
//!
//! let context = TransactionContext::from_env();
//! context.initialize().await;
//!
//! context.connect().await?;
//! context.update_draft_field(DraftField::AddressTo, "0x70997970c51812dc3a010c7d01b50e0d17dc79c8").await;
//! context.update_draft_field(DraftField::Amount, "0.01").await;
//! context.update_draft_field(DraftField::Keyword, "coffee").await;
//! context.update_draft_field(DraftField::Message, "thanks").await;
//!
//! let receipt = context.submit().await?;
//! println!("recorded in {}", receipt.record_hash);
//! ```

// Public modules
pub mod config;
pub mod context;
pub mod contract;
pub mod error;
pub mod events;
pub mod gateway;
pub mod history;
pub mod identity;
pub mod provider;
pub mod storage;
pub mod submitter;
pub mod units;

// Re-exports for convenience
pub use config::ContextConfig;
pub use context::{global, install_global, ContextSnapshot, TransactionContext};
pub use contract::{ContractBinding, Transactions};
pub use error::{StorageError, SubmissionFailure, SubmissionStage, TransactionError};
pub use events::{ContextEvent, EventSink};
pub use gateway::{bind_client, LedgerClientHandle, PendingWrite};
pub use history::{HistoryReader, TransactionRecord};
pub use identity::{IdentitySession, SessionState, WalletIdentity};
pub use provider::{HttpProvider, ProviderError, RpcRequest, WalletProvider};
pub use storage::Storage;
pub use submitter::{
    DraftField, SubmissionReceipt, SubmissionState, TransactionCounter, TransactionDraft,
    TransactionSubmitter,
};
pub use units::{format_amount, parse_amount};

// Commonly used ledger types
pub use alloy_primitives::{Address, B256, U256};

// Common result type
pub type Result<T> = std::result::Result<T, TransactionError>;
