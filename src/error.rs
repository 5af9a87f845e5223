//! Error types for ledger transfer operations
//!
//! Read-path failures (history, count) are logged and swallowed by their callers.
//! Everything on the write path reaches the caller as one of these.

use alloy_primitives::B256;
use std::fmt;
use thiserror::Error;

use crate::provider::ProviderError;

/// Core error type for wallet, ledger and submission operations
#[derive(Error, Debug)]
pub enum TransactionError {
    /// No wallet provider is injected; surfaced to the user as a notice
    #[error("No wallet provider available: {0}")]
    WalletProviderMissing(String),

    /// The gateway was asked to bind a client without a provider
    #[error("Wallet provider unavailable")]
    ProviderUnavailable,

    /// The user declined a wallet prompt
    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Unknown draft field: {0}")]
    UnknownDraftField(String),

    /// A write was attempted through a client bound without a signing identity
    #[error("Ledger client has no signing identity")]
    SignerRequired,

    #[error("Ledger read failed: {0}")]
    LedgerRead(String),

    #[error("Invalid response from ledger: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Submission(#[from] SubmissionFailure),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Transaction context already initialized")]
    AlreadyInitialized,
}

impl TransactionError {
    /// True when the failure should be shown as a notice rather than a fault
    pub fn is_user_notice(&self) -> bool {
        matches!(self, Self::WalletProviderMissing(_))
    }

    pub fn is_authorization_denied(&self) -> bool {
        match self {
            Self::AuthorizationDenied(_) => true,
            Self::Submission(failure) => failure.denied,
            _ => false,
        }
    }

    /// Convert a provider error, promoting user rejections to `AuthorizationDenied`
    pub fn from_provider(err: ProviderError) -> Self {
        if err.is_user_rejection() {
            Self::AuthorizationDenied(err.to_string())
        } else {
            Self::Provider(err)
        }
    }
}

/// Where a two-phase submission stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum SubmissionStage {
    /// Native value transfer (first signed operation)
    ValueTransfer,
    /// Contract-recorded write (second signed operation)
    RecordWrite,
    /// Waiting for the record write to be included
    Confirmation,
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValueTransfer => write!(f, "value transfer"),
            Self::RecordWrite => write!(f, "record write"),
            Self::Confirmation => write!(f, "confirmation"),
        }
    }
}

/// Failure of a two-phase submission after it started sending requests
///
/// The value transfer and the record write are independent signed operations.
/// When `transfer_hash` is set the value already moved on-chain even though
/// the record is missing or unconfirmed.
#[derive(Error, Debug, Clone)]
#[error("Transaction submission failed during {stage}: {reason}")]
pub struct SubmissionFailure {
    pub stage: SubmissionStage,
    pub transfer_hash: Option<B256>,
    pub record_hash: Option<B256>,
    /// The user declined the prompt for this stage
    pub denied: bool,
    pub reason: String,
}

impl SubmissionFailure {
    /// The value transfer went through but the record did not complete
    pub fn is_partial(&self) -> bool {
        self.transfer_hash.is_some()
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_rejection_becomes_denial() {
        let err = TransactionError::from_provider(ProviderError::Rpc {
            code: 4001,
            message: "User rejected the request.".to_string(),
        });
        assert!(err.is_authorization_denied());

        let err = TransactionError::from_provider(ProviderError::Transport("refused".into()));
        assert!(!err.is_authorization_denied());
        assert!(matches!(err, TransactionError::Provider(_)));
    }

    #[test]
    fn test_partial_failure_carries_transfer_hash() {
        let failure = SubmissionFailure {
            stage: SubmissionStage::RecordWrite,
            transfer_hash: Some(B256::repeat_byte(0x11)),
            record_hash: None,
            denied: false,
            reason: "nonce too low".to_string(),
        };
        assert!(failure.is_partial());
        assert_eq!(
            failure.to_string(),
            "Transaction submission failed during record write: nonce too low"
        );
    }

    #[test]
    fn test_missing_provider_is_notice() {
        assert!(TransactionError::WalletProviderMissing("install a wallet".into()).is_user_notice());
        assert!(!TransactionError::ProviderUnavailable.is_user_notice());
    }
}
