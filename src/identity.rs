//! Wallet identity session
//!
//! Tracks whether a wallet account is authorized and performs the connect
//! handshake. `check_existing_authorization` never prompts the user;
//! `request_connection` always does.

use alloy_primitives::Address;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::TransactionError;
use crate::events::{ContextEvent, EventSink};
use crate::provider::{RpcRequest, WalletProvider};

pub(crate) const INSTALL_WALLET_NOTICE: &str = "Please install a wallet provider";

/// An authorized externally owned account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WalletIdentity(Address);

impl WalletIdentity {
    pub fn new(address: Address) -> Self {
        Self(address)
    }

    pub fn address(&self) -> Address {
        self.0
    }
}

impl FromStr for WalletIdentity {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<Address>()
            .map(Self)
            .map_err(|e| TransactionError::InvalidAddress(format!("'{}': {}", s, e)))
    }
}

impl fmt::Display for WalletIdentity {
    /// Lower-case `0x` hex
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_slice()))
    }
}

impl Serialize for WalletIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected(WalletIdentity),
}

pub struct IdentitySession {
    state: RwLock<SessionState>,
    events: EventSink,
}

impl IdentitySession {
    pub fn new(events: EventSink) -> Self {
        Self {
            state: RwLock::new(SessionState::Disconnected),
            events,
        }
    }

    pub async fn state(&self) -> SessionState {
        *self.state.read().await
    }

    pub async fn current(&self) -> Option<WalletIdentity> {
        match *self.state.read().await {
            SessionState::Connected(identity) => Some(identity),
            SessionState::Disconnected => None,
        }
    }

    /// Adopt an account the provider already authorized, without prompting
    ///
    /// Returns `Ok(None)` and stays disconnected when nothing is authorized.
    pub async fn check_existing_authorization(
        &self,
        provider: Option<&Arc<dyn WalletProvider>>,
    ) -> Result<Option<WalletIdentity>, TransactionError> {
        let provider = self.require_provider(provider)?;

        let accounts = provider
            .request(RpcRequest::accounts())
            .await
            .map_err(TransactionError::from_provider)?;

        match first_account(&accounts)? {
            Some(identity) => {
                self.connect_as(identity).await;
                Ok(Some(identity))
            }
            None => {
                log::info!("No authorized account found");
                Ok(None)
            }
        }
    }

    /// Prompt the user to authorize an account
    pub async fn request_connection(
        &self,
        provider: Option<&Arc<dyn WalletProvider>>,
    ) -> Result<WalletIdentity, TransactionError> {
        let provider = self.require_provider(provider)?;

        let accounts = provider
            .request(RpcRequest::request_accounts())
            .await
            .map_err(|e| {
                log::warn!("Wallet connection failed: {}", e);
                TransactionError::from_provider(e)
            })?;

        let identity = first_account(&accounts)?.ok_or_else(|| {
            TransactionError::AuthorizationDenied("wallet returned no accounts".to_string())
        })?;
        self.connect_as(identity).await;
        Ok(identity)
    }

    fn require_provider<'a>(
        &self,
        provider: Option<&'a Arc<dyn WalletProvider>>,
    ) -> Result<&'a Arc<dyn WalletProvider>, TransactionError> {
        provider.ok_or_else(|| {
            self.events
                .emit(ContextEvent::Notice(INSTALL_WALLET_NOTICE.to_string()));
            TransactionError::WalletProviderMissing(INSTALL_WALLET_NOTICE.to_string())
        })
    }

    async fn connect_as(&self, identity: WalletIdentity) {
        *self.state.write().await = SessionState::Connected(identity);
        log::info!("Wallet connected: {}", identity);
        self.events.emit(ContextEvent::IdentityChanged(identity));
    }
}

fn first_account(accounts: &Value) -> Result<Option<WalletIdentity>, TransactionError> {
    let list = accounts.as_array().ok_or_else(|| {
        TransactionError::InvalidResponse(format!("expected account list, got {}", accounts))
    })?;
    match list.first() {
        Some(Value::String(raw)) => raw.parse().map(Some),
        Some(other) => Err(TransactionError::InvalidResponse(format!(
            "unexpected account entry {}",
            other
        ))),
        None => Ok(None),
    }
}
