//! Observer notifications published by the transaction context

use alloy_primitives::B256;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::identity::WalletIdentity;
use crate::submitter::SubmissionState;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ContextEvent {
    /// User-facing notice, e.g. asking the user to install a wallet
    Notice(String),
    IdentityChanged(WalletIdentity),
    SubmissionStateChanged(SubmissionState),
    /// A record write was accepted and is waiting for inclusion
    PendingTransaction { hash: B256 },
    HistoryUpdated { records: usize },
    CountUpdated { count: u64 },
}

impl ContextEvent {
    /// Hash of the write a loading indicator should track
    pub fn pending_hash(&self) -> Option<B256> {
        match self {
            Self::PendingTransaction { hash } => Some(*hash),
            _ => None,
        }
    }
}

/// Cloneable publisher for context events
///
/// Publishing never fails; events sent while nobody listens are dropped.
#[derive(Clone)]
pub struct EventSink {
    sender: broadcast::Sender<ContextEvent>,
}

impl EventSink {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn emit(&self, event: ContextEvent) {
        log::trace!("event: {:?}", event);
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ContextEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new()
    }
}
