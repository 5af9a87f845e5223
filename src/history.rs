//! Ledger history reader
//!
//! Reads every transfer record from the contract and keeps the latest full
//! snapshot. A failed read is logged and leaves the previous snapshot in place.

use alloy_primitives::{Address, U256};
use chrono::{Local, TimeZone};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::contract::Transactions;
use crate::error::TransactionError;
use crate::events::{ContextEvent, EventSink};
use crate::gateway::LedgerClientHandle;
use crate::units;

/// A transfer as recorded on-chain, normalized for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub sender: Address,
    pub receiver: Address,
    pub amount_wei: U256,
    pub message: String,
    pub keyword: String,
    pub timestamp_unix_seconds: u64,
    /// Local time rendering of the timestamp, fixed at read time
    pub display_timestamp: String,
}

impl TransactionRecord {
    pub fn from_ledger(raw: Transactions::TransferStruct) -> Result<Self, TransactionError> {
        let timestamp = u64::try_from(raw.timestamp).map_err(|_| {
            TransactionError::InvalidResponse(format!("timestamp {} out of range", raw.timestamp))
        })?;

        Ok(Self {
            sender: raw.sender,
            receiver: raw.receiver,
            amount_wei: raw.amount,
            message: raw.message,
            keyword: raw.keyword,
            timestamp_unix_seconds: timestamp,
            display_timestamp: display_timestamp(timestamp),
        })
    }

    /// Amount in display units, e.g. `"0.01"`
    pub fn amount(&self) -> String {
        units::format_amount(self.amount_wei)
    }

    pub fn amount_display_units(&self) -> f64 {
        units::to_display_units(self.amount_wei)
    }
}

/// Render unix seconds in local time as `M/D/YYYY, h:mm:ss AM`
pub fn display_timestamp(seconds: u64) -> String {
    i64::try_from(seconds)
        .ok()
        .and_then(|secs| Local.timestamp_opt(secs, 0).single())
        .map(|time| time.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string())
        .unwrap_or_else(|| seconds.to_string())
}

pub struct HistoryReader {
    records: RwLock<Vec<TransactionRecord>>,
    events: EventSink,
}

impl HistoryReader {
    pub fn new(events: EventSink) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            events,
        }
    }

    /// The most recent snapshot
    pub async fn records(&self) -> Vec<TransactionRecord> {
        self.records.read().await.clone()
    }

    /// Refresh the held snapshot from the ledger
    ///
    /// Never fails: on error the previous snapshot is kept and returned.
    pub async fn fetch_all(&self, client: &LedgerClientHandle) -> Vec<TransactionRecord> {
        match read_snapshot(client).await {
            Ok(snapshot) => {
                log::info!("Loaded {} transactions from ledger", snapshot.len());
                *self.records.write().await = snapshot.clone();
                self.events.emit(ContextEvent::HistoryUpdated {
                    records: snapshot.len(),
                });
                snapshot
            }
            Err(e) => {
                log::warn!("Failed to read transaction history: {}", e);
                self.records().await
            }
        }
    }
}

/// Read and normalize every record, preserving ledger order
pub async fn read_snapshot(
    client: &LedgerClientHandle,
) -> Result<Vec<TransactionRecord>, TransactionError> {
    client
        .get_all_transactions()
        .await?
        .into_iter()
        .map(TransactionRecord::from_ledger)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_ledger() {
        let raw = Transactions::TransferStruct {
            sender: Address::repeat_byte(1),
            receiver: Address::repeat_byte(2),
            amount: U256::from(250_000_000_000_000_000u64),
            message: "rent".to_string(),
            timestamp: U256::from(1_700_000_000u64),
            keyword: "house".to_string(),
        };

        let record = TransactionRecord::from_ledger(raw).unwrap();
        assert_eq!(record.amount(), "0.25");
        assert_eq!(record.amount_display_units(), 0.25);
        assert_eq!(record.timestamp_unix_seconds, 1_700_000_000);
        assert_eq!(record.display_timestamp, display_timestamp(1_700_000_000));
        assert!(record.display_timestamp.contains("2023"));
    }

    #[test]
    fn test_oversized_timestamp_rejected() {
        let raw = Transactions::TransferStruct {
            sender: Address::ZERO,
            receiver: Address::ZERO,
            amount: U256::ZERO,
            message: String::new(),
            timestamp: U256::MAX,
            keyword: String::new(),
        };
        assert!(matches!(
            TransactionRecord::from_ledger(raw),
            Err(TransactionError::InvalidResponse(_))
        ));
    }
}
