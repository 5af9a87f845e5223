/// Transaction context configuration from environment variables
///
/// Controls which wallet provider is injected, the target contract, where the
/// transaction count is cached and how confirmations are polled.

use alloy_primitives::Address;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::provider::{HttpProvider, WalletProvider};

/// Gas allowance for a plain value transfer (21000)
pub const DEFAULT_TRANSFER_GAS: u64 = 0x5208;

/// Interval between receipt polls while waiting for confirmation
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

#[derive(Clone, Debug)]
pub struct ContextConfig {
    /// Address of the deployed `Transactions` contract
    pub contract_address: Address,
    /// JSON-RPC endpoint of the wallet provider; `None` means no provider injected
    pub provider_url: Option<String>,
    /// Directory holding the cached transaction count
    pub cache_dir: PathBuf,
    /// Receipt polling interval
    pub confirmation_poll_interval: Duration,
    /// Gas allowance sent with the native value transfer
    pub transfer_gas: u64,
}

impl ContextConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `LEDGER_CONTRACT_ADDRESS`: `Transactions` contract address (hex)
    /// - `WALLET_PROVIDER_URL`: JSON-RPC endpoint of the wallet provider (optional)
    /// - `LEDGER_CACHE_DIR`: directory for the count cache (default `./ledger-cache`)
    /// - `CONFIRMATION_POLL_MS`: receipt polling interval in milliseconds
    /// - `TRANSFER_GAS`: gas for the value transfer, decimal or `0x` hex
    ///
    /// # Examples
    ///
    /// ```bash
    /// LEDGER_CONTRACT_ADDRESS=0x5FbDB2315678afecb367f032d93F642f64180aa3 \
    /// WALLET_PROVIDER_URL=http://localhost:8545 cargo test
    /// ```
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let contract_address = match env::var("LEDGER_CONTRACT_ADDRESS") {
            Ok(raw) => match raw.trim().parse::<Address>() {
                Ok(address) => {
                    log::info!("📜 Transactions contract: {}", address);
                    address
                }
                Err(e) => {
                    log::warn!("⚠️  Invalid LEDGER_CONTRACT_ADDRESS '{}': {}", raw, e);
                    defaults.contract_address
                }
            },
            Err(_) => {
                log::warn!("⚠️  LEDGER_CONTRACT_ADDRESS not set, using the zero address");
                defaults.contract_address
            }
        };

        let provider_url = env::var("WALLET_PROVIDER_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        match provider_url {
            Some(ref url) => log::info!("🔗 Wallet provider: {}", url),
            None => log::info!("No wallet provider configured"),
        }

        let cache_dir = env::var("LEDGER_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_dir);

        let confirmation_poll_interval = env::var("CONFIRMATION_POLL_MS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.confirmation_poll_interval);

        let transfer_gas = env::var("TRANSFER_GAS")
            .ok()
            .and_then(|raw| parse_gas(&raw))
            .unwrap_or(defaults.transfer_gas);

        Self {
            contract_address,
            provider_url,
            cache_dir,
            confirmation_poll_interval,
            transfer_gas,
        }
    }

    /// Build the configured wallet provider, if any
    pub fn provider(&self) -> Option<Arc<dyn WalletProvider>> {
        self.provider_url
            .as_ref()
            .map(|url| Arc::new(HttpProvider::new(url.clone())) as Arc<dyn WalletProvider>)
    }
}

fn parse_gas(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x") {
        Some(hex_digits) => u64::from_str_radix(hex_digits, 16).ok(),
        None => raw.parse().ok(),
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            contract_address: Address::ZERO,
            provider_url: None,
            cache_dir: PathBuf::from("./ledger-cache"),
            confirmation_poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            transfer_gas: DEFAULT_TRANSFER_GAS,
        }
    }
}
