//! ABI bindings for the `Transactions` contract

use alloy_primitives::Address;
use alloy_sol_types::sol;

sol! {
    #[sol(all_derives)]
    interface Transactions {
        struct TransferStruct {
            address sender;
            address receiver;
            uint256 amount;
            string message;
            uint256 timestamp;
            string keyword;
        }

        function addToBlockchain(address receiver, uint256 amount, string message, string keyword);

        function getAllTransactions() returns (TransferStruct[]);

        function getTransactionCount() returns (uint256);
    }
}

/// Where the `Transactions` contract is deployed
///
/// The interface itself is the `Transactions` binding generated by `sol!` above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractBinding {
    pub address: Address,
}

impl ContractBinding {
    pub fn new(address: Address) -> Self {
        Self { address }
    }
}
