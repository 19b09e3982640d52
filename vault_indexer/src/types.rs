use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::sol;
use serde::{Deserialize, Serialize};

use crate::utils::common::get_time_in_millis;

/// Transaction that triggered the current input.
/// Supplied by the ingestion layer, only ever read by the indexer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionContext {
    pub hash: B256,
    /// Index of the transaction in its block
    pub index: u64,
    /// Index of the log or call within the transaction
    pub log_index: u64,
    pub block_number: u64,
    /// Block timestamp denominated in milliseconds
    pub timestamp: u64,
    pub from: Address,
    pub to: Option<Address>,
}

impl TransactionContext {
    /// Creates a context from a block timestamp in seconds
    pub fn new(hash: B256, block_number: u64, timestamp_secs: u64) -> Self {
        Self {
            hash,
            block_number,
            timestamp: get_time_in_millis(timestamp_secs),
            ..Default::default()
        }
    }

    /// Sets the transaction index
    pub fn index(mut self, index: u64) -> Self {
        self.index = index;
        self
    }

    /// Sets the log/call index
    pub fn log_index(mut self, log_index: u64) -> Self {
        self.log_index = log_index;
        self
    }

    /// Sets the sender
    pub fn from(mut self, from: Address) -> Self {
        self.from = from;
        self
    }

    /// Sets the callee
    pub fn to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    /// Lowercase hex of the transaction hash
    pub fn hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.hash))
    }

    /// Deterministic id of everything derived from this log or call
    pub fn id(&self) -> String {
        format!("{}-{}", self.hash_hex(), self.log_index)
    }
}

/// Deposit normalized from any `deposit(...)` call shape
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VaultDeposit {
    pub vault: Address,
    pub depositor: Address,
    pub recipient: Option<Address>,
    /// Unknown for the zero-argument `deposit()` call
    pub amount: Option<U256>,
    pub shares_out: U256,
}

/// Withdrawal normalized from any `withdraw(...)` call shape
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VaultWithdraw {
    pub vault: Address,
    pub withdrawer: Address,
    pub amount: U256,
    /// Unknown for the zero-argument `withdraw()` call
    pub shares: Option<U256>,
}

/// Share `Transfer` event
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShareTransfer {
    pub vault: Address,
    pub sender: Address,
    pub receiver: Address,
    pub share_delta: U256,
}

/// `StrategyReported` event normalized across vault versions
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StrategyReported {
    pub strategy: Address,
    pub gain: U256,
    pub loss: U256,
    pub total_gain: U256,
    pub total_loss: U256,
    pub total_debt: U256,
    pub debt_added: U256,
    /// `debtLimit` before vault 0.3.2
    pub debt_ratio: U256,
    /// Zero before vault 0.3.2
    pub debt_paid: U256,
}

/// Strategy added to a vault, from the `addStrategy` call or `StrategyAdded` event
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StrategyAdded {
    pub strategy: Address,
    pub vault: Address,
    pub debt_ratio: U256,
    pub rate_limit: U256,
    pub min_debt_per_harvest: U256,
    pub max_debt_per_harvest: U256,
    pub performance_fee: U256,
}

/// `StrategyMigrated` event
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StrategyMigrated {
    pub vault: Address,
    pub old_address: Address,
    pub new_address: Address,
}

/// `Harvested` event emitted by a strategy
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Harvested {
    pub strategy: Address,
    pub harvester: Address,
    pub profit: U256,
    pub loss: U256,
    pub debt_payment: U256,
    pub debt_outstanding: U256,
}

sol!(
    // Vault getters
    function totalAssets() external view returns (uint256);
    function totalSupply() external view returns (uint256);
    function pricePerShare() external view returns (uint256);
    function token() external view returns (address);

    // Strategy getters
    function name() external view returns (string);
    function healthCheck() external view returns (address);
    function doHealthCheck() external view returns (bool);
    function vault() external view returns (address);
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_id_uses_hash_and_log_index() {
        let tx = TransactionContext::new(B256::repeat_byte(0xab), 10, 1_600_000_000).log_index(7);
        assert_eq!(tx.id(), format!("0x{}-7", "ab".repeat(32)));
        assert_eq!(tx.timestamp, 1_600_000_000_000);
    }

    #[test]
    fn transaction_builder_setters() {
        let from = Address::repeat_byte(0x11);
        let to = Address::repeat_byte(0x22);
        let tx = TransactionContext::default()
            .index(3)
            .log_index(4)
            .from(from)
            .to(to);
        assert_eq!(tx.index, 3);
        assert_eq!(tx.log_index, 4);
        assert_eq!(tx.from, from);
        assert_eq!(tx.to, Some(to));
    }
}
