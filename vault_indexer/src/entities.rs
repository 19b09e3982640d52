//! Entities materialized by the indexer
//!
//! Vault, Registry and Strategy are long-lived aggregates. Everything else is
//! an append-only fact that references them by id.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{store::Entity, utils::common::address_id};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultClassification {
    Endorsed,
    Experimental,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    pub address: Address,
    pub block_number: u64,
    pub timestamp: u64,
    pub transaction: String,
}

impl Entity for Registry {
    const KIND: &'static str = "Registry";

    fn id(&self) -> String {
        address_id(&self.address)
    }
}

/// Vault template published by a registry `NewRelease` event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VaultRelease {
    pub registry: Address,
    pub release_id: U256,
    pub template: Address,
    pub api_version: String,
    pub block_number: u64,
    pub timestamp: u64,
    pub transaction: String,
}

impl VaultRelease {
    pub fn build_id(registry: &Address, release_id: &U256) -> String {
        format!("{}-{}", address_id(registry), release_id)
    }
}

impl Entity for VaultRelease {
    const KIND: &'static str = "VaultRelease";

    fn id(&self) -> String {
        Self::build_id(&self.registry, &self.release_id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vault {
    pub address: Address,
    /// `None` for deployments that were never added to a registry
    pub registry: Option<Address>,
    pub api_version: String,
    pub classification: VaultClassification,
    /// Underlying asset, `None` when the `token()` read failed
    pub token: Option<Address>,
    pub tag: Option<String>,
    pub performance_fee_bps: Option<U256>,
    pub management_fee_bps: Option<U256>,
    pub rewards: Option<Address>,
    pub latest_price_per_share: Option<U256>,
    pub block_number: u64,
    pub timestamp: u64,
    pub transaction: String,
}

impl Entity for Vault {
    const KIND: &'static str = "Vault";

    fn id(&self) -> String {
        address_id(&self.address)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub address: Address,
    pub name: String,
    pub vault: Address,
    pub debt_limit: U256,
    pub rate_limit: U256,
    pub min_debt_per_harvest: U256,
    pub max_debt_per_harvest: U256,
    pub performance_fee_bps: U256,
    pub in_queue: bool,
    pub health_check: Option<Address>,
    pub do_health_check: bool,
    /// Id of the strategy this one was cloned or migrated from
    pub cloned_from: Option<String>,
    /// Id of the most recent `StrategyReport`
    pub latest_report: Option<String>,
    pub block_number: u64,
    pub timestamp: u64,
    pub transaction: String,
}

impl Strategy {
    pub fn build_id(address: &Address) -> String {
        address_id(address)
    }
}

impl Entity for Strategy {
    const KIND: &'static str = "Strategy";

    fn id(&self) -> String {
        Self::build_id(&self.address)
    }
}

/// Accounting snapshot reported by a strategy. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyReport {
    pub id: String,
    pub strategy: String,
    pub gain: U256,
    pub loss: U256,
    pub total_gain: U256,
    pub total_loss: U256,
    pub total_debt: U256,
    pub debt_added: U256,
    pub debt_ratio: U256,
    pub debt_paid: U256,
    pub block_number: u64,
    /// Milliseconds
    pub timestamp: u64,
    pub transaction: String,
}

impl Entity for StrategyReport {
    const KIND: &'static str = "StrategyReport";

    fn id(&self) -> String {
        self.id.clone()
    }
}

/// Performance between two consecutive reports of one strategy
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyReportResult {
    pub id: String,
    pub previous_report: String,
    pub current_report: String,
    pub start_timestamp: u64,
    pub end_timestamp: u64,
    /// Milliseconds between both reports
    pub duration: f64,
    /// Profit over the previous report's total debt
    pub duration_pr: f64,
    pub apr: f64,
    pub block_number: u64,
    pub timestamp: u64,
    pub transaction: String,
}

impl Entity for StrategyReportResult {
    const KIND: &'static str = "StrategyReportResult";

    fn id(&self) -> String {
        self.id.clone()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Harvest {
    pub id: String,
    /// `None` when the strategy's `vault()` read failed
    pub vault: Option<Address>,
    pub strategy: String,
    pub harvester: Address,
    pub profit: U256,
    pub loss: U256,
    pub debt_payment: U256,
    pub debt_outstanding: U256,
    pub block_number: u64,
    pub timestamp: u64,
    pub transaction: String,
}

impl Harvest {
    /// Strategy, transaction hash and transaction index
    pub fn build_id(strategy: &Address, tx_hash: &str, tx_index: u64) -> String {
        format!("{}-{}-{}", address_id(strategy), tx_hash, tx_index)
    }
}

impl Entity for Harvest {
    const KIND: &'static str = "Harvest";

    fn id(&self) -> String {
        self.id.clone()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
}

impl Entity for Account {
    const KIND: &'static str = "Account";

    fn id(&self) -> String {
        address_id(&self.address)
    }
}

/// Running share and token totals of one account in one vault
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountVaultPosition {
    pub account: Address,
    pub vault: Address,
    pub share_balance: U256,
    pub shares_minted: U256,
    pub shares_burnt: U256,
    pub shares_sent: U256,
    pub shares_received: U256,
    pub tokens_deposited: U256,
    pub tokens_withdrawn: U256,
    pub tokens_sent: U256,
    pub tokens_received: U256,
    pub latest_transaction: String,
}

impl AccountVaultPosition {
    pub fn build_id(account: &Address, vault: &Address) -> String {
        format!("{}-{}", address_id(account), address_id(vault))
    }

    pub fn new(account: Address, vault: Address) -> Self {
        Self {
            account,
            vault,
            ..Default::default()
        }
    }

    pub fn mint(&mut self, shares: U256, tokens: U256) -> &mut Self {
        self.shares_minted = self.shares_minted.saturating_add(shares);
        self.tokens_deposited = self.tokens_deposited.saturating_add(tokens);
        self.share_balance = self.share_balance.saturating_add(shares);
        self
    }

    pub fn burn(&mut self, shares: U256, tokens: U256) -> &mut Self {
        self.shares_burnt = self.shares_burnt.saturating_add(shares);
        self.tokens_withdrawn = self.tokens_withdrawn.saturating_add(tokens);
        self.share_balance = self.share_balance.saturating_sub(shares);
        self
    }

    pub fn send(&mut self, shares: U256, tokens: U256) -> &mut Self {
        self.shares_sent = self.shares_sent.saturating_add(shares);
        self.tokens_sent = self.tokens_sent.saturating_add(tokens);
        self.share_balance = self.share_balance.saturating_sub(shares);
        self
    }

    pub fn receive(&mut self, shares: U256, tokens: U256) -> &mut Self {
        self.shares_received = self.shares_received.saturating_add(shares);
        self.tokens_received = self.tokens_received.saturating_add(tokens);
        self.share_balance = self.share_balance.saturating_add(shares);
        self
    }
}

impl Entity for AccountVaultPosition {
    const KIND: &'static str = "AccountVaultPosition";

    fn id(&self) -> String {
        Self::build_id(&self.account, &self.vault)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Deposit {
    pub id: String,
    pub account: Address,
    pub vault: Address,
    pub token_amount: U256,
    pub shares_minted: U256,
    pub block_number: u64,
    pub timestamp: u64,
}

impl Entity for Deposit {
    const KIND: &'static str = "Deposit";

    fn id(&self) -> String {
        self.id.clone()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: String,
    pub account: Address,
    pub vault: Address,
    pub token_amount: U256,
    pub shares_burnt: U256,
    pub block_number: u64,
    pub timestamp: u64,
}

impl Entity for Withdrawal {
    const KIND: &'static str = "Withdrawal";

    fn id(&self) -> String {
        self.id.clone()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: String,
    pub vault: Address,
    pub from: Address,
    pub to: Address,
    pub token: Option<Address>,
    pub token_amount: U256,
    pub share_amount: U256,
    pub block_number: u64,
    pub timestamp: u64,
}

impl Entity for Transfer {
    const KIND: &'static str = "Transfer";

    fn id(&self) -> String {
        self.id.clone()
    }
}
