//! Historical ABI shapes of vault calls and events
//!
//! Every vault version exposes slightly different signatures for the same
//! operation. Each variant here is one decoded shape; `normalize` maps it to
//! the canonical input the core operations take.

use alloy_primitives::{Address, U256};

use crate::types::{StrategyAdded, StrategyReported, VaultDeposit, VaultWithdraw};

#[derive(Clone, Debug, PartialEq)]
pub enum DepositCall {
    /// `deposit()`: the whole balance. The amount is not part of the call.
    All { shares_out: U256 },
    /// `deposit(uint256)`
    Amount { amount: U256, shares_out: U256 },
    /// `deposit(uint256,address)`
    AmountRecipient {
        amount: U256,
        recipient: Address,
        shares_out: U256,
    },
}

impl DepositCall {
    pub fn signature(&self) -> &'static str {
        match self {
            DepositCall::All { .. } => "deposit()",
            DepositCall::Amount { .. } => "deposit(uint256)",
            DepositCall::AmountRecipient { .. } => "deposit(uint256,address)",
        }
    }

    pub fn normalize(&self, vault: Address, depositor: Address) -> VaultDeposit {
        let (amount, recipient, shares_out) = match *self {
            DepositCall::All { shares_out } => (None, None, shares_out),
            DepositCall::Amount { amount, shares_out } => (Some(amount), None, shares_out),
            DepositCall::AmountRecipient {
                amount,
                recipient,
                shares_out,
            } => (Some(amount), Some(recipient), shares_out),
        };
        VaultDeposit {
            vault,
            depositor,
            recipient,
            amount,
            shares_out,
        }
    }
}

/// Withdrawals always burn the caller's shares. The recipient only receives
/// the underlying tokens.
#[derive(Clone, Debug, PartialEq)]
pub enum WithdrawCall {
    /// `withdraw()`: all shares of the caller
    All { amount_out: U256 },
    /// `withdraw(uint256)`
    Shares { shares: U256, amount_out: U256 },
    /// `withdraw(uint256,address)`
    SharesRecipient {
        shares: U256,
        recipient: Address,
        amount_out: U256,
    },
    /// `withdraw(uint256,address,uint256)`
    SharesRecipientMaxLoss {
        max_shares: U256,
        recipient: Address,
        max_loss: U256,
        amount_out: U256,
    },
}

impl WithdrawCall {
    pub fn signature(&self) -> &'static str {
        match self {
            WithdrawCall::All { .. } => "withdraw()",
            WithdrawCall::Shares { .. } => "withdraw(uint256)",
            WithdrawCall::SharesRecipient { .. } => "withdraw(uint256,address)",
            WithdrawCall::SharesRecipientMaxLoss { .. } => "withdraw(uint256,address,uint256)",
        }
    }

    pub fn normalize(&self, vault: Address, withdrawer: Address) -> VaultWithdraw {
        let (shares, amount) = match *self {
            WithdrawCall::All { amount_out } => (None, amount_out),
            WithdrawCall::Shares { shares, amount_out }
            | WithdrawCall::SharesRecipient {
                shares, amount_out, ..
            } => (Some(shares), amount_out),
            WithdrawCall::SharesRecipientMaxLoss {
                max_shares,
                amount_out,
                ..
            } => (Some(max_shares), amount_out),
        };
        VaultWithdraw {
            vault,
            withdrawer,
            amount,
            shares,
        }
    }
}

/// `StrategyReported` before and after vault 0.3.2
#[derive(Clone, Debug, PartialEq)]
pub enum StrategyReportedEvent {
    V0_3_0 {
        strategy: Address,
        gain: U256,
        loss: U256,
        total_gain: U256,
        total_loss: U256,
        total_debt: U256,
        debt_added: U256,
        debt_limit: U256,
    },
    V0_3_2 {
        strategy: Address,
        gain: U256,
        loss: U256,
        debt_paid: U256,
        total_gain: U256,
        total_loss: U256,
        total_debt: U256,
        debt_added: U256,
        debt_ratio: U256,
    },
}

impl StrategyReportedEvent {
    pub fn normalize(&self) -> StrategyReported {
        match *self {
            StrategyReportedEvent::V0_3_0 {
                strategy,
                gain,
                loss,
                total_gain,
                total_loss,
                total_debt,
                debt_added,
                debt_limit,
            } => StrategyReported {
                strategy,
                gain,
                loss,
                total_gain,
                total_loss,
                total_debt,
                debt_added,
                debt_ratio: debt_limit,
                debt_paid: U256::ZERO,
            },
            StrategyReportedEvent::V0_3_2 {
                strategy,
                gain,
                loss,
                debt_paid,
                total_gain,
                total_loss,
                total_debt,
                debt_added,
                debt_ratio,
            } => StrategyReported {
                strategy,
                gain,
                loss,
                total_gain,
                total_loss,
                total_debt,
                debt_added,
                debt_ratio,
                debt_paid,
            },
        }
    }
}

/// `addStrategy(...)` call shapes
#[derive(Clone, Debug, PartialEq)]
pub enum AddStrategyCall {
    /// `addStrategy(address,uint256,uint256,uint256)`
    V1 {
        strategy: Address,
        debt_limit: U256,
        rate_limit: U256,
        performance_fee: U256,
    },
    /// `addStrategy(address,uint256,uint256,uint256,uint256)`
    V2 {
        strategy: Address,
        debt_ratio: U256,
        min_debt_per_harvest: U256,
        max_debt_per_harvest: U256,
        performance_fee: U256,
    },
}

impl AddStrategyCall {
    pub fn signature(&self) -> &'static str {
        match self {
            AddStrategyCall::V1 { .. } => "addStrategy(address,uint256,uint256,uint256)",
            AddStrategyCall::V2 { .. } => "addStrategy(address,uint256,uint256,uint256,uint256)",
        }
    }

    pub fn normalize(&self, vault: Address) -> StrategyAdded {
        match *self {
            AddStrategyCall::V1 {
                strategy,
                debt_limit,
                rate_limit,
                performance_fee,
            } => StrategyAdded {
                strategy,
                vault,
                debt_ratio: debt_limit,
                rate_limit,
                performance_fee,
                ..Default::default()
            },
            AddStrategyCall::V2 {
                strategy,
                debt_ratio,
                min_debt_per_harvest,
                max_debt_per_harvest,
                performance_fee,
            } => StrategyAdded {
                strategy,
                vault,
                debt_ratio,
                min_debt_per_harvest,
                max_debt_per_harvest,
                performance_fee,
                ..Default::default()
            },
        }
    }
}

/// `StrategyAdded` event shapes
#[derive(Clone, Debug, PartialEq)]
pub enum StrategyAddedEvent {
    V1 {
        strategy: Address,
        debt_limit: U256,
        rate_limit: U256,
        performance_fee: U256,
    },
    V2 {
        strategy: Address,
        debt_ratio: U256,
        min_debt_per_harvest: U256,
        max_debt_per_harvest: U256,
        performance_fee: U256,
    },
}

impl StrategyAddedEvent {
    pub fn normalize(&self, vault: Address) -> StrategyAdded {
        let call = match *self {
            StrategyAddedEvent::V1 {
                strategy,
                debt_limit,
                rate_limit,
                performance_fee,
            } => AddStrategyCall::V1 {
                strategy,
                debt_limit,
                rate_limit,
                performance_fee,
            },
            StrategyAddedEvent::V2 {
                strategy,
                debt_ratio,
                min_debt_per_harvest,
                max_debt_per_harvest,
                performance_fee,
            } => AddStrategyCall::V2 {
                strategy,
                debt_ratio,
                min_debt_per_harvest,
                max_debt_per_harvest,
                performance_fee,
            },
        };
        call.normalize(vault)
    }
}

/// Call traced on a vault
#[derive(Clone, Debug, PartialEq)]
pub enum VaultCall {
    Deposit(DepositCall),
    Withdraw(WithdrawCall),
    AddStrategy(AddStrategyCall),
}

impl VaultCall {
    pub fn name(&self) -> &'static str {
        match self {
            VaultCall::Deposit(call) => call.signature(),
            VaultCall::Withdraw(call) => call.signature(),
            VaultCall::AddStrategy(call) => call.signature(),
        }
    }
}

/// Event emitted by a vault
#[derive(Clone, Debug, PartialEq)]
pub enum VaultEvent {
    StrategyReported(StrategyReportedEvent),
    StrategyAdded(StrategyAddedEvent),
    StrategyMigrated {
        old_version: Address,
        new_version: Address,
    },
    StrategyAddedToQueue {
        strategy: Address,
    },
    StrategyRemovedFromQueue {
        strategy: Address,
    },
    Transfer {
        sender: Address,
        receiver: Address,
        value: U256,
    },
    UpdatePerformanceFee {
        performance_fee: U256,
    },
    UpdateManagementFee {
        management_fee: U256,
    },
    UpdateRewards {
        rewards: Address,
    },
}

impl VaultEvent {
    pub fn name(&self) -> &'static str {
        match self {
            VaultEvent::StrategyReported(_) => "StrategyReported",
            VaultEvent::StrategyAdded(_) => "StrategyAdded",
            VaultEvent::StrategyMigrated { .. } => "StrategyMigrated",
            VaultEvent::StrategyAddedToQueue { .. } => "StrategyAddedToQueue",
            VaultEvent::StrategyRemovedFromQueue { .. } => "StrategyRemovedFromQueue",
            VaultEvent::Transfer { .. } => "Transfer",
            VaultEvent::UpdatePerformanceFee { .. } => "UpdatePerformanceFee",
            VaultEvent::UpdateManagementFee { .. } => "UpdateManagementFee",
            VaultEvent::UpdateRewards { .. } => "UpdateRewards",
        }
    }
}

/// Event emitted by a vault registry
#[derive(Clone, Debug, PartialEq)]
pub enum RegistryEvent {
    NewRelease {
        release_id: U256,
        template: Address,
        api_version: String,
    },
    /// Endorsed vault
    NewVault {
        token: Address,
        vault: Address,
        api_version: String,
    },
    NewExperimentalVault {
        token: Address,
        vault: Address,
        api_version: String,
    },
    VaultTagged {
        vault: Address,
        tag: String,
    },
}

impl RegistryEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RegistryEvent::NewRelease { .. } => "NewRelease",
            RegistryEvent::NewVault { .. } => "NewVault",
            RegistryEvent::NewExperimentalVault { .. } => "NewExperimentalVault",
            RegistryEvent::VaultTagged { .. } => "VaultTagged",
        }
    }
}

/// Event emitted by a strategy
#[derive(Clone, Debug, PartialEq)]
pub enum StrategyEvent {
    Harvested {
        profit: U256,
        loss: U256,
        debt_payment: U256,
        debt_outstanding: U256,
    },
    SetHealthCheck {
        health_check: Address,
    },
    SetDoHealthCheck {
        do_health_check: bool,
    },
    Cloned {
        clone: Address,
    },
}

impl StrategyEvent {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyEvent::Harvested { .. } => "Harvested",
            StrategyEvent::SetHealthCheck { .. } => "SetHealthCheck",
            StrategyEvent::SetDoHealthCheck { .. } => "SetDoHealthCheck",
            StrategyEvent::Cloned { .. } => "Cloned",
        }
    }
}
