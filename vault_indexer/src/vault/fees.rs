use alloy_primitives::{Address, U256};

use crate::{
    entities::Vault,
    indexer::Indexer,
    journal::LogType,
    reader::{ContractReader, SourceRegistrar},
    store::{Entity, Store},
    types::TransactionContext,
    utils::error::IndexerResult,
};

impl<S: Store, R: ContractReader, T: SourceRegistrar> Indexer<S, R, T> {
    pub fn update_performance_fee(
        &mut self,
        vault: Address,
        performance_fee: U256,
        tx: &TransactionContext,
    ) -> IndexerResult<()> {
        self.update_vault(vault, tx, "performance fee", |v| {
            v.performance_fee_bps = Some(performance_fee)
        })
    }

    pub fn update_management_fee(
        &mut self,
        vault: Address,
        management_fee: U256,
        tx: &TransactionContext,
    ) -> IndexerResult<()> {
        self.update_vault(vault, tx, "management fee", |v| {
            v.management_fee_bps = Some(management_fee)
        })
    }

    pub fn update_rewards(
        &mut self,
        vault: Address,
        rewards: Address,
        tx: &TransactionContext,
    ) -> IndexerResult<()> {
        self.update_vault(vault, tx, "rewards", |v| v.rewards = Some(rewards))
    }

    /// Creates the vault on demand, then applies `update`
    fn update_vault<F: FnOnce(&mut Vault)>(
        &mut self,
        vault: Address,
        tx: &TransactionContext,
        setting: &str,
        update: F,
    ) -> IndexerResult<()> {
        let mut record = self.create_vault_if_needed(vault, tx)?;
        update(&mut record);
        self.store.save(&record)?;
        self.journal.append_note(
            Ok(()),
            LogType::Info,
            format!("Updated {} of vault {}.", setting, record.id()),
        );
        Ok(())
    }
}
