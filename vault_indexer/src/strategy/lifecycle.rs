//! Strategy creation, migration, cloning and queue/health-check updates
//!
//! A strategy is created exactly once per address. Its parameters are only
//! ever set at creation: a repeated create-or-get returns the stored record
//! unchanged, and the only way to carry parameters to a new address is a
//! migration.

use alloy_primitives::{Address, U256};

use crate::{
    constants::UNKNOWN_STRATEGY_NAME,
    entities::Strategy,
    indexer::Indexer,
    journal::LogType,
    reader::{ContractReader, DataSource, SourceRegistrar, StrategyView},
    store::{Entity, Store},
    types::{StrategyAdded, StrategyMigrated, TransactionContext},
    utils::error::{IndexerError, IndexerResult},
};

/// Parameters a strategy is created with
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StrategyParams {
    pub address: Address,
    pub vault: Address,
    pub debt_limit: U256,
    pub rate_limit: U256,
    pub min_debt_per_harvest: U256,
    pub max_debt_per_harvest: U256,
    pub performance_fee_bps: U256,
    pub cloned_from: Option<String>,
}

impl From<&StrategyAdded> for StrategyParams {
    fn from(value: &StrategyAdded) -> Self {
        Self {
            address: value.strategy,
            vault: value.vault,
            debt_limit: value.debt_ratio,
            rate_limit: value.rate_limit,
            min_debt_per_harvest: value.min_debt_per_harvest,
            max_debt_per_harvest: value.max_debt_per_harvest,
            performance_fee_bps: value.performance_fee,
            cloned_from: None,
        }
    }
}

impl<S: Store, R: ContractReader, T: SourceRegistrar> Indexer<S, R, T> {
    /// Returns the strategy at `params.address`, creating it if needed.
    /// On the load path every parameter is ignored.
    pub fn create_and_get_strategy(
        &mut self,
        params: StrategyParams,
        tx: &TransactionContext,
    ) -> IndexerResult<Strategy> {
        let id = Strategy::build_id(&params.address);
        if let Some(existing) = self.store.load::<Strategy>(&id)? {
            self.journal.append_note(
                Ok(()),
                LogType::Info,
                format!("Strategy {} already exists. Creation parameters ignored.", id),
            );
            return Ok(existing);
        }

        let view = StrategyView::new(&self.reader, params.address);
        let name = match view.name() {
            Ok(name) => name,
            Err(err) => {
                self.journal.append_note(
                    Err(err),
                    LogType::Guarded,
                    format!("Could not read name of strategy {}.", id),
                );
                UNKNOWN_STRATEGY_NAME.to_string()
            }
        };
        let health_check = view.health_check().ok();
        let do_health_check = view.do_health_check().unwrap_or(false);

        let strategy = Strategy {
            address: params.address,
            name,
            vault: params.vault,
            debt_limit: params.debt_limit,
            rate_limit: params.rate_limit,
            min_debt_per_harvest: params.min_debt_per_harvest,
            max_debt_per_harvest: params.max_debt_per_harvest,
            performance_fee_bps: params.performance_fee_bps,
            in_queue: true,
            health_check,
            do_health_check,
            cloned_from: params.cloned_from,
            latest_report: None,
            block_number: tx.block_number,
            timestamp: tx.timestamp,
            transaction: tx.id(),
        };
        self.store.save(&strategy)?;
        self.registrar.register(DataSource::Strategy(strategy.address));

        self.journal.append_note(
            Ok(()),
            LogType::EntityCreated,
            format!("Created strategy {} in vault {}.", id, strategy.vault),
        );
        Ok(strategy)
    }

    /// Creates `new_address` with the old strategy's parameters and removes
    /// the old strategy from the queue.
    ///
    /// Fails with `NotFound` if the old strategy is unknown and with
    /// `AlreadyExists` if the new one was already created. Neither case
    /// mutates anything.
    pub fn migrate_strategy(
        &mut self,
        migration: &StrategyMigrated,
        tx: &TransactionContext,
    ) -> IndexerResult<Strategy> {
        let old_id = Strategy::build_id(&migration.old_address);
        let old = self
            .store
            .load::<Strategy>(&old_id)?
            .ok_or_else(|| IndexerError::not_found(Strategy::KIND, &old_id))?;

        let new_id = Strategy::build_id(&migration.new_address);
        if self.store.exists::<Strategy>(&new_id)? {
            return Err(IndexerError::already_exists(Strategy::KIND, new_id));
        }

        let params = StrategyParams {
            address: migration.new_address,
            vault: migration.vault,
            debt_limit: old.debt_limit,
            rate_limit: old.rate_limit,
            min_debt_per_harvest: old.min_debt_per_harvest,
            max_debt_per_harvest: old.max_debt_per_harvest,
            performance_fee_bps: old.performance_fee_bps,
            cloned_from: Some(old_id),
        };
        let strategy = self.create_and_get_strategy(params, tx)?;
        self.strategy_removed_from_queue(migration.old_address, tx)?;
        Ok(strategy)
    }

    /// Creates a strategy cloned from `from`, with zeroed parameters.
    /// The vault is read from the clone; `clonedFrom` is only set when `from` is known.
    pub fn clone_strategy(
        &mut self,
        clone: Address,
        from: Address,
        tx: &TransactionContext,
    ) -> IndexerResult<Strategy> {
        let from_id = Strategy::build_id(&from);
        let source = self.store.load::<Strategy>(&from_id)?;
        let vault = match StrategyView::new(&self.reader, clone).vault() {
            Ok(vault) => vault,
            Err(err) => match &source {
                Some(source) => {
                    self.journal.append_note(
                        Err(err),
                        LogType::Guarded,
                        format!(
                            "Could not read vault of clone {}. Using the vault of {}.",
                            clone, from_id
                        ),
                    );
                    source.vault
                }
                None => return Err(err),
            },
        };

        let params = StrategyParams {
            address: clone,
            vault,
            cloned_from: source.map(|s| s.id()),
            ..Default::default()
        };
        self.create_and_get_strategy(params, tx)
    }

    pub fn set_health_check(
        &mut self,
        strategy: Address,
        health_check: Address,
        tx: &TransactionContext,
    ) -> IndexerResult<()> {
        self.update_strategy(strategy, tx, |s| s.health_check = Some(health_check))
    }

    pub fn set_do_health_check(
        &mut self,
        strategy: Address,
        do_health_check: bool,
        tx: &TransactionContext,
    ) -> IndexerResult<()> {
        self.update_strategy(strategy, tx, |s| s.do_health_check = do_health_check)
    }

    pub fn strategy_added_to_queue(
        &mut self,
        strategy: Address,
        tx: &TransactionContext,
    ) -> IndexerResult<()> {
        self.update_strategy(strategy, tx, |s| s.in_queue = true)
    }

    pub fn strategy_removed_from_queue(
        &mut self,
        strategy: Address,
        tx: &TransactionContext,
    ) -> IndexerResult<()> {
        self.update_strategy(strategy, tx, |s| s.in_queue = false)
    }

    /// Loads, mutates and saves a strategy. `NotFound` if it is unknown.
    fn update_strategy<F: FnOnce(&mut Strategy)>(
        &mut self,
        address: Address,
        tx: &TransactionContext,
        update: F,
    ) -> IndexerResult<()> {
        let id = Strategy::build_id(&address);
        let mut strategy = self
            .store
            .load::<Strategy>(&id)?
            .ok_or_else(|| IndexerError::not_found(Strategy::KIND, &id))?;
        update(&mut strategy);
        self.store.save(&strategy)?;
        self.journal.append_note(
            Ok(()),
            LogType::Info,
            format!("Updated strategy {} in {}.", id, tx.hash_hex()),
        );
        Ok(())
    }
}
