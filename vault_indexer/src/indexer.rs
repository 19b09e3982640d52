//! Indexer context and dispatch
//!
//! The [`Indexer`] owns the entity store, the contract reader, the source
//! registrar, the journal and the configuration. Core operations are
//! implemented in the `strategy` and `vault` modules; the `handle_*` entry
//! points below route decoded inputs to them.
//!
//! Recoverable errors (unknown entity, duplicate creation, failed contract
//! read) skip the input and are journaled as warnings. Store and
//! configuration errors propagate to the host.

use alloy_primitives::Address;

use crate::{
    adapters::{RegistryEvent, StrategyEvent, VaultCall, VaultEvent},
    config::IndexerConfig,
    entities::VaultClassification,
    journal::{JournalCollection, LogType},
    reader::{ContractReader, SourceRegistrar},
    store::Store,
    strategy::StrategyParams,
    types::{Harvested, ShareTransfer, StrategyMigrated, TransactionContext},
    utils::{common::is_event_block_number_lt, error::IndexerResult},
};

pub struct Indexer<S, R, T> {
    pub(crate) store: S,
    pub(crate) reader: R,
    pub(crate) registrar: T,
    pub(crate) journal: JournalCollection,
    pub(crate) config: IndexerConfig,
}

impl<S: Store, R: ContractReader, T: SourceRegistrar> Indexer<S, R, T> {
    pub fn new(store: S, reader: R, registrar: T) -> Self {
        Self {
            store,
            reader,
            registrar,
            journal: JournalCollection::default(),
            config: IndexerConfig::default(),
        }
    }

    /// Replaces the configuration
    pub fn with_config(mut self, config: IndexerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn registrar(&self) -> &T {
        &self.registrar
    }

    pub fn registrar_mut(&mut self) -> &mut T {
        &mut self.registrar
    }

    pub fn journal(&self) -> &JournalCollection {
        &self.journal
    }

    pub fn journal_mut(&mut self) -> &mut JournalCollection {
        &mut self.journal
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Handles a call traced on `vault` and made by `caller`
    pub fn handle_vault_call(
        &mut self,
        vault: Address,
        caller: Address,
        call: &VaultCall,
        tx: &TransactionContext,
    ) -> IndexerResult<()> {
        self.journal.open(tx);
        let name = call.name();
        let result = self.route_vault_call(vault, caller, call, tx);
        self.settle(name, result)
    }

    fn route_vault_call(
        &mut self,
        vault: Address,
        caller: Address,
        call: &VaultCall,
        tx: &TransactionContext,
    ) -> IndexerResult<()> {
        let name = call.name();
        if self.is_minimal_proxy_call(&caller, &vault)? {
            self.journal.append_note(
                Ok(()),
                LogType::Skipped,
                format!("{} is a delegated call between vaults.", name),
            );
            return Ok(());
        }
        if !self.is_in_deployment_range(name, &vault, tx) {
            return Ok(());
        }

        match call {
            VaultCall::Deposit(deposit) => self
                .deposit(&deposit.normalize(vault, caller), tx)
                .map(|_| ()),
            VaultCall::Withdraw(withdraw) => self
                .withdraw(&withdraw.normalize(vault, caller), tx)
                .map(|_| ()),
            VaultCall::AddStrategy(add) => self.create_vault_if_needed(vault, tx).and_then(|_| {
                self.create_and_get_strategy(StrategyParams::from(&add.normalize(vault)), tx)
                    .map(|_| ())
            }),
        }
    }

    /// Handles an event emitted by `vault`
    pub fn handle_vault_event(
        &mut self,
        vault: Address,
        event: &VaultEvent,
        tx: &TransactionContext,
    ) -> IndexerResult<()> {
        self.journal.open(tx);
        let name = event.name();
        let result = self.route_vault_event(vault, event, tx);
        self.settle(name, result)
    }

    fn route_vault_event(
        &mut self,
        vault: Address,
        event: &VaultEvent,
        tx: &TransactionContext,
    ) -> IndexerResult<()> {
        let name = event.name();
        if !self.is_in_deployment_range(name, &vault, tx) {
            return Ok(());
        }

        match event {
            VaultEvent::StrategyReported(reported) => {
                let report = self.create_report(&reported.normalize(), tx).map(|_| ());
                self.settle(name, report)?;
                self.update_price_per_share(vault, tx)
            }
            VaultEvent::StrategyAdded(added) => {
                self.create_vault_if_needed(vault, tx).and_then(|_| {
                    self.create_and_get_strategy(StrategyParams::from(&added.normalize(vault)), tx)
                        .map(|_| ())
                })
            }
            VaultEvent::StrategyMigrated {
                old_version,
                new_version,
            } => {
                let migration = StrategyMigrated {
                    vault,
                    old_address: *old_version,
                    new_address: *new_version,
                };
                self.migrate_strategy(&migration, tx).map(|_| ())
            }
            VaultEvent::StrategyAddedToQueue { strategy } => {
                self.strategy_added_to_queue(*strategy, tx)
            }
            VaultEvent::StrategyRemovedFromQueue { strategy } => {
                self.strategy_removed_from_queue(*strategy, tx)
            }
            VaultEvent::Transfer {
                sender,
                receiver,
                value,
            } => {
                let transfer = ShareTransfer {
                    vault,
                    sender: *sender,
                    receiver: *receiver,
                    share_delta: *value,
                };
                self.transfer(&transfer, tx).map(|_| ())
            }
            VaultEvent::UpdatePerformanceFee { performance_fee } => {
                self.update_performance_fee(vault, *performance_fee, tx)
            }
            VaultEvent::UpdateManagementFee { management_fee } => {
                self.update_management_fee(vault, *management_fee, tx)
            }
            VaultEvent::UpdateRewards { rewards } => self.update_rewards(vault, *rewards, tx),
        }
    }

    /// Handles an event emitted by `registry`
    pub fn handle_registry_event(
        &mut self,
        registry: Address,
        event: &RegistryEvent,
        tx: &TransactionContext,
    ) -> IndexerResult<()> {
        self.journal.open(tx);
        let result = match event {
            RegistryEvent::NewRelease {
                release_id,
                template,
                api_version,
            } => self
                .new_release(registry, *release_id, *template, api_version.clone(), tx)
                .map(|_| ()),
            RegistryEvent::NewVault {
                vault, api_version, ..
            } => self
                .new_vault(
                    registry,
                    *vault,
                    VaultClassification::Endorsed,
                    api_version.clone(),
                    tx,
                )
                .map(|_| ()),
            RegistryEvent::NewExperimentalVault {
                vault, api_version, ..
            } => self
                .new_vault(
                    registry,
                    *vault,
                    VaultClassification::Experimental,
                    api_version.clone(),
                    tx,
                )
                .map(|_| ()),
            RegistryEvent::VaultTagged { vault, tag } => self.tag_vault(*vault, tag.clone(), tx),
        };
        self.settle(event.name(), result)
    }

    /// Handles an event emitted by `strategy`. The harvester is the
    /// transaction sender.
    pub fn handle_strategy_event(
        &mut self,
        strategy: Address,
        event: &StrategyEvent,
        tx: &TransactionContext,
    ) -> IndexerResult<()> {
        self.journal.open(tx);
        let result = match event {
            StrategyEvent::Harvested {
                profit,
                loss,
                debt_payment,
                debt_outstanding,
            } => {
                let harvested = Harvested {
                    strategy,
                    harvester: tx.from,
                    profit: *profit,
                    loss: *loss,
                    debt_payment: *debt_payment,
                    debt_outstanding: *debt_outstanding,
                };
                self.harvest(&harvested, tx).map(|_| ())
            }
            StrategyEvent::SetHealthCheck { health_check } => {
                self.set_health_check(strategy, *health_check, tx)
            }
            StrategyEvent::SetDoHealthCheck { do_health_check } => {
                self.set_do_health_check(strategy, *do_health_check, tx)
            }
            StrategyEvent::Cloned { clone } => {
                self.clone_strategy(*clone, strategy, tx).map(|_| ())
            }
        };
        self.settle(event.name(), result)
    }

    /// Applies the cutover of the deployment handling `vault`
    fn is_in_deployment_range(
        &mut self,
        name: &str,
        vault: &Address,
        tx: &TransactionContext,
    ) -> bool {
        let end_block = self.config.end_block(vault);
        let in_range = is_event_block_number_lt(name, tx.block_number, end_block);
        if !in_range {
            self.journal.append_note(
                Ok(()),
                LogType::Skipped,
                format!(
                    "{} at block {} is past the deployment cutover.",
                    name, tx.block_number
                ),
            );
        }
        in_range
    }

    /// Journals recoverable errors and lets the rest through
    fn settle(&mut self, name: &str, result: IndexerResult<()>) -> IndexerResult<()> {
        let result = match result {
            Err(err) if err.is_recoverable() => {
                self.journal
                    .append_note(Err(err), LogType::Warning, format!("{} was skipped.", name));
                Ok(())
            }
            other => other,
        };
        self.journal.cleanup();
        result
    }
}
