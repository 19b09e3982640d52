//! Vault and registry records
//!
//! Vaults are created either from a registry event or on demand by the first
//! input of a deployment that references them.

use alloy_primitives::{Address, U256};

use crate::{
    config::VaultOrigin,
    entities::{Registry, Vault, VaultClassification, VaultRelease},
    indexer::Indexer,
    journal::LogType,
    reader::{ContractReader, DataSource, SourceRegistrar, VaultView},
    store::{Entity, Store},
    types::TransactionContext,
    utils::{
        common::address_id,
        error::{IndexerError, IndexerResult},
    },
};

impl<S: Store, R: ContractReader, T: SourceRegistrar> Indexer<S, R, T> {
    /// Returns `true` if a vault record exists for `address`
    pub fn is_vault(&self, address: &Address) -> IndexerResult<bool> {
        self.store.exists::<Vault>(&address_id(address))
    }

    /// A call between two known vaults is a delegated call of a minimal
    /// proxy. Its effects are already recorded by the outer call.
    pub fn is_minimal_proxy_call(&self, from: &Address, to: &Address) -> IndexerResult<bool> {
        Ok(self.is_vault(to)? && self.is_vault(from)?)
    }

    /// Returns the vault at `address`, creating it from `origin` if needed.
    /// A new vault reads its `token()` and, with `register_source`, is
    /// registered as a dynamic source.
    pub fn create_vault(
        &mut self,
        address: Address,
        origin: &VaultOrigin,
        register_source: bool,
        tx: &TransactionContext,
    ) -> IndexerResult<Vault> {
        let id = address_id(&address);
        if let Some(existing) = self.store.load::<Vault>(&id)? {
            return Ok(existing);
        }

        let token = match VaultView::new(&self.reader, address).token() {
            Ok(token) => Some(token),
            Err(err) => {
                self.journal.append_note(
                    Err(err),
                    LogType::Guarded,
                    format!("Could not read token of vault {}.", id),
                );
                None
            }
        };

        let vault = Vault {
            address,
            registry: origin.registry,
            api_version: origin.api_version.clone(),
            classification: origin.classification,
            token,
            tag: None,
            performance_fee_bps: None,
            management_fee_bps: None,
            rewards: None,
            latest_price_per_share: None,
            block_number: tx.block_number,
            timestamp: tx.timestamp,
            transaction: tx.hash_hex(),
        };
        self.store.save(&vault)?;
        if register_source {
            self.registrar.register(DataSource::Vault(address));
        }

        self.journal.append_note(
            Ok(()),
            LogType::EntityCreated,
            format!("Created {:?} vault {} ({}).", vault.classification, id, vault.api_version),
        );
        Ok(vault)
    }

    /// Creates the vault of a configured deployment on first reference.
    /// Deployments have their own handlers, so no source is registered.
    pub fn create_vault_if_needed(
        &mut self,
        address: Address,
        tx: &TransactionContext,
    ) -> IndexerResult<Vault> {
        let origin = self.config.origin(&address);
        self.create_vault(address, &origin, false, tx)
    }

    pub fn get_or_create_registry(
        &mut self,
        address: Address,
        tx: &TransactionContext,
    ) -> IndexerResult<Registry> {
        let loaded = self.store.load_or_create(&address_id(&address), || {
            Ok(Registry {
                address,
                block_number: tx.block_number,
                timestamp: tx.timestamp,
                transaction: tx.hash_hex(),
            })
        })?;
        if loaded.is_created() {
            self.journal.append_note(
                Ok(()),
                LogType::EntityCreated,
                format!("Created registry {}.", address_id(&address)),
            );
        }
        Ok(loaded.into_inner())
    }

    /// Records a vault template release of `registry`
    pub fn new_release(
        &mut self,
        registry: Address,
        release_id: U256,
        template: Address,
        api_version: String,
        tx: &TransactionContext,
    ) -> IndexerResult<VaultRelease> {
        self.get_or_create_registry(registry, tx)?;
        let id = VaultRelease::build_id(&registry, &release_id);
        let loaded = self.store.load_or_create(&id, || {
            Ok(VaultRelease {
                registry,
                release_id,
                template,
                api_version,
                block_number: tx.block_number,
                timestamp: tx.timestamp,
                transaction: tx.hash_hex(),
            })
        })?;
        if loaded.is_created() {
            self.journal.append_note(
                Ok(()),
                LogType::EntityCreated,
                format!("Created release {}.", id),
            );
        }
        Ok(loaded.into_inner())
    }

    /// Records a vault announced by `registry`. A vault that was created on
    /// demand before its registry event is attached to the registry.
    pub fn new_vault(
        &mut self,
        registry: Address,
        vault: Address,
        classification: VaultClassification,
        api_version: String,
        tx: &TransactionContext,
    ) -> IndexerResult<Vault> {
        self.get_or_create_registry(registry, tx)?;

        if let Some(mut existing) = self.store.load::<Vault>(&address_id(&vault))? {
            if existing.registry.is_none() {
                existing.registry = Some(registry);
                existing.classification = classification;
                existing.api_version = api_version;
                self.store.save(&existing)?;
                self.journal.append_note(
                    Ok(()),
                    LogType::Info,
                    format!(
                        "Attached vault {} to registry {}.",
                        existing.id(), address_id(&registry)
                    ),
                );
            }
            return Ok(existing);
        }

        let origin = VaultOrigin {
            registry: Some(registry),
            classification,
            api_version,
        };
        let register_source = self.config.create_vault_templates;
        self.create_vault(vault, &origin, register_source, tx)
    }

    pub fn tag_vault(
        &mut self,
        vault: Address,
        tag: String,
        tx: &TransactionContext,
    ) -> IndexerResult<()> {
        let id = address_id(&vault);
        let mut record = self
            .store
            .load::<Vault>(&id)?
            .ok_or_else(|| IndexerError::not_found(Vault::KIND, &id))?;
        record.tag = Some(tag);
        self.store.save(&record)?;
        self.journal.append_note(
            Ok(()),
            LogType::Info,
            format!("Tagged vault {} in {}.", id, tx.hash_hex()),
        );
        Ok(())
    }

    /// Refreshes the vault's price per share after a strategy report.
    /// A failed read keeps the previous value.
    pub fn update_price_per_share(
        &mut self,
        vault: Address,
        tx: &TransactionContext,
    ) -> IndexerResult<()> {
        let mut record = self.create_vault_if_needed(vault, tx)?;
        match VaultView::new(&self.reader, vault).price_per_share() {
            Ok(price) => {
                record.latest_price_per_share = Some(price);
                self.store.save(&record)?;
            }
            Err(err) => {
                self.journal.append_note(
                    Err(err),
                    LogType::Guarded,
                    format!("Could not read price per share of vault {}.", record.id()),
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        indexer::tests::{indexer_with, reverting_reader, tx_at},
        reader::{
            tests::{encode_address, encode_u256},
            MockContractReader,
        },
        types::{pricePerShareCall, tokenCall},
        utils::error::read_err,
        IndexerConfig,
    };
    use alloy_sol_types::SolCall;

    fn vault_reader() -> MockContractReader {
        let mut reader = MockContractReader::new();
        reader.expect_call().returning(|_, data| {
            if data == tokenCall::SELECTOR.to_vec() {
                Ok(encode_address(Address::repeat_byte(0x70)))
            } else if data == pricePerShareCall::SELECTOR.to_vec() {
                Ok(encode_u256(U256::from(1_050_000u64)))
            } else {
                Err(read_err("unexpected call"))
            }
        });
        reader
    }

    #[test]
    fn create_vault_reads_token_once() {
        let mut indexer = indexer_with(vault_reader());
        let address = Address::repeat_byte(0xee);
        let vault = indexer
            .create_vault(address, &VaultOrigin::default(), true, &tx_at(1, 0))
            .unwrap();

        assert_eq!(vault.token, Some(Address::repeat_byte(0x70)));
        assert_eq!(vault.classification, VaultClassification::Experimental);
        assert_eq!(indexer.registrar().sources(), &[DataSource::Vault(address)]);

        let again = indexer
            .create_vault(address, &VaultOrigin::default(), true, &tx_at(2, 0))
            .unwrap();
        assert_eq!(again, vault);
        assert_eq!(indexer.store().count::<Vault>(), 1);
    }

    #[test]
    fn unreadable_token_is_none() {
        let mut indexer = indexer_with(reverting_reader());
        let vault = indexer
            .create_vault_if_needed(Address::repeat_byte(0xee), &tx_at(1, 0))
            .unwrap();
        assert_eq!(vault.token, None);
        assert!(indexer.registrar().sources().is_empty());
    }

    #[test]
    fn proxy_call_requires_both_vaults() {
        let mut indexer = indexer_with(reverting_reader());
        let outer = Address::repeat_byte(0x01);
        let inner = Address::repeat_byte(0x02);
        indexer.create_vault_if_needed(outer, &tx_at(1, 0)).unwrap();

        assert!(!indexer.is_minimal_proxy_call(&outer, &inner).unwrap());
        indexer.create_vault_if_needed(inner, &tx_at(1, 1)).unwrap();
        assert!(indexer.is_minimal_proxy_call(&outer, &inner).unwrap());
    }

    #[test]
    fn registry_vault_registers_source_when_configured() {
        let config = IndexerConfig {
            create_vault_templates: true,
            ..Default::default()
        };
        let mut indexer = indexer_with(vault_reader()).with_config(config);
        let registry = Address::repeat_byte(0x50);
        let address = Address::repeat_byte(0xee);

        let vault = indexer
            .new_vault(
                registry,
                address,
                VaultClassification::Endorsed,
                "0.4.3".to_string(),
                &tx_at(1, 0),
            )
            .unwrap();

        assert_eq!(vault.registry, Some(registry));
        assert_eq!(vault.classification, VaultClassification::Endorsed);
        assert_eq!(indexer.store().count::<Registry>(), 1);
        assert_eq!(indexer.registrar().sources(), &[DataSource::Vault(address)]);
    }

    #[test]
    fn registry_event_attaches_on_demand_vault() {
        let mut indexer = indexer_with(reverting_reader());
        let registry = Address::repeat_byte(0x50);
        let address = Address::repeat_byte(0xee);
        indexer.create_vault_if_needed(address, &tx_at(1, 0)).unwrap();

        let vault = indexer
            .new_vault(
                registry,
                address,
                VaultClassification::Endorsed,
                "0.3.5".to_string(),
                &tx_at(2, 0),
            )
            .unwrap();

        assert_eq!(vault.registry, Some(registry));
        assert_eq!(vault.api_version, "0.3.5");
        assert_eq!(indexer.store().count::<Vault>(), 1);
    }

    #[test]
    fn releases_are_keyed_by_registry_and_id() {
        let mut indexer = indexer_with(reverting_reader());
        let registry = Address::repeat_byte(0x50);
        indexer
            .new_release(
                registry,
                U256::from(0u64),
                Address::repeat_byte(0x60),
                "0.3.0".to_string(),
                &tx_at(1, 0),
            )
            .unwrap();
        indexer
            .new_release(
                registry,
                U256::from(1u64),
                Address::repeat_byte(0x61),
                "0.4.2".to_string(),
                &tx_at(2, 0),
            )
            .unwrap();
        indexer
            .new_release(
                registry,
                U256::from(1u64),
                Address::repeat_byte(0x62),
                "0.4.3".to_string(),
                &tx_at(3, 0),
            )
            .unwrap();

        assert_eq!(indexer.store().count::<VaultRelease>(), 2);
        let release: VaultRelease = indexer
            .store()
            .load(&VaultRelease::build_id(&registry, &U256::from(1u64)))
            .unwrap()
            .unwrap();
        assert_eq!(release.template, Address::repeat_byte(0x61));
    }

    #[test]
    fn tag_unknown_vault_is_not_found() {
        let mut indexer = indexer_with(reverting_reader());
        let result =
            indexer.tag_vault(Address::repeat_byte(0xee), "deprecated".to_string(), &tx_at(1, 0));
        assert!(matches!(result, Err(IndexerError::NotFound { .. })));
    }

    #[test]
    fn price_per_share_is_refreshed() {
        let mut indexer = indexer_with(vault_reader());
        let address = Address::repeat_byte(0xee);
        indexer.update_price_per_share(address, &tx_at(1, 0)).unwrap();

        let vault: Vault = indexer.store().load(&address_id(&address)).unwrap().unwrap();
        assert_eq!(vault.latest_price_per_share, Some(U256::from(1_050_000u64)));
    }
}
