use crate::{
    entities::{Harvest, Strategy},
    indexer::Indexer,
    journal::LogType,
    reader::{ContractReader, SourceRegistrar, StrategyView},
    store::Store,
    types::{Harvested, TransactionContext},
    utils::error::IndexerResult,
};

impl<S: Store, R: ContractReader, T: SourceRegistrar> Indexer<S, R, T> {
    /// Records a `Harvested` event. One record per strategy and transaction.
    pub fn harvest(
        &mut self,
        harvested: &Harvested,
        tx: &TransactionContext,
    ) -> IndexerResult<Harvest> {
        let id = Harvest::build_id(&harvested.strategy, &tx.hash_hex(), tx.index);
        if let Some(existing) = self.store.load::<Harvest>(&id)? {
            self.journal.append_note(
                Ok(()),
                LogType::Warning,
                format!("Harvest {} was already recorded.", id),
            );
            return Ok(existing);
        }

        let vault = match StrategyView::new(&self.reader, harvested.strategy).vault() {
            Ok(vault) => Some(vault),
            Err(err) => {
                self.journal.append_note(
                    Err(err),
                    LogType::Guarded,
                    format!("Could not read vault of strategy {}.", harvested.strategy),
                );
                None
            }
        };

        let harvest = Harvest {
            id: id.clone(),
            vault,
            strategy: Strategy::build_id(&harvested.strategy),
            harvester: harvested.harvester,
            profit: harvested.profit,
            loss: harvested.loss,
            debt_payment: harvested.debt_payment,
            debt_outstanding: harvested.debt_outstanding,
            block_number: tx.block_number,
            timestamp: tx.timestamp,
            transaction: tx.hash_hex(),
        };
        self.store.save(&harvest)?;
        self.journal
            .append_note(Ok(()), LogType::EntityCreated, format!("Created harvest {}.", id));
        Ok(harvest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        indexer::tests::{indexer_with, reverting_reader, tx_at},
        reader::{tests::encode_address, MockContractReader},
    };
    use alloy_primitives::{Address, U256};

    fn harvested() -> Harvested {
        Harvested {
            strategy: Address::repeat_byte(0x01),
            harvester: Address::repeat_byte(0x0f),
            profit: U256::from(50u64),
            loss: U256::ZERO,
            debt_payment: U256::from(5u64),
            debt_outstanding: U256::from(7u64),
        }
    }

    #[test]
    fn records_harvest_with_vault() {
        let vault = Address::repeat_byte(0xee);
        let mut reader = MockContractReader::new();
        reader
            .expect_call()
            .times(1)
            .returning(move |_, _| Ok(encode_address(vault)));
        let mut indexer = indexer_with(reader);

        let tx = tx_at(1, 0).index(4);
        let harvest = indexer.harvest(&harvested(), &tx).unwrap();

        assert_eq!(harvest.vault, Some(vault));
        assert_eq!(harvest.profit, U256::from(50u64));
        assert_eq!(
            harvest.id,
            Harvest::build_id(&Address::repeat_byte(0x01), &tx.hash_hex(), 4)
        );
    }

    #[test]
    fn unreadable_vault_is_none() {
        let mut indexer = indexer_with(reverting_reader());
        let harvest = indexer.harvest(&harvested(), &tx_at(1, 0)).unwrap();
        assert_eq!(harvest.vault, None);
    }

    #[test]
    fn duplicate_harvest_is_returned_unchanged() {
        let mut indexer = indexer_with(reverting_reader());
        let first = indexer.harvest(&harvested(), &tx_at(1, 0)).unwrap();

        let mut again = harvested();
        again.profit = U256::from(999u64);
        let second = indexer.harvest(&again, &tx_at(1, 0)).unwrap();

        assert_eq!(first, second);
        assert_eq!(indexer.store().count::<Harvest>(), 1);
        assert_eq!(indexer.journal().of_type(LogType::Warning).count(), 1);
    }
}
