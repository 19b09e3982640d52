use crate::{
    entities::{Strategy, StrategyReport},
    indexer::Indexer,
    journal::LogType,
    reader::{ContractReader, SourceRegistrar},
    store::{Entity, Store},
    types::{StrategyReported, TransactionContext},
    utils::error::{IndexerError, IndexerResult},
};

impl<S: Store, R: ContractReader, T: SourceRegistrar> Indexer<S, R, T> {
    /// Appends a report to the strategy's report chain and, when a previous
    /// report exists, derives the performance result between both.
    ///
    /// A report that was already recorded for this log is returned unchanged
    /// without relinking the chain.
    pub fn create_report(
        &mut self,
        reported: &StrategyReported,
        tx: &TransactionContext,
    ) -> IndexerResult<StrategyReport> {
        let strategy_id = Strategy::build_id(&reported.strategy);
        let mut strategy = self
            .store
            .load::<Strategy>(&strategy_id)?
            .ok_or_else(|| IndexerError::not_found(Strategy::KIND, &strategy_id))?;

        let report_id = tx.id();
        if let Some(existing) = self.store.load::<StrategyReport>(&report_id)? {
            self.journal.append_note(
                Ok(()),
                LogType::Warning,
                format!("Report {} was already recorded. Chain left unchanged.", report_id),
            );
            return Ok(existing);
        }

        let report = StrategyReport {
            id: report_id.clone(),
            strategy: strategy_id.clone(),
            gain: reported.gain,
            loss: reported.loss,
            total_gain: reported.total_gain,
            total_loss: reported.total_loss,
            total_debt: reported.total_debt,
            debt_added: reported.debt_added,
            debt_ratio: reported.debt_ratio,
            debt_paid: reported.debt_paid,
            block_number: tx.block_number,
            timestamp: tx.timestamp,
            transaction: tx.hash_hex(),
        };
        self.store.save(&report)?;

        let previous_id = strategy.latest_report.replace(report_id.clone());
        self.store.save(&strategy)?;
        self.journal.append_note(
            Ok(()),
            LogType::EntityCreated,
            format!("Created report {} for strategy {}.", report_id, strategy_id),
        );

        match previous_id {
            Some(previous_id) => match self.store.load::<StrategyReport>(&previous_id)? {
                Some(previous) => {
                    self.create_report_result(&previous, &report, tx)?;
                }
                None => {
                    self.journal.append_note(
                        Err(IndexerError::not_found(StrategyReport::KIND, &previous_id)),
                        LogType::Warning,
                        format!(
                            "Previous report of strategy {} is missing. No result derived.",
                            strategy_id
                        ),
                    );
                }
            },
            None => {
                self.journal.append_note(
                    Ok(()),
                    LogType::Info,
                    format!("First report of strategy {}. No result derived.", strategy_id),
                );
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        entities::StrategyReportResult,
        indexer::tests::{indexer_with, reverting_reader, tx_at},
        strategy::StrategyParams,
    };
    use alloy_primitives::{Address, U256};

    fn reported(strategy: Address, total_gain: u64, total_debt: u64) -> StrategyReported {
        StrategyReported {
            strategy,
            gain: U256::from(total_gain),
            total_gain: U256::from(total_gain),
            total_debt: U256::from(total_debt),
            ..Default::default()
        }
    }

    #[test]
    fn first_report_has_no_result() {
        let mut indexer = indexer_with(reverting_reader());
        let address = Address::repeat_byte(0x01);
        indexer
            .create_and_get_strategy(StrategyParams { address, ..Default::default() }, &tx_at(1, 0))
            .unwrap();

        let report = indexer.create_report(&reported(address, 0, 1_000), &tx_at(2, 0)).unwrap();

        let strategy: Strategy = indexer
            .store()
            .load(&Strategy::build_id(&address))
            .unwrap()
            .unwrap();
        assert_eq!(strategy.latest_report, Some(report.id.clone()));
        assert_eq!(indexer.store().count::<StrategyReportResult>(), 0);
    }

    #[test]
    fn chain_links_consecutive_reports() {
        let mut indexer = indexer_with(reverting_reader());
        let address = Address::repeat_byte(0x01);
        indexer
            .create_and_get_strategy(StrategyParams { address, ..Default::default() }, &tx_at(1, 0))
            .unwrap();

        let first = indexer.create_report(&reported(address, 0, 1_000), &tx_at(2, 0)).unwrap();
        let second = indexer.create_report(&reported(address, 100, 1_100), &tx_at(3, 0)).unwrap();

        let strategy: Strategy = indexer
            .store()
            .load(&Strategy::build_id(&address))
            .unwrap()
            .unwrap();
        assert_eq!(strategy.latest_report, Some(second.id.clone()));

        let result: StrategyReportResult = indexer
            .store()
            .load(&tx_at(3, 0).id())
            .unwrap()
            .unwrap();
        assert_eq!(result.previous_report, first.id);
        assert_eq!(result.current_report, second.id);
    }

    #[test]
    fn redelivered_report_is_not_relinked() {
        let mut indexer = indexer_with(reverting_reader());
        let address = Address::repeat_byte(0x01);
        indexer
            .create_and_get_strategy(StrategyParams { address, ..Default::default() }, &tx_at(1, 0))
            .unwrap();

        let first = indexer.create_report(&reported(address, 0, 1_000), &tx_at(2, 0)).unwrap();
        let again = indexer.create_report(&reported(address, 0, 1_000), &tx_at(2, 0)).unwrap();

        assert_eq!(first, again);
        assert_eq!(indexer.store().count::<StrategyReport>(), 1);
        assert_eq!(indexer.store().count::<StrategyReportResult>(), 0);
        assert_eq!(indexer.journal().of_type(LogType::Warning).count(), 1);
    }

    #[test]
    fn report_for_unknown_strategy_is_not_found() {
        let mut indexer = indexer_with(reverting_reader());
        let result =
            indexer.create_report(&reported(Address::repeat_byte(0x09), 0, 0), &tx_at(1, 0));

        assert!(matches!(result, Err(IndexerError::NotFound { .. })));
        assert_eq!(indexer.store().count::<StrategyReport>(), 0);
    }
}
