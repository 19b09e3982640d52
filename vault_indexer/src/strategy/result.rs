//! Performance between two consecutive strategy reports

use crate::{
    constants::{ms_per_day, DAYS_PER_YEAR},
    entities::{StrategyReport, StrategyReportResult},
    indexer::Indexer,
    journal::LogType,
    reader::{ContractReader, SourceRegistrar},
    store::Store,
    types::TransactionContext,
    utils::{
        common::{big_int_to_f64, u256_to_big_int, u256_to_f64},
        conversion::guarded_div,
        error::IndexerResult,
    },
};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReportMetrics {
    /// Milliseconds between both reports. Negative if delivered out of order.
    pub duration: f64,
    pub duration_pr: f64,
    pub apr: f64,
}

/// Profit is the growth of `total_gain` relative to the previous report's
/// `total_debt`, annualized over the elapsed days. Zero debt or zero elapsed
/// time yields zero return and zero APR.
pub fn compute_report_metrics(
    previous: &StrategyReport,
    current: &StrategyReport,
) -> ReportMetrics {
    let duration = current.timestamp as f64 - previous.timestamp as f64;
    let days = duration / ms_per_day();

    if days == 0.0 {
        return ReportMetrics {
            duration,
            ..Default::default()
        };
    }

    let profit = u256_to_big_int(&current.total_gain) - u256_to_big_int(&previous.total_gain);
    let duration_pr = guarded_div(big_int_to_f64(&profit), u256_to_f64(&previous.total_debt));
    let apr = duration_pr * (DAYS_PER_YEAR / days);

    ReportMetrics {
        duration,
        duration_pr,
        apr,
    }
}

impl<S: Store, R: ContractReader, T: SourceRegistrar> Indexer<S, R, T> {
    /// Stores the result between `previous` and `current` under the id of
    /// the current transaction. Created at most once.
    pub fn create_report_result(
        &mut self,
        previous: &StrategyReport,
        current: &StrategyReport,
        tx: &TransactionContext,
    ) -> IndexerResult<StrategyReportResult> {
        let id = tx.id();
        let loaded = self.store.load_or_create(&id, || {
            let metrics = compute_report_metrics(previous, current);
            Ok(StrategyReportResult {
                id: id.clone(),
                previous_report: previous.id.clone(),
                current_report: current.id.clone(),
                start_timestamp: previous.timestamp,
                end_timestamp: current.timestamp,
                duration: metrics.duration,
                duration_pr: metrics.duration_pr,
                apr: metrics.apr,
                block_number: tx.block_number,
                timestamp: tx.timestamp,
                transaction: tx.hash_hex(),
            })
        })?;

        if loaded.is_created() {
            self.journal.append_note(
                Ok(()),
                LogType::EntityCreated,
                format!("Created report result {} ({} -> {}).", id, previous.id, current.id),
            );
        }
        Ok(loaded.into_inner())
    }
}
