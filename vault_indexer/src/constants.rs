//! Indexer constants

use alloy_primitives::Address;
use chrono::Duration;

/// Milliseconds in one day, the unit report durations are expressed in
pub const MS_PER_DAY: i64 = 86_400_000;
pub fn ms_per_day() -> f64 {
    Duration::days(1).num_milliseconds() as f64
}

/// Days used to annualize a period return
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Name stored for strategies whose `name()` read fails
pub const UNKNOWN_STRATEGY_NAME: &str = "TBD";

/// Mint/burn counterparty of share transfers
pub const ZERO_ADDRESS: Address = Address::ZERO;

/// Max number of journal entries kept after a cleanup
pub const JOURNAL_CAPACITY: usize = 300;

/// Api version assumed for vaults created without a registry event
pub const DEFAULT_API_VERSION: &str = "0.4.2";
