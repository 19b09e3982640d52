//! Strategy lifecycle, report history and harvests

pub mod harvest;
pub mod lifecycle;
pub mod report;
pub mod result;

pub use lifecycle::StrategyParams;
pub use result::{compute_report_metrics, ReportMetrics};
