//! Vault registry, share ledger and fee settings

pub mod fees;
pub mod ledger;
pub mod lifecycle;
