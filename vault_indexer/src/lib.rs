//! Accounting and report-history engine for vault and strategy events.
//!
//! The host delivers one normalized event or call at a time, in chain order,
//! to an [`Indexer`]. The indexer loads and creates entities through its
//! [`Store`], reads live contract views through its [`ContractReader`], and
//! records what it did in a [`JournalCollection`].

pub mod adapters;
pub mod config;
pub mod constants;
pub mod entities;
pub mod indexer;
pub mod journal;
pub mod reader;
pub mod store;
pub mod strategy;
pub mod types;
pub mod utils;
pub mod vault;

pub use config::{DeploymentConfig, IndexerConfig};
pub use indexer::Indexer;
pub use journal::{JournalCollection, JournalEntry, LogType};
pub use reader::{ContractReader, DataSource, PendingSources, SourceRegistrar};
pub use store::{Entity, Loaded, MemoryStore, Store};
pub use types::TransactionContext;
pub use utils::error::{IndexerError, IndexerResult};
