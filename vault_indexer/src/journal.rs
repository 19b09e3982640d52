//! Handler journal
//!
//! Every input the indexer processes leaves notes in the journal: what was
//! created, what was skipped and why, which defaults were substituted. Each
//! note is mirrored to a `tracing` event so a host subscriber sees the same
//! stream.

use serde::{Deserialize, Serialize};

use crate::{constants::JOURNAL_CAPACITY, types::TransactionContext, utils::error::IndexerResult};

/// Category of a journal entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogType {
    Info,
    /// A new entity was persisted
    EntityCreated,
    /// The input was filtered out (block gate, proxy guard, mint/burn transfer)
    Skipped,
    /// A zero-denominator guard or read fallback was applied
    Guarded,
    /// A recoverable error skipped the input
    Warning,
}

/// Journal entry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Timestamp of the transaction being processed, in milliseconds
    pub timestamp: u64,
    pub entry: IndexerResult<()>,
    pub log_type: LogType,
    pub transaction: Option<String>,
    pub note: Option<String>,
}

impl JournalEntry {
    pub fn is_warning(&self) -> bool {
        self.log_type == LogType::Warning
    }
}

/// Ordered collection of journal entries, stamped with the transaction
/// currently being processed
#[derive(Clone, Debug, Default)]
pub struct JournalCollection {
    entries: Vec<JournalEntry>,
    transaction: Option<String>,
    timestamp: u64,
}

impl JournalCollection {
    /// Stamps all following entries with `tx`
    pub fn open(&mut self, tx: &TransactionContext) -> &mut Self {
        self.transaction = Some(tx.id());
        self.timestamp = tx.timestamp;
        self
    }

    /// Appends an entry and mirrors it to `tracing`
    pub fn append_note<S: AsRef<str>>(
        &mut self,
        entry: IndexerResult<()>,
        log_type: LogType,
        note: S,
    ) -> &mut Self {
        let note = note.as_ref();
        let transaction = self.transaction.as_deref().unwrap_or("-");
        match (&entry, log_type) {
            (Err(err), _) => tracing::warn!(transaction, error = %err, "{}", note),
            (Ok(()), LogType::Warning) => tracing::warn!(transaction, "{}", note),
            (Ok(()), LogType::Skipped | LogType::Guarded) => {
                tracing::debug!(transaction, ?log_type, "{}", note)
            }
            (Ok(()), _) => tracing::info!(transaction, ?log_type, "{}", note),
        }

        self.entries.push(JournalEntry {
            timestamp: self.timestamp,
            entry,
            log_type,
            transaction: self.transaction.clone(),
            note: Some(note.to_string()),
        });
        self
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Entries of the given type
    pub fn of_type(&self, log_type: LogType) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter().filter(move |e| e.log_type == log_type)
    }

    /// Trims the journal to the most recent `JOURNAL_CAPACITY` entries
    pub fn cleanup(&mut self) {
        let len = self.entries.len();
        if len > JOURNAL_CAPACITY {
            self.entries.drain(..len - JOURNAL_CAPACITY);
        }
    }
}
