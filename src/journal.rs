//! In-memory order journal.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;

use crate::error::JournalError;
use crate::gateway::{Journal, JournalStats};
use crate::order::OrderResult;

/// Keeps executed orders in memory for inspection and cleanup.
#[derive(Default)]
pub struct MemoryJournal {
    entries: Mutex<Vec<OrderResult>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn entries(&self) -> Vec<OrderResult> {
        self.entries.lock().clone()
    }
}

#[async_trait]
impl Journal for MemoryJournal {
    async fn append(&self, result: &OrderResult) -> Result<(), JournalError> {
        self.entries.lock().push(result.clone());
        Ok(())
    }

    async fn cleanup(&self, older_than_days: i64) -> Result<JournalStats, JournalError> {
        let cutoff = Utc::now() - Duration::days(older_than_days);
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|e| e.timestamp >= cutoff);
        let retained = entries.len();

        let stats = JournalStats {
            removed: before - retained,
            retained,
        };
        tracing::debug!(removed = stats.removed, retained = stats.retained, "Journal cleanup");
        Ok(stats)
    }
}
