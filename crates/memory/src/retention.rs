use crate::types::MemoryEntry;
use std::collections::VecDeque;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Count cap plus optional age cap applied on every durable load/write.
#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    pub max_entries: usize,
    pub max_age_ms: Option<i64>,
}

impl RetentionPolicy {
    pub fn window(max_entries: usize) -> Self {
        Self {
            max_entries,
            max_age_ms: None,
        }
    }

    pub fn durable(max_entries: usize, retention_days: i64) -> Self {
        Self {
            max_entries,
            max_age_ms: Some(retention_days.saturating_mul(MILLIS_PER_DAY)),
        }
    }

    /// Drops expired entries, then the oldest ones beyond the cap.
    /// Returns how many entries were removed.
    pub fn apply(&self, entries: &mut Vec<MemoryEntry>, now_ms: i64) -> usize {
        let original_len = entries.len();

        if let Some(max_age) = self.max_age_ms {
            // Unrepresentable or future ages count as corrupt and are dropped.
            entries.retain(|entry| match now_ms.checked_sub(entry.timestamp) {
                Some(age) => (0..max_age).contains(&age),
                None => false,
            });
        }

        if entries.len() > self.max_entries {
            let excess = entries.len() - self.max_entries;
            entries.drain(..excess);
        }

        let removed = original_len - entries.len();
        if removed > 0 {
            tracing::debug!("Retention dropped {} entries", removed);
        }
        removed
    }

    /// Append-then-trim for the sliding window scopes.
    pub fn push(&self, window: &mut VecDeque<MemoryEntry>, entry: MemoryEntry) {
        window.push_back(entry);
        while window.len() > self.max_entries {
            window.pop_front();
        }
    }
}
