use crate::retention::RetentionPolicy;
use crate::store::{DurableStore, MemoryError};
use crate::types::*;
use std::collections::VecDeque;
use std::sync::Arc;

/// Three-tier memory: a session sliding window, a short-lived task window and
/// a persisted durable scope with count and age limits.
pub struct MemoryManager {
    config: MemoryConfig,
    session: VecDeque<MemoryEntry>,
    task: VecDeque<MemoryEntry>,
    durable: Vec<MemoryEntry>,
    store: Arc<dyn DurableStore>,
}

impl MemoryManager {
    /// Opens the manager and loads the durable scope. Missing or unreadable
    /// data yields an empty durable scope rather than an error.
    pub fn open(config: MemoryConfig, store: Arc<dyn DurableStore>) -> Self {
        let mut manager = Self {
            config,
            session: VecDeque::new(),
            task: VecDeque::new(),
            durable: Vec::new(),
            store,
        };
        manager.reload_durable();
        manager
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    fn session_policy(&self) -> RetentionPolicy {
        RetentionPolicy::window(self.config.session_cap)
    }

    fn task_policy(&self) -> RetentionPolicy {
        RetentionPolicy::window(self.config.task_cap)
    }

    fn durable_policy(&self) -> RetentionPolicy {
        RetentionPolicy::durable(self.config.durable_cap, self.config.retention_days)
    }

    /// Re-reads the persisted durable scope, applying retention.
    pub fn reload_durable(&mut self) {
        if !self.config.persist_durable {
            return;
        }

        let mut entries = match self.read_persisted() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Durable memory unreadable, starting empty: {}", e);
                Vec::new()
            }
        };

        let now = chrono::Utc::now().timestamp_millis();
        let removed = self.durable_policy().apply(&mut entries, now);
        self.durable = entries;

        if removed > 0 {
            tracing::info!("Retention cleanup removed {} durable entries", removed);
            if let Err(e) = self.write_persisted() {
                tracing::warn!("Failed to persist durable memory after cleanup: {}", e);
            }
        }
    }

    fn read_persisted(&self) -> Result<Vec<MemoryEntry>, MemoryError> {
        let Some(raw) = self.store.load(&self.config.storage_key)? else {
            return Ok(Vec::new());
        };
        let mut entries: Vec<MemoryEntry> = serde_json::from_str(&raw)?;
        for entry in &mut entries {
            entry.scope = MemoryScope::Durable;
        }
        Ok(entries)
    }

    fn write_persisted(&self) -> Result<(), MemoryError> {
        if !self.config.persist_durable {
            return Ok(());
        }
        let content = serde_json::to_string(&self.durable)?;
        self.store.save(&self.config.storage_key, &content)
    }

    pub fn record(
        &mut self,
        role: MemoryRole,
        content: impl Into<String>,
        scope: MemoryScope,
    ) -> Result<(), MemoryError> {
        self.insert(MemoryEntry::new(role, content, scope))
    }

    /// Inserts an entry into the scope it names.
    pub fn insert(&mut self, entry: MemoryEntry) -> Result<(), MemoryError> {
        match entry.scope {
            MemoryScope::Session => {
                let policy = self.session_policy();
                policy.push(&mut self.session, entry);
                Ok(())
            }
            MemoryScope::Task => {
                let policy = self.task_policy();
                policy.push(&mut self.task, entry);
                Ok(())
            }
            MemoryScope::Durable => {
                self.durable.push(entry);
                let now = chrono::Utc::now().timestamp_millis();
                let policy = self.durable_policy();
                policy.apply(&mut self.durable, now);
                self.write_persisted()
            }
        }
    }

    /// Records a completed request/response exchange. A completed task
    /// clears task memory instead of extending it.
    pub fn record_interaction(&mut self, input: &str, response: &str, task_complete: bool) {
        let session = self.session_policy();
        session.push(
            &mut self.session,
            MemoryEntry::new(MemoryRole::User, input, MemoryScope::Session),
        );
        session.push(
            &mut self.session,
            MemoryEntry::new(MemoryRole::Assistant, response, MemoryScope::Session),
        );

        if task_complete {
            self.clear_task();
        } else {
            let task = self.task_policy();
            task.push(
                &mut self.task,
                MemoryEntry::new(MemoryRole::User, input, MemoryScope::Task),
            );
            task.push(
                &mut self.task,
                MemoryEntry::new(MemoryRole::Assistant, response, MemoryScope::Task),
            );
        }
    }

    pub fn clear_task(&mut self) {
        if !self.task.is_empty() {
            tracing::debug!("Clearing {} task memory entries", self.task.len());
        }
        self.task.clear();
    }

    pub fn context(&self) -> MemoryContext {
        MemoryContext {
            session: self.session.iter().cloned().collect(),
            task: self.task.iter().cloned().collect(),
            durable: self.durable.clone(),
        }
    }

    pub fn session(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.session.iter()
    }

    pub fn task(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.task.iter()
    }

    pub fn durable(&self) -> &[MemoryEntry] {
        &self.durable
    }

    /// Clears every scope and the persisted representation. In-memory scopes
    /// are always cleared, even if removing the persisted copy fails.
    pub fn purge(&mut self) -> Result<(), MemoryError> {
        self.session.clear();
        self.task.clear();
        self.durable.clear();
        self.store.remove(&self.config.storage_key)?;
        tracing::info!("Memory purged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn manager(config: MemoryConfig) -> (MemoryManager, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (MemoryManager::open(config, store.clone()), store)
    }

    #[test]
    fn test_session_window_keeps_last_ten() {
        let (mut memory, _) = manager(MemoryConfig::default());
        for i in 0..25 {
            memory
                .record(MemoryRole::User, format!("m{}", i), MemoryScope::Session)
                .unwrap();
        }

        let contents: Vec<_> = memory.session().map(|e| e.content.clone()).collect();
        let expected: Vec<_> = (15..25).map(|i| format!("m{}", i)).collect();
        assert_eq!(contents, expected);
    }

    #[test]
    fn test_task_cleared_on_completion() {
        let (mut memory, _) = manager(MemoryConfig::default());
        memory.record_interaction("open maps", "Opening maps", false);
        assert_eq!(memory.task().count(), 2);

        memory.record_interaction("done", "Task finished", true);
        assert_eq!(memory.task().count(), 0);
        assert_eq!(memory.session().count(), 4);
    }

    #[test]
    fn test_durable_persists() {
        let (mut memory, store) = manager(MemoryConfig::default());
        memory
            .record(MemoryRole::User, "prefers large text", MemoryScope::Durable)
            .unwrap();

        let raw = store.raw("cognitive_memory_v3").unwrap();
        assert!(raw.contains("prefers large text"));
        assert!(!raw.contains("scope"));
    }

    #[test]
    fn test_corrupt_store_degrades_to_empty() {
        let store = Arc::new(InMemoryStore::new());
        store.save("cognitive_memory_v3", "{not json").unwrap();

        let memory = MemoryManager::open(MemoryConfig::default(), store);
        assert!(memory.durable().is_empty());
    }

    #[test]
    fn test_persist_disabled_keeps_store_untouched() {
        let config = MemoryConfig {
            persist_durable: false,
            ..MemoryConfig::default()
        };
        let (mut memory, store) = manager(config);
        memory
            .record(MemoryRole::System, "note", MemoryScope::Durable)
            .unwrap();

        assert_eq!(memory.durable().len(), 1);
        assert!(store.raw("cognitive_memory_v3").is_none());
    }

    #[test]
    fn test_purge_clears_everything() {
        let (mut memory, store) = manager(MemoryConfig::default());
        memory.record_interaction("a", "b", false);
        memory
            .record(MemoryRole::User, "keep", MemoryScope::Durable)
            .unwrap();

        memory.purge().unwrap();

        assert!(memory.context().is_empty());
        assert!(store.raw("cognitive_memory_v3").is_none());
    }
}
