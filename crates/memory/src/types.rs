use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemoryRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemoryScope {
    #[default]
    Session,
    Task,
    Durable,
}

/// One remembered line of interaction. Timestamps are Unix milliseconds.
///
/// The persisted schema is `{role, content, timestamp}`; scope is implied by
/// where the entry is stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryEntry {
    pub role: MemoryRole,
    pub content: String,
    pub timestamp: i64,
    #[serde(skip)]
    pub scope: MemoryScope,
}

impl MemoryEntry {
    pub fn new(role: MemoryRole, content: impl Into<String>, scope: MemoryScope) -> Self {
        Self::at(role, content, scope, chrono::Utc::now().timestamp_millis())
    }

    pub fn at(
        role: MemoryRole,
        content: impl Into<String>,
        scope: MemoryScope,
        timestamp: i64,
    ) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
            scope,
        }
    }
}

/// Bounded copy of all three scopes, handed to the reasoning service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MemoryContext {
    pub session: Vec<MemoryEntry>,
    pub task: Vec<MemoryEntry>,
    pub durable: Vec<MemoryEntry>,
}

impl MemoryContext {
    pub fn is_empty(&self) -> bool {
        self.session.is_empty() && self.task.is_empty() && self.durable.is_empty()
    }
}

fn default_session_cap() -> usize {
    10
}

fn default_task_cap() -> usize {
    20
}

fn default_durable_cap() -> usize {
    200
}

fn default_retention_days() -> i64 {
    30
}

fn default_storage_key() -> String {
    "cognitive_memory_v3".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryConfig {
    #[serde(default = "default_session_cap")]
    pub session_cap: usize,
    #[serde(default = "default_task_cap")]
    pub task_cap: usize,
    #[serde(default = "default_durable_cap")]
    pub durable_cap: usize,
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    /// When off, the durable scope lives in memory only.
    #[serde(default = "default_true")]
    pub persist_durable: bool,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            session_cap: default_session_cap(),
            task_cap: default_task_cap(),
            durable_cap: default_durable_cap(),
            retention_days: default_retention_days(),
            persist_durable: true,
            storage_key: default_storage_key(),
        }
    }
}
