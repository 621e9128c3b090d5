use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::GovernanceError;
use crate::types::OperationalStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditCategory {
    Security,
    System,
    Governance,
    Execution,
    Error,
    Tool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub category: AuditCategory,
    pub status: OperationalStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Secondary destination for audit events.
pub trait AuditSink: Send + Sync {
    fn write(&self, event: &AuditEvent) -> Result<(), GovernanceError>;
}

/// Appends one JSON object per line.
pub struct JsonlAuditSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlAuditSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, GovernanceError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonlAuditSink {
    fn write(&self, event: &AuditEvent) -> Result<(), GovernanceError> {
        let json = serde_json::to_string(event)?;
        let mut file = self.file.lock();
        writeln!(file, "{}", json)?;
        file.flush()?;
        Ok(())
    }
}

/// Bounded append-only log. The oldest entry is dropped on overflow and
/// entries are never modified once written.
pub struct AuditLog {
    capacity: usize,
    entries: VecDeque<AuditEvent>,
    sink: Option<Box<dyn AuditSink>>,
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn AuditSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn record(
        &mut self,
        category: AuditCategory,
        status: OperationalStatus,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
    ) {
        let event = AuditEvent {
            timestamp: Utc::now(),
            category,
            status,
            message: message.into(),
            data,
        };

        tracing::debug!("[{:?}] {}", event.category, event.message);

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.write(&event) {
                tracing::warn!("Audit sink write failed: {}", e);
            }
        }

        self.entries.push_back(event);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &AuditEvent> {
        self.entries.iter()
    }

    pub fn snapshot(&self) -> Vec<AuditEvent> {
        self.entries.iter().cloned().collect()
    }

    pub fn count(&self, category: AuditCategory) -> usize {
        self.entries.iter().filter(|e| e.category == category).count()
    }

}
