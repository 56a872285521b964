//! Thread bookkeeping across runs
//!
//! The platform keeps the conversation itself; locally we only remember
//! which memory thread a named session last used.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use huddle_config::paths::safe_filename;

/// Thread store errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("THREAD STORE IO ERROR: {0}")]
    Io(#[from] std::io::Error),

    #[error("THREAD RECORD CORRUPTED: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// The remembered thread of one named session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadRecord {
    /// Session name chosen by the operator
    pub key: String,
    /// Agent the thread belongs to
    pub agent_id: String,
    /// Platform memory thread id
    pub thread_id: String,
    /// Completed runs on this thread
    #[serde(default)]
    pub runs: u32,
    /// Status of the last run
    #[serde(default)]
    pub last_status: Option<String>,
    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
}

impl ThreadRecord {
    pub fn new(
        key: impl Into<String>,
        agent_id: impl Into<String>,
        thread_id: impl Into<String>,
    ) -> Self {
        let now = Local::now();
        Self {
            key: key.into(),
            agent_id: agent_id.into(),
            thread_id: thread_id.into(),
            runs: 0,
            last_status: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a finished run; a new thread id replaces the old one
    pub fn record_run(&mut self, thread_id: impl Into<String>, status: impl Into<String>) {
        let thread_id = thread_id.into();
        if thread_id != self.thread_id {
            debug!(
                "Session {} moved from thread {} to {}",
                self.key, self.thread_id, thread_id
            );
            self.thread_id = thread_id;
        }
        self.runs += 1;
        self.last_status = Some(status.into());
        self.updated_at = Local::now();
    }
}

/// File-backed store of thread records, one JSON file per session
pub struct ThreadStore {
    dir: PathBuf,
    cache: HashMap<String, ThreadRecord>,
}

impl ThreadStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).ok();
        Self {
            dir,
            cache: HashMap::new(),
        }
    }

    /// Thread id to resume for `key`, if it belongs to `agent_id`
    pub async fn thread_for(&mut self, key: &str, agent_id: &str) -> Option<String> {
        let record = self.get(key).await?;
        if record.agent_id == agent_id {
            Some(record.thread_id.clone())
        } else {
            warn!(
                "Session {} belongs to agent {}, not {}; starting a new thread",
                key, record.agent_id, agent_id
            );
            None
        }
    }

    /// Look up a record, loading it from disk on first access
    pub async fn get(&mut self, key: &str) -> Option<&ThreadRecord> {
        if !self.cache.contains_key(key) {
            let record = self.load(key).await?;
            self.cache.insert(key.to_string(), record);
        }
        self.cache.get(key)
    }

    /// Record a run outcome and persist it
    pub async fn record(
        &mut self,
        key: &str,
        agent_id: &str,
        thread_id: &str,
        status: &str,
    ) -> Result<ThreadRecord> {
        let existing = self.get(key).await.cloned();
        let mut record = match existing {
            Some(record) if record.agent_id == agent_id => record,
            _ => ThreadRecord::new(key, agent_id, thread_id),
        };
        record.record_run(thread_id, status);
        self.save(&record).await?;
        self.cache.insert(key.to_string(), record.clone());
        Ok(record)
    }

    pub async fn save(&self, record: &ThreadRecord) -> Result<()> {
        let path = self.record_path(&record.key);
        let content = serde_json::to_string_pretty(record)?;
        tokio::fs::write(path, content).await?;
        debug!("Saved thread record: {}", record.key);
        Ok(())
    }

    async fn load(&self, key: &str) -> Option<ThreadRecord> {
        let path = self.record_path(key);
        if !path.exists() {
            return None;
        }

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<ThreadRecord>(&content) {
                Ok(record) if record.key == key => Some(record),
                Ok(record) => {
                    warn!(
                        "Thread record {:?} holds session {}, not {}; ignoring it",
                        path, record.key, key
                    );
                    None
                }
                Err(e) => {
                    warn!("Failed to parse thread record {}: {}", key, e);
                    None
                }
            },
            Err(e) => {
                warn!("Failed to read thread record {}: {}", key, e);
                None
            }
        }
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", safe_filename(key)))
    }

    /// Forget a session's thread
    pub async fn delete(&mut self, key: &str) -> Result<bool> {
        self.cache.remove(key);
        let path = self.record_path(key);
        if path.exists() {
            tokio::fs::remove_file(path).await?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// All stored records, sorted by key
    pub async fn list(&self) -> Vec<ThreadRecord> {
        let mut records = Vec::new();

        if let Ok(mut entries) = tokio::fs::read_dir(&self.dir).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                if let Ok(content) = tokio::fs::read_to_string(&path).await {
                    match serde_json::from_str::<ThreadRecord>(&content) {
                        Ok(record) => records.push(record),
                        Err(e) => warn!("Skipping {:?}: {}", path, e),
                    }
                }
            }
        }

        records.sort_by(|a, b| a.key.cmp(&b.key));
        records
    }
}
