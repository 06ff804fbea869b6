//! JSON-lines persistence adapter.
//!
//! Implements [`PersistencePort`] by appending one JSON object per line:
//! transitions and session summaries to the events file, unlock entries
//! to the audit file.  The files are opened per write, so several clones
//! (one per thread) can share them.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::ports::PersistencePort;
use crate::classifier::Status;
use crate::config::SystemConfig;
use crate::counter::SessionSummary;
use crate::error::PersistenceError;
use crate::interlock::AuditEntry;

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Record<'a> {
    Transition {
        status: Status,
        timestamp: DateTime<Utc>,
    },
    Unlock(&'a AuditEntry),
    SessionEnd(&'a SessionSummary),
}

#[derive(Debug, Clone)]
pub struct JsonlStore {
    events_file: PathBuf,
    audit_file: PathBuf,
}

impl JsonlStore {
    pub fn new(events_file: impl Into<PathBuf>, audit_file: impl Into<PathBuf>) -> Self {
        Self {
            events_file: events_file.into(),
            audit_file: audit_file.into(),
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(&config.events_file, &config.audit_log_file)
    }

    pub fn events_file(&self) -> &Path {
        &self.events_file
    }

    pub fn audit_file(&self) -> &Path {
        &self.audit_file
    }

    fn append(path: &Path, record: &Record<'_>) -> Result<(), PersistenceError> {
        let line =
            serde_json::to_string(record).map_err(|e| PersistenceError::Encode(e.to_string()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| PersistenceError::Io(format!("{}: {e}", path.display())))?;
        writeln!(file, "{line}")
            .map_err(|e| PersistenceError::Io(format!("{}: {e}", path.display())))
    }
}

impl PersistencePort for JsonlStore {
    fn record_transition(
        &mut self,
        status: Status,
        at: DateTime<Utc>,
    ) -> Result<(), PersistenceError> {
        Self::append(
            &self.events_file,
            &Record::Transition {
                status,
                timestamp: at,
            },
        )
    }

    fn record_unlock(&mut self, entry: &AuditEntry) -> Result<(), PersistenceError> {
        Self::append(&self.audit_file, &Record::Unlock(entry))
    }

    fn end_session(&mut self, summary: &SessionSummary) -> Result<(), PersistenceError> {
        Self::append(&self.events_file, &Record::SessionEnd(summary))
    }
}
