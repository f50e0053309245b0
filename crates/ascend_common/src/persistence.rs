//! On-disk formats (v0.4.0).
//!
//! Two files per learner:
//! - a JSON snapshot of the whole `LearnerState`, replaced atomically
//! - an append-only JSONL journal of every command that was accepted
//!
//! The journal is the source of truth for replay: loading it from a fresh
//! learner through the same reducer must give back the snapshot.

use crate::command::Command;
use crate::error::StoreError;
use crate::learner::LearnerState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Pretty-printed JSON snapshot, written via temp file + rename
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the snapshot, or `None` if the file does not exist yet
    pub fn load(&self) -> Result<Option<LearnerState>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let state: LearnerState = serde_json::from_str(&content)?;
        Ok(Some(state))
    }

    pub fn save(&self, state: &LearnerState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(state)?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;

        debug!("Saved snapshot to {}", self.path.display());
        Ok(())
    }
}

/// One accepted command with the wall-clock time it was recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub command: Command,
}

impl JournalEntry {
    pub fn now(command: Command) -> Self {
        Self { at: Utc::now(), command }
    }
}

/// Append-only JSONL command journal
#[derive(Debug, Clone)]
pub struct CommandJournal {
    path: PathBuf,
}

impl CommandJournal {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &JournalEntry) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let line = serde_json::to_string(entry)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Read every entry in order.
    ///
    /// Unlike a stats log, a journal with a bad line cannot be replayed
    /// faithfully, so the first unreadable line is an error.
    pub fn read_all(&self) -> Result<Vec<JournalEntry>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut entries = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str::<JournalEntry>(&line).map_err(|e| {
                StoreError::CorruptJournal {
                    line: index + 1,
                    reason: e.to_string(),
                }
            })?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Commands only, in journal order
    pub fn commands(&self) -> Result<Vec<Command>, StoreError> {
        Ok(self.read_all()?.into_iter().map(|e| e.command).collect())
    }

    /// Start an empty journal, dropping any previous one
    pub fn reset(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        File::create(&self.path)?;
        Ok(())
    }
}
