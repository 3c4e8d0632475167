use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

use crate::common::config::Config;

/// Audit record for one mutating run (resolve, prune or sweep)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    /// Unique run identifier
    pub run_id: String,

    /// When the run started
    pub timestamp: DateTime<Utc>,

    /// Which operation produced this log (`resolve`, `prune`, `small-videos`, ...)
    pub operation: String,

    /// Root the operation worked on, when there is one
    pub root: Option<PathBuf>,

    /// Total bytes removed or moved
    pub total_bytes: u64,

    /// Items that succeeded
    pub total_files: usize,

    /// Individual items
    pub items: Vec<ActionItem>,

    /// Errors encountered
    pub errors: Vec<String>,
}

/// A single file or directory touched by a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionItem {
    pub path: PathBuf,

    /// `delete`, `move`, `quarantine` or `rmdir`
    pub action: String,

    /// Where a moved file ended up
    pub destination: Option<PathBuf>,

    pub size_bytes: u64,

    pub is_dir: bool,

    pub success: bool,

    pub error: Option<String>,
}

impl ActionItem {
    pub fn new(path: &Path, action: &str, size_bytes: u64) -> Self {
        Self {
            path: path.to_path_buf(),
            action: action.to_string(),
            destination: None,
            size_bytes,
            is_dir: false,
            success: true,
            error: None,
        }
    }

    pub fn dir(mut self) -> Self {
        self.is_dir = true;
        self
    }

    pub fn moved_to(mut self, destination: PathBuf) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn failed(mut self, error: String) -> Self {
        self.success = false;
        self.error = Some(error);
        self
    }
}

impl ActionLog {
    pub fn new(operation: &str, root: Option<&Path>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            operation: operation.to_string(),
            root: root.map(Path::to_path_buf),
            total_bytes: 0,
            total_files: 0,
            items: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Add an item; only successes count toward the totals
    pub fn add_item(&mut self, item: ActionItem) {
        if item.success {
            self.total_bytes += item.size_bytes;
            self.total_files += 1;
        } else if let Some(err) = &item.error {
            self.errors.push(err.clone());
        }
        self.items.push(item);
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    /// Daily log file inside `log_dir`
    pub fn log_path(&self, log_dir: &Path) -> PathBuf {
        let log_date = self.timestamp.format("%Y-%m-%d").to_string();
        log_dir.join(format!("actions-{}.jsonl", log_date))
    }

    /// Append this run as one JSON line to the daily log in `log_dir`
    pub fn save_to(&self, log_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create logs dir: {}", log_dir.display()))?;

        let log_path = self.log_path(log_dir);
        let log_entry = serde_json::to_string(self).context("Failed to serialize log entry")?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log: {}", log_path.display()))?;
        writeln!(file, "{}", log_entry)
            .with_context(|| format!("Failed to write log: {}", log_path.display()))?;

        Ok(log_path)
    }

    /// Append to the default log directory. A failure here never fails the run.
    pub fn save(&self) {
        if let Err(e) = self.save_to(&Config::logs_dir()) {
            warn!("Could not write action log: {:#}", e);
        }
    }

    /// Read every run recorded in a daily log file
    pub fn read_all(log_path: &Path) -> Result<Vec<ActionLog>> {
        let contents = std::fs::read_to_string(log_path)
            .with_context(|| format!("Failed to read log: {}", log_path.display()))?;
        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line)
                    .with_context(|| format!("Failed to parse log: {}", log_path.display()))
            })
            .collect()
    }
}
