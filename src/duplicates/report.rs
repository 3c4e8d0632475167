use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::common::errors::SweepError;

/// A single file (or, for fingerprint groups, directory) seen by a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl FileRecord {
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            filename: None,
            digest: None,
        }
    }

    pub fn with_digest(mut self, digest: String) -> Self {
        self.digest = Some(digest);
        self
    }

    pub fn with_filename(mut self) -> Self {
        self.filename = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string());
        self
    }
}

/// How the members of a group were matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// Byte-identical content (verified by hash)
    Hash,
    /// Same base filename, content unverified
    Filename,
    /// Directories with identical relative names and content
    Fingerprint,
}

impl GroupKind {
    /// Content equality is verified, so removing extra copies is safe
    pub fn content_verified(self) -> bool {
        matches!(self, GroupKind::Hash | GroupKind::Fingerprint)
    }
}

impl std::fmt::Display for GroupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupKind::Hash => write!(f, "hash"),
            GroupKind::Filename => write!(f, "filename"),
            GroupKind::Fingerprint => write!(f, "fingerprint"),
        }
    }
}

/// Two or more files or directories sharing a grouping key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub key: String,
    pub kind: GroupKind,
    pub size: u64,
    pub members: Vec<FileRecord>,
}

impl DuplicateGroup {
    pub fn new(key: String, kind: GroupKind, mut members: Vec<FileRecord>) -> Self {
        members.sort_by(|a, b| a.path.cmp(&b.path));
        let size = members.first().map(|m| m.size).unwrap_or(0);
        Self {
            key,
            kind,
            size,
            members,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        self.members.len() >= 2
    }

    /// Whether all members report the same size
    pub fn sizes_agree(&self) -> bool {
        self.members.windows(2).all(|w| w[0].size == w[1].size)
    }

    /// Bytes held by every member but one
    pub fn wasted_bytes(&self) -> u64 {
        self.members.iter().skip(1).map(|m| m.size).sum()
    }
}

/// Persisted result of a duplicate scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub kind: GroupKind,
    pub created_at: DateTime<Utc>,
    pub roots: Vec<PathBuf>,
    pub files_scanned: usize,
    pub groups: BTreeMap<String, DuplicateGroup>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl DuplicateReport {
    /// Build a report, dropping anything that is not a real duplicate group
    pub fn new(
        kind: GroupKind,
        roots: Vec<PathBuf>,
        files_scanned: usize,
        groups: impl IntoIterator<Item = DuplicateGroup>,
        errors: Vec<String>,
    ) -> Self {
        let groups = groups
            .into_iter()
            .filter(DuplicateGroup::is_duplicate)
            .map(|g| (g.key.clone(), g))
            .collect();
        Self {
            kind,
            created_at: Utc::now(),
            roots,
            files_scanned,
            groups,
            errors,
        }
    }

    pub fn total_groups(&self) -> usize {
        self.groups.len()
    }

    /// Members that would go if every group kept exactly one
    pub fn total_duplicates(&self) -> usize {
        self.groups.values().map(|g| g.members.len() - 1).sum()
    }

    pub fn total_wasted(&self) -> u64 {
        self.groups.values().map(DuplicateGroup::wasted_bytes).sum()
    }

    /// Write the report as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create report dir: {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }

    /// Load a report; groups with fewer than two members are discarded
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SweepError::Report {
                path: path.to_path_buf(),
                message: "report file not found".to_string(),
            }
            .into());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read report: {}", path.display()))?;
        let mut report: DuplicateReport =
            serde_json::from_str(&contents).map_err(|e| SweepError::Report {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        for (key, group) in report.groups.iter_mut() {
            if group.key != *key {
                return Err(SweepError::Report {
                    path: path.to_path_buf(),
                    message: format!("group key '{}' stored under '{}'", group.key, key),
                }
                .into());
            }
            group.members.sort_by(|a, b| a.path.cmp(&b.path));
        }
        report.groups.retain(|_, g| g.is_duplicate());
        Ok(report)
    }
}
