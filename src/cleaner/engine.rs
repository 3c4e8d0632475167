use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::finders::{self, Target};
use super::manifest::{ActionItem, ActionLog};
use crate::common::config::Config;
use crate::common::format;
use crate::common::progress::{clear, make_progress, set_message, tick};
use crate::common::safety;

/// Clean mode determines whether anything is removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanMode {
    /// Show what would be done without doing it
    DryRun,
    /// Permanent removal, no undo
    HardDelete,
}

impl std::fmt::Display for CleanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CleanMode::DryRun => write!(f, "dry_run"),
            CleanMode::HardDelete => write!(f, "hard_delete"),
        }
    }
}

/// Report from one sweep stage
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub stage: String,
    pub mode: CleanMode,
    pub files_removed: usize,
    pub bytes_freed: u64,
    pub dirs_removed: usize,
    /// Paths affected (or that would be, in a dry run)
    pub paths: Vec<PathBuf>,
    pub errors: Vec<String>,
    #[serde(skip)]
    pub log: Option<ActionLog>,
}

impl SweepReport {
    fn new(stage: &str, mode: CleanMode) -> Self {
        Self {
            stage: stage.to_string(),
            mode,
            files_removed: 0,
            bytes_freed: 0,
            dirs_removed: 0,
            paths: Vec::new(),
            errors: Vec::new(),
            log: None,
        }
    }

    /// Persist the audit log for a real run; dry runs leave no trace
    pub fn save_log(&self) {
        if self.mode == CleanMode::DryRun {
            return;
        }
        if let Some(log) = &self.log {
            log.save();
        }
    }
}

/// Delete `targets`. In `DryRun` nothing is touched and the totals are what
/// would be freed; otherwise only successful removals are counted.
pub fn clean_files(
    stage: &str,
    targets: &[Target],
    mode: CleanMode,
    show_progress: bool,
) -> SweepReport {
    let mut report = SweepReport::new(stage, mode);

    if mode == CleanMode::DryRun {
        report.files_removed = targets.len();
        report.bytes_freed = targets.iter().map(|t| t.size).sum();
        report.paths = targets.iter().map(|t| t.path.clone()).collect();
        return report;
    }

    let mut log = ActionLog::new(stage, None);
    let pb = make_progress(show_progress, targets.len() as u64, "Deleting...");

    for target in targets {
        set_message(&pb, format::truncate(&format::format_path(&target.path), 40));
        let item = ActionItem::new(&target.path, "delete", target.size);

        match std::fs::remove_file(&target.path) {
            Ok(()) => {
                report.files_removed += 1;
                report.bytes_freed += target.size;
                report.paths.push(target.path.clone());
                log.add_item(item);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Already gone
            }
            Err(e) => {
                let msg = format!("Failed to remove '{}': {}", target.path.display(), e);
                warn!("{}", msg);
                report.errors.push(msg.clone());
                log.add_item(item.failed(msg));
            }
        }
        tick(&pb);
    }
    clear(pb);

    info!(
        stage,
        files = report.files_removed,
        bytes = report.bytes_freed,
        errors = report.errors.len(),
        "sweep stage finished"
    );
    report.log = Some(log);
    report
}

/// Remove directories in the given order with a non-recursive `remove_dir`,
/// so a directory that gained content is left alone.
pub fn remove_empty_dirs(dirs: &[PathBuf], mode: CleanMode) -> SweepReport {
    let mut report = SweepReport::new("empty-dirs", mode);

    if mode == CleanMode::DryRun {
        report.dirs_removed = dirs.len();
        report.paths = dirs.to_vec();
        return report;
    }

    let mut log = ActionLog::new("empty-dirs", None);
    for dir in dirs {
        match std::fs::remove_dir(dir) {
            Ok(()) => {
                report.dirs_removed += 1;
                report.paths.push(dir.clone());
                log.add_item(ActionItem::new(dir, "rmdir", 0).dir());
            }
            Err(e) => {
                let msg = format!("Failed to remove '{}': {}", dir.display(), e);
                warn!("{}", msg);
                report.errors.push(msg.clone());
                log.add_item(ActionItem::new(dir, "rmdir", 0).dir().failed(msg));
            }
        }
    }
    report.log = Some(log);
    report
}

/// Small videos, then junk extensions, then empty directories.
/// Each stage sees the tree as the previous stage left it.
pub fn run_all(root: &Path, config: &Config, mode: CleanMode) -> Result<Vec<SweepReport>> {
    ensure_sweepable(root)?;

    let small = finders::find_small_videos(root, config.small_video_bytes(), &config.video_set());
    let mut reports = vec![clean_files("small-videos", &small, mode, false)];

    let junk = finders::find_by_extension(root, &config.junk_set());
    reports.push(clean_files("junk", &junk, mode, false));

    let empty = if mode == CleanMode::DryRun {
        empty_after_dry_run(root, &reports)
    } else {
        finders::find_empty_dirs(root)
    };
    reports.push(remove_empty_dirs(&empty, mode));

    for report in &mut reports {
        if let Some(log) = report.log.as_mut() {
            log.root = Some(root.to_path_buf());
        }
    }
    Ok(reports)
}

/// The sweep root must be an existing, non-protected directory
pub fn ensure_sweepable(root: &Path) -> Result<()> {
    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }
    let canonical = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    safety::ensure_not_protected(&canonical)?;
    Ok(())
}

/// Empty directories the real run would find once the planned files are gone
fn empty_after_dry_run(root: &Path, reports: &[SweepReport]) -> Vec<PathBuf> {
    let planned: std::collections::BTreeSet<&Path> = reports
        .iter()
        .flat_map(|r| r.paths.iter().map(PathBuf::as_path))
        .collect();
    finders::find_empty_dirs_ignoring(root, &planned)
}
