use anyhow::Result;
use indicatif::ProgressBar;
use serde::Serialize;
use std::fs::FileType;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::validate::validate_roots;
use crate::cleaner::manifest::{ActionItem, ActionLog};
use crate::common::config::Config;
use crate::common::format;
use crate::common::fsops;
use crate::common::media::{MediaKind, MediaTypes};
use crate::common::progress::{clear, make_spinner, set_message};

/// Settings for one prune run
#[derive(Debug, Clone)]
pub struct PruneConfig {
    pub source: PathBuf,
    pub target: PathBuf,
    /// Videos at least this large are kept
    pub min_video_bytes: u64,
    pub media: MediaTypes,
    pub show_progress: bool,
}

impl PruneConfig {
    pub fn new(source: PathBuf, target: PathBuf) -> Self {
        Self::from_config(source, target, &Config::default())
    }

    pub fn from_config(source: PathBuf, target: PathBuf, config: &Config) -> Self {
        Self {
            source,
            target,
            min_video_bytes: config.min_video_bytes(),
            media: MediaTypes::from_config(config),
            show_progress: false,
        }
    }
}

/// Counters for one prune run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneStats {
    pub videos_kept: usize,
    pub videos_deleted: usize,
    pub images_kept: usize,
    pub other_deleted: usize,
    pub dirs_removed: usize,
    pub collisions_resolved: usize,
    /// Items that could not be moved or removed
    pub failures: usize,
}

/// Result of a prune run
#[derive(Debug, Clone, Serialize)]
pub struct PruneReport {
    pub source: PathBuf,
    pub target: PathBuf,
    pub stats: PruneStats,
    /// Whether any video was large enough to keep
    pub kept_video_in_root: bool,
    pub errors: Vec<String>,
    pub duration_secs: f64,
    #[serde(skip)]
    pub log: Option<ActionLog>,
}

/// What a processed directory tells its parent
#[derive(Debug, Clone, Copy, Default)]
struct DirOutcome {
    kept_video: bool,
    /// Something below failed; never remove this directory recursively
    pinned: bool,
}

struct Pruner<'a> {
    config: &'a PruneConfig,
    target: PathBuf,
    stats: PruneStats,
    errors: Vec<String>,
    log: ActionLog,
    pb: Option<ProgressBar>,
}

/// Prune `config.source` into `config.target`.
///
/// Every directory is handled children-first. Images and large videos are
/// moved to the same relative path under the target; everything else is
/// deleted. Afterwards a subdirectory with no kept video beneath it is
/// removed recursively, and one that had a kept video is removed once empty.
/// The source root itself always stays.
pub fn prune(config: &PruneConfig) -> Result<PruneReport> {
    let start = Instant::now();
    let (source, target) = validate_roots(&config.source, &config.target)?;
    info!(
        source = %source.display(),
        target = %target.display(),
        min_video = %format::format_size(config.min_video_bytes),
        "prune started"
    );

    let mut pruner = Pruner {
        config,
        target: target.clone(),
        stats: PruneStats::default(),
        errors: Vec::new(),
        log: ActionLog::new("prune", Some(&source)),
        pb: make_spinner(config.show_progress, "Pruning..."),
    };

    let root = pruner.process_dir(&source, Path::new(""));
    clear(pruner.pb.take());

    if !root.kept_video {
        info!(
            "No video files over {} found in {}",
            format::format_size(config.min_video_bytes),
            source.display()
        );
    }
    info!(
        videos_kept = pruner.stats.videos_kept,
        videos_deleted = pruner.stats.videos_deleted,
        images_kept = pruner.stats.images_kept,
        other_deleted = pruner.stats.other_deleted,
        dirs_removed = pruner.stats.dirs_removed,
        failures = pruner.stats.failures,
        "prune finished"
    );

    Ok(PruneReport {
        source,
        target,
        stats: pruner.stats,
        kept_video_in_root: root.kept_video,
        errors: pruner.errors,
        duration_secs: start.elapsed().as_secs_f64(),
        log: Some(pruner.log),
    })
}

impl Pruner<'_> {
    fn process_dir(&mut self, dir: &Path, rel: &Path) -> DirOutcome {
        let mut outcome = DirOutcome::default();

        // 1. Materialize and sort the listing before mutating anything
        let Some((entries, complete)) = self.list_sorted(dir) else {
            outcome.pinned = true;
            return outcome;
        };
        outcome.pinned = !complete;

        for (name, path, file_type) in entries {
            set_message(&self.pb, format::truncate(&format::format_path(&path), 50));

            if file_type.is_symlink() {
                // Never followed
                if self.delete(&path, 0) {
                    self.stats.other_deleted += 1;
                } else {
                    outcome.pinned = true;
                }
            } else if file_type.is_dir() {
                let child = self.process_dir(&path, &rel.join(&name));
                outcome.kept_video |= child.kept_video;
                if !self.collapse(&path, child) {
                    outcome.pinned = true;
                }
                outcome.pinned |= child.pinned;
            } else {
                let dest = self.target.join(rel).join(&name);
                match self.process_file(&path, &dest) {
                    Some(kept_video) => outcome.kept_video |= kept_video,
                    None => outcome.pinned = true,
                }
            }
        }
        outcome
    }

    /// Returns whether the file was a kept video, or `None` on failure
    fn process_file(&mut self, path: &Path, dest: &Path) -> Option<bool> {
        match self.config.media.classify(path) {
            MediaKind::Image => {
                let size = file_size(path);
                if !self.keep(path, dest, size) {
                    return None;
                }
                self.stats.images_kept += 1;
                Some(false)
            }
            MediaKind::Video => {
                let size = match std::fs::symlink_metadata(path) {
                    Ok(meta) => meta.len(),
                    Err(e) => {
                        self.fail(format!("Cannot stat '{}': {}", path.display(), e));
                        return None;
                    }
                };
                if size >= self.config.min_video_bytes {
                    if !self.keep(path, dest, size) {
                        return None;
                    }
                    self.stats.videos_kept += 1;
                    Some(true)
                } else {
                    if !self.delete(path, size) {
                        return None;
                    }
                    self.stats.videos_deleted += 1;
                    Some(false)
                }
            }
            MediaKind::Other => {
                if !self.delete(path, file_size(path)) {
                    return None;
                }
                self.stats.other_deleted += 1;
                Some(false)
            }
        }
    }

    /// Remove a processed subdirectory. Returns false if removal failed.
    fn collapse(&mut self, dir: &Path, child: DirOutcome) -> bool {
        if child.kept_video || child.pinned {
            if !fsops::is_dir_empty(dir) {
                debug!(path = %dir.display(), pinned = child.pinned, "directory left in place");
                return true;
            }
            return match std::fs::remove_dir(dir) {
                Ok(()) => {
                    self.removed_dir(dir);
                    true
                }
                Err(e) => {
                    self.fail(format!("Failed to remove '{}': {}", dir.display(), e));
                    false
                }
            };
        }

        match fsops::remove_path(dir) {
            Ok(()) => {
                self.removed_dir(dir);
                true
            }
            Err(e) => {
                self.fail(format!("{:#}", e));
                false
            }
        }
    }

    fn removed_dir(&mut self, dir: &Path) {
        debug!(path = %dir.display(), "directory removed");
        self.stats.dirs_removed += 1;
        self.log.add_item(ActionItem::new(dir, "rmdir", 0).dir());
    }

    fn keep(&mut self, path: &Path, dest: &Path, size: u64) -> bool {
        match fsops::move_file(path, dest) {
            Ok(moved) => {
                if moved.renamed {
                    self.stats.collisions_resolved += 1;
                    info!(
                        "Name taken, kept {} as {}",
                        path.display(),
                        moved.destination.display()
                    );
                }
                debug!(from = %path.display(), to = %moved.destination.display(), "moved");
                self.log
                    .add_item(ActionItem::new(path, "move", size).moved_to(moved.destination));
                true
            }
            Err(e) => {
                let msg = format!("Failed to move '{}': {:#}", path.display(), e);
                self.log
                    .add_item(ActionItem::new(path, "move", size).failed(msg.clone()));
                self.record_failure(msg);
                false
            }
        }
    }

    fn delete(&mut self, path: &Path, size: u64) -> bool {
        match std::fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "deleted");
                self.log.add_item(ActionItem::new(path, "delete", size));
                true
            }
            Err(e) => {
                let msg = format!("Failed to delete '{}': {}", path.display(), e);
                self.log
                    .add_item(ActionItem::new(path, "delete", size).failed(msg.clone()));
                self.record_failure(msg);
                false
            }
        }
    }

    fn fail(&mut self, msg: String) {
        self.log.add_error(msg.clone());
        self.record_failure(msg);
    }

    fn record_failure(&mut self, msg: String) {
        warn!("{}", msg);
        self.stats.failures += 1;
        self.errors.push(msg);
    }

    /// Sorted listing (case-insensitive) and whether every entry could be read
    fn list_sorted(&mut self, dir: &Path) -> Option<(Vec<(String, PathBuf, FileType)>, bool)> {
        let reader = match std::fs::read_dir(dir) {
            Ok(r) => r,
            Err(e) => {
                self.fail(format!("Cannot list '{}': {}", dir.display(), e));
                return None;
            }
        };

        let mut entries = Vec::new();
        let mut complete = true;
        for entry in reader {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    self.fail(format!("Cannot list entry in '{}': {}", dir.display(), e));
                    complete = false;
                    continue;
                }
            };
            match entry.file_type() {
                Ok(file_type) => entries.push((
                    entry.file_name().to_string_lossy().to_string(),
                    entry.path(),
                    file_type,
                )),
                Err(e) => {
                    self.fail(format!("Cannot stat '{}': {}", entry.path().display(), e));
                    complete = false;
                }
            }
        }

        entries.sort_by(|a, b| {
            a.0.to_lowercase()
                .cmp(&b.0.to_lowercase())
                .then_with(|| a.0.cmp(&b.0))
        });
        Some((entries, complete))
    }
}

fn file_size(path: &Path) -> u64 {
    std::fs::symlink_metadata(path).map(|m| m.len()).unwrap_or(0)
}
