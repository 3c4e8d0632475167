use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};
use walkdir::WalkDir;

use super::fingerprint;
use super::hasher;
use super::report::{DuplicateGroup, DuplicateReport, FileRecord, GroupKind};
use crate::common::progress::{finish, make_progress, make_spinner, tick};

/// Which key files are grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStrategy {
    /// Same size, then same content hash
    Hash,
    /// Same base filename (content not compared)
    Filename,
    /// Directories with identical fingerprints
    Fingerprint,
}

impl ScanStrategy {
    pub fn kind(self) -> GroupKind {
        match self {
            ScanStrategy::Hash => GroupKind::Hash,
            ScanStrategy::Filename => GroupKind::Filename,
            ScanStrategy::Fingerprint => GroupKind::Fingerprint,
        }
    }
}

/// Configuration for duplicate scanning
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Root directories to scan
    pub roots: Vec<PathBuf>,
    pub strategy: ScanStrategy,
    /// Only consider files with these extensions (lowercase, no dot)
    pub extensions: Option<BTreeSet<String>>,
    /// Read chunk used when hashing
    pub chunk_size: usize,
    /// Show progress bars
    pub show_progress: bool,
}

impl ScanConfig {
    pub fn new(roots: Vec<PathBuf>, strategy: ScanStrategy) -> Self {
        Self {
            roots,
            strategy,
            extensions: None,
            chunk_size: hasher::DEFAULT_CHUNK_SIZE,
            show_progress: false,
        }
    }

    pub fn with_extensions(mut self, extensions: BTreeSet<String>) -> Self {
        self.extensions = Some(extensions);
        self
    }
}

/// Run a duplicate scan with the configured strategy
pub fn scan(config: &ScanConfig) -> Result<DuplicateReport> {
    let start = Instant::now();
    let roots = existing_roots(&config.roots);

    let report = match config.strategy {
        ScanStrategy::Hash => scan_by_hash(config, &roots),
        ScanStrategy::Filename => scan_by_name(config, &roots),
        ScanStrategy::Fingerprint => scan_by_fingerprint(config, &roots),
    };

    info!(
        strategy = %config.strategy.kind(),
        groups = report.total_groups(),
        files = report.files_scanned,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "duplicate scan finished"
    );
    Ok(report)
}

/// Existing roots in canonical form, sorted, with roots nested inside another
/// root dropped. A directory reached through two spellings is scanned once.
fn existing_roots(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut sorted: Vec<PathBuf> = roots
        .iter()
        .filter_map(|root| {
            if !root.is_dir() {
                warn!("Root does not exist or is not a directory: {}", root.display());
                return None;
            }
            match std::fs::canonicalize(root) {
                Ok(canonical) => Some(canonical),
                Err(e) => {
                    warn!("Cannot resolve root {}: {}", root.display(), e);
                    None
                }
            }
        })
        .collect();
    sorted.sort();
    sorted.dedup();

    let mut out: Vec<PathBuf> = Vec::new();
    for root in sorted {
        if out.iter().any(|kept| root.starts_with(kept)) {
            info!("Root {} is already covered by another root", root.display());
            continue;
        }
        out.push(root);
    }
    out
}

/// Regular files found under the scan roots
struct Collected {
    files: Vec<FileRecord>,
    errors: Vec<String>,
}

/// Collect regular files under all roots, filtered by extension.
/// Symlinks are neither followed nor collected.
fn collect_files(roots: &[PathBuf], extensions: Option<&BTreeSet<String>>) -> Collected {
    let mut seen: BTreeMap<PathBuf, FileRecord> = BTreeMap::new();
    let mut errors = Vec::new();

    for root in roots {
        for entry in WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Cannot access entry: {}", e);
                    errors.push(format!("Cannot access entry: {}", e));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(exts) = extensions {
                if !crate::common::media::has_extension(entry.path(), exts) {
                    continue;
                }
            }
            match entry.metadata() {
                Ok(meta) => {
                    let path = entry.path().to_path_buf();
                    seen.entry(path.clone())
                        .or_insert_with(|| FileRecord::new(path, meta.len()));
                }
                Err(e) => {
                    warn!("Cannot stat {}: {}", entry.path().display(), e);
                    errors.push(format!("Cannot stat {}: {}", entry.path().display(), e));
                }
            }
        }
    }

    Collected {
        files: seen.into_values().collect(),
        errors,
    }
}

/// Two-phase content scan: size buckets first, then hash only shared sizes
fn scan_by_hash(config: &ScanConfig, roots: &[PathBuf]) -> DuplicateReport {
    // ── Step 0: Collect all files ─────────────────────────────────────────
    let pb = make_spinner(config.show_progress, "Collecting files...");
    let collected = collect_files(roots, config.extensions.as_ref());
    let files_scanned = collected.files.len();
    let mut errors = collected.errors;
    finish(pb, &format!("Found {} files", files_scanned));

    // ── Pass 1: Group by file size ────────────────────────────────────────
    let size_groups = hasher::group_by_size(&collected.files);
    let candidates: Vec<FileRecord> = size_groups.into_values().flatten().collect();
    info!(candidates = candidates.len(), "size pass complete");

    // ── Pass 2: Full hash of candidates ───────────────────────────────────
    let pb = make_spinner(
        config.show_progress,
        &format!("Hashing {} candidates...", candidates.len()),
    );
    let hashed = hasher::group_by_hash(&candidates, config.chunk_size);
    errors.extend(hashed.errors);
    finish(pb, &format!("{} duplicate groups", hashed.groups.len()));

    let groups = hashed
        .groups
        .into_iter()
        .map(|(digest, members)| DuplicateGroup::new(digest, GroupKind::Hash, members));

    DuplicateReport::new(GroupKind::Hash, roots.to_vec(), files_scanned, groups, errors)
}

/// Cheap pre-filter: same base name anywhere under the roots
fn scan_by_name(config: &ScanConfig, roots: &[PathBuf]) -> DuplicateReport {
    let pb = make_spinner(config.show_progress, "Indexing file names...");
    let collected = collect_files(roots, config.extensions.as_ref());
    let files_scanned = collected.files.len();

    let mut by_name: BTreeMap<String, Vec<FileRecord>> = BTreeMap::new();
    for record in collected.files {
        let record = record.with_filename();
        if let Some(name) = record.filename.clone() {
            by_name.entry(name).or_default().push(record);
        }
    }
    finish(pb, &format!("Indexed {} files", files_scanned));

    let groups = by_name
        .into_iter()
        .map(|(name, members)| DuplicateGroup::new(name, GroupKind::Filename, members));

    DuplicateReport::new(
        GroupKind::Filename,
        roots.to_vec(),
        files_scanned,
        groups,
        collected.errors,
    )
}

/// Structurally identical subtrees, by directory fingerprint
fn scan_by_fingerprint(config: &ScanConfig, roots: &[PathBuf]) -> DuplicateReport {
    let pb = make_progress(
        config.show_progress,
        roots.len() as u64,
        "Fingerprinting directories...",
    );

    let mut by_digest: BTreeMap<String, BTreeMap<PathBuf, FileRecord>> = BTreeMap::new();
    let mut files_scanned = 0usize;
    let mut errors = Vec::new();

    for root in roots {
        let index = fingerprint::fingerprint_tree(root, config.chunk_size);
        files_scanned += index.files_hashed;
        errors.extend(index.errors);
        for dir in index.dirs {
            by_digest
                .entry(dir.digest.clone())
                .or_default()
                .entry(dir.path.clone())
                .or_insert_with(|| FileRecord::new(dir.path, dir.total_size));
        }
        tick(&pb);
    }
    finish(pb, &format!("{} fingerprinted groups", by_digest.len()));

    let groups = by_digest.into_iter().map(|(digest, members)| {
        DuplicateGroup::new(
            digest.clone(),
            GroupKind::Fingerprint,
            members
                .into_values()
                .map(|m| m.with_digest(digest.clone()))
                .collect(),
        )
    });

    DuplicateReport::new(
        GroupKind::Fingerprint,
        roots.to_vec(),
        files_scanned,
        groups,
        errors,
    )
}
