use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::report::{DuplicateGroup, DuplicateReport, FileRecord, GroupKind};
use crate::cleaner::manifest::{ActionItem, ActionLog};
use crate::common::fsops;

/// Keep/delete policy applied to every group of a report
#[derive(Debug, Clone)]
pub struct ResolvePolicy {
    /// Members under this root sort first when choosing the keeper
    pub preferred_root: Option<PathBuf>,
    /// Unverified duplicates (filename groups) are moved here
    pub quarantine_dir: PathBuf,
    /// Resolve filename groups even when member sizes disagree
    pub allow_size_mismatch: bool,
}

impl ResolvePolicy {
    pub fn new(quarantine_dir: PathBuf) -> Self {
        Self {
            preferred_root: None,
            quarantine_dir,
            allow_size_mismatch: false,
        }
    }
}

/// What happens to a non-kept member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Delete,
    Quarantine,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionKind::Delete => write!(f, "delete"),
            ActionKind::Quarantine => write!(f, "quarantine"),
        }
    }
}

/// One planned (dry run) or performed action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedAction {
    pub group_key: String,
    pub keep: PathBuf,
    pub target: PathBuf,
    pub size: u64,
    pub action: ActionKind,
    /// Final location for quarantine moves
    pub destination: Option<PathBuf>,
}

/// Counters and details from a resolve run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolveOutcome {
    pub dry_run: bool,
    /// Groups examined
    pub groups: usize,
    /// Members removed
    pub deleted: usize,
    /// Members moved into quarantine
    pub quarantined: usize,
    pub freed_bytes: u64,
    pub quarantined_bytes: u64,
    /// Ambiguous groups, groups whose keeper vanished, members already gone,
    /// and members holding another group's kept copy
    pub skipped: usize,
    /// Members whose removal or move failed
    pub failed: usize,
    /// Groups skipped because same-named members differ in size
    pub ambiguous: Vec<String>,
    /// In a dry run, everything that would happen; otherwise what did happen
    pub planned: Vec<PlannedAction>,
    pub errors: Vec<String>,
}

impl ResolveOutcome {
    /// Audit record of what a real run did
    pub fn to_action_log(&self) -> ActionLog {
        let mut log = ActionLog::new("resolve", None);
        for action in &self.planned {
            let item = ActionItem::new(&action.target, &action.action.to_string(), action.size);
            log.add_item(match &action.destination {
                Some(dest) => item.moved_to(dest.clone()),
                None => item,
            });
        }
        for err in &self.errors {
            log.add_error(err.clone());
        }
        log
    }
}

/// Order members for keeper selection: preferred root first, then path.
pub fn keeper_order<'a>(
    members: &'a [FileRecord],
    preferred_root: Option<&Path>,
) -> Vec<&'a FileRecord> {
    let mut ordered: Vec<&FileRecord> = members.iter().collect();
    ordered.sort_by(|a, b| {
        let rank = |m: &FileRecord| match preferred_root {
            Some(root) if m.path.starts_with(root) => 0u8,
            _ => 1u8,
        };
        rank(a).cmp(&rank(b)).then_with(|| a.path.cmp(&b.path))
    });
    ordered
}

/// The member that survives resolution
pub fn select_keeper<'a>(
    group: &'a DuplicateGroup,
    preferred_root: Option<&Path>,
) -> Option<&'a FileRecord> {
    keeper_order(&group.members, preferred_root).into_iter().next()
}

/// Apply `policy` to every group of `report`.
///
/// Hash and fingerprint groups have verified content, so extra members are
/// deleted. Filename groups are only moved into quarantine. With `dry_run`
/// nothing on disk changes and `planned` lists the intended actions.
pub fn resolve(report: &DuplicateReport, policy: &ResolvePolicy, dry_run: bool) -> ResolveOutcome {
    let mut outcome = ResolveOutcome {
        dry_run,
        ..Default::default()
    };
    let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let mut guard = RunGuard::new(report, policy);

    for group in report.groups.values() {
        outcome.groups += 1;
        resolve_group(group, policy, dry_run, &stamp, &mut guard, &mut outcome);
    }

    info!(
        dry_run,
        deleted = outcome.deleted,
        quarantined = outcome.quarantined,
        skipped = outcome.skipped,
        failed = outcome.failed,
        "resolve finished"
    );
    outcome
}

/// Paths shared by every group of one run. Fingerprint groups nest (a
/// directory and its subdirectories match separately), so a member may only
/// go if no group keeps anything at or below it.
struct RunGuard {
    keepers: Vec<PathBuf>,
    removed: Vec<PathBuf>,
}

impl RunGuard {
    fn new(report: &DuplicateReport, policy: &ResolvePolicy) -> Self {
        let keepers = report
            .groups
            .values()
            .filter_map(|g| select_keeper(g, policy.preferred_root.as_deref()))
            .map(|k| k.path.clone())
            .collect();
        Self {
            keepers,
            removed: Vec::new(),
        }
    }

    /// Some group keeps this path or something beneath it
    fn holds_keeper(&self, path: &Path) -> bool {
        self.keepers.iter().any(|k| k.starts_with(path))
    }

    /// Already deleted or moved away, directly or with an ancestor
    fn is_removed(&self, path: &Path) -> bool {
        self.removed.iter().any(|r| path.starts_with(r))
    }
}

fn resolve_group(
    group: &DuplicateGroup,
    policy: &ResolvePolicy,
    dry_run: bool,
    stamp: &str,
    guard: &mut RunGuard,
    outcome: &mut ResolveOutcome,
) {
    // 1. Same name, different size: likely different files
    if group.kind == GroupKind::Filename && !policy.allow_size_mismatch && !group.sizes_agree() {
        warn!(
            "Skipping '{}': copies differ in size, review manually",
            group.key
        );
        outcome.ambiguous.push(group.key.clone());
        outcome.skipped += 1;
        return;
    }

    // 2. Keep exactly one
    let ordered = keeper_order(&group.members, policy.preferred_root.as_deref());
    let Some((keeper, others)) = ordered.split_first() else {
        return;
    };

    if guard.is_removed(&keeper.path) || (!dry_run && !fsops::exists_no_follow(&keeper.path)) {
        warn!(
            "Skipping group '{}': kept copy {} no longer exists",
            group.key,
            keeper.path.display()
        );
        outcome.skipped += 1;
        return;
    }

    let action = if group.kind.content_verified() {
        ActionKind::Delete
    } else {
        ActionKind::Quarantine
    };

    // 3. Act on the rest
    for member in others {
        if guard.holds_keeper(&member.path) {
            warn!(
                "Keeping {}: another group keeps a copy inside it",
                member.path.display()
            );
            outcome.skipped += 1;
            continue;
        }
        if guard.is_removed(&member.path) {
            debug!(path = %member.path.display(), "already removed with a parent");
            outcome.skipped += 1;
            continue;
        }

        let mut planned = PlannedAction {
            group_key: group.key.clone(),
            keep: keeper.path.clone(),
            target: member.path.clone(),
            size: member.size,
            action,
            destination: None,
        };

        if action == ActionKind::Quarantine {
            planned.destination = Some(quarantine_path(&policy.quarantine_dir, &member.path, stamp));
        }

        if dry_run {
            guard.removed.push(member.path.clone());
            outcome.planned.push(planned);
            continue;
        }

        if !fsops::exists_no_follow(&member.path) {
            debug!(path = %member.path.display(), "already gone");
            outcome.skipped += 1;
            continue;
        }

        // 4. Count only what succeeded
        match perform(&planned) {
            Ok(destination) => {
                guard.removed.push(member.path.clone());
                match action {
                    ActionKind::Delete => {
                        outcome.deleted += 1;
                        outcome.freed_bytes += member.size;
                    }
                    ActionKind::Quarantine => {
                        outcome.quarantined += 1;
                        outcome.quarantined_bytes += member.size;
                    }
                }
                info!(
                    action = %action,
                    path = %member.path.display(),
                    "resolved duplicate"
                );
                planned.destination = destination;
                outcome.planned.push(planned);
            }
            Err(e) => {
                warn!("Failed to {} {}: {:#}", action, member.path.display(), e);
                outcome.failed += 1;
                outcome
                    .errors
                    .push(format!("Failed to {} '{}': {:#}", action, member.path.display(), e));
            }
        }
    }
}

fn quarantine_path(quarantine_dir: &Path, path: &Path, stamp: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("unnamed"));
    quarantine_dir.join(fsops::with_stem_suffix(&name, stamp))
}

fn perform(planned: &PlannedAction) -> Result<Option<PathBuf>> {
    match (planned.action, &planned.destination) {
        (ActionKind::Quarantine, Some(dest)) => {
            let moved = fsops::move_file(&planned.target, dest)?;
            Ok(Some(moved.destination))
        }
        _ => {
            fsops::remove_path(&planned.target)?;
            Ok(None)
        }
    }
}
