use anyhow::Result;
use colored::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Write;

use crate::cleaner::{CleanMode, SweepReport};
use crate::common::format::{self, format_path, format_size, format_size_colored};
use crate::duplicates::resolver::ActionKind;
use crate::duplicates::{DuplicateReport, GroupKind, ResolveOutcome};
use crate::pruner::PruneReport;

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Error serializing: {}", e),
    }
}

/// Ask a `[y/N]` question on stdin
pub fn confirm(question: &str) -> Result<bool> {
    print!("\n  {} {} [y/N] ", "❓", question);
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

pub fn print_cancelled() {
    println!("  {} Cancelled", "✗".red());
}

fn print_errors(errors: &[String], limit: usize) {
    if errors.is_empty() {
        return;
    }
    println!();
    println!("  {} {} warnings:", "⚠".yellow(), errors.len());
    for err in errors.iter().take(limit) {
        println!("    {} {}", "→".dimmed(), err.dimmed());
    }
    if errors.len() > limit {
        println!("    ... and {} more", (errors.len() - limit).to_string().dimmed());
    }
}

// ─── Scan ─────────────────────────────────────────────────────────────────────

/// Print duplicate scan results in human-readable format
pub fn print_scan_report(report: &DuplicateReport, detailed: bool) {
    let title = match report.kind {
        GroupKind::Hash => "Content Duplicates",
        GroupKind::Filename => "Same-Name Files",
        GroupKind::Fingerprint => "Identical Directories",
    };

    println!();
    println!("  {} treesweep {}", "👯", title);
    println!("{}", "─".repeat(60).dimmed());
    println!(
        "  Scanned {} across {}",
        format::format_count(report.files_scanned, "file").cyan(),
        format::format_count(report.roots.len(), "root"),
    );
    println!("{}", "─".repeat(60).dimmed());
    println!();

    if report.groups.is_empty() {
        println!("  {} No duplicates found!", "✨");
        print_errors(&report.errors, 5);
        println!();
        return;
    }

    for group in report.groups.values() {
        let label = match group.kind {
            GroupKind::Filename => group.key.clone(),
            _ => format::short_key(&group.key).to_string(),
        };
        let mismatch = if group.kind == GroupKind::Filename && !group.sizes_agree() {
            format!("  {}", "sizes differ".yellow())
        } else {
            String::new()
        };
        println!(
            "    {} {} copies, {}{}",
            label.bold(),
            group.members.len(),
            format_size(group.size),
            mismatch,
        );

        if detailed {
            for member in &group.members {
                println!(
                    "      {} {} ({})",
                    "→".dimmed(),
                    format_path(&member.path),
                    format_size(member.size),
                );
            }
            println!();
        }
    }

    if !detailed {
        println!();
        println!("      Run with {} to see file paths", "--detailed".cyan());
    }

    print_errors(&report.errors, 5);

    println!();
    println!("{}", "─".repeat(60).dimmed());
    println!(
        "  {} {} groups, {} removable copies, {} reclaimable",
        "💾",
        report.total_groups().to_string().cyan(),
        report.total_duplicates().to_string().cyan(),
        format_size_colored(report.total_wasted()),
    );
    println!();
}

pub fn print_scan_quiet(report: &DuplicateReport) {
    println!(
        "{}  {}  {}",
        report.total_groups(),
        report.total_duplicates(),
        format_size(report.total_wasted())
    );
}

// ─── Resolve ──────────────────────────────────────────────────────────────────

pub fn print_resolve_outcome(outcome: &ResolveOutcome) {
    println!();
    if outcome.dry_run {
        println!("  {} {}", "ℹ️", "Dry run, no files modified".bold());
    } else {
        println!("  {} {}", "🔥", "Duplicates resolved".bold());
    }
    println!("{}", "─".repeat(60).dimmed());

    for action in &outcome.planned {
        let verb = match action.action {
            ActionKind::Delete => "delete".red(),
            ActionKind::Quarantine => "move".yellow(),
        };
        println!(
            "  {} {} ({})",
            verb,
            format_path(&action.target),
            format_size(action.size)
        );
        if let Some(dest) = &action.destination {
            println!("      {} {}", "→".dimmed(), format_path(dest).dimmed());
        }
        println!("      {} {}", "keep".green(), format_path(&action.keep).dimmed());
    }

    for key in &outcome.ambiguous {
        println!(
            "  {} {} skipped: copies differ in size (use {})",
            "⚠".yellow(),
            key.bold(),
            "--force-diff-size".cyan()
        );
    }

    println!("{}", "─".repeat(60).dimmed());
    if outcome.dry_run {
        println!(
            "  {} Would act on {} in {}",
            "💡",
            format::format_count(outcome.planned.len(), "file").cyan(),
            format::format_count(outcome.groups, "group"),
        );
        println!("  {} Run with {} to apply", "💡", "--execute".cyan());
    } else {
        println!(
            "  {} Deleted {} ({}), quarantined {} ({})",
            "💾",
            outcome.deleted.to_string().cyan(),
            format_size_colored(outcome.freed_bytes),
            outcome.quarantined.to_string().cyan(),
            format_size(outcome.quarantined_bytes),
        );
        println!(
            "  {} Skipped {}, failed {}",
            "📄",
            outcome.skipped,
            if outcome.failed > 0 {
                outcome.failed.to_string().red()
            } else {
                outcome.failed.to_string().normal()
            }
        );
    }
    print_errors(&outcome.errors, 10);
    println!();
}

// ─── Prune ────────────────────────────────────────────────────────────────────

pub fn print_prune_report(report: &PruneReport, min_video_bytes: u64) {
    let stats = &report.stats;
    println!();
    println!(
        "  {} Pruned {} in {}",
        "✂️",
        format_path(&report.source).cyan(),
        format::format_duration(report.duration_secs).cyan()
    );
    println!("{}", "─".repeat(60).dimmed());
    println!("  Videos kept:         {}", stats.videos_kept.to_string().green());
    println!("  Videos deleted:      {}", stats.videos_deleted);
    println!("  Images kept:         {}", stats.images_kept.to_string().green());
    println!("  Other files deleted: {}", stats.other_deleted);
    println!("  Directories removed: {}", stats.dirs_removed);
    println!("  Name collisions:     {}", stats.collisions_resolved);
    if stats.failures > 0 {
        println!("  Failures:            {}", stats.failures.to_string().red());
    }
    println!("{}", "─".repeat(60).dimmed());

    if !report.kept_video_in_root {
        println!(
            "  {} No video files over {} found",
            "ℹ️",
            format_size(min_video_bytes)
        );
    }
    println!("  {} Kept files are under {}", "📁", format_path(&report.target).cyan());
    print_errors(&report.errors, 10);
    println!();
}

pub fn print_prune_quiet(report: &PruneReport) {
    let s = &report.stats;
    println!(
        "{} {} {} {} {} {} {}",
        s.videos_kept,
        s.videos_deleted,
        s.images_kept,
        s.other_deleted,
        s.dirs_removed,
        s.collisions_resolved,
        s.failures
    );
}

// ─── Sweep ────────────────────────────────────────────────────────────────────

/// Print what a sweep stage found, before confirmation
pub fn print_sweep_preview(stage: &str, paths: &[std::path::PathBuf], total_bytes: u64) {
    println!();
    println!(
        "  {} {}: {} ({})",
        "🧹",
        stage.bold(),
        format::format_count(paths.len(), "item").cyan(),
        format_size_colored(total_bytes)
    );
    for path in paths.iter().take(20) {
        println!("    {} {}", "→".dimmed(), format_path(path).dimmed());
    }
    if paths.len() > 20 {
        println!("    ... and {} more", paths.len() - 20);
    }
}

pub fn print_sweep_reports(reports: &[SweepReport]) {
    println!();
    for report in reports {
        let (icon, label) = match report.mode {
            CleanMode::DryRun => ("ℹ️", "would remove"),
            CleanMode::HardDelete => ("🔥", "removed"),
        };
        if report.stage == "empty-dirs" {
            println!(
                "  {} {:<14} {} {}",
                icon,
                report.stage.bold(),
                label,
                format::format_count(report.dirs_removed, "directory").cyan(),
            );
        } else {
            println!(
                "  {} {:<14} {} {}, {}",
                icon,
                report.stage.bold(),
                label,
                format::format_count(report.files_removed, "file").cyan(),
                format_size_colored(report.bytes_freed),
            );
        }
        print_errors(&report.errors, 10);
    }
    println!();
}

pub fn print_sweep_quiet(reports: &[SweepReport]) {
    for report in reports {
        println!(
            "{}  {}  {}  {}",
            report.stage, report.files_removed, report.bytes_freed, report.dirs_removed
        );
    }
}

// ─── Extensions ───────────────────────────────────────────────────────────────

pub fn print_extensions(extensions: &BTreeSet<String>, human: bool) {
    if human {
        println!();
        println!(
            "  {} {}",
            "📋",
            format::format_count(extensions.len(), "extension").bold()
        );
        println!("{}", "─".repeat(60).dimmed());
    }
    for ext in extensions {
        if human {
            println!("  .{}", ext);
        } else {
            println!("{}", ext);
        }
    }
    if human {
        println!();
    }
}
