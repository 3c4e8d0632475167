use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};

use treesweep::cleaner::{self, CleanMode, SweepReport, Target};
use treesweep::cli::args::{Cli, Commands, CompletionShell, ConfigAction, OutputFormat, ScanBy};
use treesweep::cli::output;
use treesweep::common::config::{self, Config};
use treesweep::common::{format, logging};
use treesweep::duplicates::{self, DuplicateReport, ResolvePolicy, ScanConfig, ScanStrategy};
use treesweep::pruner::{self, PruneConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let _guard = logging::init(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);

    if let Commands::Config { action } = &cli.command {
        return cmd_config(action, &config_path);
    }
    if let Commands::Completions { shell } = &cli.command {
        use clap::CommandFactory;
        let mut cmd = Cli::command();
        let shell = match shell {
            CompletionShell::Bash => clap_complete::Shell::Bash,
            CompletionShell::Zsh => clap_complete::Shell::Zsh,
            CompletionShell::Fish => clap_complete::Shell::Fish,
        };
        clap_complete::generate(shell, &mut cmd, "treesweep", &mut std::io::stdout());
        return Ok(());
    }

    let config = Config::load_from(&config_path)?;
    let ctx = Ctx::new(&cli, config);

    match &cli.command {
        Commands::Scan {
            roots,
            by,
            ext,
            all_files,
            output,
            detailed,
        } => cmd_scan(&ctx, roots, *by, ext.as_deref(), *all_files, output.as_deref(), *detailed),

        Commands::Resolve {
            report,
            execute,
            preferred_root,
            quarantine,
            force_diff_size,
            yes,
        } => cmd_resolve(
            &ctx,
            report,
            *execute,
            preferred_root.clone(),
            quarantine.clone(),
            *force_diff_size,
            *yes,
        ),

        Commands::Prune {
            source,
            target,
            min_video_mb,
            yes,
        } => cmd_prune(&ctx, source, target, *min_video_mb, *yes),

        Commands::SmallVideos {
            dir,
            size,
            dry_run,
            yes,
        } => {
            let threshold = size
                .map(|mb| mb * 1024 * 1024)
                .unwrap_or_else(|| ctx.config.small_video_bytes());
            cleaner::engine::ensure_sweepable(dir)?;
            let targets =
                cleaner::find_small_videos(dir, threshold, &ctx.config.video_set());
            cmd_sweep(&ctx, "small-videos", dir, &targets, *dry_run, *yes)
        }

        Commands::Junk {
            dir,
            ext,
            dry_run,
            yes,
        } => {
            let exts = match ext {
                Some(list) => config::normalize_extensions(list),
                None => ctx.config.junk_set(),
            };
            cleaner::engine::ensure_sweepable(dir)?;
            let targets = cleaner::find_by_extension(dir, &exts);
            cmd_sweep(&ctx, "junk", dir, &targets, *dry_run, *yes)
        }

        Commands::KeywordImages {
            dir,
            keyword,
            dry_run,
            yes,
        } => {
            let keywords = keyword
                .clone()
                .unwrap_or_else(|| ctx.config.image_keywords.clone());
            if keywords.is_empty() {
                anyhow::bail!(
                    "No keywords given: pass --keyword or set image_keywords in {}",
                    config_path.display()
                );
            }
            cleaner::engine::ensure_sweepable(dir)?;
            let targets =
                cleaner::find_images_by_keyword(dir, &keywords, &ctx.config.image_set());
            cmd_sweep(&ctx, "keyword-images", dir, &targets, *dry_run, *yes)
        }

        Commands::EmptyDirs { dir, dry_run, yes } => cmd_empty_dirs(&ctx, dir, *dry_run, *yes),

        Commands::CleanAll { dir, dry_run, yes } => cmd_clean_all(&ctx, dir, *dry_run, *yes),

        Commands::Extensions { dir } => {
            if !dir.is_dir() {
                anyhow::bail!("Not a directory: {}", dir.display());
            }
            let exts = cleaner::list_extensions(dir);
            match ctx.format {
                OutputFormat::Json => output::print_json(&exts),
                _ => output::print_extensions(&exts, ctx.human()),
            }
            Ok(())
        }

        Commands::Config { .. } | Commands::Completions { .. } => Ok(()),
    }
}

/// Resolved global settings shared by every command
struct Ctx {
    config: Config,
    format: OutputFormat,
    quiet: bool,
    show_progress: bool,
}

impl Ctx {
    fn new(cli: &Cli, config: Config) -> Self {
        let format = cli.format.unwrap_or(match config.output_format {
            config::OutputFormat::Human => OutputFormat::Human,
            config::OutputFormat::Json => OutputFormat::Json,
            config::OutputFormat::Quiet => OutputFormat::Quiet,
        });
        let quiet = cli.quiet || format == OutputFormat::Quiet;
        Self {
            config,
            format,
            quiet,
            show_progress: !quiet && format == OutputFormat::Human,
        }
    }

    fn human(&self) -> bool {
        self.format == OutputFormat::Human && !self.quiet
    }
}

// ─── Scan ─────────────────────────────────────────────────────────────────────

fn cmd_scan(
    ctx: &Ctx,
    roots: &[PathBuf],
    by: ScanBy,
    ext: Option<&[String]>,
    all_files: bool,
    output_path: Option<&Path>,
    detailed: bool,
) -> Result<()> {
    for root in roots {
        if !root.exists() {
            anyhow::bail!("Path does not exist: {}", root.display());
        }
    }

    let strategy = match by {
        ScanBy::Hash => ScanStrategy::Hash,
        ScanBy::Name => ScanStrategy::Filename,
        ScanBy::Dir => ScanStrategy::Fingerprint,
    };

    if ctx.human() {
        println!();
        for root in roots {
            println!(
                "  {} Scanning for duplicates in: {}",
                "🔍",
                format::format_path(root).cyan()
            );
        }
    }

    let mut scan_config = ScanConfig::new(roots.to_vec(), strategy);
    scan_config.chunk_size = ctx.config.hash_chunk_bytes();
    scan_config.show_progress = ctx.show_progress;
    if strategy != ScanStrategy::Fingerprint && !all_files {
        scan_config = scan_config.with_extensions(match ext {
            Some(list) => config::normalize_extensions(list),
            None => ctx.config.video_set(),
        });
    }

    let report = duplicates::scan(&scan_config)?;

    if let Some(path) = output_path {
        report.save(path)?;
        if ctx.human() {
            println!(
                "  {} Report written to {}",
                "💾",
                format::format_path(path).cyan()
            );
        }
    }

    match ctx.format {
        OutputFormat::Json => output::print_json(&report),
        _ if ctx.quiet => output::print_scan_quiet(&report),
        _ => output::print_scan_report(&report, detailed),
    }
    Ok(())
}

// ─── Resolve ──────────────────────────────────────────────────────────────────

fn cmd_resolve(
    ctx: &Ctx,
    report_path: &Path,
    execute: bool,
    preferred_root: Option<PathBuf>,
    quarantine: Option<PathBuf>,
    force_diff_size: bool,
    yes: bool,
) -> Result<()> {
    let report = DuplicateReport::load(report_path)?;

    let quarantine_dir = quarantine
        .or_else(|| ctx.config.quarantine_dir.clone())
        .unwrap_or_else(|| default_quarantine(&report));
    let policy = ResolvePolicy {
        preferred_root: preferred_root.or_else(|| ctx.config.preferred_root.clone()),
        quarantine_dir,
        allow_size_mismatch: force_diff_size,
    };

    let plan = duplicates::resolve(&report, &policy, true);
    if !execute || plan.planned.is_empty() {
        print_resolve(ctx, &plan);
        return Ok(());
    }

    if !yes {
        if ctx.human() {
            output::print_resolve_outcome(&plan);
        }
        let question = format!(
            "Delete or move {} from {}?",
            format::format_count(plan.planned.len(), "file"),
            format::format_count(plan.groups, "group"),
        );
        if !output::confirm(&question)? {
            output::print_cancelled();
            return Ok(());
        }
    }

    let outcome = duplicates::resolve(&report, &policy, false);
    outcome.to_action_log().save();
    print_resolve(ctx, &outcome);
    Ok(())
}

/// `dump/` next to the first scanned root, like the scanner's parent directory
fn default_quarantine(report: &DuplicateReport) -> PathBuf {
    report
        .roots
        .first()
        .and_then(|root| root.parent())
        .map(|parent| parent.join("dump"))
        .unwrap_or_else(|| Config::data_dir().join("dump"))
}

fn print_resolve(ctx: &Ctx, outcome: &duplicates::ResolveOutcome) {
    match ctx.format {
        OutputFormat::Json => output::print_json(outcome),
        _ if ctx.quiet => println!(
            "{}  {}  {}  {}",
            outcome.deleted,
            outcome.quarantined,
            format::format_size(outcome.freed_bytes),
            outcome.failed
        ),
        _ => output::print_resolve_outcome(outcome),
    }
}

// ─── Prune ────────────────────────────────────────────────────────────────────

fn cmd_prune(
    ctx: &Ctx,
    source: &Path,
    target: &Path,
    min_video_mb: Option<u64>,
    yes: bool,
) -> Result<()> {
    // Refuse bad arguments before asking anything
    pruner::check_roots(source, target)?;

    let mut prune_config =
        PruneConfig::from_config(source.to_path_buf(), target.to_path_buf(), &ctx.config);
    if let Some(mb) = min_video_mb {
        prune_config.min_video_bytes = mb * 1024 * 1024;
    }
    prune_config.show_progress = ctx.show_progress;

    if !yes {
        let question = format!(
            "Prune {}? Images and videos of {} or more move to {}; everything else is PERMANENTLY DELETED.",
            format::format_path(source),
            format::format_size(prune_config.min_video_bytes),
            format::format_path(target),
        );
        if !output::confirm(&question)? {
            output::print_cancelled();
            return Ok(());
        }
    }

    let report = pruner::prune(&prune_config)?;
    if let Some(log) = &report.log {
        log.save();
    }

    match ctx.format {
        OutputFormat::Json => output::print_json(&report),
        _ if ctx.quiet => output::print_prune_quiet(&report),
        _ => output::print_prune_report(&report, prune_config.min_video_bytes),
    }
    Ok(())
}

// ─── Sweep ────────────────────────────────────────────────────────────────────

fn cmd_sweep(
    ctx: &Ctx,
    stage: &str,
    dir: &Path,
    targets: &[Target],
    dry_run: bool,
    yes: bool,
) -> Result<()> {
    if targets.is_empty() {
        if ctx.human() {
            println!("  {} Nothing to remove in {}", "✨", format::format_path(dir));
        }
        return Ok(());
    }

    let total: u64 = targets.iter().map(|t| t.size).sum();
    if ctx.human() {
        let paths: Vec<PathBuf> = targets.iter().map(|t| t.path.clone()).collect();
        output::print_sweep_preview(stage, &paths, total);
    }

    let mode = if dry_run {
        CleanMode::DryRun
    } else {
        CleanMode::HardDelete
    };

    if mode == CleanMode::HardDelete && !yes {
        let question = format!(
            "PERMANENTLY DELETE {} ({})?",
            format::format_count(targets.len(), "file"),
            format::format_size(total)
        );
        if !output::confirm(&question)? {
            output::print_cancelled();
            return Ok(());
        }
    }

    let mut report = cleaner::clean_files(stage, targets, mode, ctx.show_progress);
    if let Some(log) = report.log.as_mut() {
        log.root = Some(dir.to_path_buf());
    }
    report.save_log();
    print_sweep(ctx, &[report]);
    Ok(())
}

fn cmd_empty_dirs(ctx: &Ctx, dir: &Path, dry_run: bool, yes: bool) -> Result<()> {
    cleaner::engine::ensure_sweepable(dir)?;
    let dirs = cleaner::find_empty_dirs(dir);
    if dirs.is_empty() {
        if ctx.human() {
            println!("  {} No empty directories in {}", "✨", format::format_path(dir));
        }
        return Ok(());
    }

    if ctx.human() {
        output::print_sweep_preview("empty-dirs", &dirs, 0);
    }
    let mode = if dry_run {
        CleanMode::DryRun
    } else {
        CleanMode::HardDelete
    };
    if mode == CleanMode::HardDelete && !yes {
        let question = format!("Remove {}?", format::format_count(dirs.len(), "directory"));
        if !output::confirm(&question)? {
            output::print_cancelled();
            return Ok(());
        }
    }

    let report = cleaner::remove_empty_dirs(&dirs, mode);
    report.save_log();
    print_sweep(ctx, &[report]);
    Ok(())
}

fn cmd_clean_all(ctx: &Ctx, dir: &Path, dry_run: bool, yes: bool) -> Result<()> {
    let mode = if dry_run {
        CleanMode::DryRun
    } else {
        CleanMode::HardDelete
    };

    if mode == CleanMode::HardDelete && !yes {
        let question = format!(
            "Delete videos under {}, {} files and empty directories in {}?",
            format::format_size(ctx.config.small_video_bytes()),
            ctx.config.junk_extensions.join("/"),
            format::format_path(dir)
        );
        if !output::confirm(&question)? {
            output::print_cancelled();
            return Ok(());
        }
    }

    let reports = cleaner::run_all(dir, &ctx.config, mode)
        .with_context(|| format!("Sweep failed for {}", dir.display()))?;
    for report in &reports {
        report.save_log();
    }
    print_sweep(ctx, &reports);
    Ok(())
}

fn print_sweep(ctx: &Ctx, reports: &[SweepReport]) {
    match ctx.format {
        OutputFormat::Json => output::print_json(&reports),
        _ if ctx.quiet => output::print_sweep_quiet(reports),
        _ => output::print_sweep_reports(reports),
    }
}

// ─── Config ───────────────────────────────────────────────────────────────────

fn cmd_config(action: &ConfigAction, path: &Path) -> Result<()> {
    match action {
        ConfigAction::Init => {
            Config::init_dirs()?;
            if path.exists() {
                println!(
                    "  {} Config already exists at {}",
                    "ℹ️",
                    format::format_path(path)
                );
            } else {
                Config::default().save_to(path)?;
                println!(
                    "  {} treesweep initialized at {}",
                    "✓".green(),
                    format::format_path(path)
                );
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = Config::load_from(path)?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        ConfigAction::Reset => {
            Config::default().save_to(path)?;
            println!("  {} Configuration reset to defaults", "✓".green());
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}
