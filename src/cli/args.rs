use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// treesweep: duplicate finder, tree pruner and media sweeper
#[derive(Parser, Debug)]
#[command(
    name = "treesweep",
    version,
    about = "Find duplicates, prune media trees and sweep junk files",
    long_about = "treesweep finds duplicate files and directories, resolves them with a\n\
                   keep/delete policy, prunes trees down to large videos and images,\n\
                   and sweeps small videos, junk files and empty directories.",
    after_help = "EXAMPLES:\n  \
        treesweep scan /mnt/a /mnt/b -o dupes.json      Content duplicates among videos\n  \
        treesweep scan /mnt/a --by name --all-files     Same-name files\n  \
        treesweep scan /mnt/a --by dir                  Identical directories\n  \
        treesweep resolve dupes.json                    Preview what would be removed\n  \
        treesweep resolve dupes.json --execute -y       Apply the keep/delete policy\n  \
        treesweep prune ~/Downloads/raw /mnt/keep       Keep big videos and images\n  \
        treesweep small-videos /mnt/a --size 50         Delete videos under 50 MB\n  \
        treesweep junk /mnt/a --dry-run                 Preview junk removal\n  \
        treesweep clean-all /mnt/a                      Run every sweep in order\n  \
        treesweep extensions /mnt/a                     List extensions present"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (defaults to the configured format)
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode, minimal output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Use this config file instead of ~/.treesweep/config.toml
    #[arg(long, global = true, value_name = "FILE", env = "TREESWEEP_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find duplicate files or directories
    Scan {
        /// Directories to scan
        #[arg(required = true)]
        roots: Vec<PathBuf>,

        /// Grouping key
        #[arg(long, default_value = "hash")]
        by: ScanBy,

        /// Only consider these extensions (default: configured video extensions)
        #[arg(long, value_delimiter = ',')]
        ext: Option<Vec<String>>,

        /// Consider every file regardless of extension
        #[arg(long, conflicts_with = "ext")]
        all_files: bool,

        /// Write the report to this JSON file
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Show individual paths in each group
        #[arg(long)]
        detailed: bool,
    },

    /// Apply the keep/delete policy to a saved report
    Resolve {
        /// Report written by `scan --output`
        #[arg(default_value = "duplicates.json")]
        report: PathBuf,

        /// Actually delete and move files (otherwise a dry run)
        #[arg(long)]
        execute: bool,

        /// Copies under this directory are kept first
        #[arg(long, value_name = "DIR")]
        preferred_root: Option<PathBuf>,

        /// Where same-name duplicates are moved to
        #[arg(long, value_name = "DIR")]
        quarantine: Option<PathBuf>,

        /// Resolve same-name groups even when sizes differ
        #[arg(long)]
        force_diff_size: bool,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Keep large videos and images (moved to TARGET), delete everything else
    Prune {
        /// Tree to prune
        source: PathBuf,

        /// Where kept files are moved, mirroring their relative paths
        target: PathBuf,

        /// Minimum size of a kept video in MB (default: configured value)
        #[arg(long, value_name = "MB")]
        min_video_mb: Option<u64>,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Delete videos below a size threshold
    SmallVideos {
        dir: PathBuf,

        /// Threshold in MB (default: configured value)
        #[arg(long, value_name = "MB")]
        size: Option<u64>,

        #[arg(long)]
        dry_run: bool,

        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Delete files with junk extensions (.txt, .url, .html, ...)
    Junk {
        dir: PathBuf,

        /// Extensions to remove (default: configured junk extensions)
        #[arg(long, value_delimiter = ',')]
        ext: Option<Vec<String>>,

        #[arg(long)]
        dry_run: bool,

        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Delete images whose name contains a keyword
    KeywordImages {
        dir: PathBuf,

        /// Keywords to match (default: configured keywords)
        #[arg(long, value_delimiter = ',')]
        keyword: Option<Vec<String>>,

        #[arg(long)]
        dry_run: bool,

        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Remove empty directories, deepest first
    EmptyDirs {
        dir: PathBuf,

        #[arg(long)]
        dry_run: bool,

        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Small videos, then junk files, then empty directories
    CleanAll {
        dir: PathBuf,

        #[arg(long)]
        dry_run: bool,

        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// List the file extensions present under a directory
    Extensions { dir: PathBuf },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Initialize treesweep directories and default config
    Init,

    /// Reset to default configuration
    Reset,

    /// Print the config file location
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Quiet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScanBy {
    /// Same size and content
    Hash,
    /// Same file name
    Name,
    /// Identical directory trees
    Dir,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
