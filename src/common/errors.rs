use std::path::PathBuf;

use thiserror::Error;

/// Typed errors for treesweep operations.
/// `anyhow` carries these to the CLI; modules use them where the
/// caller needs to tell a fatal configuration problem from a per-item one.
#[derive(Debug, Error)]
pub enum SweepError {
    /// Source root does not exist
    #[error("Source directory '{}' does not exist", path.display())]
    SourceMissing { path: PathBuf },

    /// Source root exists but is a file
    #[error("Source path '{}' is not a directory", path.display())]
    SourceNotDirectory { path: PathBuf },

    /// Target exists and is not a directory
    #[error("Target path '{}' exists and is not a directory", path.display())]
    TargetNotDirectory { path: PathBuf },

    /// Source and target resolve to the same directory
    #[error("Source and target directories must be different ('{}')", path.display())]
    SameDirectory { path: PathBuf },

    /// Target would be created inside the tree being pruned
    #[error(
        "Target directory '{}' must not be inside the source directory '{}'",
        target.display(),
        source_root.display()
    )]
    TargetInsideSource {
        source_root: PathBuf,
        target: PathBuf,
    },

    /// Root-level or home directory that must never be swept
    #[error("Refusing to operate on protected path '{}'", path.display())]
    ProtectedPath { path: PathBuf },

    /// File system operation failed
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Duplicate report could not be read or is malformed
    #[error("Report error in '{}': {message}", path.display())]
    Report { path: PathBuf, message: String },

    /// Configuration file is invalid
    #[error("Config error in '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl SweepError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SweepError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_paths() {
        let err = SweepError::TargetInsideSource {
            source_root: PathBuf::from("/data/src"),
            target: PathBuf::from("/data/src/keep"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/data/src/keep"));
        assert!(msg.contains("inside the source"));
    }

    #[test]
    fn test_io_error_has_source() {
        use std::error::Error as _;
        let err = SweepError::io(
            "/tmp/x",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.source().is_some());
    }
}
