use std::path::Path;

use super::errors::SweepError;

/// Paths that must NEVER be swept, pruned, or deleted wholesale.
const PROTECTED_PATHS: &[&str] = &[
    "/",
    "/bin",
    "/boot",
    "/dev",
    "/etc",
    "/home",
    "/lib",
    "/mnt",
    "/opt",
    "/proc",
    "/root",
    "/sbin",
    "/sys",
    "/usr",
    "/var",
    "/Applications",
    "/Library",
    "/System",
    "/Users",
    "/Volumes",
];

/// Home entries that must never be used as a root. Media folders such as
/// `~/Videos` are valid prune and sweep roots.
const PROTECTED_HOME_DIRS: &[&str] = &[
    "", // home dir itself
    ".ssh",
    ".gnupg",
];

/// Check if a path is protected and should NEVER be removed or used as a sweep root
pub fn is_protected(path: &Path) -> bool {
    if PROTECTED_PATHS.iter().any(|p| path == Path::new(p)) {
        return true;
    }

    if let Some(home) = dirs::home_dir() {
        // Roots arrive canonicalized; $HOME may be spelled through a symlink
        let canonical = std::fs::canonicalize(&home).unwrap_or_else(|_| home.clone());
        return [home, canonical].iter().any(|base| {
            PROTECTED_HOME_DIRS
                .iter()
                .any(|dir| path == base.join(dir).components().as_path())
        });
    }

    false
}

/// Fail fast when a sweep root is protected
pub fn ensure_not_protected(path: &Path) -> Result<(), SweepError> {
    if is_protected(path) {
        return Err(SweepError::ProtectedPath {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
