use std::path::{Component, Path, PathBuf};

use crate::common::errors::SweepError;
use crate::common::safety;

/// Check source and target, then create the target.
pub fn validate_roots(source: &Path, target: &Path) -> Result<(PathBuf, PathBuf), SweepError> {
    let (source_abs, target_abs) = check_roots(source, target)?;
    std::fs::create_dir_all(&target_abs).map_err(|e| SweepError::io(&target_abs, e))?;
    Ok((source_abs, target_abs))
}

/// Check source and target without touching the filesystem.
///
/// Returns canonical `(source, target)`. A target that does not exist yet is
/// resolved through its nearest existing ancestor so that symlinked or
/// relative spellings of a path inside the source are still caught.
pub fn check_roots(source: &Path, target: &Path) -> Result<(PathBuf, PathBuf), SweepError> {
    let source_meta = std::fs::metadata(source).map_err(|_| SweepError::SourceMissing {
        path: source.to_path_buf(),
    })?;
    if !source_meta.is_dir() {
        return Err(SweepError::SourceNotDirectory {
            path: source.to_path_buf(),
        });
    }
    if target.exists() && !target.is_dir() {
        return Err(SweepError::TargetNotDirectory {
            path: target.to_path_buf(),
        });
    }

    let source_abs = std::fs::canonicalize(source).map_err(|e| SweepError::io(source, e))?;
    safety::ensure_not_protected(&source_abs)?;
    let target_abs = resolve_lenient(target)?;

    if source_abs == target_abs {
        return Err(SweepError::SameDirectory { path: source_abs });
    }
    if target_abs.starts_with(&source_abs) {
        return Err(SweepError::TargetInsideSource {
            source_root: source_abs,
            target: target_abs,
        });
    }
    Ok((source_abs, target_abs))
}

/// Canonicalize the longest existing prefix of `path` and append the rest
fn resolve_lenient(path: &Path) -> Result<PathBuf, SweepError> {
    for ancestor in path.ancestors() {
        let candidate = if ancestor.as_os_str().is_empty() {
            Path::new(".")
        } else {
            ancestor
        };
        if !candidate.exists() {
            continue;
        }
        let base = std::fs::canonicalize(candidate).map_err(|e| SweepError::io(candidate, e))?;
        let rest = path.strip_prefix(ancestor).unwrap_or(Path::new(""));

        let mut resolved = base;
        for component in rest.components() {
            match component {
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::Normal(part) => resolved.push(part),
                _ => {}
            }
        }
        return Ok(resolved);
    }
    Ok(path.to_path_buf())
}
