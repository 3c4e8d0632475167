use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Outcome of placing a file at a destination
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    /// Where the file actually ended up
    pub destination: PathBuf,
    /// Whether the requested name was taken and a suffix was added
    pub renamed: bool,
}

/// Find a free path next to `dest`: `name_1.ext`, `name_2.ext`, ...
pub fn resolve_collision(dest: &Path) -> PathBuf {
    let parent = dest.parent().unwrap_or_else(|| Path::new(""));
    let stem = dest
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = dest.extension().map(|e| e.to_string_lossy().to_string());

    let mut counter: u64 = 1;
    loop {
        let name = match &ext {
            Some(ext) => format!("{}_{}.{}", stem, counter, ext),
            None => format!("{}_{}", stem, counter),
        };
        let candidate = parent.join(name);
        if !exists_no_follow(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Append a suffix to the file stem: `clip.mp4` + `2024` -> `clip_2024.mp4`
pub fn with_stem_suffix(file_name: &Path, suffix: &str) -> PathBuf {
    let stem = file_name
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    match file_name.extension() {
        Some(ext) => PathBuf::from(format!("{}_{}.{}", stem, suffix, ext.to_string_lossy())),
        None => PathBuf::from(format!("{}_{}", stem, suffix)),
    }
}

/// Move `source` to `dest`, never overwriting: an occupied destination gets
/// a numeric suffix. Parent directories of the destination are created.
pub fn move_file(source: &Path, dest: &Path) -> Result<MoveOutcome> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let (destination, renamed) = if exists_no_follow(dest) {
        (resolve_collision(dest), true)
    } else {
        (dest.to_path_buf(), false)
    };

    // Try rename first (fast, same filesystem)
    if std::fs::rename(source, &destination).is_err() {
        // Fallback: copy then delete (cross-filesystem)
        std::fs::copy(source, &destination).with_context(|| {
            format!(
                "Failed to copy '{}' to '{}'",
                source.display(),
                destination.display()
            )
        })?;
        if let Err(e) = std::fs::remove_file(source) {
            // Leave exactly one copy behind
            let _ = std::fs::remove_file(&destination);
            return Err(e).with_context(|| {
                format!(
                    "Copied but failed to remove original: {}",
                    source.display()
                )
            });
        }
    }

    Ok(MoveOutcome {
        destination,
        renamed,
    })
}

/// Delete a file, or a directory recursively. Symlinks are removed, never followed.
pub fn remove_path(path: &Path) -> Result<()> {
    let meta = std::fs::symlink_metadata(path)
        .with_context(|| format!("Failed to stat: {}", path.display()))?;

    if meta.is_dir() {
        std::fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
    } else {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove file: {}", path.display()))?;
    }
    Ok(())
}

/// `Path::exists` follows symlinks; a dangling link still occupies its name.
pub fn exists_no_follow(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}

/// Whether a directory has no entries. Unreadable directories count as non-empty.
pub fn is_dir_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
