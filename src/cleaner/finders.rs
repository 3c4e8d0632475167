use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::common::media::{has_extension, lowercase_extension};

/// A file selected for removal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub path: PathBuf,
    pub size: u64,
}

fn walk(root: &Path) -> impl Iterator<Item = DirEntry> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!("Cannot access entry: {}", e);
                None
            }
        })
}

fn files_matching<F>(root: &Path, mut keep: F) -> Vec<Target>
where
    F: FnMut(&Path, u64) -> bool,
{
    let mut out = Vec::new();
    for entry in walk(root).filter(|e| e.file_type().is_file()) {
        let size = match entry.metadata() {
            Ok(m) => m.len(),
            Err(e) => {
                warn!("Cannot stat {}: {}", entry.path().display(), e);
                continue;
            }
        };
        if keep(entry.path(), size) {
            debug!(path = %entry.path().display(), size, "matched");
            out.push(Target {
                path: entry.path().to_path_buf(),
                size,
            });
        }
    }
    out
}

/// Videos strictly smaller than `threshold` bytes
pub fn find_small_videos(root: &Path, threshold: u64, video_exts: &BTreeSet<String>) -> Vec<Target> {
    files_matching(root, |path, size| {
        has_extension(path, video_exts) && size < threshold
    })
}

/// Files whose extension is in `exts` (case-insensitive)
pub fn find_by_extension(root: &Path, exts: &BTreeSet<String>) -> Vec<Target> {
    files_matching(root, |path, _| has_extension(path, exts))
}

/// Images whose file name contains any of `keywords` (case-insensitive)
pub fn find_images_by_keyword(
    root: &Path,
    keywords: &[String],
    image_exts: &BTreeSet<String>,
) -> Vec<Target> {
    let keywords: Vec<String> = keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return Vec::new();
    }

    files_matching(root, |path, _| {
        if !has_extension(path, image_exts) {
            return false;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        keywords.iter().any(|k| name.contains(k.as_str()))
    })
}

/// Directories that hold nothing but other empty directories, deepest first.
/// The root itself is never returned.
pub fn find_empty_dirs(root: &Path) -> Vec<PathBuf> {
    find_empty_dirs_ignoring(root, &BTreeSet::new())
}

/// Like [`find_empty_dirs`], treating the files in `ignored` as already removed
pub fn find_empty_dirs_ignoring(root: &Path, ignored: &BTreeSet<&Path>) -> Vec<PathBuf> {
    // dir -> still empty candidate
    let mut state: BTreeMap<PathBuf, bool> = BTreeMap::new();
    let mut order: Vec<PathBuf> = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .contents_first(true)
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                // Unreadable: its parent must not be treated as empty
                warn!("Cannot access entry: {}", e);
                if let Some(parent) = e.path().and_then(Path::parent) {
                    state.insert(parent.to_path_buf(), false);
                }
                continue;
            }
        };
        let path = entry.path();

        if entry.file_type().is_dir() {
            let empty = *state.get(path).unwrap_or(&true);
            if entry.depth() > 0 && empty {
                order.push(path.to_path_buf());
            }
            if !empty {
                if let Some(parent) = path.parent() {
                    state.insert(parent.to_path_buf(), false);
                }
            }
            state.remove(path);
        } else if !ignored.contains(path) {
            if let Some(parent) = path.parent() {
                state.insert(parent.to_path_buf(), false);
            }
        }
    }

    order.sort_by(|a, b| {
        b.components()
            .count()
            .cmp(&a.components().count())
            .then_with(|| a.cmp(b))
    });
    order
}

/// Sorted set of the lowercase extensions present under `root`
pub fn list_extensions(root: &Path) -> BTreeSet<String> {
    walk(root)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| lowercase_extension(e.path()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::normalize_extensions;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, bytes: usize) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, vec![b'x'; bytes]).unwrap();
    }

    #[test]
    fn test_small_videos_strictly_below_threshold() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.mp4", 10);
        write(dir.path(), "b.MP4", 5);
        write(dir.path(), "c.txt", 1);
        let found = find_small_videos(dir.path(), 10, &normalize_extensions(&["mp4"]));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, dir.path().join("b.MP4"));
    }

    #[test]
    fn test_keyword_images() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Cover_SAMPLE.jpg", 1);
        write(dir.path(), "holiday.jpg", 1);
        write(dir.path(), "sample.txt", 1);
        let found = find_images_by_keyword(
            dir.path(),
            &["sample".to_string()],
            &normalize_extensions(&["jpg"]),
        );
        assert_eq!(found.len(), 1);
        assert!(found[0].path.ends_with("Cover_SAMPLE.jpg"));
        assert!(find_images_by_keyword(dir.path(), &[], &normalize_extensions(&["jpg"])).is_empty());
    }

    #[test]
    fn test_empty_dirs_deepest_first() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        std::fs::create_dir_all(dir.path().join("keep/empty")).unwrap();
        write(dir.path(), "keep/file.txt", 1);

        let found = find_empty_dirs(dir.path());
        assert_eq!(
            found,
            vec![
                dir.path().join("a/b/c"),
                dir.path().join("a/b"),
                dir.path().join("keep/empty"),
                dir.path().join("a"),
            ]
        );
    }

    #[test]
    fn test_empty_dirs_ignoring_planned_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a/notes.txt", 1);
        let planned = dir.path().join("a/notes.txt");
        let ignored: BTreeSet<&Path> = [planned.as_path()].into_iter().collect();

        assert!(find_empty_dirs(dir.path()).is_empty());
        assert_eq!(
            find_empty_dirs_ignoring(dir.path(), &ignored),
            vec![dir.path().join("a")]
        );
    }

    #[test]
    fn test_root_never_listed() {
        let dir = TempDir::new().unwrap();
        assert!(find_empty_dirs(dir.path()).is_empty());
    }

    #[test]
    fn test_list_extensions() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.MKV", 1);
        write(dir.path(), "sub/b.mkv", 1);
        write(dir.path(), "c.txt", 1);
        write(dir.path(), "README", 1);
        let exts: Vec<String> = list_extensions(dir.path()).into_iter().collect();
        assert_eq!(exts, vec!["mkv", "txt"]);
    }
}
