use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

use treesweep::common::config::Config;
use treesweep::common::errors::SweepError;
use treesweep::pruner::{prune, PruneConfig};

fn write(root: &Path, rel: &str, bytes: usize) -> PathBuf {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, vec![b'v'; bytes]).unwrap();
    path
}

/// Prune config with a tiny video threshold so tests write small files
fn config(src: &Path, dst: &Path, min_video_bytes: u64) -> PruneConfig {
    let mut c = PruneConfig::new(src.to_path_buf(), dst.to_path_buf());
    c.min_video_bytes = min_video_bytes;
    c
}

fn files_under(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| !e.file_type().is_dir())
        .map(|e| e.path().to_path_buf())
        .collect()
}

#[test]
fn test_default_threshold_is_200_mib() {
    let c = PruneConfig::new(PathBuf::from("/s"), PathBuf::from("/t"));
    assert_eq!(c.min_video_bytes, 200 * 1024 * 1024);
    assert_eq!(Config::default().min_video_bytes(), c.min_video_bytes);
}

#[test]
fn test_mixed_tree() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("s");
    let dst = dir.path().join("t");
    write(&src, "a/movie.mp4", 300);
    write(&src, "a/notes.txt", 5);
    write(&src, "a/b/photo.jpg", 10);
    write(&src, "a/c/clip.mp4", 50);

    let report = prune(&config(&src, &dst, 200)).unwrap();
    let stats = &report.stats;

    assert_eq!(stats.videos_kept, 1);
    assert_eq!(stats.videos_deleted, 1);
    assert_eq!(stats.images_kept, 1);
    assert_eq!(stats.other_deleted, 1);
    assert!(stats.dirs_removed >= 1);
    assert_eq!(stats.failures, 0);
    assert!(report.kept_video_in_root);

    assert!(dst.join("a/movie.mp4").exists());
    assert!(dst.join("a/b/photo.jpg").exists());
    assert!(!dst.join("a/c/clip.mp4").exists());
    assert!(src.exists(), "source root is never removed");
    assert!(files_under(&src).is_empty());
    assert!(!src.join("a/c").exists());
}

#[test]
fn test_image_collision_gets_suffix() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("s");
    let dst = dir.path().join("t");
    write(&src, "photo.jpg", 3);
    write(&dst, "photo.jpg", 7);

    let report = prune(&config(&src, &dst, 200)).unwrap();
    assert_eq!(report.stats.images_kept, 1);
    assert_eq!(report.stats.collisions_resolved, 1);
    assert_eq!(std::fs::read(dst.join("photo.jpg")).unwrap().len(), 7);
    assert_eq!(std::fs::read(dst.join("photo_1.jpg")).unwrap().len(), 3);
}

#[test]
fn test_video_threshold_is_inclusive() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("s");
    let dst = dir.path().join("t");
    write(&src, "exact.mkv", 100);
    write(&src, "under.mkv", 99);

    let report = prune(&config(&src, &dst, 100)).unwrap();
    assert_eq!(report.stats.videos_kept, 1);
    assert_eq!(report.stats.videos_deleted, 1);
    assert!(dst.join("exact.mkv").exists());
}

#[test]
fn test_extensions_are_case_insensitive() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("s");
    let dst = dir.path().join("t");
    write(&src, "x/BIG.MP4", 500);
    write(&src, "x/Pic.JPG", 1);

    let report = prune(&config(&src, &dst, 200)).unwrap();
    assert_eq!(report.stats.videos_kept, 1);
    assert_eq!(report.stats.images_kept, 1);
    assert!(dst.join("x/BIG.MP4").exists());
}

#[test]
fn test_no_kept_video_collapses_everything() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("s");
    let dst = dir.path().join("t");
    write(&src, "d1/d2/readme.md", 3);
    write(&src, "d1/small.mp4", 3);
    std::fs::create_dir_all(src.join("empty")).unwrap();

    let report = prune(&config(&src, &dst, 200)).unwrap();
    assert!(!report.kept_video_in_root);
    assert_eq!(report.stats.other_deleted, 1);
    assert_eq!(report.stats.videos_deleted, 1);
    assert!(report.stats.dirs_removed >= 3);
    assert_eq!(std::fs::read_dir(&src).unwrap().count(), 0);
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_removed_not_followed() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("s");
    let dst = dir.path().join("t");
    let outside = write(dir.path(), "outside/keep.mp4", 500);
    std::fs::create_dir_all(&src).unwrap();
    std::os::unix::fs::symlink(outside.parent().unwrap(), src.join("linkdir")).unwrap();
    std::os::unix::fs::symlink(&outside, src.join("link.mp4")).unwrap();

    let report = prune(&config(&src, &dst, 200)).unwrap();
    assert_eq!(report.stats.other_deleted, 2);
    assert_eq!(report.stats.videos_kept, 0);
    assert!(outside.exists(), "link targets are never touched");
    assert!(!dst.join("link.mp4").exists());
}

#[test]
fn test_invalid_roots_do_not_mutate() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("s");
    write(&src, "a/notes.txt", 1);

    let err = prune(&config(&src, &src.join("inside"), 200)).unwrap_err();
    let sweep = err.downcast_ref::<SweepError>().unwrap();
    assert!(matches!(sweep, SweepError::TargetInsideSource { .. }));
    assert!(src.join("a/notes.txt").exists());

    let err = prune(&config(&src, &src, 200)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SweepError>(),
        Some(SweepError::SameDirectory { .. })
    ));

    let err = prune(&config(&dir.path().join("nope"), &dir.path().join("t"), 200)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SweepError>(),
        Some(SweepError::SourceMissing { .. })
    ));
    assert!(src.join("a/notes.txt").exists());
}

#[cfg(unix)]
#[test]
fn test_failed_move_pins_directory() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let src = dir.path().join("s");
    let dst = dir.path().join("t");
    write(&src, "a/photo.jpg", 4);
    write(&src, "a/junk.txt", 4);

    // Target subtree that cannot receive the image
    std::fs::create_dir_all(dst.join("a")).unwrap();
    std::fs::set_permissions(dst.join("a"), std::fs::Permissions::from_mode(0o555)).unwrap();

    let report = prune(&config(&src, &dst, 200)).unwrap();
    std::fs::set_permissions(dst.join("a"), std::fs::Permissions::from_mode(0o755)).unwrap();

    // Running as root ignores permissions; only check when the move failed
    if report.stats.failures > 0 {
        assert_eq!(report.stats.images_kept, 0);
        assert!(src.join("a/photo.jpg").exists(), "unmoved file must survive");
        assert!(!src.join("a/junk.txt").exists());
        assert!(!report.errors.is_empty());
    } else {
        assert!(dst.join("a/photo.jpg").exists());
    }
}

#[test]
fn test_audit_log_records_moves() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("s");
    let dst = dir.path().join("t");
    write(&src, "a/photo.jpg", 4);
    write(&src, "a/notes.txt", 2);

    let report = prune(&config(&src, &dst, 200)).unwrap();
    let expected = std::fs::canonicalize(&dst).unwrap().join("a/photo.jpg");
    let log = report.log.unwrap();
    assert_eq!(log.operation, "prune");
    assert!(log
        .items
        .iter()
        .any(|i| i.action == "move" && i.destination.as_deref() == Some(expected.as_path())));
    assert!(log.items.iter().any(|i| i.action == "delete"));
}
