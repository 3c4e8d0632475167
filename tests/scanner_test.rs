use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use treesweep::common::config::normalize_extensions;
use treesweep::duplicates::{
    resolve, scan, DuplicateReport, GroupKind, ResolvePolicy, ScanConfig, ScanStrategy,
};

fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    path
}

fn videos() -> BTreeSet<String> {
    normalize_extensions(&["mp4", "mkv"])
}

// ─── Hash strategy ───────────────────────────────────────────────────────────

#[test]
fn test_hash_scan_groups_identical_content() {
    let dir = TempDir::new().unwrap();
    let x = write(dir.path(), "x/1.mp4", b"identical video bytes");
    let y = write(dir.path(), "y/1.mp4", b"identical video bytes");
    write(dir.path(), "z/2.mp4", b"different video bytes");

    let config = ScanConfig::new(vec![dir.path().to_path_buf()], ScanStrategy::Hash);
    let report = scan(&config).unwrap();

    assert_eq!(report.kind, GroupKind::Hash);
    assert_eq!(report.files_scanned, 3);
    assert_eq!(report.total_groups(), 1);
    let group = report.groups.values().next().unwrap();
    let paths: Vec<&PathBuf> = group.members.iter().map(|m| &m.path).collect();
    assert_eq!(paths, vec![&x, &y]);
    assert_eq!(group.size, 21);
}

#[test]
fn test_hash_scan_same_size_different_content() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.mp4", b"aaaa");
    write(dir.path(), "b.mp4", b"bbbb");

    let config = ScanConfig::new(vec![dir.path().to_path_buf()], ScanStrategy::Hash);
    assert_eq!(scan(&config).unwrap().total_groups(), 0);
}

#[test]
fn test_hash_scan_ignores_empty_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.mp4", b"");
    write(dir.path(), "b.mp4", b"");

    let config = ScanConfig::new(vec![dir.path().to_path_buf()], ScanStrategy::Hash);
    assert_eq!(scan(&config).unwrap().total_groups(), 0);
}

#[test]
fn test_extension_filter() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.MP4", b"same");
    write(dir.path(), "b.mkv", b"same");
    write(dir.path(), "c.txt", b"same");

    let config = ScanConfig::new(vec![dir.path().to_path_buf()], ScanStrategy::Hash)
        .with_extensions(videos());
    let report = scan(&config).unwrap();
    assert_eq!(report.files_scanned, 2);
    assert_eq!(report.groups.values().next().unwrap().members.len(), 2);
}

#[test]
fn test_overlapping_roots_record_paths_once() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "x/1.mp4", b"one copy");
    write(dir.path(), "x/sub/1.mp4", b"one copy");

    let config = ScanConfig::new(
        vec![dir.path().to_path_buf(), dir.path().join("x"), dir.path().join("x/sub")],
        ScanStrategy::Hash,
    );
    let report = scan(&config).unwrap();
    assert_eq!(report.files_scanned, 2);
    assert_eq!(report.groups.values().next().unwrap().members.len(), 2);
}

#[test]
fn test_missing_root_is_skipped() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a/1.mp4", b"dup");
    write(dir.path(), "a/2.mp4", b"dup");

    let config = ScanConfig::new(
        vec![dir.path().join("a"), dir.path().join("missing")],
        ScanStrategy::Hash,
    );
    let report = scan(&config).unwrap();
    assert_eq!(report.roots, vec![std::fs::canonicalize(dir.path().join("a")).unwrap()]);
    assert_eq!(report.total_groups(), 1);
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_not_followed() {
    let dir = TempDir::new().unwrap();
    let real = write(dir.path(), "real.mp4", b"content");
    std::os::unix::fs::symlink(&real, dir.path().join("link.mp4")).unwrap();

    let config = ScanConfig::new(vec![dir.path().to_path_buf()], ScanStrategy::Hash);
    let report = scan(&config).unwrap();
    assert_eq!(report.files_scanned, 1);
    assert_eq!(report.total_groups(), 0);
}

#[cfg(unix)]
#[test]
fn test_root_given_twice_through_symlink_is_scanned_once() {
    let dir = TempDir::new().unwrap();
    let only = write(dir.path(), "movies/only.mp4", b"the only copy");
    std::os::unix::fs::symlink(dir.path().join("movies"), dir.path().join("alias")).unwrap();

    for strategy in [ScanStrategy::Hash, ScanStrategy::Filename, ScanStrategy::Fingerprint] {
        let config = ScanConfig::new(
            vec![dir.path().join("movies"), dir.path().join("alias")],
            strategy,
        );
        let report = scan(&config).unwrap();
        assert_eq!(report.roots.len(), 1, "{:?}", strategy);
        assert_eq!(report.total_groups(), 0, "{:?}", strategy);
    }

    let config = ScanConfig::new(
        vec![dir.path().join("alias"), dir.path().join("movies")],
        ScanStrategy::Hash,
    );
    let report = scan(&config).unwrap();
    let outcome = resolve(&report, &ResolvePolicy::new(dir.path().join("dump")), false);
    assert_eq!(outcome.deleted, 0);
    assert!(only.exists());
}

#[test]
fn test_differently_spelled_root_is_scanned_once() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "movies/only.mp4", b"the only copy");

    let config = ScanConfig::new(
        vec![dir.path().join("movies"), dir.path().join("movies/../movies/.")],
        ScanStrategy::Hash,
    );
    let report = scan(&config).unwrap();
    assert_eq!(report.files_scanned, 1);
    assert_eq!(report.total_groups(), 0);
}

// ─── Filename strategy ───────────────────────────────────────────────────────

#[test]
fn test_name_scan_groups_by_base_name() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "x/1.mp4", b"same");
    write(dir.path(), "y/1.mp4", b"other content entirely");
    write(dir.path(), "y/2.mp4", b"same");

    let config = ScanConfig::new(vec![dir.path().to_path_buf()], ScanStrategy::Filename);
    let report = scan(&config).unwrap();

    assert_eq!(report.kind, GroupKind::Filename);
    assert_eq!(report.total_groups(), 1);
    let group = &report.groups["1.mp4"];
    assert_eq!(group.members.len(), 2);
    assert!(!group.sizes_agree());
    assert_eq!(group.members[0].filename.as_deref(), Some("1.mp4"));
}

#[test]
fn test_name_scan_across_roots() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "left/clip.mkv", b"a");
    write(dir.path(), "right/deep/clip.mkv", b"a");

    let config = ScanConfig::new(
        vec![dir.path().join("right"), dir.path().join("left")],
        ScanStrategy::Filename,
    );
    let report = scan(&config).unwrap();
    let group = &report.groups["clip.mkv"];
    assert_eq!(group.members[0].path, dir.path().join("left/clip.mkv"));
}

// ─── Fingerprint strategy ────────────────────────────────────────────────────

#[test]
fn test_dir_scan_finds_identical_trees() {
    let dir = TempDir::new().unwrap();
    for top in ["one", "two"] {
        write(dir.path(), &format!("{}/season/e1.mkv", top), b"episode one");
        write(dir.path(), &format!("{}/season/e2.mkv", top), b"episode two");
        write(dir.path(), &format!("{}/notes.txt", top), b"notes");
    }
    write(dir.path(), "three/season/e1.mkv", b"episode one");

    let config = ScanConfig::new(vec![dir.path().to_path_buf()], ScanStrategy::Fingerprint);
    let report = scan(&config).unwrap();
    assert_eq!(report.kind, GroupKind::Fingerprint);

    let groups: Vec<Vec<PathBuf>> = report
        .groups
        .values()
        .map(|g| g.members.iter().map(|m| m.path.clone()).collect())
        .collect();
    assert!(groups.contains(&vec![dir.path().join("one"), dir.path().join("two")]));
    assert!(groups.contains(&vec![
        dir.path().join("one/season"),
        dir.path().join("two/season"),
    ]));
    assert!(!groups.iter().flatten().any(|p| p.starts_with(dir.path().join("three"))));
}

#[cfg(unix)]
#[test]
fn test_dir_scan_separates_trees_differing_by_a_link() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "one/season/e1.mkv", b"episode one");
    write(dir.path(), "two/season/e1.mkv", b"episode one");
    write(dir.path(), "store/e2.mkv", b"episode two");
    std::os::unix::fs::symlink(
        dir.path().join("store/e2.mkv"),
        dir.path().join("two/season/e2.mkv"),
    )
    .unwrap();

    let config = ScanConfig::new(
        vec![dir.path().join("one"), dir.path().join("two")],
        ScanStrategy::Fingerprint,
    );
    let report = scan(&config).unwrap();
    assert_eq!(report.total_groups(), 0);
    assert_eq!(report.files_scanned, 2);
}

#[test]
fn test_dir_scan_ignores_empty_directories() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("e1")).unwrap();
    std::fs::create_dir_all(dir.path().join("e2")).unwrap();

    let config = ScanConfig::new(vec![dir.path().to_path_buf()], ScanStrategy::Fingerprint);
    assert_eq!(scan(&config).unwrap().total_groups(), 0);
}

// ─── Report round-trip ───────────────────────────────────────────────────────

#[test]
fn test_report_save_and_load() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "data/x/1.mp4", b"dup bytes");
    write(dir.path(), "data/y/1.mp4", b"dup bytes");

    let config = ScanConfig::new(vec![dir.path().join("data")], ScanStrategy::Hash);
    let report = scan(&config).unwrap();

    let path = dir.path().join("reports/dupes.json");
    report.save(&path).unwrap();
    let loaded = DuplicateReport::load(&path).unwrap();

    assert_eq!(loaded, report);
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"digest\""));
    assert!(!raw.contains("\"filename\""));
}

#[test]
fn test_scans_are_deterministic() {
    let dir = TempDir::new().unwrap();
    for i in 0..5 {
        write(dir.path(), &format!("a/{}.mp4", i), format!("v{}", i % 2).as_bytes());
        write(dir.path(), &format!("b/{}.mp4", i), format!("v{}", i % 2).as_bytes());
    }

    let config = ScanConfig::new(vec![dir.path().to_path_buf()], ScanStrategy::Hash);
    let first = scan(&config).unwrap();
    let second = scan(&config).unwrap();
    assert_eq!(first.groups, second.groups);
}
