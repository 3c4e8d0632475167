use std::path::PathBuf;
use tempfile::TempDir;

use treesweep::duplicates::hasher;
use treesweep::duplicates::FileRecord;

#[test]
fn test_full_hash_identical_files() {
    let dir = TempDir::new().unwrap();
    let content = b"Hello, treesweep! This is test content for hashing.";

    let file1 = dir.path().join("file1.txt");
    let file2 = dir.path().join("file2.txt");
    std::fs::write(&file1, content).unwrap();
    std::fs::write(&file2, content).unwrap();

    let hash1 = hasher::full_hash(&file1).unwrap();
    let hash2 = hasher::full_hash(&file2).unwrap();

    assert_eq!(hash1, hash2, "Identical files should produce identical digests");
}

#[test]
fn test_full_hash_different_files() {
    let dir = TempDir::new().unwrap();

    let file1 = dir.path().join("file1.txt");
    let file2 = dir.path().join("file2.txt");
    std::fs::write(&file1, b"Content A").unwrap();
    std::fs::write(&file2, b"Content B").unwrap();

    let hash1 = hasher::full_hash(&file1).unwrap();
    let hash2 = hasher::full_hash(&file2).unwrap();

    assert_ne!(hash1, hash2, "Different files should produce different digests");
}

#[test]
fn test_known_md5_digest() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("abc.txt");
    std::fs::write(&file, b"abc").unwrap();

    assert_eq!(
        hasher::full_hash(&file).unwrap(),
        "900150983cd24fb0d6963f7d28e17f72"
    );
}

#[test]
fn test_chunk_size_does_not_change_digest() {
    let dir = TempDir::new().unwrap();
    // Spans several 64 KiB chunks with a ragged tail
    let content: Vec<u8> = (0..200_003u32).map(|i| (i % 251) as u8).collect();
    let file = dir.path().join("big.bin");
    std::fs::write(&file, &content).unwrap();

    let default = hasher::full_hash(&file).unwrap();
    for chunk in [1, 7, 4096, 65_536, 1 << 20] {
        assert_eq!(
            hasher::hash_with_chunk_size(&file, chunk).unwrap(),
            default,
            "chunk size {} changed the digest",
            chunk
        );
    }
}

#[test]
fn test_difference_deep_in_file_is_detected() {
    let dir = TempDir::new().unwrap();

    let mut content1 = vec![0u8; 150_000];
    let content2 = content1.clone();
    content1[140_000] = 0xFF;

    let file1 = dir.path().join("file1.bin");
    let file2 = dir.path().join("file2.bin");
    std::fs::write(&file1, &content1).unwrap();
    std::fs::write(&file2, &content2).unwrap();

    assert_ne!(
        hasher::full_hash(&file1).unwrap(),
        hasher::full_hash(&file2).unwrap()
    );
}

#[test]
fn test_hash_nonexistent_file() {
    let result = hasher::full_hash(std::path::Path::new("/nonexistent/file.txt"));
    assert!(result.is_err(), "Hashing a nonexistent file should return an error");
}

#[test]
fn test_group_by_size() {
    let records = vec![
        FileRecord::new(PathBuf::from("/a.txt"), 100),
        FileRecord::new(PathBuf::from("/b.txt"), 100),
        FileRecord::new(PathBuf::from("/c.txt"), 200),
        FileRecord::new(PathBuf::from("/d.txt"), 300),
        FileRecord::new(PathBuf::from("/e.txt"), 300),
        FileRecord::new(PathBuf::from("/f.txt"), 0),
        FileRecord::new(PathBuf::from("/g.txt"), 0),
    ];

    let groups = hasher::group_by_size(&records);

    assert_eq!(groups.len(), 2, "Only shared non-zero sizes should remain");
    assert!(groups.contains_key(&100));
    assert!(groups.contains_key(&300));
    assert!(!groups.contains_key(&200));
    assert!(!groups.contains_key(&0), "Empty files are never compared");
}

#[test]
fn test_group_by_hash_excludes_unreadable() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.bin");
    let b = dir.path().join("b.bin");
    let c = dir.path().join("c.bin");
    std::fs::write(&a, b"same").unwrap();
    std::fs::write(&b, b"same").unwrap();
    std::fs::write(&c, b"diff").unwrap();

    let records = vec![
        FileRecord::new(b.clone(), 4),
        FileRecord::new(a.clone(), 4),
        FileRecord::new(c, 4),
        FileRecord::new(dir.path().join("gone.bin"), 4),
    ];

    let hashed = hasher::group_by_hash(&records, hasher::DEFAULT_CHUNK_SIZE);
    assert_eq!(hashed.groups.len(), 1);
    assert_eq!(hashed.errors.len(), 1);

    let members = hashed.groups.values().next().unwrap();
    let paths: Vec<&PathBuf> = members.iter().map(|m| &m.path).collect();
    assert_eq!(paths, vec![&a, &b], "Members are ordered by path");
    assert!(members.iter().all(|m| m.digest.is_some()));
}
