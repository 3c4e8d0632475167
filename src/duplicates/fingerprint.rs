use anyhow::{Context, Result};
use md5::{Digest, Md5};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::hasher;

/// Fingerprint of one directory subtree
#[derive(Debug, Clone, PartialEq)]
pub struct DirFingerprint {
    pub path: PathBuf,
    pub digest: String,
    /// Total bytes of the files beneath the directory
    pub total_size: u64,
    /// Files and subdirectories beneath the directory
    pub entry_count: usize,
}

/// Fingerprints for every complete, non-empty directory under a root
#[derive(Debug, Default)]
pub struct FingerprintIndex {
    pub dirs: Vec<DirFingerprint>,
    pub files_hashed: usize,
    pub errors: Vec<String>,
}

/// In-memory snapshot of a directory tree; listings are materialized and
/// sorted before any hashing happens.
enum Node {
    File {
        name: String,
        path: PathBuf,
        size: u64,
    },
    /// Symlinks are recorded by their target, never followed
    Link {
        name: String,
        target: String,
    },
    Dir {
        name: String,
        path: PathBuf,
        children: Vec<Node>,
        readable: bool,
    },
}

/// Entries of a subtree relative to its top directory
struct Subtree {
    entries: Vec<String>,
    size: u64,
    complete: bool,
}

/// Compute the fingerprint of a single directory.
/// Fails if any file or directory beneath it cannot be read.
pub fn dir_fingerprint(dir: &Path, chunk_size: usize) -> Result<String> {
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {}", dir.display());
    }
    let mut errors = Vec::new();
    let tree = snapshot(dir, name_of(dir), &mut errors);
    let digests = hash_files(&tree, chunk_size, &mut errors);

    let mut index = FingerprintIndex::default();
    let subtree = compose(&tree, &digests, &mut index);
    if !subtree.complete || !errors.is_empty() {
        anyhow::bail!(
            "Incomplete fingerprint for '{}': {}",
            dir.display(),
            errors.join("; ")
        );
    }
    Ok(digest_entries(subtree.entries))
}

/// Fingerprint every directory under `root` (the root included) in one
/// post-order pass. Every file is hashed exactly once.
pub fn fingerprint_tree(root: &Path, chunk_size: usize) -> FingerprintIndex {
    let mut errors = Vec::new();
    let tree = snapshot(root, name_of(root), &mut errors);
    let digests = hash_files(&tree, chunk_size, &mut errors);

    let mut index = FingerprintIndex {
        files_hashed: digests.values().filter(|d| d.is_some()).count(),
        ..Default::default()
    };
    compose(&tree, &digests, &mut index);
    index.errors = errors;
    index
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn snapshot(dir: &Path, name: String, errors: &mut Vec<String>) -> Node {
    let mut children = Vec::new();

    let listing = std::fs::read_dir(dir)
        .with_context(|| format!("Cannot access directory: {}", dir.display()));
    let entries = match listing {
        Ok(entries) => entries,
        Err(e) => {
            warn!("{:#}", e);
            errors.push(format!("{:#}", e));
            return Node::Dir {
                name,
                path: dir.to_path_buf(),
                children,
                readable: false,
            };
        }
    };

    let mut readable = true;
    let mut sorted = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => sorted.push(entry),
            Err(e) => {
                warn!("Cannot list entry in {}: {}", dir.display(), e);
                errors.push(format!("Cannot list entry in {}: {}", dir.display(), e));
                readable = false;
            }
        }
    }
    sorted.sort_by_key(|e| e.file_name());

    for entry in sorted {
        let path = entry.path();
        let child_name = entry.file_name().to_string_lossy().to_string();
        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(e) => {
                errors.push(format!("Cannot stat {}: {}", path.display(), e));
                readable = false;
                continue;
            }
        };

        if file_type.is_symlink() {
            match std::fs::read_link(&path) {
                Ok(target) => {
                    debug!(path = %path.display(), "symlink recorded by target");
                    children.push(Node::Link {
                        name: child_name,
                        target: target.to_string_lossy().to_string(),
                    });
                }
                Err(e) => {
                    errors.push(format!("Cannot read link {}: {}", path.display(), e));
                    readable = false;
                }
            }
        } else if file_type.is_dir() {
            children.push(snapshot(&path, child_name, errors));
        } else if file_type.is_file() {
            match entry.metadata() {
                Ok(meta) => children.push(Node::File {
                    name: child_name,
                    path,
                    size: meta.len(),
                }),
                Err(e) => {
                    errors.push(format!("Cannot stat {}: {}", path.display(), e));
                    readable = false;
                }
            }
        }
    }

    Node::Dir {
        name,
        path: dir.to_path_buf(),
        children,
        readable,
    }
}

fn collect_files<'a>(node: &'a Node, out: &mut Vec<&'a Path>) {
    match node {
        Node::File { path, .. } => out.push(path),
        Node::Link { .. } => {}
        Node::Dir { children, .. } => {
            for child in children {
                collect_files(child, out);
            }
        }
    }
}

fn hash_files(
    tree: &Node,
    chunk_size: usize,
    errors: &mut Vec<String>,
) -> BTreeMap<PathBuf, Option<String>> {
    let mut files = Vec::new();
    collect_files(tree, &mut files);
    let paths: Vec<PathBuf> = files.into_iter().map(Path::to_path_buf).collect();

    hasher::hash_paths(&paths, chunk_size)
        .into_iter()
        .map(|(path, digest)| match digest {
            Ok(d) => (path, Some(d)),
            Err(e) => {
                warn!("Skipping unreadable file: {:#}", e);
                errors.push(format!("{:#}", e));
                (path, None)
            }
        })
        .collect()
}

fn compose(
    node: &Node,
    digests: &BTreeMap<PathBuf, Option<String>>,
    index: &mut FingerprintIndex,
) -> Subtree {
    let Node::Dir {
        path,
        children,
        readable,
        ..
    } = node
    else {
        return Subtree {
            entries: Vec::new(),
            size: 0,
            complete: true,
        };
    };

    let mut subtree = Subtree {
        entries: Vec::new(),
        size: 0,
        complete: *readable,
    };

    for child in children {
        match child {
            Node::File {
                name,
                path: file_path,
                size,
            } => match digests.get(file_path).and_then(|d| d.as_deref()) {
                Some(digest) => {
                    subtree.entries.push(format!("{}\0{}", name, digest));
                    subtree.size += size;
                }
                None => subtree.complete = false,
            },
            Node::Link { name, target } => {
                subtree.entries.push(format!("{}@{}", name, target));
            }
            Node::Dir { name, .. } => {
                let nested = compose(child, digests, index);
                subtree.entries.push(format!("{}/", name));
                subtree
                    .entries
                    .extend(nested.entries.into_iter().map(|e| format!("{}/{}", name, e)));
                subtree.size += nested.size;
                subtree.complete &= nested.complete;
            }
        }
    }

    if subtree.entries.is_empty() {
        return subtree;
    }

    if subtree.complete {
        index.dirs.push(DirFingerprint {
            path: path.clone(),
            digest: digest_entries(subtree.entries.clone()),
            total_size: subtree.size,
            entry_count: subtree.entries.len(),
        });
    } else {
        warn!(
            "Excluding '{}' from directory matching: contents not fully readable",
            path.display()
        );
    }
    subtree
}

/// Sort the entry sequence and digest its concatenation
fn digest_entries(mut entries: Vec<String>) -> String {
    entries.sort();
    let mut hasher = Md5::new();
    for entry in &entries {
        hasher.update(entry.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}
