use anyhow::{Context, Result};
use md5::{Digest, Md5};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::report::FileRecord;

/// Default read chunk (64 KiB). Chunk size never changes the digest.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Compute the full MD5 hash of a file with the default chunk size
pub fn full_hash(path: &Path) -> Result<String> {
    hash_with_chunk_size(path, DEFAULT_CHUNK_SIZE)
}

/// Compute the MD5 hash of a file, reading `chunk_size` bytes at a time.
///
/// MD5 is used for equality testing only; collision resistance is not a
/// property this tool relies on.
pub fn hash_with_chunk_size(path: &Path, chunk_size: usize) -> Result<String> {
    let chunk_size = chunk_size.max(1);
    let file =
        File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
    let mut reader = BufReader::with_capacity(chunk_size, file);
    let mut hasher = Md5::new();

    let mut buffer = vec![0u8; chunk_size];
    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .with_context(|| format!("Failed to read: {}", path.display()))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Group file records by size.
/// Pass 1: files with a unique size cannot have a duplicate, and
/// empty files are never compared.
pub fn group_by_size(files: &[FileRecord]) -> BTreeMap<u64, Vec<FileRecord>> {
    let mut groups: BTreeMap<u64, Vec<FileRecord>> = BTreeMap::new();

    for record in files.iter().filter(|r| r.size > 0) {
        groups.entry(record.size).or_default().push(record.clone());
    }

    groups.retain(|_, v| v.len() > 1);
    groups
}

/// Result of hashing a batch of candidates
#[derive(Debug, Default)]
pub struct HashedGroups {
    /// digest -> members (2+), members ordered by path
    pub groups: BTreeMap<String, Vec<FileRecord>>,
    /// Files that could not be read
    pub errors: Vec<String>,
}

/// Group files by full MD5 hash.
/// Pass 2: confirms byte-for-byte duplicates. Hashing runs on the rayon pool;
/// results land in ordered maps so the outcome never depends on scheduling.
pub fn group_by_hash(files: &[FileRecord], chunk_size: usize) -> HashedGroups {
    let hashed: Vec<(FileRecord, Result<String>)> = files
        .par_iter()
        .map(|record| {
            let digest = hash_with_chunk_size(&record.path, chunk_size);
            (record.clone(), digest)
        })
        .collect();

    let mut out = HashedGroups::default();
    let mut buckets: HashMap<String, Vec<FileRecord>> = HashMap::new();

    for (record, digest) in hashed {
        match digest {
            Ok(digest) => {
                debug!(path = %record.path.display(), %digest, "hashed");
                let record = record.with_digest(digest.clone());
                buckets.entry(digest).or_default().push(record);
            }
            Err(e) => {
                warn!("Skipping unreadable file: {:#}", e);
                out.errors.push(format!("{:#}", e));
            }
        }
    }

    for (digest, mut members) in buckets {
        if members.len() > 1 {
            members.sort_by(|a, b| a.path.cmp(&b.path));
            out.groups.insert(digest, members);
        }
    }
    out
}

/// Hash a list of paths, returning the digests that could be computed
pub fn hash_paths(paths: &[PathBuf], chunk_size: usize) -> BTreeMap<PathBuf, Result<String>> {
    paths
        .par_iter()
        .map(|p| (p.clone(), hash_with_chunk_size(p, chunk_size)))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}
