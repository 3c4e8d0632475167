//! # treesweep
//!
//! Filesystem maintenance for large media collections.
//!
//! - **Duplicate discovery**: by content hash (size first, then MD5), by file
//!   name, or by directory fingerprint, persisted as a JSON report
//! - **Resolution**: keep one copy per group, delete verified duplicates and
//!   quarantine same-name ones; dry-run by default
//! - **Tree pruning**: keep large videos and images under a mirrored target,
//!   delete everything else, collapse emptied directories
//! - **Sweeps**: small videos, junk extensions, keyword images, empty
//!   directories, and an extension census

pub mod cleaner;
pub mod cli;
pub mod common;
pub mod duplicates;
pub mod pruner;
