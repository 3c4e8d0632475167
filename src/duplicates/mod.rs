pub mod fingerprint;
pub mod grouper;
pub mod hasher;
pub mod report;
pub mod resolver;

pub use grouper::{scan, ScanConfig, ScanStrategy};
pub use report::{DuplicateGroup, DuplicateReport, FileRecord, GroupKind};
pub use resolver::{resolve, select_keeper, ActionKind, PlannedAction, ResolveOutcome, ResolvePolicy};
