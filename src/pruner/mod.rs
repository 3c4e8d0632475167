pub mod engine;
pub mod validate;

pub use engine::{prune, PruneConfig, PruneReport, PruneStats};
pub use validate::{check_roots, validate_roots};
