pub mod engine;
pub mod finders;
pub mod manifest;

pub use engine::{clean_files, remove_empty_dirs, run_all, CleanMode, SweepReport};
pub use finders::{
    find_by_extension, find_empty_dirs, find_images_by_keyword, find_small_videos,
    list_extensions, Target,
};
pub use manifest::{ActionItem, ActionLog};
