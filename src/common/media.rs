use std::collections::BTreeSet;
use std::path::Path;

/// Coarse file classification used by the pruner and the sweep finders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
    Other,
}

/// Extension sets used for classification (lowercase, no leading dot)
#[derive(Debug, Clone, Default)]
pub struct MediaTypes {
    pub video: BTreeSet<String>,
    pub image: BTreeSet<String>,
}

impl MediaTypes {
    pub fn new(video: BTreeSet<String>, image: BTreeSet<String>) -> Self {
        Self { video, image }
    }

    pub fn from_config(config: &crate::common::config::Config) -> Self {
        Self::new(config.video_set(), config.image_set())
    }

    /// Classify a path by its extension
    pub fn classify(&self, path: &Path) -> MediaKind {
        match lowercase_extension(path) {
            Some(ext) if self.video.contains(&ext) => MediaKind::Video,
            Some(ext) if self.image.contains(&ext) => MediaKind::Image,
            _ => MediaKind::Other,
        }
    }
}

/// Lowercased extension of a path, if it has one
pub fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Check whether a path's extension is in `extensions`
pub fn has_extension(path: &Path, extensions: &BTreeSet<String>) -> bool {
    lowercase_extension(path)
        .map(|ext| extensions.contains(&ext))
        .unwrap_or(false)
}
