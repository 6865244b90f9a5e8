//! Image selection for the near-duplicate pipeline.

use super::FileRecord;
use std::collections::HashSet;
use std::path::Path;

/// Filters file records down to the images the hasher can try
pub struct ImageFilter {
    /// File extensions to include (lowercase, no dot)
    extensions: HashSet<String>,
    /// Whether to keep files flagged hidden, system or reparse
    include_hidden: bool,
}

impl ImageFilter {
    /// Create a new filter with default previewable extensions
    pub fn new() -> Self {
        Self {
            extensions: ["jpg", "jpeg", "png", "bmp", "gif", "webp", "tiff", "tif", "ico"]
                .into_iter()
                .map(String::from)
                .collect(),
            include_hidden: false,
        }
    }

    /// Keep files flagged hidden, system or reparse
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Override the list of extensions to accept
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions.into_iter().map(|e| e.to_lowercase()).collect();
        self
    }

    /// Check if a path has an accepted image extension
    pub fn is_image_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()))
    }

    /// Check if a discovered file should be hashed
    pub fn accepts(&self, record: &FileRecord) -> bool {
        if !self.include_hidden && record.attributes.is_excluded() {
            return false;
        }
        self.is_image_path(&record.path)
    }
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self::new()
    }
}
