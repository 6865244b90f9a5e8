//! Per-index thumbnail cache shared by verification workers.

use crate::core::hasher::{FastDecoder, FastResizer};
use crate::error::HashError;
use dashmap::DashMap;
use image::GrayImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;

/// Side of the square grayscale thumbnail compared by SSIM
pub const THUMBNAIL_SIZE: u32 = 128;

/// Lazily-populated thumbnails keyed by image index.
///
/// A failed load is remembered as `None` so a broken file is decoded at
/// most once per run. Concurrent callers may both decode an index the
/// first time; whichever result lands first is kept.
pub struct ThumbnailCache {
    paths: Vec<PathBuf>,
    entries: DashMap<usize, Option<Arc<GrayImage>>>,
}

impl ThumbnailCache {
    /// Create an empty cache over `paths`; index `i` refers to `paths[i]`
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            entries: DashMap::new(),
        }
    }

    /// Thumbnail for `index`, loading it on first use
    pub fn get(&self, index: usize) -> Option<Arc<GrayImage>> {
        if let Some(entry) = self.entries.get(&index) {
            return entry.value().clone();
        }

        let path = self.paths.get(index)?;
        let loaded = match load_thumbnail(path) {
            Ok(thumbnail) => Some(Arc::new(thumbnail)),
            Err(e) => {
                trace!(path = %path.display(), error = %e, "thumbnail unavailable");
                None
            }
        };

        self.entries.entry(index).or_insert(loaded).value().clone()
    }

    /// Number of indices attempted so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been loaded yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decode `path` and fit it to a black `THUMBNAIL_SIZE` square.
pub fn load_thumbnail(path: &Path) -> Result<GrayImage, HashError> {
    let image = FastDecoder::decode(path)?;
    FastResizer::new().fit_to_square(&image, THUMBNAIL_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn loads_and_reuses_thumbnails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.png");
        image::RgbImage::from_pixel(40, 20, image::Rgb([200, 200, 200]))
            .save(&path)
            .unwrap();

        let cache = ThumbnailCache::new(vec![path]);
        let first = cache.get(0).unwrap();
        let second = cache.get(0).unwrap();

        assert_eq!(first.dimensions(), (THUMBNAIL_SIZE, THUMBNAIL_SIZE));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failures_are_cached_as_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();

        let cache = ThumbnailCache::new(vec![path]);
        assert!(cache.get(0).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn unknown_index_is_none() {
        let cache = ThumbnailCache::new(Vec::new());
        assert!(cache.get(3).is_none());
        assert!(cache.is_empty());
    }
}
