//! # Verifier Module
//!
//! Confirms candidate pairs with a structural-similarity check.
//!
//! Only images that appear in some candidate pair are ever thumbnailed.
//! Each thumbnail is decoded once and shared through [`ThumbnailCache`];
//! each pair score is computed once and memoised, so the grouper's merge
//! probe can reuse scores the main pass already paid for.

mod ssim;
mod thumbnail;

pub use ssim::{ssim, STRIDE, WINDOW};
pub use thumbnail::{load_thumbnail, ThumbnailCache, THUMBNAIL_SIZE};

use crate::core::comparator::CandidatePair;
use crate::core::scanner::FileRecord;
use crate::error::VerifyError;
use dashmap::DashMap;
use image::GrayImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

/// Candidates verified per parallel batch
pub const VERIFY_BATCH: usize = 64;

/// Default caller-facing similarity percentage
pub const DEFAULT_SIMILARITY_PERCENT: u32 = 92;

/// Lowest accepted similarity percentage
pub const MIN_SIMILARITY_PERCENT: u32 = 85;

/// Highest accepted similarity percentage
pub const MAX_SIMILARITY_PERCENT: u32 = 99;

/// Convert a 0-100 percentage to a 0-1 threshold, clamped into 85-99 first.
pub fn similarity_threshold_from_percent(percent: u32) -> f64 {
    percent.clamp(MIN_SIMILARITY_PERCENT, MAX_SIMILARITY_PERCENT) as f64 / 100.0
}

/// A candidate pair with its verified similarity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityScore {
    pub pair: CandidatePair,
    /// 0 to 1, 1 meaning identical structure
    pub score: f64,
}

/// Scores image pairs by index.
///
/// The grouper only needs this much of the verifier, which keeps its
/// state machine testable without decoding images.
pub trait PairScorer: Sync {
    /// Similarity of images `a` and `b`, or `None` if either can't be loaded
    fn score(&self, a: usize, b: usize) -> Option<f64>;

    /// Whether `a` and `b` share name and byte length
    fn is_exact_duplicate(&self, a: usize, b: usize) -> bool;
}

/// SSIM verifier over a fixed, indexed image list
pub struct SimilarityVerifier {
    files: Vec<FileRecord>,
    thumbnails: ThumbnailCache,
    scores: DashMap<(usize, usize), Option<f64>>,
}

impl SimilarityVerifier {
    /// Create a verifier; index `i` refers to `files[i]`
    pub fn new(files: Vec<FileRecord>) -> Self {
        let paths = files.iter().map(|f| f.path.clone()).collect();
        Self {
            files,
            thumbnails: ThumbnailCache::new(paths),
            scores: DashMap::new(),
        }
    }

    /// The indexed image list
    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    /// The shared thumbnail cache
    pub fn thumbnails(&self) -> &ThumbnailCache {
        &self.thumbnails
    }

    /// Compute SSIM for `a` and `b` without consulting the score memo.
    pub fn compare(&self, a: usize, b: usize) -> Result<f64, VerifyError> {
        let left = self.thumbnail(a)?;
        let right = self.thumbnail(b)?;
        ssim(&left, &right)
    }

    fn thumbnail(&self, index: usize) -> Result<Arc<GrayImage>, VerifyError> {
        let file = self
            .files
            .get(index)
            .ok_or(VerifyError::UnknownIndex { index })?;
        self.thumbnails
            .get(index)
            .ok_or_else(|| VerifyError::ThumbnailUnavailable {
                path: file.path.clone(),
            })
    }

    /// Score a batch of candidates in parallel.
    ///
    /// Results line up with `pairs`. A pair is `None` when its files share
    /// name and length or when either image fails to load.
    pub fn verify_batch(&self, pairs: &[CandidatePair]) -> Vec<Option<SimilarityScore>> {
        pairs
            .par_iter()
            .map(|pair| {
                if self.is_exact_duplicate(pair.i, pair.j) {
                    return None;
                }
                self.score(pair.i, pair.j).map(|score| SimilarityScore {
                    pair: *pair,
                    score,
                })
            })
            .collect()
    }
}

impl PairScorer for SimilarityVerifier {
    fn score(&self, a: usize, b: usize) -> Option<f64> {
        let key = (a.min(b), a.max(b));
        if let Some(cached) = self.scores.get(&key) {
            return *cached;
        }

        let score = match self.compare(key.0, key.1) {
            Ok(score) => Some(score),
            Err(e) => {
                trace!(a = key.0, b = key.1, error = %e, "pair not scored");
                None
            }
        };
        self.scores.insert(key, score);
        score
    }

    fn is_exact_duplicate(&self, a: usize, b: usize) -> bool {
        match (self.files.get(a), self.files.get(b)) {
            (Some(left), Some(right)) => left.same_name_and_size(right),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scanner::FileAttributes;
    use image::{Rgb, RgbImage};
    use std::path::Path;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn record(path: &Path) -> FileRecord {
        FileRecord {
            path: path.to_path_buf(),
            name: path.file_name().unwrap().to_string_lossy().into_owned(),
            size: std::fs::metadata(path).map(|m| m.len()).unwrap_or(0),
            modified: SystemTime::UNIX_EPOCH,
            attributes: FileAttributes::default(),
        }
    }

    fn stripes(vertical: bool) -> RgbImage {
        RgbImage::from_fn(64, 64, |x, y| {
            let band = if vertical { x / 8 } else { y / 8 };
            if band % 2 == 0 {
                Rgb([240, 240, 240])
            } else {
                Rgb([15, 15, 15])
            }
        })
    }

    fn pair(i: usize, j: usize) -> CandidatePair {
        CandidatePair { i, j, distance: 0 }
    }

    #[test]
    fn threshold_is_clamped_before_conversion() {
        assert_eq!(similarity_threshold_from_percent(50), 0.85);
        assert_eq!(similarity_threshold_from_percent(92), 0.92);
        assert_eq!(similarity_threshold_from_percent(100), 0.99);
    }

    #[test]
    fn identical_pictures_score_one_and_stripes_do_not() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.png");
        let c = dir.path().join("c.png");
        let d = dir.path().join("d.png");
        stripes(true).save(&a).unwrap();
        stripes(true).save(&c).unwrap();
        stripes(false).save(&d).unwrap();

        let verifier = SimilarityVerifier::new(vec![record(&a), record(&c), record(&d)]);

        assert!((verifier.score(0, 1).unwrap() - 1.0).abs() < 1e-9);
        assert!(verifier.score(0, 2).unwrap() < 0.5);
    }

    #[test]
    fn exact_duplicates_are_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("x")).unwrap();
        std::fs::create_dir(dir.path().join("y")).unwrap();
        let a = dir.path().join("x/same.png");
        let b = dir.path().join("y/same.png");
        stripes(true).save(&a).unwrap();
        stripes(true).save(&b).unwrap();

        let verifier = SimilarityVerifier::new(vec![record(&a), record(&b)]);

        assert!(verifier.is_exact_duplicate(0, 1));
        assert_eq!(verifier.verify_batch(&[pair(0, 1)]), vec![None]);
    }

    #[test]
    fn unreadable_images_yield_no_score() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.png");
        let bad = dir.path().join("bad.png");
        stripes(true).save(&good).unwrap();
        std::fs::write(&bad, b"garbage").unwrap();

        let verifier = SimilarityVerifier::new(vec![record(&good), record(&bad)]);

        assert!(verifier.score(0, 1).is_none());
        assert!(matches!(
            verifier.compare(0, 1),
            Err(VerifyError::ThumbnailUnavailable { .. })
        ));
        assert!(matches!(
            verifier.compare(0, 9),
            Err(VerifyError::UnknownIndex { index: 9 })
        ));
    }

    #[test]
    fn batch_results_follow_input_order() {
        let dir = TempDir::new().unwrap();
        let paths: Vec<_> = ["a.png", "b.png", "c.png"]
            .iter()
            .map(|n| dir.path().join(n))
            .collect();
        stripes(true).save(&paths[0]).unwrap();
        stripes(false).save(&paths[1]).unwrap();
        stripes(true).save(&paths[2]).unwrap();

        let verifier = SimilarityVerifier::new(paths.iter().map(|p| record(p)).collect());
        let results = verifier.verify_batch(&[pair(0, 2), pair(0, 1), pair(1, 2)]);

        let pairs: Vec<_> = results.iter().map(|r| r.unwrap().pair).collect();
        assert_eq!(pairs, vec![pair(0, 2), pair(0, 1), pair(1, 2)]);
        assert!(results[0].unwrap().score > results[1].unwrap().score);
    }

    #[test]
    fn scores_are_memoised_in_either_order() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        stripes(true).save(&a).unwrap();
        stripes(false).save(&b).unwrap();

        let verifier = SimilarityVerifier::new(vec![record(&a), record(&b)]);
        let forward = verifier.score(0, 1);
        std::fs::remove_file(&a).unwrap();

        assert_eq!(verifier.score(1, 0), forward);
    }
}
