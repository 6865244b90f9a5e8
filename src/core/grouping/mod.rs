//! # Grouping Module
//!
//! Turns verified pairs into near-duplicate groups.
//!
//! ## Strategies
//! - **Streaming** ([`IncrementalGrouper`]): consumes pairs closest-first
//!   and emits every creation, addition and merge as it happens. Greedy;
//!   the result can depend on pair order.
//! - **Transitive** ([`TransitiveGrouper`]): union-find over all passing
//!   pairs after verification finishes. If A~B and B~C then {A, B, C}.
//! - **Closest pairs** ([`closest_pairs`]): no clustering, just the
//!   best-scoring pairs.

mod incremental;
mod transitive;

pub use incremental::IncrementalGrouper;
pub use transitive::TransitiveGrouper;

use crate::core::scanner::FileRecord;
use crate::core::verifier::SimilarityScore;
use serde::{Deserialize, Serialize};

/// A set of visually similar images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageGroup {
    /// `group_N` or `pair_N`
    pub id: String,
    /// Members in the order they joined
    pub images: Vec<FileRecord>,
    /// Score of the pair that created the group
    pub similarity: f64,
}

impl ImageGroup {
    /// Total bytes across all members
    pub fn total_size(&self) -> u64 {
        self.images.iter().map(|f| f.size).sum()
    }
}

/// How verified pairs become groups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Clustering {
    /// Greedy, order-dependent, streamed while verifying
    #[default]
    Streaming,
    /// Connected components of all passing pairs, built at the end
    Transitive,
}

/// The `count` highest-scoring pairs, best first, as two-image groups.
///
/// Ignores any threshold. Equal scores keep candidate order.
pub fn closest_pairs(files: &[FileRecord], scores: &[SimilarityScore], count: usize) -> Vec<ImageGroup> {
    let mut ranked: Vec<&SimilarityScore> = scores.iter().collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    ranked
        .into_iter()
        .take(count)
        .enumerate()
        .filter_map(|(n, s)| {
            Some(ImageGroup {
                id: format!("pair_{}", n),
                images: vec![files.get(s.pair.i)?.clone(), files.get(s.pair.j)?.clone()],
                similarity: s.score,
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::core::comparator::CandidatePair;
    use crate::core::scanner::FileAttributes;
    use std::path::PathBuf;
    use std::time::SystemTime;

    pub fn files(count: usize) -> Vec<FileRecord> {
        (0..count)
            .map(|i| FileRecord {
                path: PathBuf::from(format!("/photos/img{}.jpg", i)),
                name: format!("img{}.jpg", i),
                size: 1000 + i as u64,
                modified: SystemTime::UNIX_EPOCH,
                attributes: FileAttributes::default(),
            })
            .collect()
    }

    pub fn scored(i: usize, j: usize, score: f64) -> SimilarityScore {
        SimilarityScore {
            pair: CandidatePair { i, j, distance: 0 },
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn closest_pairs_orders_by_descending_score() {
        let files = files(4);
        let scores = vec![scored(0, 1, 0.4), scored(2, 3, 0.9), scored(1, 2, 0.7)];

        let pairs = closest_pairs(&files, &scores, 2);

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].id, "pair_0");
        assert_eq!(pairs[0].similarity, 0.9);
        assert_eq!(pairs[1].similarity, 0.7);
        assert_eq!(pairs[0].images[0].name, "img2.jpg");
    }

    #[test]
    fn closest_pairs_returns_all_when_fewer_than_requested() {
        let pairs = closest_pairs(&files(2), &[scored(0, 1, 0.1)], 5);
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn total_size_sums_members() {
        let files = files(2);
        let group = ImageGroup {
            id: "group_0".into(),
            images: files.clone(),
            similarity: 1.0,
        };
        assert_eq!(group.total_size(), 2001);
    }
}
