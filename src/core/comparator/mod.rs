//! # Comparator Module
//!
//! Finds candidate near-duplicate pairs by comparing difference hashes.
//!
//! ## How It Works
//! 1. Compare every unordered pair of signatures using Hamming distance
//! 2. Keep pairs at or under a loose pre-filter threshold
//! 3. Sort by distance so the grouper sees the closest pairs first
//!
//! The threshold is deliberately looser than the final similarity check;
//! the verifier makes the real decision.

use crate::core::hasher::HashSignature;
use crate::core::pipeline::CancellationToken;
use crate::events::{EventSender, PipelinePhase};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Default maximum Hamming distance (out of 64 bits) for a candidate
pub const DEFAULT_PREFILTER_THRESHOLD: u32 = 25;

/// Comparisons between two status messages
pub const STATUS_EVERY: usize = 5000;

/// Two signature indices that passed the pre-filter, `i < j`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidatePair {
    pub i: usize,
    pub j: usize,
    pub distance: u32,
}

/// All-pairs Hamming scan
#[derive(Debug, Clone, Copy)]
pub struct CandidateFinder {
    threshold: u32,
}

impl CandidateFinder {
    /// Create a finder accepting pairs with `distance <= threshold`
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    /// The configured pre-filter threshold
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Find all candidate pairs, sorted ascending by distance then `(i, j)`.
    ///
    /// Rows are scanned in parallel. Once `cancel` fires, rows not yet
    /// started are skipped and the pairs found so far are returned.
    pub fn find(
        &self,
        signatures: &[HashSignature],
        cancel: &CancellationToken,
        events: &EventSender,
    ) -> Vec<CandidatePair> {
        let n = signatures.len();
        let total = n.saturating_sub(1) * n / 2;
        let compared = AtomicUsize::new(0);

        let mut pairs: Vec<CandidatePair> = (0..n)
            .into_par_iter()
            .flat_map_iter(|i| {
                if cancel.is_cancelled() {
                    return Vec::new();
                }

                let row: Vec<CandidatePair> = ((i + 1)..n)
                    .filter_map(|j| {
                        let distance = signatures[i].distance(&signatures[j]);
                        (distance <= self.threshold).then_some(CandidatePair { i, j, distance })
                    })
                    .collect();

                let width = n - i - 1;
                let before = compared.fetch_add(width, Ordering::Relaxed);
                let after = before + width;
                if after / STATUS_EVERY > before / STATUS_EVERY {
                    events.status(format!("Compared {} of {} pairs", after, total));
                    events.progress(PipelinePhase::Comparing, after, total);
                }

                row
            })
            .collect();

        pairs.sort_unstable_by_key(|p| (p.distance, p.i, p.j));
        debug!(
            candidates = pairs.len(),
            compared = compared.load(Ordering::Relaxed),
            total,
            "candidate scan done"
        );
        pairs
    }
}

impl Default for CandidateFinder {
    fn default() -> Self {
        Self::new(DEFAULT_PREFILTER_THRESHOLD)
    }
}

/// Convenience wrapper around [`CandidateFinder::find`]
pub fn find_candidates(
    signatures: &[HashSignature],
    threshold: u32,
    cancel: &CancellationToken,
    events: &EventSender,
) -> Vec<CandidatePair> {
    CandidateFinder::new(threshold).find(signatures, cancel, events)
}
