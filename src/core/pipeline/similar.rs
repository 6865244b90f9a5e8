//! Near-duplicate image pipeline.
//!
//! walk -> filter images -> hash -> candidate scan -> SSIM verify -> group
//!
//! Every stage checks the cancellation token. Whatever was grouped before
//! the cancel is returned; a cancelled run is always a subset of what an
//! uninterrupted run would report.

use super::{CancellationToken, ScanHandle};
use crate::core::comparator::{CandidateFinder, CandidatePair, DEFAULT_PREFILTER_THRESHOLD};
use crate::core::grouping::{closest_pairs, Clustering, ImageGroup, IncrementalGrouper, TransitiveGrouper};
use crate::core::hasher::{hash_all, DifferenceHasher, HashSignature, SIGNATURE_BITS};
use crate::core::scanner::{FileRecord, ImageFilter, TreeWalker, WalkConfig, MAX_WALK_DEPTH};
use crate::core::verifier::{
    similarity_threshold_from_percent, SimilarityScore, SimilarityVerifier,
    DEFAULT_SIMILARITY_PERCENT, VERIFY_BATCH,
};
use crate::error::{DupfreeError, Result};
use crate::events::{
    null_sender, Event, EventSender, GroupEvent, PipelineEvent, PipelinePhase, PipelineSummary,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// Configuration for [`SimilarSearch`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarConfig {
    /// Directories to walk
    pub roots: Vec<PathBuf>,
    /// Caller-facing similarity, 0-100; clamped into 85-99 when used
    pub similarity_percent: u32,
    /// Maximum Hamming distance for a candidate pair
    pub prefilter_threshold: u32,
    /// Return the K best-scoring pairs instead of groups
    pub closest_pairs: Option<usize>,
    /// How passing pairs become groups
    pub clustering: Clustering,
    /// Keep hidden, system and reparse files
    pub include_hidden: bool,
    /// Deepest directory level listed
    pub max_depth: usize,
}

impl Default for SimilarConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            similarity_percent: DEFAULT_SIMILARITY_PERCENT,
            prefilter_threshold: DEFAULT_PREFILTER_THRESHOLD,
            closest_pairs: None,
            clustering: Clustering::default(),
            include_hidden: false,
            max_depth: MAX_WALK_DEPTH,
        }
    }
}

impl SimilarConfig {
    /// Reject configurations that can never produce a useful run
    pub fn validate(&self) -> Result<()> {
        if self.roots.is_empty() {
            return Err(DupfreeError::Config("at least one root directory is required".into()));
        }
        if self.similarity_percent > 100 {
            return Err(DupfreeError::Config(format!(
                "similarity must be 0-100, got {}",
                self.similarity_percent
            )));
        }
        if self.prefilter_threshold as usize > SIGNATURE_BITS {
            return Err(DupfreeError::Config(format!(
                "prefilter threshold cannot exceed {} bits",
                SIGNATURE_BITS
            )));
        }
        if self.closest_pairs == Some(0) {
            return Err(DupfreeError::Config("closest pair count must be positive".into()));
        }
        if self.max_depth > MAX_WALK_DEPTH {
            return Err(DupfreeError::Config(format!(
                "max_depth cannot exceed {}",
                MAX_WALK_DEPTH
            )));
        }
        Ok(())
    }

    /// The 0-1 threshold the verifier and grouper apply
    pub fn similarity_threshold(&self) -> f64 {
        similarity_threshold_from_percent(self.similarity_percent)
    }
}

/// Outcome of a [`SimilarSearch`] run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimilarReport {
    /// Groups, or `pair_N` groups in closest-pairs mode
    pub groups: Vec<ImageGroup>,
    /// Image files selected from the walk
    pub images_found: usize,
    /// Images that produced a signature
    pub images_hashed: usize,
    /// Pairs that passed the pre-filter
    pub candidates: usize,
    /// Pairs that received a similarity score
    pub verified: usize,
    /// Roots that could not be walked, as messages
    pub root_errors: Vec<String>,
    /// Whether the run was cancelled
    pub cancelled: bool,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Builder for [`SimilarSearch`]
#[derive(Debug, Default)]
pub struct SimilarSearchBuilder {
    config: SimilarConfig,
}

impl SimilarSearchBuilder {
    /// Directories to walk
    pub fn roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.config.roots = roots;
        self
    }

    /// Similarity percentage, 0-100
    pub fn similarity(mut self, percent: u32) -> Self {
        self.config.similarity_percent = percent;
        self
    }

    /// Maximum Hamming distance for a candidate pair
    pub fn prefilter_threshold(mut self, bits: u32) -> Self {
        self.config.prefilter_threshold = bits;
        self
    }

    /// Return the `count` best pairs instead of groups
    pub fn closest_pairs(mut self, count: Option<usize>) -> Self {
        self.config.closest_pairs = count;
        self
    }

    /// How passing pairs become groups
    pub fn clustering(mut self, clustering: Clustering) -> Self {
        self.config.clustering = clustering;
        self
    }

    /// Keep hidden, system and reparse files
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.include_hidden = include;
        self
    }

    /// Deepest directory level listed
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<SimilarSearch> {
        SimilarSearch::from_config(self.config)
    }
}

/// Finds visually similar images under a set of roots
#[derive(Debug, Clone)]
pub struct SimilarSearch {
    config: SimilarConfig,
}

impl SimilarSearch {
    /// Create a new builder
    pub fn builder() -> SimilarSearchBuilder {
        SimilarSearchBuilder::default()
    }

    /// Build from a validated configuration
    pub fn from_config(config: SimilarConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration
    pub fn config(&self) -> &SimilarConfig {
        &self.config
    }

    /// Run without events
    pub fn run(&self, cancel: &CancellationToken) -> SimilarReport {
        self.run_with_events(cancel, &null_sender())
    }

    /// Run on a background thread
    pub fn spawn(self, events: EventSender) -> ScanHandle<SimilarReport> {
        ScanHandle::spawn(CancellationToken::new(), move |cancel| {
            self.run_with_events(&cancel, &events)
        })
    }

    /// Run with event reporting; groups are streamed as [`Event::Group`].
    pub fn run_with_events(&self, cancel: &CancellationToken, events: &EventSender) -> SimilarReport {
        let start_time = Instant::now();
        let mut report = SimilarReport::default();

        events.send(Event::Pipeline(PipelineEvent::Started));

        // Phase 1: Walking
        events.phase(PipelinePhase::Walking);
        let walker = TreeWalker::new(WalkConfig {
            max_depth: self.config.max_depth,
            ..WalkConfig::default()
        });
        let outcome = walker.walk(&self.config.roots, cancel, events);
        report.root_errors = outcome.root_errors.iter().map(|e| e.to_string()).collect();

        let filter = ImageFilter::new().with_hidden(self.config.include_hidden);
        let images: Vec<FileRecord> = outcome
            .files
            .into_iter()
            .filter(|f| filter.accepts(f))
            .collect();
        report.images_found = images.len();
        if cancel.is_cancelled() {
            return self.finish(report, start_time, events, true);
        }

        // Phase 2: Hashing
        events.phase(PipelinePhase::Hashing);
        events.status(format!("Hashing {} images...", images.len()));
        let total = images.len();
        let hashed = hash_all(
            &DifferenceHasher::new(),
            images,
            |done| events.progress(PipelinePhase::Hashing, done, total),
            || cancel.is_cancelled(),
        );
        report.images_hashed = hashed.len();
        if cancel.is_cancelled() {
            return self.finish(report, start_time, events, true);
        }

        let (files, signatures): (Vec<FileRecord>, Vec<HashSignature>) =
            hashed.into_iter().map(|h| (h.file, h.signature)).unzip();

        // Phase 3: Comparing
        events.phase(PipelinePhase::Comparing);
        events.status(format!("Comparing {} images...", files.len()));
        let candidates = CandidateFinder::new(self.config.prefilter_threshold).find(
            &signatures,
            cancel,
            events,
        );
        report.candidates = candidates.len();
        debug!(candidates = candidates.len(), "pre-filter done");

        // Phase 4: Verifying and grouping
        events.phase(PipelinePhase::Verifying);
        let verifier = SimilarityVerifier::new(files);
        let scores = self.verify(&verifier, &candidates, cancel, events, &mut report);
        report.verified = scores.len();

        let cancelled = cancel.is_cancelled();
        if let Some(count) = self.config.closest_pairs {
            report.groups = closest_pairs(verifier.files(), &scores, count);
        } else if self.config.clustering == Clustering::Transitive {
            report.groups = TransitiveGrouper::new(self.config.similarity_threshold())
                .group(verifier.files(), &scores);
            if !cancelled {
                for group in &report.groups {
                    events.group(GroupEvent::Created(group.clone()));
                }
            }
        }

        self.finish(report, start_time, events, cancelled)
    }

    /// Verify candidates batch by batch, streaming groups when clustering
    /// online. Returns every score computed, pass or fail.
    fn verify(
        &self,
        verifier: &SimilarityVerifier,
        candidates: &[CandidatePair],
        cancel: &CancellationToken,
        events: &EventSender,
        report: &mut SimilarReport,
    ) -> Vec<SimilarityScore> {
        let threshold = self.config.similarity_threshold();
        let streaming =
            self.config.closest_pairs.is_none() && self.config.clustering == Clustering::Streaming;
        let mut grouper = IncrementalGrouper::new(verifier.files(), verifier, threshold);
        let mut scores = Vec::new();
        let mut checked = 0;

        'batches: for batch in candidates.chunks(VERIFY_BATCH) {
            if cancel.is_cancelled() {
                break;
            }

            for scored in verifier.verify_batch(batch).into_iter().flatten() {
                scores.push(scored);
                if !streaming {
                    continue;
                }
                // Every change the grouper makes is streamed, so stop before it
                if cancel.is_cancelled() {
                    break 'batches;
                }
                for event in grouper.process(&scored) {
                    events.group(event);
                }
            }

            checked += batch.len();
            events.progress(PipelinePhase::Verifying, checked, candidates.len());
            events.status(format!(
                "Verified {} of {} candidates, {} groups",
                checked,
                candidates.len(),
                grouper.group_count()
            ));
        }

        if streaming {
            report.groups = grouper.finish();
        }
        scores
    }

    fn finish(
        &self,
        mut report: SimilarReport,
        start_time: Instant,
        events: &EventSender,
        cancelled: bool,
    ) -> SimilarReport {
        report.cancelled = cancelled;
        report.duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            groups = report.groups.len(),
            images = report.images_hashed,
            cancelled,
            "similar search finished"
        );

        if cancelled {
            events.send(Event::Pipeline(PipelineEvent::Cancelled));
        } else {
            events.status(format!("Found {} groups", report.groups.len()));
            events.send(Event::Pipeline(PipelineEvent::Completed {
                summary: PipelineSummary {
                    files_scanned: report.images_found,
                    groups: report.groups.len(),
                    files_in_groups: report.groups.iter().map(|g| g.images.len()).sum(),
                    duration_ms: report.duration_ms,
                },
            }));
        }
        report
    }
}
