//! Exact-duplicate pipeline: walk, then group by name and size.

use super::{CancellationToken, ScanHandle};
use crate::core::duplicates::{DuplicateGroup, DuplicatePolicy, ExactDuplicateGrouper};
use crate::core::scanner::{TreeWalker, WalkConfig, MAX_WALK_DEPTH};
use crate::error::{DupfreeError, Result};
use crate::events::{
    null_sender, Event, EventSender, PipelineEvent, PipelinePhase, PipelineSummary,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// What a cancelled run returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartialResults {
    /// Return nothing once cancelled
    #[default]
    Discard,
    /// Group whatever was collected before the cancel
    Keep,
}

/// Configuration for [`DuplicateSearch`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateConfig {
    /// Directories to walk
    pub roots: Vec<PathBuf>,
    /// Cap on total files across returned groups
    pub max_files: Option<usize>,
    /// Duplicate membership rule
    pub policy: DuplicatePolicy,
    /// Cancelled-run behaviour
    pub partial_results: PartialResults,
    /// Deepest directory level listed
    pub max_depth: usize,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            max_files: None,
            policy: DuplicatePolicy::default(),
            partial_results: PartialResults::default(),
            max_depth: MAX_WALK_DEPTH,
        }
    }
}

impl DuplicateConfig {
    /// Reject configurations that can never produce a useful run
    pub fn validate(&self) -> Result<()> {
        if self.roots.is_empty() {
            return Err(DupfreeError::Config("at least one root directory is required".into()));
        }
        if self.max_depth > MAX_WALK_DEPTH {
            return Err(DupfreeError::Config(format!(
                "max_depth cannot exceed {}",
                MAX_WALK_DEPTH
            )));
        }
        Ok(())
    }
}

/// Outcome of a [`DuplicateSearch`] run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Groups in discovery order
    pub groups: Vec<DuplicateGroup>,
    /// Files the walk found
    pub files_scanned: usize,
    /// Directories the walk listed
    pub directories_visited: usize,
    /// Items skipped on I/O errors
    pub errors_skipped: usize,
    /// Roots that could not be walked, as messages
    pub root_errors: Vec<String>,
    /// Whether the run was cancelled
    pub cancelled: bool,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl DuplicateReport {
    /// Bytes reclaimable across all groups
    pub fn wasted_bytes(&self) -> u64 {
        self.groups.iter().map(|g| g.wasted_bytes()).sum()
    }
}

/// Builder for [`DuplicateSearch`]
#[derive(Debug, Default)]
pub struct DuplicateSearchBuilder {
    config: DuplicateConfig,
}

impl DuplicateSearchBuilder {
    /// Directories to walk
    pub fn roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.config.roots = roots;
        self
    }

    /// Cap the total number of returned files
    pub fn max_files(mut self, max_files: Option<usize>) -> Self {
        self.config.max_files = max_files;
        self
    }

    /// Duplicate membership rule
    pub fn policy(mut self, policy: DuplicatePolicy) -> Self {
        self.config.policy = policy;
        self
    }

    /// Cancelled-run behaviour
    pub fn partial_results(mut self, partial: PartialResults) -> Self {
        self.config.partial_results = partial;
        self
    }

    /// Deepest directory level listed
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<DuplicateSearch> {
        DuplicateSearch::from_config(self.config)
    }
}

/// Finds exact duplicates under a set of roots
#[derive(Debug, Clone)]
pub struct DuplicateSearch {
    config: DuplicateConfig,
}

impl DuplicateSearch {
    /// Create a new builder
    pub fn builder() -> DuplicateSearchBuilder {
        DuplicateSearchBuilder::default()
    }

    /// Build from a validated configuration
    pub fn from_config(config: DuplicateConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration
    pub fn config(&self) -> &DuplicateConfig {
        &self.config
    }

    /// Run without events
    pub fn run(&self, cancel: &CancellationToken) -> DuplicateReport {
        self.run_with_events(cancel, &null_sender())
    }

    /// Run on a background thread
    pub fn spawn(self, events: EventSender) -> ScanHandle<DuplicateReport> {
        ScanHandle::spawn(CancellationToken::new(), move |cancel| {
            self.run_with_events(&cancel, &events)
        })
    }

    /// Run with event reporting
    pub fn run_with_events(&self, cancel: &CancellationToken, events: &EventSender) -> DuplicateReport {
        let start_time = Instant::now();
        let keep_partial = self.config.partial_results == PartialResults::Keep;

        events.send(Event::Pipeline(PipelineEvent::Started));
        events.phase(PipelinePhase::Walking);

        let walker = TreeWalker::new(WalkConfig {
            max_depth: self.config.max_depth,
            ..WalkConfig::default()
        });
        let outcome = walker.walk(&self.config.roots, cancel, events);

        let mut report = DuplicateReport {
            files_scanned: outcome.files.len(),
            directories_visited: outcome.directories_visited,
            errors_skipped: outcome.errors_skipped,
            root_errors: outcome.root_errors.iter().map(|e| e.to_string()).collect(),
            ..DuplicateReport::default()
        };

        if outcome.cancelled && !keep_partial {
            return self.cancelled(report, start_time, events);
        }

        if !outcome.cancelled {
            events.phase(PipelinePhase::Grouping);
            events.status(format!("Grouping {} files...", outcome.files.len()));
        }

        let grouper =
            ExactDuplicateGrouper::new(self.config.policy).with_max_files(self.config.max_files);
        report.groups = grouper.group(&outcome.files, cancel);

        if cancel.is_cancelled() {
            if !keep_partial {
                report.groups.clear();
            }
            return self.cancelled(report, start_time, events);
        }

        report.duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            groups = report.groups.len(),
            files = report.files_scanned,
            "duplicate search finished"
        );
        events.status(format!("Found {} duplicate groups", report.groups.len()));
        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: PipelineSummary {
                files_scanned: report.files_scanned,
                groups: report.groups.len(),
                files_in_groups: report.groups.iter().map(|g| g.files.len()).sum(),
                duration_ms: report.duration_ms,
            },
        }));

        report
    }

    fn cancelled(
        &self,
        mut report: DuplicateReport,
        start_time: Instant,
        events: &EventSender,
    ) -> DuplicateReport {
        report.cancelled = true;
        report.duration_ms = start_time.elapsed().as_millis() as u64;
        info!(groups = report.groups.len(), "duplicate search cancelled");
        events.send(Event::Pipeline(PipelineEvent::Cancelled));
        report
    }
}
