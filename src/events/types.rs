//! Event type definitions for progress reporting and streamed results.

use crate::core::grouping::ImageGroup;
use crate::core::scanner::FileRecord;
use serde::{Deserialize, Serialize};

/// All events emitted by the detection pipelines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Human-readable status line
    Status(String),
    /// Coarse numeric progress
    Progress(Progress),
    /// Streamed near-duplicate results
    Group(GroupEvent),
    /// Pipeline lifecycle
    Pipeline(PipelineEvent),
}

/// Numeric progress within one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub phase: PipelinePhase,
    pub current: usize,
    pub total: usize,
}

/// Streamed changes to the near-duplicate group list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GroupEvent {
    /// A new group was formed from a verified pair
    Created(ImageGroup),
    /// An image joined an existing group
    MemberAdded { group_id: String, image: FileRecord },
    /// `absorbed_id` was folded into `group_id` and no longer exists
    Merged { group_id: String, absorbed_id: String },
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline ran to the end
    Completed { summary: PipelineSummary },
    /// Pipeline stopped early because the token was cancelled
    Cancelled,
}

/// Phases of the two pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Walking,
    Grouping,
    Hashing,
    Comparing,
    Verifying,
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Files (pipeline A) or images (pipeline B) considered
    pub files_scanned: usize,
    /// Number of groups (or pairs) returned
    pub groups: usize,
    /// Total members across the returned groups
    pub files_in_groups: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Walking => write!(f, "Walking"),
            PipelinePhase::Grouping => write!(f, "Grouping"),
            PipelinePhase::Hashing => write!(f, "Hashing"),
            PipelinePhase::Comparing => write!(f, "Comparing"),
            PipelinePhase::Verifying => write!(f, "Verifying"),
        }
    }
}
