//! # Core Module
//!
//! The GUI-agnostic detection engine.
//!
//! ## Modules
//! - `scanner` - Walks directory trees into file records
//! - `duplicates` - Groups exact duplicates by name and size
//! - `hasher` - Computes difference hashes
//! - `comparator` - Finds candidate pairs by Hamming distance
//! - `verifier` - Confirms candidates with SSIM on thumbnails
//! - `grouping` - Builds near-duplicate groups from verified pairs
//! - `pipeline` - Orchestrates both workflows

pub mod comparator;
pub mod duplicates;
pub mod grouping;
pub mod hasher;
pub mod pipeline;
pub mod scanner;
pub mod verifier;

// Re-export commonly used types
pub use duplicates::{DuplicateGroup, DuplicatePolicy};
pub use grouping::{Clustering, ImageGroup};
pub use pipeline::{CancellationToken, DuplicateSearch, SimilarSearch};
pub use scanner::FileRecord;
