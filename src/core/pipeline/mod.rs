//! # Pipeline Module
//!
//! Orchestrates the two detection workflows.
//!
//! ## Exact duplicates ([`DuplicateSearch`])
//! 1. **Walk** - Discover files under the roots
//! 2. **Group** - Bucket by name and size, optionally verify content
//!
//! ## Near duplicates ([`SimilarSearch`])
//! 1. **Walk** - Discover files, keep images
//! 2. **Hash** - Difference hash per image
//! 3. **Compare** - All-pairs Hamming pre-filter
//! 4. **Verify** - SSIM on thumbnails, grouping as results arrive
//!
//! ## Parallelism
//! Uses rayon for hashing, comparison rows and verification batches.
//! Either search can run on its own thread via `spawn`.

mod cancel;
mod exact;
mod handle;
mod similar;

pub use cancel::CancellationToken;
pub use exact::{
    DuplicateConfig, DuplicateReport, DuplicateSearch, DuplicateSearchBuilder, PartialResults,
};
pub use handle::ScanHandle;
pub use similar::{SimilarConfig, SimilarReport, SimilarSearch, SimilarSearchBuilder};
