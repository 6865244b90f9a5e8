//! # Hasher Module
//!
//! Computes perceptual difference hashes for images.
//!
//! ## How It Works
//! 1. Decode the image (zune-jpeg for JPEG, `image` for the rest)
//! 2. Resize to a `GRID_WIDTH` x `GRID_HEIGHT` grid
//! 3. Convert to grayscale by averaging R, G and B
//! 4. Compare each sample with its right neighbour
//!
//! Signatures are compared with Hamming distance, see [`HashSignature::distance`].
//!
//! ## Example
//! ```rust,ignore
//! use dupfree::core::hasher::{DifferenceHasher, ImageHasher};
//!
//! let signature = DifferenceHasher::new().hash_file(&path)?;
//! ```

mod difference;
pub mod fast_decode;
pub mod fast_resize;
mod signature;

pub use difference::DifferenceHasher;
pub use fast_decode::FastDecoder;
pub use fast_resize::FastResizer;
pub use signature::HashSignature;

use crate::core::scanner::FileRecord;
use crate::error::HashError;
use image::DynamicImage;
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Columns sampled per row; one more than the bits each row produces
pub const GRID_WIDTH: u32 = 9;

/// Rows sampled
pub const GRID_HEIGHT: u32 = 8;

/// Bits in every signature produced by [`DifferenceHasher::new`]
pub const SIGNATURE_BITS: usize = ((GRID_WIDTH - 1) * GRID_HEIGHT) as usize;

/// Trait for perceptual hashers
pub trait ImageHasher: Send + Sync {
    /// Compute a signature from an already-loaded image
    fn hash_image(&self, image: &DynamicImage) -> Result<HashSignature, HashError>;

    /// Compute a signature directly from a file path.
    fn hash_file(&self, path: &Path) -> Result<HashSignature, HashError> {
        let image = FastDecoder::decode(path)?;
        self.hash_image(&image)
    }
}

/// An image that hashed successfully
#[derive(Debug, Clone)]
pub struct HashedImage {
    /// The file the signature belongs to
    pub file: FileRecord,
    /// Its signature
    pub signature: HashSignature,
}

/// Hash `files` in parallel, keeping input order and dropping failures.
///
/// `on_progress` is called with the number of files attempted so far and
/// may be called from any worker thread. Files not yet started when
/// `should_stop` returns true are skipped.
pub fn hash_all<H, P, S>(
    hasher: &H,
    files: Vec<FileRecord>,
    on_progress: P,
    should_stop: S,
) -> Vec<HashedImage>
where
    H: ImageHasher + ?Sized,
    P: Fn(usize) + Sync,
    S: Fn() -> bool + Sync,
{
    let done = AtomicUsize::new(0);

    files
        .into_par_iter()
        .filter_map(|file| {
            if should_stop() {
                return None;
            }
            let result = hasher.hash_file(&file.path);
            on_progress(done.fetch_add(1, Ordering::Relaxed) + 1);

            match result {
                Ok(signature) => Some(HashedImage { file, signature }),
                Err(e) => {
                    debug!(path = %file.path.display(), error = %e, "no signature");
                    None
                }
            }
        })
        .collect()
}
