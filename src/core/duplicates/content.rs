//! Full-content hashing for verifying metadata duplicates.
//!
//! Large files are memory-mapped so hashing does not copy them through a
//! heap buffer first.

use crate::error::HashError;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;
use xxhash_rust::xxh3::xxh3_64;

/// Minimum file size to use memory-mapped I/O (1MB)
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// File bytes that may be either owned or memory-mapped.
pub enum FileBytes {
    /// Standard heap-allocated bytes
    Vec(Vec<u8>),
    /// Memory-mapped bytes
    Mmap(Mmap),
}

impl std::ops::Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        match self {
            FileBytes::Vec(v) => v,
            FileBytes::Mmap(m) => m,
        }
    }
}

/// Read a whole file, mapping it when it is at least 1MB.
pub fn read_file_bytes(path: &Path) -> Result<FileBytes, HashError> {
    let io_error = |source| HashError::IoError {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_error)?;
    let len = file.metadata().map_err(io_error)?.len();

    if len >= MMAP_THRESHOLD {
        // SAFETY: the map is read-only and the file handle outlives it
        // for the duration of the hash.
        let mmap = unsafe { Mmap::map(&file) }.map_err(io_error)?;
        Ok(FileBytes::Mmap(mmap))
    } else {
        std::fs::read(path).map(FileBytes::Vec).map_err(io_error)
    }
}

/// xxh3 digest of a file's full content
pub fn content_hash(path: &Path) -> Result<u64, HashError> {
    let bytes = read_file_bytes(path)?;
    Ok(xxh3_64(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn identical_content_hashes_equal() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        std::fs::write(&a, b"same bytes").unwrap();
        std::fs::write(&b, b"same bytes").unwrap();

        assert_eq!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
    }

    #[test]
    fn different_content_hashes_differ() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        std::fs::write(&a, b"same size!").unwrap();
        std::fs::write(&b, b"other size").unwrap();

        assert_ne!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
    }

    #[test]
    fn large_files_are_mapped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("large.bin");
        std::fs::write(&path, vec![1u8; MMAP_THRESHOLD as usize]).unwrap();

        let bytes = read_file_bytes(&path).unwrap();
        assert!(matches!(bytes, FileBytes::Mmap(_)));
        assert_eq!(bytes.len(), MMAP_THRESHOLD as usize);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(content_hash(Path::new("/nonexistent/file.bin")).is_err());
    }
}
