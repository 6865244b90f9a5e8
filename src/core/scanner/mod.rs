//! # Scanner Module
//!
//! Discovers files under a set of directory roots.
//!
//! The walk is breadth-first with a hard depth cap, skips hidden, system
//! and reparse-point directories, and never fails as a whole: unreadable
//! items are skipped and an unreadable root only loses that root.
//!
//! ## Example
//! ```rust,ignore
//! use dupfree::core::scanner::{TreeWalker, WalkConfig};
//!
//! let walker = TreeWalker::new(WalkConfig::default());
//! let outcome = walker.walk(&["/Users/photos".into()], &token, &events);
//! ```

mod attributes;
mod filter;
mod walker;

pub use attributes::FileAttributes;
pub use filter::ImageFilter;
pub use walker::{TreeWalker, WalkConfig, WalkOutcome, MAX_WALK_DEPTH};

use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A file discovered during traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path to the file
    pub path: PathBuf,
    /// Final path component
    pub name: String,
    /// File size in bytes
    pub size: u64,
    /// Last modified time
    pub modified: SystemTime,
    /// Hidden / system / reparse flags
    pub attributes: FileAttributes,
}

impl FileRecord {
    /// Build a record from a path and its (non-following) metadata
    pub fn from_metadata(path: &Path, metadata: &Metadata) -> Self {
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            attributes: FileAttributes::from_metadata(&path, metadata),
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            name,
            path,
        }
    }

    /// Whether two records look like the same file by name and length
    pub fn same_name_and_size(&self, other: &FileRecord) -> bool {
        self.size == other.size && self.name == other.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn record(name: &str, size: u64) -> FileRecord {
        FileRecord {
            path: PathBuf::from("/photos").join(name),
            name: name.to_string(),
            size,
            modified: SystemTime::UNIX_EPOCH,
            attributes: FileAttributes::default(),
        }
    }

    #[test]
    fn from_metadata_captures_name_and_size() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("holiday.jpg");
        File::create(&path).unwrap().write_all(&[0u8; 42]).unwrap();

        let metadata = std::fs::symlink_metadata(&path).unwrap();
        let record = FileRecord::from_metadata(&path, &metadata);

        assert_eq!(record.name, "holiday.jpg");
        assert_eq!(record.size, 42);
        assert!(record.path.is_absolute());
        assert!(!record.attributes.is_excluded());
    }

    #[test]
    fn same_name_and_size_requires_both() {
        assert!(record("a.jpg", 10).same_name_and_size(&record("a.jpg", 10)));
        assert!(!record("a.jpg", 10).same_name_and_size(&record("a.jpg", 11)));
        assert!(!record("a.jpg", 10).same_name_and_size(&record("b.jpg", 10)));
    }
}
