//! Hidden / system / reparse-point flags for files and directories.

use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::path::Path;

/// Attribute flags relevant to traversal and filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttributes {
    pub hidden: bool,
    pub system: bool,
    /// Symlink, junction or other reparse point
    pub reparse: bool,
}

#[cfg(windows)]
const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
#[cfg(windows)]
const FILE_ATTRIBUTE_SYSTEM: u32 = 0x4;
#[cfg(windows)]
const FILE_ATTRIBUTE_REPARSE_POINT: u32 = 0x400;

impl FileAttributes {
    /// Read the flags from metadata obtained without following links.
    #[cfg(windows)]
    pub fn from_metadata(_path: &Path, metadata: &Metadata) -> Self {
        use std::os::windows::fs::MetadataExt;

        let bits = metadata.file_attributes();
        Self {
            hidden: bits & FILE_ATTRIBUTE_HIDDEN != 0,
            system: bits & FILE_ATTRIBUTE_SYSTEM != 0,
            reparse: bits & FILE_ATTRIBUTE_REPARSE_POINT != 0,
        }
    }

    /// Read the flags from metadata obtained without following links.
    ///
    /// Unix has no hidden or system bits: a leading dot marks a hidden
    /// entry and a symlink stands in for a reparse point.
    #[cfg(not(windows))]
    pub fn from_metadata(path: &Path, metadata: &Metadata) -> Self {
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));

        Self {
            hidden,
            system: false,
            reparse: metadata.file_type().is_symlink(),
        }
    }

    /// Whether an entry with these flags is left out of scans
    pub fn is_excluded(&self) -> bool {
        self.hidden || self.system || self.reparse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_excluded() {
        assert!(!FileAttributes::default().is_excluded());
    }

    #[test]
    fn any_flag_excludes() {
        let hidden = FileAttributes {
            hidden: true,
            ..Default::default()
        };
        let system = FileAttributes {
            system: true,
            ..Default::default()
        };
        let reparse = FileAttributes {
            reparse: true,
            ..Default::default()
        };

        assert!(hidden.is_excluded());
        assert!(system.is_excluded());
        assert!(reparse.is_excluded());
    }

    #[cfg(unix)]
    #[test]
    fn dot_files_are_hidden_on_unix() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join(".secret");
        std::fs::write(&path, b"x").unwrap();

        let metadata = std::fs::symlink_metadata(&path).unwrap();
        assert!(FileAttributes::from_metadata(&path, &metadata).hidden);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_reparse_points_on_unix() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let target = temp_dir.path().join("target");
        let link = temp_dir.path().join("link");
        std::fs::create_dir(&target).unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let metadata = std::fs::symlink_metadata(&link).unwrap();
        assert!(FileAttributes::from_metadata(&link, &metadata).reparse);
    }
}
