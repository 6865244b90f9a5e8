//! Breadth-first directory walking.
//!
//! walkdir lists one directory level at a time; the queue, depth cap and
//! attribute checks live here so that hidden, system and reparse-point
//! directories are never entered.

use super::{FileAttributes, FileRecord};
use crate::core::pipeline::CancellationToken;
use crate::error::ScanError;
use crate::events::{EventSender, PipelinePhase};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Deepest directory level that is still listed
pub const MAX_WALK_DEPTH: usize = 100;

/// Configuration for the tree walker
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Directories deeper than this are not listed
    pub max_depth: usize,
    /// Minimum time between status notifications
    pub status_interval: Duration,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_WALK_DEPTH,
            status_interval: Duration::from_millis(750),
        }
    }
}

/// Everything a walk produced
#[derive(Debug, Default)]
pub struct WalkOutcome {
    /// Files in discovery order
    pub files: Vec<FileRecord>,
    /// Directories that were listed
    pub directories_visited: usize,
    /// Items skipped because of I/O errors
    pub errors_skipped: usize,
    /// Roots that could not be walked at all
    pub root_errors: Vec<ScanError>,
    /// Whether the walk stopped on the cancellation token
    pub cancelled: bool,
}

/// Breadth-first walker over one or more roots
pub struct TreeWalker {
    config: WalkConfig,
}

struct WalkState<'a> {
    outcome: WalkOutcome,
    last_status: Instant,
    events: &'a EventSender,
}

impl TreeWalker {
    /// Create a new walker with the given configuration
    pub fn new(config: WalkConfig) -> Self {
        Self { config }
    }

    /// Walk every root in order.
    ///
    /// Returns early with `cancelled` set once the token fires; no status
    /// is sent after that point.
    pub fn walk(
        &self,
        roots: &[PathBuf],
        cancel: &CancellationToken,
        events: &EventSender,
    ) -> WalkOutcome {
        let mut state = WalkState {
            outcome: WalkOutcome::default(),
            last_status: Instant::now(),
            events,
        };

        for root in roots {
            if cancel.is_cancelled() {
                state.outcome.cancelled = true;
                break;
            }

            if let Err(error) = self.walk_root(root, cancel, &mut state) {
                debug!(root = %root.display(), %error, "skipping root");
                state.outcome.root_errors.push(error);
            }

            if state.outcome.cancelled {
                break;
            }

            events.status(format!(
                "Scanning... {} files found",
                state.outcome.files.len()
            ));
        }

        debug!(
            files = state.outcome.files.len(),
            directories = state.outcome.directories_visited,
            errors = state.outcome.errors_skipped,
            cancelled = state.outcome.cancelled,
            "walk finished"
        );

        state.outcome
    }

    fn walk_root(
        &self,
        root: &Path,
        cancel: &CancellationToken,
        state: &mut WalkState<'_>,
    ) -> Result<(), ScanError> {
        let mut queue: VecDeque<(PathBuf, usize)> = VecDeque::new();
        queue.push_back((root.to_path_buf(), 0));

        while let Some((dir, depth)) = queue.pop_front() {
            if cancel.is_cancelled() {
                state.outcome.cancelled = true;
                return Ok(());
            }

            if depth > self.config.max_depth {
                continue;
            }

            let is_root = depth == 0;

            let metadata = match fs::symlink_metadata(&dir) {
                Ok(metadata) => metadata,
                Err(e) if is_root => return Err(ScanError::from_io(dir, e)),
                Err(e) => {
                    trace!(path = %dir.display(), error = %e, "unreadable directory");
                    state.outcome.errors_skipped += 1;
                    continue;
                }
            };

            let mut attributes = FileAttributes::from_metadata(&dir, &metadata);
            if is_root {
                // A root picked explicitly is walked even if its name hides it
                attributes.hidden = false;
            }
            if attributes.is_excluded() {
                trace!(path = %dir.display(), ?attributes, "skipping directory");
                continue;
            }

            if is_root && !metadata.is_dir() {
                return Err(ScanError::DirectoryNotFound { path: dir });
            }

            self.list_directory(&dir, depth, &mut queue, state)?;
            state.outcome.directories_visited += 1;

            if state.last_status.elapsed() >= self.config.status_interval {
                state.events.status(format!(
                    "Collecting files... {} files, {} dirs",
                    state.outcome.files.len(),
                    state.outcome.directories_visited
                ));
                state.events.progress(
                    PipelinePhase::Walking,
                    state.outcome.files.len(),
                    0,
                );
                state.last_status = Instant::now();
            }
        }

        Ok(())
    }

    /// List one directory: files become records, subdirectories are queued.
    fn list_directory(
        &self,
        dir: &Path,
        depth: usize,
        queue: &mut VecDeque<(PathBuf, usize)>,
        state: &mut WalkState<'_>,
    ) -> Result<(), ScanError> {
        let entries = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry_result in entries {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    // Depth 0 means the directory itself could not be listed
                    if depth == 0 && e.depth() == 0 {
                        let source = e
                            .into_io_error()
                            .unwrap_or_else(|| std::io::Error::other("walk error"));
                        return Err(ScanError::from_io(dir.to_path_buf(), source));
                    }
                    trace!(path = ?e.path(), error = %e, "skipping entry");
                    state.outcome.errors_skipped += 1;
                    continue;
                }
            };

            let file_type = entry.file_type();
            let is_dir = file_type.is_dir() || (file_type.is_symlink() && entry.path().is_dir());

            if is_dir {
                queue.push_back((entry.into_path(), depth + 1));
                continue;
            }

            match entry.metadata() {
                Ok(metadata) => state
                    .outcome
                    .files
                    .push(FileRecord::from_metadata(entry.path(), &metadata)),
                Err(e) => {
                    trace!(path = %entry.path().display(), error = %e, "unreadable file");
                    state.outcome.errors_skipped += 1;
                }
            }
        }

        Ok(())
    }
}

impl Default for TreeWalker {
    fn default() -> Self {
        Self::new(WalkConfig::default())
    }
}
