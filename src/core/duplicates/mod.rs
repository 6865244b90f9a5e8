//! # Duplicates Module
//!
//! Exact-duplicate grouping over walked files.
//!
//! Files are bucketed by `(size, name)`. That key is a metadata heuristic:
//! two different files with the same name and length are reported as
//! duplicates, and renamed copies are missed. [`DuplicatePolicy::ContentVerified`]
//! splits every bucket by a full-content hash to close the first gap.

mod content;

pub use content::{content_hash, read_file_bytes, FileBytes};

use crate::core::pipeline::CancellationToken;
use crate::core::scanner::FileRecord;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace};

/// How duplicate membership is decided
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// Same name and same byte length
    #[default]
    Metadata,
    /// Same name, same length and same content hash
    ContentVerified,
}

/// Files that share a duplicate key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// `"{name}_{size}"`
    pub key: String,
    /// Members in discovery order
    pub files: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Byte length shared by every member
    pub fn file_size(&self) -> u64 {
        self.files.first().map(|f| f.size).unwrap_or(0)
    }

    /// Bytes reclaimable by keeping a single copy
    pub fn wasted_bytes(&self) -> u64 {
        self.file_size() * self.files.len().saturating_sub(1) as u64
    }
}

/// Groups walked files into exact-duplicate sets
#[derive(Debug, Clone, Default)]
pub struct ExactDuplicateGrouper {
    policy: DuplicatePolicy,
    max_files: Option<usize>,
}

impl ExactDuplicateGrouper {
    /// Create a grouper with the given policy and no file cap
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            max_files: None,
        }
    }

    /// Cap the total number of files across all returned groups
    pub fn with_max_files(mut self, max_files: Option<usize>) -> Self {
        self.max_files = max_files;
        self
    }

    /// Group `records`.
    ///
    /// Hidden, system and reparse files are ignored. Content verification
    /// stops at the next group boundary once `cancel` fires and keeps only
    /// the groups it finished.
    pub fn group(&self, records: &[FileRecord], cancel: &CancellationToken) -> Vec<DuplicateGroup> {
        let candidates: Vec<&FileRecord> = records
            .iter()
            .filter(|r| !r.attributes.is_excluded())
            .collect();

        let mut groups = group_by_name_and_size(&candidates);
        debug!(groups = groups.len(), files = candidates.len(), "metadata grouping done");

        if self.policy == DuplicatePolicy::ContentVerified {
            groups = verify_content(groups, cancel);
        }

        match self.max_files {
            Some(cap) => apply_file_cap(groups, cap),
            None => groups,
        }
    }
}

/// Bucket by `(size, name)` keeping discovery order; drop singletons.
fn group_by_name_and_size(records: &[&FileRecord]) -> Vec<DuplicateGroup> {
    let mut index: HashMap<(u64, &str), usize> = HashMap::new();
    let mut buckets: Vec<Vec<FileRecord>> = Vec::new();

    for record in records {
        let key = (record.size, record.name.as_str());
        match index.get(&key) {
            Some(&slot) => buckets[slot].push((*record).clone()),
            None => {
                index.insert(key, buckets.len());
                buckets.push(vec![(*record).clone()]);
            }
        }
    }

    buckets
        .into_iter()
        .filter(|files| files.len() > 1)
        .map(|files| DuplicateGroup {
            key: format!("{}_{}", files[0].name, files[0].size),
            files,
        })
        .collect()
}

/// Split every group by content hash. Unreadable files drop out.
fn verify_content(groups: Vec<DuplicateGroup>, cancel: &CancellationToken) -> Vec<DuplicateGroup> {
    let mut verified = Vec::new();

    for group in groups {
        if cancel.is_cancelled() {
            break;
        }

        let hashed: Vec<(u64, FileRecord)> = group
            .files
            .into_par_iter()
            .filter_map(|file| match content_hash(&file.path) {
                Ok(hash) => Some((hash, file)),
                Err(e) => {
                    trace!(error = %e, "content hash failed");
                    None
                }
            })
            .collect();

        let mut by_hash: Vec<(u64, Vec<FileRecord>)> = Vec::new();
        for (hash, file) in hashed {
            match by_hash.iter_mut().find(|(h, _)| *h == hash) {
                Some((_, files)) => files.push(file),
                None => by_hash.push((hash, vec![file])),
            }
        }

        let split = by_hash.len() > 1;
        for (hash, files) in by_hash {
            if files.len() < 2 {
                continue;
            }
            let key = if split {
                format!("{}_{:016x}", group.key, hash)
            } else {
                group.key.clone()
            };
            verified.push(DuplicateGroup { key, files });
        }
    }

    verified
}

/// Keep at most `cap` files, taking prefixes of groups in order.
///
/// A group cut down to a single file is dropped.
fn apply_file_cap(groups: Vec<DuplicateGroup>, cap: usize) -> Vec<DuplicateGroup> {
    let total: usize = groups.iter().map(|g| g.files.len()).sum();
    if total <= cap {
        return groups;
    }

    let mut limited = Vec::new();
    let mut count = 0;

    for mut group in groups {
        let take = group.files.len().min(cap - count);
        if take < 2 {
            break;
        }
        group.files.truncate(take);
        count += take;
        limited.push(group);
        if count >= cap {
            break;
        }
    }

    limited
}
