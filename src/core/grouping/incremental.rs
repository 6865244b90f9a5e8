//! Streaming greedy clustering.
//!
//! Pairs arrive closest-first. Each image is either unassigned or belongs
//! to exactly one group:
//!
//! | i          | j          | action                                   |
//! |------------|------------|------------------------------------------|
//! | unassigned | unassigned | create a group {i, j}                    |
//! | in g       | unassigned | add j to g, then probe for one merge     |
//! | in g       | in h       | nothing                                  |
//!
//! The merge probe is bounded: at most [`MERGE_SAMPLES`] cross-group pairs
//! per other group, and at most one merge per added member.
//!
//! A group never holds two files sharing name and length: a join that
//! would add such a twin is refused, and so is a merge that would combine
//! twins.

use super::ImageGroup;
use crate::core::scanner::FileRecord;
use crate::core::verifier::{PairScorer, SimilarityScore};
use crate::events::GroupEvent;
use tracing::debug;

/// Cross-group pairs sampled per other group during a merge probe
pub const MERGE_SAMPLES: usize = 2;

struct LiveGroup {
    id: String,
    members: Vec<usize>,
    similarity: f64,
}

/// Online grouper fed with verified, threshold-passing pairs
pub struct IncrementalGrouper<'a, S: PairScorer + ?Sized> {
    files: &'a [FileRecord],
    scorer: &'a S,
    threshold: f64,
    groups: Vec<LiveGroup>,
    assignment: Vec<Option<usize>>,
    created: usize,
}

impl<'a, S: PairScorer + ?Sized> IncrementalGrouper<'a, S> {
    /// Create a grouper over `files`; pair indices refer to this slice.
    ///
    /// `scorer` is consulted only by the merge probe.
    pub fn new(files: &'a [FileRecord], scorer: &'a S, threshold: f64) -> Self {
        Self {
            files,
            scorer,
            threshold,
            groups: Vec::new(),
            assignment: vec![None; files.len()],
            created: 0,
        }
    }

    /// Number of live groups
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Apply one verified pair and return the resulting events.
    ///
    /// Pairs below the threshold, pairs of name-and-length twins and pairs
    /// with an out-of-range index are ignored.
    pub fn process(&mut self, scored: &SimilarityScore) -> Vec<GroupEvent> {
        let (i, j) = (scored.pair.i, scored.pair.j);
        if i == j
            || i >= self.files.len()
            || j >= self.files.len()
            || scored.score < self.threshold
            || self.scorer.is_exact_duplicate(i, j)
        {
            return Vec::new();
        }

        match (self.assignment[i], self.assignment[j]) {
            (None, None) => vec![self.create(i, j, scored.score)],
            (Some(g), None) if !self.has_twin(g, j) => self.join(g, j),
            (None, Some(g)) if !self.has_twin(g, i) => self.join(g, i),
            _ => Vec::new(),
        }
    }

    /// Whether `image` shares name and length with a member of `group`
    fn has_twin(&self, group: usize, image: usize) -> bool {
        self.groups[group]
            .members
            .iter()
            .any(|&member| self.scorer.is_exact_duplicate(member, image))
    }

    fn create(&mut self, i: usize, j: usize, similarity: f64) -> GroupEvent {
        let index = self.groups.len();
        self.groups.push(LiveGroup {
            id: format!("group_{}", self.created),
            members: vec![i, j],
            similarity,
        });
        self.created += 1;
        self.assignment[i] = Some(index);
        self.assignment[j] = Some(index);

        GroupEvent::Created(self.snapshot(index))
    }

    fn join(&mut self, group: usize, image: usize) -> Vec<GroupEvent> {
        self.groups[group].members.push(image);
        self.assignment[image] = Some(group);

        let mut events = vec![GroupEvent::MemberAdded {
            group_id: self.groups[group].id.clone(),
            image: self.files[image].clone(),
        }];
        events.extend(self.probe_merge(group));
        events
    }

    /// Merge the first other group whose sampled pairs meet the threshold.
    fn probe_merge(&mut self, target: usize) -> Option<GroupEvent> {
        let other = (0..self.groups.len())
            .filter(|&o| o != target)
            .find(|&o| self.samples_match(target, o) && !self.would_combine_twins(target, o))?;

        let absorbed = self.groups.remove(other);
        let target = if other < target { target - 1 } else { target };

        for slot in self.assignment.iter_mut().flatten() {
            if *slot > other {
                *slot -= 1;
            }
        }
        for &member in &absorbed.members {
            self.assignment[member] = Some(target);
        }
        self.groups[target].members.extend(absorbed.members);

        debug!(group = %self.groups[target].id, absorbed = %absorbed.id, "groups merged");
        Some(GroupEvent::Merged {
            group_id: self.groups[target].id.clone(),
            absorbed_id: absorbed.id,
        })
    }

    fn samples_match(&self, target: usize, other: usize) -> bool {
        let target_members = &self.groups[target].members;
        let other_members = &self.groups[other].members;

        target_members
            .iter()
            .flat_map(|&a| other_members.iter().map(move |&b| (a, b)))
            .take(MERGE_SAMPLES)
            .any(|(a, b)| {
                !self.scorer.is_exact_duplicate(a, b)
                    && self
                        .scorer
                        .score(a, b)
                        .is_some_and(|score| score >= self.threshold)
            })
    }

    fn would_combine_twins(&self, target: usize, other: usize) -> bool {
        self.groups[other]
            .members
            .iter()
            .any(|&member| self.has_twin(target, member))
    }

    fn snapshot(&self, index: usize) -> ImageGroup {
        let group = &self.groups[index];
        ImageGroup {
            id: group.id.clone(),
            images: group.members.iter().map(|&m| self.files[m].clone()).collect(),
            similarity: group.similarity,
        }
    }

    /// The live groups, in creation order minus any absorbed ones
    pub fn finish(self) -> Vec<ImageGroup> {
        (0..self.groups.len()).map(|g| self.snapshot(g)).collect()
    }
}
