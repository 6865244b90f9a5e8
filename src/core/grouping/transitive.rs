//! Groups images into clusters using transitive relationships.
//!
//! If A matches B and B matches C, then {A, B, C} forms a single group
//! even if A doesn't directly match C.

use super::ImageGroup;
use crate::core::scanner::FileRecord;
use crate::core::verifier::SimilarityScore;
use std::collections::HashMap;

/// Groups verified pairs into connected components
pub struct TransitiveGrouper {
    threshold: f64,
}

impl TransitiveGrouper {
    /// Create a grouper that links pairs scoring at least `threshold`
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Group passing pairs into clusters.
    ///
    /// Uses union-find over image indices. Groups come out in the order
    /// their first pair appears in `scores`, members sorted by index, and
    /// each group's similarity is its best pair score.
    pub fn group(&self, files: &[FileRecord], scores: &[SimilarityScore]) -> Vec<ImageGroup> {
        let passing: Vec<&SimilarityScore> = scores
            .iter()
            .filter(|s| s.score >= self.threshold)
            .filter(|s| s.pair.i != s.pair.j)
            .filter(|s| s.pair.i < files.len() && s.pair.j < files.len())
            .collect();
        if passing.is_empty() {
            return Vec::new();
        }

        let mut parent: Vec<usize> = (0..files.len()).collect();
        let mut component: Vec<Vec<usize>> = (0..files.len()).map(|i| vec![i]).collect();

        // Find root with path halving
        fn find(parent: &mut [usize], mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }

        // A union that would put two name-and-length twins together is refused
        let mut linked: Vec<&SimilarityScore> = Vec::with_capacity(passing.len());
        for s in passing {
            let root_a = find(&mut parent, s.pair.i);
            let root_b = find(&mut parent, s.pair.j);
            if root_a != root_b {
                let twins = component[root_a].iter().any(|&a| {
                    component[root_b]
                        .iter()
                        .any(|&b| files[a].same_name_and_size(&files[b]))
                });
                if twins {
                    continue;
                }
                parent[root_b] = root_a;
                let moved = std::mem::take(&mut component[root_b]);
                component[root_a].extend(moved);
            }
            linked.push(s);
        }

        // Order components by their first appearance in the pair stream
        let mut order: Vec<usize> = Vec::new();
        let mut best: HashMap<usize, f64> = HashMap::new();
        for s in &linked {
            let root = find(&mut parent, s.pair.i);
            match best.get_mut(&root) {
                Some(score) => *score = score.max(s.score),
                None => {
                    order.push(root);
                    best.insert(root, s.score);
                }
            }
        }

        let mut members: HashMap<usize, Vec<usize>> = HashMap::new();
        for index in 0..files.len() {
            let root = find(&mut parent, index);
            if best.contains_key(&root) {
                members.entry(root).or_default().push(index);
            }
        }

        order
            .into_iter()
            .enumerate()
            .map(|(n, root)| ImageGroup {
                id: format!("group_{}", n),
                images: members
                    .remove(&root)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|m| files[m].clone())
                    .collect(),
                similarity: best[&root],
            })
            .collect()
    }
}
