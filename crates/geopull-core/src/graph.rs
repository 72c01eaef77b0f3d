//! Memoized pairwise distances between identified points.
//!
//! Keyed per source point: `graph[a][b]` is the distance from `a` to `b`.
//! Each direction is checked independently, but a distance is computed at
//! most once per unordered pair and is never overwritten afterwards.
//! Entries only ever get added, so repeated extensions with overlapping
//! random subsets cost nothing for pairs already seen.

use std::collections::HashMap;

use crate::types::{IdentifiedPoint, Point, PointId, distance};

/// Adjacency map of memoized Euclidean distances.
#[derive(Debug, Clone, Default)]
pub struct DistanceGraph {
    edges: HashMap<PointId, HashMap<PointId, f64>>,
    computed: usize,
}

impl DistanceGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Memoized distance from `from` to `to`, if present.
    #[must_use]
    pub fn get(&self, from: PointId, to: PointId) -> Option<f64> {
        self.edges.get(&from)?.get(&to).copied()
    }

    /// Number of distances computed by this graph so far.
    #[must_use]
    pub const fn computed(&self) -> usize {
        self.computed
    }

    /// Number of stored directed entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.edges.values().map(HashMap::len).sum()
    }

    /// Add Euclidean distances for every (traveled, choice) pair not
    /// already present, in both directions.
    pub fn extend(&mut self, traveled: &[IdentifiedPoint], choice: &[IdentifiedPoint]) {
        self.extend_with(traveled, choice, distance);
    }

    /// [`extend`](Self::extend) with a caller-supplied metric.
    pub fn extend_with<F>(
        &mut self,
        traveled: &[IdentifiedPoint],
        choice: &[IdentifiedPoint],
        mut metric: F,
    ) where
        F: FnMut(Point, Point) -> f64,
    {
        for t in traveled {
            for c in choice {
                let forward = self.get(t.id, c.id);
                let backward = self.get(c.id, t.id);
                if forward.is_some() && backward.is_some() {
                    continue;
                }

                let d = match forward.or(backward) {
                    Some(known) => known,
                    None => {
                        self.computed += 1;
                        metric(t.point, c.point)
                    }
                };
                self.edges.entry(t.id).or_default().entry(c.id).or_insert(d);
                self.edges.entry(c.id).or_default().entry(t.id).or_insert(d);
            }
        }
    }
}
