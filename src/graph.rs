use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

pub type NodeId = u64;

/// An entity in the co-appearance graph. `weight` is the recognizability
/// score; it drives relaxation edge weighting and is carried through stage
/// outputs for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub weight: f64,
}

/// Canonical undirected edge with `a < b`. The only constructor sorts the
/// endpoints and rejects self-pairs, so a `BTreeSet<Edge>` deduplicates
/// observations regardless of direction or repetition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub a: NodeId,
    pub b: NodeId,
}

impl Edge {
    /// Canonicalize a raw pair. Returns `None` for self-pairs; a node
    /// cannot co-appear with itself in this domain.
    pub fn canonical(x: NodeId, y: NodeId) -> Option<Edge> {
        if x == y {
            return None;
        }
        Some(if x < y {
            Edge { a: x, b: y }
        } else {
            Edge { a: y, b: x }
        })
    }
}

/// Deduplicated edge set plus symmetric adjacency, built once per run and
/// read-only thereafter. Ordered containers keep iteration deterministic
/// across runs.
#[derive(Debug, Clone, Default)]
pub struct GraphIndex {
    edges: BTreeSet<Edge>,
    adjacency: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl GraphIndex {
    /// Build from a node universe and raw (source, target) observations.
    ///
    /// Pairs with either endpoint outside the universe are dropped, as are
    /// self-pairs. Duplicate observations in either direction collapse into
    /// one canonical edge, so degree counts unique neighbors rather than
    /// raw observations.
    pub fn build(ids: &[NodeId], raw_pairs: &[(NodeId, NodeId)]) -> GraphIndex {
        let universe: HashSet<NodeId> = ids.iter().copied().collect();
        let mut adjacency: BTreeMap<NodeId, BTreeSet<NodeId>> =
            ids.iter().map(|&id| (id, BTreeSet::new())).collect();
        let mut edges = BTreeSet::new();

        for &(source, target) in raw_pairs {
            if !universe.contains(&source) || !universe.contains(&target) {
                continue;
            }
            let Some(edge) = Edge::canonical(source, target) else {
                continue;
            };
            if edges.insert(edge) {
                if let Some(set) = adjacency.get_mut(&edge.a) {
                    set.insert(edge.b);
                }
                if let Some(set) = adjacency.get_mut(&edge.b) {
                    set.insert(edge.a);
                }
            }
        }

        GraphIndex { edges, adjacency }
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.adjacency.contains_key(&id)
    }

    /// Direct neighbors of `id`; empty for unknown ids.
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency
            .get(&id)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Unique-neighbor count; 0 for unknown ids.
    pub fn degree(&self, id: NodeId) -> usize {
        self.adjacency.get(&id).map(|set| set.len()).unwrap_or(0)
    }

    pub fn are_connected(&self, x: NodeId, y: NodeId) -> bool {
        self.adjacency
            .get(&x)
            .map(|set| set.contains(&y))
            .unwrap_or(false)
    }
}
