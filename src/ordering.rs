use std::cmp::Reverse;
use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::graph::{GraphIndex, NodeId};

/// Seeded random permutation of 0..n, assigned to nodes in input order.
/// The same seed always yields the same assignment; this is the baseline
/// every optimized stage is measured against.
pub fn random_slots(ids: &[NodeId], seed: u64) -> BTreeMap<NodeId, usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut slots: Vec<usize> = (0..ids.len()).collect();
    slots.shuffle(&mut rng);
    ids.iter().copied().zip(slots).collect()
}

/// Degree-descending assignment: the most connected node takes slot 0,
/// where the spiral radius is smallest and its many incident edges are
/// geometrically cheapest. Ties keep input order so runs are reproducible.
pub fn degree_slots(ids: &[NodeId], graph: &GraphIndex) -> BTreeMap<NodeId, usize> {
    let mut ranked: Vec<NodeId> = ids.to_vec();
    // Stable sort preserves input order among equal degrees.
    ranked.sort_by_key(|&id| Reverse(graph.degree(id)));
    ranked
        .into_iter()
        .enumerate()
        .map(|(slot, id)| (id, slot))
        .collect()
}
