use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;

use crate::error::LayoutError;
use crate::graph::{GraphIndex, NodeId};

/// Hop-count report from one designated center node. Descriptive only;
/// the optimizer never consumes it.
#[derive(Debug, Clone, Serialize)]
pub struct PathReport {
    pub center: NodeId,
    /// Nodes with a finite hop distance, excluding the center itself.
    pub reachable: usize,
    /// Nodes in the universe with no path to the center. Reported as a
    /// count, never as an infinite or zero distance.
    pub unreachable: usize,
    pub avg_distance: f64,
    pub max_distance: usize,
    /// Nodes per hop distance, distances >= 1.
    pub histogram: BTreeMap<usize, usize>,
}

/// Unweighted breadth-first distances from `source` over the adjacency
/// index. Unreached nodes are absent from the result.
pub fn bfs_distances(graph: &GraphIndex, source: NodeId) -> BTreeMap<NodeId, usize> {
    let mut distances = BTreeMap::new();
    distances.insert(source, 0);
    let mut queue = VecDeque::from([source]);

    while let Some(node) = queue.pop_front() {
        let depth = distances.get(&node).copied().unwrap_or(0);
        for neighbor in graph.neighbors(node) {
            if !distances.contains_key(&neighbor) {
                distances.insert(neighbor, depth + 1);
                queue.push_back(neighbor);
            }
        }
    }

    distances
}

/// BFS from `center` plus the aggregate statistics the progress reports
/// print. Fails fast for a center outside the node universe.
pub fn analyze_center(graph: &GraphIndex, center: NodeId) -> Result<PathReport, LayoutError> {
    if !graph.contains(center) {
        return Err(LayoutError::UnknownNode(center));
    }

    let distances = bfs_distances(graph, center);
    let reachable = distances.len().saturating_sub(1);
    let unreachable = graph.node_count().saturating_sub(distances.len());

    let mut histogram: BTreeMap<usize, usize> = BTreeMap::new();
    for &dist in distances.values() {
        if dist == 0 {
            continue;
        }
        *histogram.entry(dist).or_insert(0) += 1;
    }
    let total: usize = histogram.iter().map(|(dist, count)| dist * count).sum();
    let max_distance = histogram.keys().next_back().copied().unwrap_or(0);
    let avg_distance = if reachable > 0 {
        total as f64 / reachable as f64
    } else {
        0.0
    };

    Ok(PathReport {
        center,
        reachable,
        unreachable,
        avg_distance,
        max_distance,
        histogram,
    })
}
