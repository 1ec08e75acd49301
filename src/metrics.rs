use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::graph::{Edge, NodeId};
use crate::spiral::Point;

/// Aggregate edge-length statistics for one layout. Recomputed fresh at
/// every stage boundary; only the swap loop carries a running total, and
/// that total is cross-checked against this in tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutMetrics {
    pub edge_count: usize,
    pub total_distance: f64,
    pub avg_distance: f64,
    pub min_distance: f64,
    pub max_distance: f64,
}

impl LayoutMetrics {
    /// The contract for empty graphs: all zeros, not an error.
    pub fn zero() -> Self {
        Self {
            edge_count: 0,
            total_distance: 0.0,
            avg_distance: 0.0,
            min_distance: 0.0,
            max_distance: 0.0,
        }
    }
}

/// Percentage improvement of `current` over `previous` average edge
/// length. `None` when the previous average is zero (nothing to compare).
pub fn improvement_pct(previous: &LayoutMetrics, current: &LayoutMetrics) -> Option<f64> {
    if previous.avg_distance > 0.0 {
        Some((previous.avg_distance - current.avg_distance) / previous.avg_distance * 100.0)
    } else {
        None
    }
}

/// Euclidean edge-length aggregate over caller-supplied positions.
///
/// Fails fast if an edge references an id without a position; that is an
/// upstream precondition violation, never repaired here.
pub fn compute<'a>(
    positions: &BTreeMap<NodeId, Point>,
    edges: impl IntoIterator<Item = &'a Edge>,
) -> Result<LayoutMetrics, LayoutError> {
    let mut edge_count = 0usize;
    let mut total = 0.0f64;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for edge in edges {
        let a = positions
            .get(&edge.a)
            .copied()
            .ok_or(LayoutError::UnknownNode(edge.a))?;
        let b = positions
            .get(&edge.b)
            .copied()
            .ok_or(LayoutError::UnknownNode(edge.b))?;
        let dist = a.distance(b);
        edge_count += 1;
        total += dist;
        min = min.min(dist);
        max = max.max(dist);
    }

    if edge_count == 0 {
        return Ok(LayoutMetrics::zero());
    }

    Ok(LayoutMetrics {
        edge_count,
        total_distance: total,
        avg_distance: total / edge_count as f64,
        min_distance: min,
        max_distance: max,
    })
}
