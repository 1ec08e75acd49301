use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SwapConfig;
use crate::error::LayoutError;
use crate::graph::{GraphIndex, NodeId};
use crate::metrics;
use crate::spiral::Point;
use crate::state::LayoutState;

const MIN_ITERATIONS: usize = 5_000;
const MAX_ITERATIONS: usize = 50_000;
const ITERATIONS_PER_EDGE: usize = 6;
const MIN_NO_IMPROVE: usize = 500;

/// Which stopping condition ended an optimization loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Consecutive non-improving swap trials reached the threshold.
    Stagnation,
    /// Relative objective improvement stayed below threshold for the
    /// patience window.
    Converged,
    /// The hard iteration cap was hit before convergence.
    IterationCap,
}

/// Convergence record for one swap-optimization run.
#[derive(Debug, Clone, Serialize)]
pub struct SwapStats {
    pub iterations: usize,
    pub swaps_accepted: usize,
    pub stop_reason: StopReason,
    /// Running total maintained incrementally across accepted swaps;
    /// matches a fresh metrics recomputation within float tolerance.
    pub total_distance: f64,
    pub elapsed: Duration,
}

/// Iteration budget as a pure function of edge count: roughly six trials
/// per edge, floored and capped so small graphs still search and large
/// graphs stay bounded. The early-stop limit is a fixed fraction of the
/// cap. Returns `(max_iterations, no_improve_limit)`.
pub fn resolve_iteration_budget(edge_count: usize) -> (usize, usize) {
    let cap = (edge_count * ITERATIONS_PER_EDGE).clamp(MIN_ITERATIONS, MAX_ITERATIONS);
    let no_improve = (cap / 20).max(MIN_NO_IMPROVE);
    (cap, no_improve)
}

/// Stochastic pairwise-exchange local search minimizing total edge length.
///
/// Each trial picks two distinct nodes from the injected RNG, evaluates
/// the exact distance delta over only their incident edges, and accepts
/// the exchange iff the delta clears the improvement epsilon. Stops at the
/// stagnation threshold or the iteration cap, whichever comes first.
pub fn optimize(
    state: &mut LayoutState,
    graph: &GraphIndex,
    config: &SwapConfig,
    rng: &mut impl Rng,
) -> Result<SwapStats, LayoutError> {
    if state.len() < 2 {
        return Err(LayoutError::TooFewNodes(state.len()));
    }
    for edge in graph.edges() {
        if state.position(edge.a).is_none() {
            return Err(LayoutError::UnknownNode(edge.a));
        }
        if state.position(edge.b).is_none() {
            return Err(LayoutError::UnknownNode(edge.b));
        }
    }

    let max_iterations = config
        .max_iterations
        .unwrap_or_else(|| resolve_iteration_budget(graph.edge_count()).0);
    let stagnation_limit = config
        .stagnation_threshold
        .unwrap_or_else(|| resolve_iteration_budget(graph.edge_count()).1);

    let ids: Vec<NodeId> = state.node_ids().to_vec();
    // Explicit running total threaded through the loop; accepted deltas are
    // added instead of recomputing all edges per trial.
    let mut total_distance = metrics::compute(state.positions(), graph.edges())?.total_distance;

    let start = Instant::now();
    let mut iterations = 0usize;
    let mut swaps_accepted = 0usize;
    let mut stagnation = 0usize;

    while stagnation < stagnation_limit && iterations < max_iterations {
        iterations += 1;
        let (i, j) = pick_pair(&ids, rng);
        let delta = swap_delta(i, j, state, graph)?;

        if delta < -config.epsilon {
            state.swap(i, j)?;
            total_distance += delta;
            swaps_accepted += 1;
            stagnation = 0;
        } else {
            stagnation += 1;
        }
    }

    let stop_reason = if stagnation >= stagnation_limit {
        StopReason::Stagnation
    } else {
        StopReason::IterationCap
    };

    Ok(SwapStats {
        iterations,
        swaps_accepted,
        stop_reason,
        total_distance,
        elapsed: start.elapsed(),
    })
}

fn pick_pair(ids: &[NodeId], rng: &mut impl Rng) -> (NodeId, NodeId) {
    let i = rng.gen_range(0..ids.len());
    let mut j = rng.gen_range(0..ids.len());
    while j == i {
        j = rng.gen_range(0..ids.len());
    }
    (ids[i], ids[j])
}

/// Sum of distances from `id` to its direct neighbors under the current
/// coordinates.
fn contribution(id: NodeId, positions: &BTreeMap<NodeId, Point>, graph: &GraphIndex) -> f64 {
    let Some(&origin) = positions.get(&id) else {
        return 0.0;
    };
    graph
        .neighbors(id)
        .filter_map(|neighbor| positions.get(&neighbor))
        .map(|&p| origin.distance(p))
        .sum()
}

/// Exact change in total edge length if `i` and `j` exchanged slots.
///
/// Only edges incident to the pair are touched, O(deg(i) + deg(j)) per
/// trial. When the pair is directly connected their shared edge appears in
/// both contribution sums and is subtracted once on each side. The
/// tentative exchange is reverted before returning (swap is self-inverse).
fn swap_delta(
    i: NodeId,
    j: NodeId,
    state: &mut LayoutState,
    graph: &GraphIndex,
) -> Result<f64, LayoutError> {
    let shared = graph.are_connected(i, j);
    let pair_distance = |state: &LayoutState| match (state.position(i), state.position(j)) {
        (Some(a), Some(b)) => a.distance(b),
        _ => 0.0,
    };

    let mut old_total = contribution(i, state.positions(), graph)
        + contribution(j, state.positions(), graph);
    if shared {
        old_total -= pair_distance(state);
    }

    state.swap(i, j)?;
    let mut new_total = contribution(i, state.positions(), graph)
        + contribution(j, state.positions(), graph);
    if shared {
        new_total -= pair_distance(state);
    }
    state.swap(i, j)?;

    Ok(new_total - old_total)
}
