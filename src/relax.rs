use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::RelaxConfig;
use crate::error::LayoutError;
use crate::graph::{Edge, GraphIndex, Node, NodeId};
use crate::spiral::Point;
use crate::state::LayoutState;
use crate::swap::StopReason;

/// Substitute distance for coincident points so force directions stay
/// finite; paired with a canonical (1, 0) fallback direction.
const COINCIDENT_DISTANCE: f64 = 1e-6;

/// Convergence record for one force-relaxation run.
#[derive(Debug, Clone, Serialize)]
pub struct RelaxStats {
    pub iterations: usize,
    /// Weighted total edge length after the final iteration.
    pub final_objective: f64,
    /// Percentage improvement of the objective versus the stage input.
    pub improvement_from_input: f64,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

/// Per-edge spring weights derived from the endpoints' recognizability:
/// `1 + weight_scale * avg(normalized weight)`, so more important pairs
/// pull harder. A scale of 0 gives uniform springs.
pub fn edge_weights(
    nodes: &[Node],
    graph: &GraphIndex,
    weight_scale: f64,
) -> BTreeMap<Edge, f64> {
    let normalized = normalize_weights(nodes);
    graph
        .edges()
        .map(|&edge| {
            let a = normalized.get(&edge.a).copied().unwrap_or(0.5);
            let b = normalized.get(&edge.b).copied().unwrap_or(0.5);
            (edge, 1.0 + weight_scale * (a + b) / 2.0)
        })
        .collect()
}

/// Min-max normalization of node weights into [0, 1]; a flat weight
/// distribution normalizes to 0.5 everywhere.
fn normalize_weights(nodes: &[Node]) -> BTreeMap<NodeId, f64> {
    let min = nodes.iter().map(|n| n.weight).fold(f64::INFINITY, f64::min);
    let max = nodes
        .iter()
        .map(|n| n.weight)
        .fold(f64::NEG_INFINITY, f64::max);

    if max <= min {
        return nodes.iter().map(|n| (n.id, 0.5)).collect();
    }
    let scale = max - min;
    nodes
        .iter()
        .map(|n| (n.id, (n.weight - min) / scale))
        .collect()
}

/// Weighted total edge length, the objective the relaxation minimizes.
fn objective(
    positions: &BTreeMap<NodeId, Point>,
    graph: &GraphIndex,
    weights: &BTreeMap<Edge, f64>,
) -> f64 {
    graph
        .edges()
        .filter_map(|edge| {
            let a = positions.get(&edge.a)?;
            let b = positions.get(&edge.b)?;
            let weight = weights.get(edge).copied().unwrap_or(1.0);
            Some(weight * a.distance(*b))
        })
        .sum()
}

/// Continuous force relaxation of the swap-optimized coordinates.
///
/// Each iteration synchronously accumulates three forces per node —
/// spring attraction along edges, short-range repulsion for pairs closer
/// than `min_distance`, and an anchor pull back toward the stage-input
/// coordinate — then applies displacements scaled by `step_size` and
/// capped at `max_step`. Slots are untouched; only coordinates move.
///
/// The repulsion pass is the one all-pairs cost in the crate and is the
/// scalability ceiling for large node counts.
pub fn relax(
    state: &mut LayoutState,
    graph: &GraphIndex,
    weights: &BTreeMap<Edge, f64>,
    config: &RelaxConfig,
) -> Result<RelaxStats, LayoutError> {
    for edge in graph.edges() {
        if state.position(edge.a).is_none() {
            return Err(LayoutError::UnknownNode(edge.a));
        }
        if state.position(edge.b).is_none() {
            return Err(LayoutError::UnknownNode(edge.b));
        }
    }

    let ids: Vec<NodeId> = state.node_ids().to_vec();
    let anchors: BTreeMap<NodeId, Point> = state.positions().clone();
    let initial_objective = objective(state.positions(), graph, weights);

    let start = Instant::now();
    let mut prev_objective = initial_objective;
    let mut no_improve = 0usize;
    let mut iterations = 0usize;

    for iteration in 1..=config.max_iterations {
        iterations = iteration;
        let mut forces: BTreeMap<NodeId, (f64, f64)> =
            ids.iter().map(|&id| (id, (0.0, 0.0))).collect();

        // Attraction: springs along edges, proportional to distance and
        // the per-edge weight. Coincident endpoints exert no pull.
        for edge in graph.edges() {
            let (Some(a), Some(b)) = (state.position(edge.a), state.position(edge.b)) else {
                continue;
            };
            let dx = b.x - a.x;
            let dy = b.y - a.y;
            let dist = dx.hypot(dy);
            if dist == 0.0 {
                continue;
            }
            let weight = weights.get(edge).copied().unwrap_or(1.0);
            let magnitude = config.attraction * weight * dist;
            let fx = dx / dist * magnitude;
            let fy = dy / dist * magnitude;
            if let Some(force) = forces.get_mut(&edge.a) {
                force.0 += fx;
                force.1 += fy;
            }
            if let Some(force) = forces.get_mut(&edge.b) {
                force.0 -= fx;
                force.1 -= fy;
            }
        }

        // Repulsion: all pairs, but only those overlapping the minimum
        // distance push apart, which bounds the active pair count.
        for (idx, &id_i) in ids.iter().enumerate() {
            let Some(pos_i) = state.position(id_i) else {
                continue;
            };
            for &id_j in &ids[idx + 1..] {
                let Some(pos_j) = state.position(id_j) else {
                    continue;
                };
                let dx = pos_j.x - pos_i.x;
                let dy = pos_j.y - pos_i.y;
                let raw_dist = dx.hypot(dy);
                let (ux, uy, dist) = if raw_dist == 0.0 {
                    (1.0, 0.0, COINCIDENT_DISTANCE)
                } else {
                    (dx / raw_dist, dy / raw_dist, raw_dist)
                };
                if dist < config.min_distance {
                    let magnitude = config.repulsion * (config.min_distance - dist);
                    let fx = ux * magnitude;
                    let fy = uy * magnitude;
                    if let Some(force) = forces.get_mut(&id_i) {
                        force.0 -= fx;
                        force.1 -= fy;
                    }
                    if let Some(force) = forces.get_mut(&id_j) {
                        force.0 += fx;
                        force.1 += fy;
                    }
                }
            }
        }

        // Anchor: pull back toward the stage-input coordinate to bound
        // drift from the swap-optimized layout.
        for &id in &ids {
            let (Some(anchor), Some(current)) = (anchors.get(&id), state.position(id)) else {
                continue;
            };
            if let Some(force) = forces.get_mut(&id) {
                force.0 += config.anchor * (anchor.x - current.x);
                force.1 += config.anchor * (anchor.y - current.y);
            }
        }

        // Apply scaled displacements, capped direction-preserving at
        // max_step.
        for &id in &ids {
            let (fx, fy) = forces.get(&id).copied().unwrap_or((0.0, 0.0));
            let mut step_x = config.step_size * fx;
            let mut step_y = config.step_size * fy;
            let step = step_x.hypot(step_y);
            if step > config.max_step {
                let rescale = config.max_step / step;
                step_x *= rescale;
                step_y *= rescale;
            }
            let Some(current) = state.position(id) else {
                continue;
            };
            state.nudge(id, Point::new(current.x + step_x, current.y + step_y))?;
        }

        let current_objective = objective(state.positions(), graph, weights);
        let improvement = if prev_objective > 0.0 {
            (prev_objective - current_objective) / prev_objective
        } else {
            0.0
        };
        if improvement < config.improvement_threshold {
            no_improve += 1;
        } else {
            no_improve = 0;
        }
        if no_improve >= config.patience {
            break;
        }
        prev_objective = current_objective;
    }

    let final_objective = objective(state.positions(), graph, weights);
    let improvement_from_input = if initial_objective > 0.0 {
        (initial_objective - final_objective) / initial_objective * 100.0
    } else {
        0.0
    };
    let stop_reason = if no_improve >= config.patience {
        StopReason::Converged
    } else {
        StopReason::IterationCap
    };

    Ok(RelaxStats {
        iterations,
        final_objective,
        improvement_from_input,
        stop_reason,
        elapsed: start.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering;
    use crate::state::LayoutState;

    fn nodes_of(ids: &[NodeId]) -> Vec<Node> {
        ids.iter()
            .map(|&id| Node {
                id,
                name: format!("n{id}"),
                weight: id as f64,
            })
            .collect()
    }

    fn ring(n: u64) -> (Vec<NodeId>, GraphIndex) {
        let ids: Vec<NodeId> = (0..n).collect();
        let raw: Vec<(NodeId, NodeId)> = (0..n).map(|i| (i, (i + 1) % n)).collect();
        let graph = GraphIndex::build(&ids, &raw);
        (ids, graph)
    }

    fn degree_state(ids: &[NodeId], graph: &GraphIndex) -> LayoutState {
        LayoutState::new(ids.to_vec(), ordering::degree_slots(ids, graph), 80.0).unwrap()
    }

    #[test]
    fn flat_weights_normalize_to_half() {
        let ids = [1u64, 2, 3];
        let mut nodes = nodes_of(&ids);
        for node in &mut nodes {
            node.weight = 7.0;
        }
        let graph = GraphIndex::build(&ids, &[(1, 2), (2, 3)]);
        let weights = edge_weights(&nodes, &graph, 0.4);
        for weight in weights.values() {
            assert!((weight - 1.2).abs() < 1e-12);
        }
    }

    #[test]
    fn heavier_endpoints_pull_harder() {
        let ids = [1u64, 2, 3, 4];
        let nodes = nodes_of(&ids);
        let graph = GraphIndex::build(&ids, &[(1, 2), (3, 4)]);
        let weights = edge_weights(&nodes, &graph, 0.35);
        let light = weights[&Edge::canonical(1, 2).unwrap()];
        let heavy = weights[&Edge::canonical(3, 4).unwrap()];
        assert!(heavy > light);
    }

    #[test]
    fn zero_scale_gives_uniform_weights() {
        let ids = [1u64, 2];
        let graph = GraphIndex::build(&ids, &[(1, 2)]);
        let weights = edge_weights(&nodes_of(&ids), &graph, 0.0);
        assert_eq!(weights[&Edge::canonical(1, 2).unwrap()], 1.0);
    }

    #[test]
    fn displacement_never_exceeds_max_step() {
        let (ids, graph) = ring(10);
        let mut state = degree_state(&ids, &graph);
        let weights = BTreeMap::new();
        // Violent forces so the cap is exercised, one iteration so each
        // node's displacement is directly observable.
        let config = RelaxConfig {
            max_iterations: 1,
            step_size: 10.0,
            max_step: 5.0,
            attraction: 1.0,
            repulsion: 10.0,
            anchor: 1.0,
            min_distance: 500.0,
            ..RelaxConfig::default()
        };

        let before = state.positions().clone();
        relax(&mut state, &graph, &weights, &config).unwrap();
        for (&id, after) in state.positions() {
            let moved = before[&id].distance(*after);
            assert!(
                moved <= config.max_step + 1e-9,
                "node {id} moved {moved}, above the {} cap",
                config.max_step
            );
        }
    }

    #[test]
    fn relaxation_does_not_worsen_the_objective() {
        let (ids, graph) = ring(12);
        let mut state = degree_state(&ids, &graph);
        let weights = edge_weights(&nodes_of(&ids), &graph, 0.35);

        let before = objective(state.positions(), &graph, &weights);
        let stats = relax(&mut state, &graph, &weights, &RelaxConfig::default()).unwrap();
        assert!(stats.final_objective <= before + 1e-9);
        assert!(stats.improvement_from_input >= 0.0);
    }

    #[test]
    fn patience_stops_a_settled_layout() {
        let (ids, graph) = ring(6);
        let mut state = degree_state(&ids, &graph);
        // All forces off: the objective cannot improve, so the patience
        // counter runs out immediately after `patience` iterations.
        let config = RelaxConfig {
            attraction: 0.0,
            repulsion: 0.0,
            anchor: 0.0,
            patience: 5,
            ..RelaxConfig::default()
        };
        let stats = relax(&mut state, &graph, &BTreeMap::new(), &config).unwrap();
        assert_eq!(stats.stop_reason, StopReason::Converged);
        assert_eq!(stats.iterations, 5);
    }

    #[test]
    fn coincident_points_are_pushed_apart() {
        let ids = [1u64, 2];
        let graph = GraphIndex::build(&ids, &[]);
        let slots: BTreeMap<NodeId, usize> = [(1u64, 0usize), (2, 1)].into_iter().collect();
        let mut state = LayoutState::new(vec![1, 2], slots, 80.0).unwrap();
        state.nudge(1, Point::new(0.0, 0.0)).unwrap();
        state.nudge(2, Point::new(0.0, 0.0)).unwrap();

        let config = RelaxConfig {
            max_iterations: 1,
            anchor: 0.0,
            ..RelaxConfig::default()
        };
        relax(&mut state, &graph, &BTreeMap::new(), &config).unwrap();
        let a = state.position(1).unwrap();
        let b = state.position(2).unwrap();
        assert!(a.distance(b) > 0.0, "coincident pair was not separated");
        // Fallback direction is the x axis.
        assert!(a.x != b.x);
    }
}
