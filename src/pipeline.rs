use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::config::Config;
use crate::error::LayoutError;
use crate::graph::{Edge, GraphIndex, Node, NodeId};
use crate::metrics::{self, LayoutMetrics};
use crate::ordering;
use crate::relax::{self, RelaxStats};
use crate::state::LayoutState;
use crate::swap::{self, SwapStats};

/// A node annotated with its slot and spiral coordinate, as persisted in
/// every stage output.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedNode {
    pub id: NodeId,
    pub name: String,
    pub weight: f64,
    pub degree: usize,
    pub slot: usize,
    pub x: f64,
    pub y: f64,
}

/// Stage-specific convergence stats; the baseline and ordering stages
/// have none.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStats {
    Swap(SwapStats),
    Relax(RelaxStats),
}

/// One pipeline stage's full output: annotated nodes, canonical edges,
/// fresh metrics, and optional convergence stats. Consumed by the next
/// stage and by the persistence collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct StageOutput {
    pub stage: String,
    pub nodes: Vec<PlacedNode>,
    pub edges: Vec<Edge>,
    pub metrics: LayoutMetrics,
    pub stats: Option<StageStats>,
}

impl StageOutput {
    fn capture(
        stage: &str,
        nodes: &[Node],
        graph: &GraphIndex,
        state: &LayoutState,
        stats: Option<StageStats>,
    ) -> Result<Self, LayoutError> {
        // Metrics are recomputed fresh at every stage boundary; running
        // totals never cross stage restarts.
        let metrics = metrics::compute(state.positions(), graph.edges())?;
        let mut placed = Vec::with_capacity(nodes.len());
        for node in nodes {
            let slot = state.slot(node.id).ok_or(LayoutError::UnknownNode(node.id))?;
            let position = state
                .position(node.id)
                .ok_or(LayoutError::UnknownNode(node.id))?;
            placed.push(PlacedNode {
                id: node.id,
                name: node.name.clone(),
                weight: node.weight,
                degree: graph.degree(node.id),
                slot,
                x: position.x,
                y: position.y,
            });
        }
        Ok(Self {
            stage: stage.to_string(),
            nodes: placed,
            edges: graph.edges().copied().collect(),
            metrics,
            stats,
        })
    }
}

/// Outputs of every executed stage, in pipeline order. The first entry is
/// always the random baseline when the graph is non-empty.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub stages: Vec<StageOutput>,
}

impl PipelineReport {
    pub fn baseline(&self) -> Option<&StageOutput> {
        self.stages.first()
    }

    pub fn final_stage(&self) -> Option<&StageOutput> {
        self.stages.last()
    }
}

/// Run the full optimization pipeline: random baseline, centrality
/// ordering, swap optimization, force relaxation. Metrics are recomputed
/// at every boundary; degenerate inputs (no nodes, or no edges) skip the
/// iterative stages since there is nothing to optimize.
pub fn run_pipeline(
    nodes: &[Node],
    raw_pairs: &[(NodeId, NodeId)],
    config: &Config,
) -> Result<PipelineReport, LayoutError> {
    let ids: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
    let graph = GraphIndex::build(&ids, raw_pairs);
    let mut stages = Vec::new();

    if nodes.is_empty() {
        return Ok(PipelineReport { stages });
    }

    let spacing = config.spiral.spacing;

    let baseline = LayoutState::new(
        ids.clone(),
        ordering::random_slots(&ids, config.ordering.seed),
        spacing,
    )?;
    stages.push(StageOutput::capture(
        "random-baseline",
        nodes,
        &graph,
        &baseline,
        None,
    )?);

    let mut state = LayoutState::new(ids.clone(), ordering::degree_slots(&ids, &graph), spacing)?;
    stages.push(StageOutput::capture(
        "centrality-ordering",
        nodes,
        &graph,
        &state,
        None,
    )?);

    if ids.len() >= 2 && graph.edge_count() > 0 {
        let mut rng = StdRng::seed_from_u64(config.swap.seed);
        let swap_stats = swap::optimize(&mut state, &graph, &config.swap, &mut rng)?;
        stages.push(StageOutput::capture(
            "swap-optimization",
            nodes,
            &graph,
            &state,
            Some(StageStats::Swap(swap_stats)),
        )?);

        let weights = relax::edge_weights(nodes, &graph, config.relax.weight_scale);
        let relax_stats = relax::relax(&mut state, &graph, &weights, &config.relax)?;
        stages.push(StageOutput::capture(
            "force-relaxation",
            nodes,
            &graph,
            &state,
            Some(StageStats::Relax(relax_stats)),
        )?);
    }

    Ok(PipelineReport { stages })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::improvement_pct;

    fn nodes_of(ids: &[NodeId]) -> Vec<Node> {
        ids.iter()
            .map(|&id| Node {
                id,
                name: format!("n{id}"),
                weight: 1.0,
            })
            .collect()
    }

    #[test]
    fn empty_graph_produces_no_stages() {
        let report = run_pipeline(&[], &[], &Config::default()).unwrap();
        assert!(report.stages.is_empty());
    }

    #[test]
    fn edgeless_graph_skips_iterative_stages() {
        let nodes = nodes_of(&[1, 2, 3]);
        let report = run_pipeline(&nodes, &[], &Config::default()).unwrap();
        let names: Vec<&str> = report.stages.iter().map(|s| s.stage.as_str()).collect();
        assert_eq!(names, ["random-baseline", "centrality-ordering"]);
        for stage in &report.stages {
            assert_eq!(stage.metrics, LayoutMetrics::zero());
        }
    }

    #[test]
    fn full_pipeline_runs_all_four_stages() {
        let ids: Vec<NodeId> = (0..20).collect();
        let nodes = nodes_of(&ids);
        let raw: Vec<(NodeId, NodeId)> = (0..20u64)
            .flat_map(|i| [(i, (i + 1) % 20), (i, (i + 5) % 20)])
            .collect();
        let report = run_pipeline(&nodes, &raw, &Config::default()).unwrap();

        let names: Vec<&str> = report.stages.iter().map(|s| s.stage.as_str()).collect();
        assert_eq!(
            names,
            [
                "random-baseline",
                "centrality-ordering",
                "swap-optimization",
                "force-relaxation"
            ]
        );
        assert!(matches!(report.stages[2].stats, Some(StageStats::Swap(_))));
        assert!(matches!(report.stages[3].stats, Some(StageStats::Relax(_))));
    }

    #[test]
    fn each_stage_improves_or_holds_the_baseline() {
        let ids: Vec<NodeId> = (0..24).collect();
        let nodes = nodes_of(&ids);
        let raw: Vec<(NodeId, NodeId)> = (0..24u64)
            .flat_map(|i| [(i, (i + 1) % 24), (i, (i + 9) % 24)])
            .collect();
        let report = run_pipeline(&nodes, &raw, &Config::default()).unwrap();

        let baseline = &report.baseline().unwrap().metrics;
        let last = &report.final_stage().unwrap().metrics;
        let improvement = improvement_pct(baseline, last).unwrap();
        assert!(
            improvement > 0.0,
            "pipeline did not improve over the random baseline: {improvement:.2}%"
        );
    }

    #[test]
    fn nonpositive_spacing_errors_instead_of_panicking() {
        // A config file can carry any spacing value; it must surface as a
        // descriptive error, never reach the placement assertion.
        let config: Config = serde_json::from_str(r#"{"spiral": {"spacing": 0.0}}"#).unwrap();
        let nodes = nodes_of(&[1, 2]);
        let err = run_pipeline(&nodes, &[(1, 2)], &config).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidSpacing(s) if s == 0.0));
    }

    #[test]
    fn stage_outputs_keep_the_slot_bijection() {
        let ids: Vec<NodeId> = (0..10).collect();
        let nodes = nodes_of(&ids);
        let raw: Vec<(NodeId, NodeId)> = (0..10u64).map(|i| (i, (i + 1) % 10)).collect();
        let report = run_pipeline(&nodes, &raw, &Config::default()).unwrap();

        for stage in &report.stages {
            let mut slots: Vec<usize> = stage.nodes.iter().map(|n| n.slot).collect();
            slots.sort_unstable();
            assert_eq!(slots, (0..10).collect::<Vec<_>>(), "stage {}", stage.stage);
        }
    }
}
