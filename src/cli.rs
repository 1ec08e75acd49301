use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use serde::Deserialize;

use crate::config::load_config;
use crate::graph::{GraphIndex, Node, NodeId};
use crate::metrics::improvement_pct;
use crate::paths::analyze_center;
use crate::pipeline::{StageStats, run_pipeline};
use crate::report::write_pipeline_dumps;

#[derive(Parser, Debug)]
#[command(
    name = "costar",
    version,
    about = "Spiral layout optimizer for co-appearance graphs"
)]
pub struct Args {
    /// Input graph snapshot JSON ({nodes, links}) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Directory for per-stage JSON dumps. Skipped if omitted.
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// Config JSON file (partial overrides of the tuned defaults)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Seed override for the baseline shuffle and swap trials
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Spiral spacing override
    #[arg(long = "spacing")]
    pub spacing: Option<f64>,

    /// Node ids for BFS hop-distance reports, comma separated
    #[arg(long = "centers", value_delimiter = ',')]
    pub centers: Vec<NodeId>,
}

/// Graph snapshot file: the node list plus raw, possibly duplicated
/// connection observations. Uniqueness is not re-validated here; the core
/// deduplicates edges itself.
#[derive(Debug, Deserialize)]
struct GraphFile {
    nodes: Vec<Node>,
    links: Vec<LinkRecord>,
}

#[derive(Debug, Deserialize)]
struct LinkRecord {
    source: NodeId,
    target: NodeId,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.ordering.seed = seed;
        config.swap.seed = seed;
    }
    if let Some(spacing) = args.spacing {
        anyhow::ensure!(spacing > 0.0, "--spacing must be positive");
        config.spiral.spacing = spacing;
    }

    let input = read_input(args.input.as_deref())?;
    let snapshot: GraphFile = serde_json::from_str(&input)?;
    let raw_pairs: Vec<(NodeId, NodeId)> = snapshot
        .links
        .iter()
        .map(|link| (link.source, link.target))
        .collect();

    println!(
        "Loaded {} nodes, {} raw links",
        snapshot.nodes.len(),
        raw_pairs.len()
    );

    let report = run_pipeline(&snapshot.nodes, &raw_pairs, &config)?;
    if report.stages.is_empty() {
        println!("Empty graph; nothing to lay out.");
        return Ok(());
    }

    let baseline = report.stages[0].metrics;
    let mut previous = None;
    for stage in &report.stages {
        println!("\n=== {} ===", stage.stage);
        println!("  edges:          {}", stage.metrics.edge_count);
        println!("  total distance: {:.2}", stage.metrics.total_distance);
        println!("  avg distance:   {:.2}", stage.metrics.avg_distance);
        println!("  min distance:   {:.2}", stage.metrics.min_distance);
        println!("  max distance:   {:.2}", stage.metrics.max_distance);
        if let Some(prev) = previous {
            if let Some(pct) = improvement_pct(&prev, &stage.metrics) {
                println!("  vs previous:    {pct:+.1}%");
            }
        }
        if let Some(pct) = improvement_pct(&baseline, &stage.metrics) {
            println!("  vs baseline:    {pct:+.1}%");
        }
        match &stage.stats {
            Some(StageStats::Swap(stats)) => {
                println!(
                    "  {} iterations, {} swaps accepted, stopped: {:?} ({:.2}s)",
                    stats.iterations,
                    stats.swaps_accepted,
                    stats.stop_reason,
                    stats.elapsed.as_secs_f64()
                );
            }
            Some(StageStats::Relax(stats)) => {
                println!(
                    "  {} iterations, objective {:.2}, stopped: {:?} ({:.2}s)",
                    stats.iterations,
                    stats.final_objective,
                    stats.stop_reason,
                    stats.elapsed.as_secs_f64()
                );
            }
            None => {}
        }
        previous = Some(stage.metrics);
    }

    if let Some(dir) = args.output_dir.as_deref() {
        let paths = write_pipeline_dumps(dir, &report)?;
        println!("\nWrote {} stage dumps to {}", paths.len(), dir.display());
    }

    if !args.centers.is_empty() {
        let ids: Vec<NodeId> = snapshot.nodes.iter().map(|n| n.id).collect();
        let graph = GraphIndex::build(&ids, &raw_pairs);
        for &center in &args.centers {
            let path_report = analyze_center(&graph, center)?;
            println!(
                "\nCenter {center}: {} reachable, {} unreachable, avg {:.3} hops, max {}",
                path_report.reachable,
                path_report.unreachable,
                path_report.avg_distance,
                path_report.max_distance
            );
            for (dist, count) in &path_report.histogram {
                println!("  {dist:3}: {count}");
            }
        }
    }

    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_json_deserializes() {
        let input = r#"{
            "nodes": [
                {"id": 1, "name": "Alice", "weight": 0.9},
                {"id": 2, "name": "Bob", "weight": 0.4}
            ],
            "links": [{"source": 1, "target": 2}, {"source": 2, "target": 1}]
        }"#;
        let snapshot: GraphFile = serde_json::from_str(input).unwrap();
        assert_eq!(snapshot.nodes.len(), 2);
        assert_eq!(snapshot.links.len(), 2);
        assert_eq!(snapshot.links[0].source, 1);
    }

    #[test]
    fn args_parse_center_list() {
        let args = Args::parse_from(["costar", "-i", "graph.json", "--centers", "1,2,3"]);
        assert_eq!(args.centers, vec![1, 2, 3]);
    }
}
