use std::path::Path;

use serde::{Deserialize, Serialize};

/// All externally supplied knobs for the layout pipeline. Defaults carry
/// the tuned constants the optimizer was calibrated with; a config file
/// may override any subset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub spiral: SpiralConfig,
    pub ordering: OrderingConfig,
    pub swap: SwapConfig,
    pub relax: RelaxConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiralConfig {
    /// Base spacing factor; slot radius is spacing * sqrt(slot + 1).
    pub spacing: f64,
}

impl Default for SpiralConfig {
    fn default() -> Self {
        Self { spacing: 80.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingConfig {
    /// Seed for the random-baseline shuffle.
    pub seed: u64,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwapConfig {
    /// Improvement margin a swap must clear; guards against accepting
    /// floating-point noise.
    pub epsilon: f64,
    /// Seed for candidate-pair selection.
    pub seed: u64,
    /// Hard iteration cap. Unset: adaptive from edge count.
    pub max_iterations: Option<usize>,
    /// Consecutive non-improving trials before stopping. Unset: adaptive
    /// from edge count.
    pub stagnation_threshold: Option<usize>,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.001,
            seed: 42,
            max_iterations: None,
            stagnation_threshold: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaxConfig {
    pub max_iterations: usize,
    /// Global multiplier from force to displacement.
    pub step_size: f64,
    /// Per-node displacement cap per iteration.
    pub max_step: f64,
    /// Spring constant for edge attraction.
    pub attraction: f64,
    /// Push-apart constant, applied only below `min_distance`.
    pub repulsion: f64,
    /// Pull back toward the stage-input coordinate.
    pub anchor: f64,
    /// Pairs closer than this repel each other.
    pub min_distance: f64,
    /// Relative objective improvement below this counts as a stalled
    /// iteration.
    pub improvement_threshold: f64,
    /// Stalled iterations tolerated before stopping.
    pub patience: usize,
    /// Strength of recognizability-based edge weighting; 0 disables it.
    pub weight_scale: f64,
}

impl Default for RelaxConfig {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            step_size: 0.02,
            max_step: 5.0,
            attraction: 0.01,
            repulsion: 0.5,
            anchor: 0.02,
            min_distance: 60.0,
            improvement_threshold: 0.002,
            patience: 15,
            weight_scale: 0.35,
        }
    }
}

/// Load a config file, or defaults when no path is given. Partial files
/// are fine; unspecified fields keep their defaults. Values the layout
/// core would reject are caught here so a malformed file fails with a
/// message naming the field.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&contents)?;
    anyhow::ensure!(
        config.spiral.spacing > 0.0,
        "{}: spiral.spacing must be positive, got {}",
        path.display(),
        config.spiral.spacing
    );
    Ok(config)
}
