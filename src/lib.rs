#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod metrics;
pub mod ordering;
pub mod paths;
pub mod pipeline;
pub mod relax;
pub mod report;
pub mod spiral;
pub mod state;
pub mod swap;

pub use config::Config;
pub use error::LayoutError;
pub use graph::{Edge, GraphIndex, Node, NodeId};
pub use metrics::LayoutMetrics;
pub use pipeline::{PipelineReport, StageOutput, run_pipeline};
pub use spiral::Point;
pub use state::LayoutState;
pub use swap::StopReason;

#[cfg(feature = "cli")]
pub use cli::run;
