use crate::graph::NodeId;
use thiserror::Error;

/// Precondition violations in the layout core.
///
/// Degenerate data (empty graphs, zero edges) is not an error anywhere in
/// this crate; these variants signal upstream programming errors and should
/// never be retried.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// A slot assignment does not map the node set one-to-one onto 0..n.
    #[error("slot assignment is not a bijection onto 0..{expected}: {detail}")]
    SlotsNotBijective { expected: usize, detail: String },

    /// Spiral spacing must be strictly positive; zero or negative spacing
    /// collapses or mirrors the spiral.
    #[error("spiral spacing must be positive, got {0}")]
    InvalidSpacing(f64),

    /// An operation referenced a node id outside the active universe.
    #[error("unknown node id {0}")]
    UnknownNode(NodeId),

    /// Swap optimization needs at least two nodes to exchange.
    #[error("swap optimization requires at least 2 nodes, got {0}")]
    TooFewNodes(usize),
}
