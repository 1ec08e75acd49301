use std::collections::BTreeMap;

use crate::error::LayoutError;
use crate::graph::NodeId;
use crate::spiral::{self, Point};

/// The full node -> slot assignment plus the materialized spiral
/// coordinate per node.
///
/// Invariant: the slot assignment is always a bijection onto 0..n. The
/// constructor validates it and the only mutations are `swap` (which
/// preserves it) and `nudge` (coordinate-only, for relaxation), so the
/// invariant holds between any two iterations of the optimizers.
#[derive(Debug, Clone)]
pub struct LayoutState {
    order: Vec<NodeId>,
    slots: BTreeMap<NodeId, usize>,
    positions: BTreeMap<NodeId, Point>,
    spacing: f64,
}

impl LayoutState {
    /// Build from a slot assignment, validating the bijection and
    /// materializing spiral coordinates at `spacing`.
    pub fn new(
        order: Vec<NodeId>,
        slots: BTreeMap<NodeId, usize>,
        spacing: f64,
    ) -> Result<Self, LayoutError> {
        // Negated comparison so NaN is rejected along with zero/negative.
        if !(spacing > 0.0) {
            return Err(LayoutError::InvalidSpacing(spacing));
        }
        let n = order.len();
        if slots.len() != n {
            return Err(LayoutError::SlotsNotBijective {
                expected: n,
                detail: format!("{} nodes but {} slot entries", n, slots.len()),
            });
        }
        let mut seen = vec![false; n];
        for &id in &order {
            let Some(&slot) = slots.get(&id) else {
                return Err(LayoutError::UnknownNode(id));
            };
            if slot >= n {
                return Err(LayoutError::SlotsNotBijective {
                    expected: n,
                    detail: format!("node {id} has out-of-range slot {slot}"),
                });
            }
            if seen[slot] {
                return Err(LayoutError::SlotsNotBijective {
                    expected: n,
                    detail: format!("slot {slot} assigned twice"),
                });
            }
            seen[slot] = true;
        }

        let positions = slots
            .iter()
            .map(|(&id, &slot)| (id, spiral::position(slot, spacing)))
            .collect();

        Ok(Self {
            order,
            slots,
            positions,
            spacing,
        })
    }

    /// Node ids in stable input order.
    pub fn node_ids(&self) -> &[NodeId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn slot(&self, id: NodeId) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    pub fn position(&self, id: NodeId) -> Option<Point> {
        self.positions.get(&id).copied()
    }

    pub fn positions(&self) -> &BTreeMap<NodeId, Point> {
        &self.positions
    }

    pub fn slots(&self) -> &BTreeMap<NodeId, usize> {
        &self.slots
    }

    /// Exchange the slots and coordinates of two nodes. Self-inverse:
    /// applying the same swap twice restores the exact prior state.
    pub fn swap(&mut self, i: NodeId, j: NodeId) -> Result<(), LayoutError> {
        if !self.slots.contains_key(&i) {
            return Err(LayoutError::UnknownNode(i));
        }
        if !self.slots.contains_key(&j) {
            return Err(LayoutError::UnknownNode(j));
        }
        if i == j {
            return Ok(());
        }
        let slot_i = self.slots[&i];
        let slot_j = self.slots[&j];
        self.slots.insert(i, slot_j);
        self.slots.insert(j, slot_i);
        let pos_i = self.positions[&i];
        let pos_j = self.positions[&j];
        self.positions.insert(i, pos_j);
        self.positions.insert(j, pos_i);
        Ok(())
    }

    /// Coordinate-only mutation used by force relaxation; the slot
    /// assignment is untouched.
    pub fn nudge(&mut self, id: NodeId, point: Point) -> Result<(), LayoutError> {
        match self.positions.get_mut(&id) {
            Some(current) => {
                *current = point;
                Ok(())
            }
            None => Err(LayoutError::UnknownNode(id)),
        }
    }
}
