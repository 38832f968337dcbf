use super::cost::Cost;
use super::ids::{EdgeId, LabelIdx};
use crate::graph::NodeId;

/// One relaxation result: the cost to reach `end_node` via `edge_id`, the index of the
/// predecessor label (or `None` for a seed label), and whether this label is a seed
/// (`is_origin`) or has been recorded as touching the destination region (`is_destination`).
/// Grounded on `examples/original_source/algorithms/inner_types.py`'s `EdgeLabel`.
#[derive(Debug, Clone)]
pub struct EdgeLabel {
    pub cost: Cost,
    pub sort_cost: f64,
    pub edge_id: EdgeId,
    pub pred_idx: Option<LabelIdx>,
    pub end_node: NodeId,
    pub is_origin: bool,
    pub is_destination: bool,
    /// Set only by the double-expansion isochrone (C12): once a walking label is produced by a
    /// post-bike-leg walking frontier, it can no longer seed another bike leg.
    pub can_change_mode: bool,
}

impl EdgeLabel {
    pub fn seed(cost: Cost, sort_cost: f64, edge_id: EdgeId, end_node: NodeId) -> Self {
        EdgeLabel {
            cost,
            sort_cost,
            edge_id,
            pred_idx: None,
            end_node,
            is_origin: true,
            is_destination: false,
            can_change_mode: true,
        }
    }

    pub fn relaxed(
        cost: Cost,
        sort_cost: f64,
        edge_id: EdgeId,
        pred_idx: LabelIdx,
        end_node: NodeId,
    ) -> Self {
        EdgeLabel {
            cost,
            sort_cost,
            edge_id,
            pred_idx: Some(pred_idx),
            end_node,
            is_origin: false,
            is_destination: false,
            can_change_mode: true,
        }
    }
}

/// Append-only store of labels, referenced by stable integer index for the lifetime of one
/// search (I1). Mutating an existing label on a cheaper relaxation happens in place (I5); no
/// duplicate label is ever appended for the same edge while it's `Temporary`.
#[derive(Debug, Default)]
pub struct LabelStore {
    labels: Vec<EdgeLabel>,
}

impl LabelStore {
    pub fn new() -> Self {
        LabelStore { labels: Vec::new() }
    }

    pub fn push(&mut self, label: EdgeLabel) -> LabelIdx {
        let idx = self.labels.len();
        self.labels.push(label);
        idx
    }

    pub fn get(&self, idx: LabelIdx) -> &EdgeLabel {
        &self.labels[idx]
    }

    pub fn get_mut(&mut self, idx: LabelIdx) -> &mut EdgeLabel {
        &mut self.labels[idx]
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
