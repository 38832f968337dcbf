use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::config::MultiModalConfig;
use crate::err::SearchError;
use crate::graph::{Graph, NodeId};
use crate::observer::Observer;

use crate::routing::cost::Cost;
use crate::routing::ids::{EdgeId, Mode};
use crate::routing::labels::{EdgeLabel, LabelStore};
use crate::routing::path::MultiModalRoutePath;
use crate::routing::queue::PriorityQueue;
use crate::routing::status::EdgeStatus;

/// Single-queue multimodal router: one label store and one queue over states keyed by
/// `EdgeId(start, end, mode)`. Non-BSS nodes only continue the incoming mode; BSS nodes fork
/// into both modes. Grounded on
/// `examples/original_source/algorithms/multimodal_double_expansion_astart_one_queue.py`'s
/// `MultiModalDoubleExpansionAStarOneQueue`.
pub struct OneQueueMultiModalRouter {
    pub config: MultiModalConfig,
}

impl OneQueueMultiModalRouter {
    pub fn new(config: MultiModalConfig) -> Self {
        OneQueueMultiModalRouter { config }
    }

    fn step_cost(&self, length: f64, mode: Mode) -> Cost {
        match mode {
            Mode::Walking => Cost::new(length, length / self.config.walking_speed),
            Mode::Bike => Cost::new(
                length * (self.config.walking_speed / self.config.bike_speed),
                length / self.config.bike_speed,
            ),
        }
    }

    pub fn best_path<G: Graph>(
        &self,
        graph: &G,
        orig: NodeId,
        dest: NodeId,
        bss_nodes: &HashSet<NodeId>,
        observer: &mut dyn Observer,
    ) -> Result<MultiModalRoutePath, SearchError> {
        let mut labels = LabelStore::new();
        let mut status: HashMap<EdgeId, EdgeStatus> = HashMap::new();
        let mut queue = PriorityQueue::new();

        for n in graph.out_neighbors(orig) {
            let length = graph.edge_length(orig, n);
            let cost = self.step_cost(length, Mode::Walking);
            let edge_id = EdgeId::with_mode(orig, n, Mode::Walking);
            let idx = labels.push(EdgeLabel::seed(cost, cost.cost, edge_id, n));
            status.insert(edge_id, EdgeStatus::Temporary(idx));
            queue.insert(cost.cost, idx);
        }

        // only a walking arrival at `dest` terminates the search: biking all the way to the
        // destination without a closing walk leg is not a valid trip.
        let destinations: HashSet<EdgeId> = graph
            .out_neighbors(dest)
            .into_iter()
            .map(|m| EdgeId::with_mode(dest, m, Mode::Walking))
            .collect();

        let mut tick: u64 = 0;
        let mut best: Option<usize> = None;

        while let Some((_, idx)) = queue.pop() {
            tick += 1;
            if tick % 200 == 0 {
                observer.on_tick(tick);
            }
            if labels.len() > self.config.queue_capacity {
                warn!("one-queue multimodal: exceeded queue capacity, aborting search");
                return Err(SearchError::CapacityExceeded);
            }

            let edge_id = labels.get(idx).edge_id;
            if destinations.contains(&edge_id) {
                best = Some(idx);
                break;
            }

            let is_seed = labels.get(idx).is_origin;
            if !is_seed {
                status.insert(edge_id, EdgeStatus::Permanent(idx));
            }

            let node = labels.get(idx).end_node;
            let mode = edge_id.mode.expect("all states in this engine are mode-tagged");
            let pred_cost = labels.get(idx).cost;

            let modes_to_expand: Vec<Mode> = if bss_nodes.contains(&node) {
                vec![Mode::Walking, Mode::Bike]
            } else {
                vec![mode]
            };

            for expand_mode in modes_to_expand {
                for m in graph.out_neighbors(node) {
                    let candidate_edge = EdgeId::with_mode(node, m, expand_mode);
                    if let Some(existing) = status.get(&candidate_edge) {
                        if existing.is_permanent() {
                            continue;
                        }
                    }

                    let length = graph.edge_length(node, m);
                    let new_cost = pred_cost + self.step_cost(length, expand_mode);

                    match status.get(&candidate_edge).copied() {
                        Some(EdgeStatus::Temporary(existing_idx)) => {
                            if new_cost.cost < labels.get(existing_idx).cost.cost {
                                let lab = labels.get_mut(existing_idx);
                                lab.pred_idx = Some(idx);
                                lab.end_node = m;
                                lab.cost = new_cost;
                                lab.sort_cost = new_cost.cost;
                                queue.insert(new_cost.cost, existing_idx);
                            }
                        }
                        Some(EdgeStatus::Permanent(_)) => unreachable!("filtered above"),
                        None => {
                            let new_idx = labels.push(EdgeLabel::relaxed(
                                new_cost,
                                new_cost.cost,
                                candidate_edge,
                                idx,
                                m,
                            ));
                            status.insert(candidate_edge, EdgeStatus::Temporary(new_idx));
                            queue.insert(new_cost.cost, new_idx);
                        }
                    }
                }
            }
        }

        match best {
            Some(idx) => {
                let path = reconstruct_legs(&labels, idx, orig);
                debug!("one-queue multimodal: path found, {} s total", path.total_seconds());
                Ok(path)
            }
            None => Err(SearchError::NoPath),
        }
    }
}

/// Walks the predecessor chain, segmenting it into (first walk, bike, second walk) legs by
/// counting mode changes -- grounded on
/// `examples/original_source/algorithms/multimodal_double_expansion_astart_one_queue.py`'s
/// `make_osm_path`. A leg with no nodes beyond its anchor is omitted.
fn reconstruct_legs(labels: &LabelStore, mut idx: usize, orig: NodeId) -> MultiModalRoutePath {
    let mut chain: Vec<(Mode, NodeId, f64)> = Vec::new();
    loop {
        let lab = labels.get(idx);
        let mode = lab.edge_id.mode.expect("mode-tagged engine");
        chain.push((mode, lab.end_node, lab.cost.seconds));
        match lab.pred_idx {
            Some(pred) => idx = pred,
            None => break,
        }
    }
    chain.push((Mode::Walking, orig, 0.0));
    chain.reverse();

    // Only 3 legs are ever returned (walk, bike, walk), but the BSS-fork rule above allows a
    // path to switch modes more than twice; extra transitions fold into the last leg rather than
    // indexing past it.
    let mut changed_mode = 0u8;
    let mut legs: [Vec<(NodeId, f64)>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    let mut last_mode = Mode::Walking;
    for (i, (mode, node, seconds)) in chain.iter().enumerate() {
        if i > 0 && *mode != last_mode {
            changed_mode = (changed_mode + 1).min(2);
            // carry the boundary node into the new leg so legs are contiguous.
            let prev = chain[i - 1];
            legs[changed_mode as usize].push((prev.1, prev.2));
        }
        legs[changed_mode as usize].push((*node, *seconds));
        last_mode = *mode;
    }

    let to_route = |leg: &[(NodeId, f64)]| -> Option<crate::routing::path::RoutePath> {
        if leg.len() < 2 {
            None
        } else {
            let nodes = leg.iter().map(|(n, _)| *n).collect();
            let seconds = leg.last().unwrap().1 - leg.first().unwrap().1;
            Some(crate::routing::path::RoutePath::new(nodes, seconds))
        }
    };

    MultiModalRoutePath {
        first_walk: to_route(&legs[0]),
        bike: to_route(&legs[1]),
        second_walk: to_route(&legs[2]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LonLat;
    use crate::observer::NullObserver;
    use std::collections::HashMap as Map;

    struct StarGraph {
        edges: Map<(NodeId, NodeId), f64>,
    }

    impl Graph for StarGraph {
        fn out_neighbors(&self, node: NodeId) -> Vec<NodeId> {
            self.edges
                .keys()
                .filter(|(u, _)| *u == node)
                .map(|(_, v)| *v)
                .collect()
        }
        fn edge_length(&self, u: NodeId, v: NodeId) -> f64 {
            self.edges[&(u, v)]
        }
        fn coord(&self, _node: NodeId) -> LonLat {
            LonLat::new(0.0, 0.0)
        }
    }

    #[test]
    fn walk_only_when_no_bss_reachable() {
        let mut edges = Map::new();
        edges.insert((1, 2), 100.0);
        edges.insert((2, 1), 100.0);
        let g = StarGraph { edges };
        let router = OneQueueMultiModalRouter::new(MultiModalConfig::default());
        let mut obs = NullObserver;
        let bss: HashSet<NodeId> = HashSet::new();
        let result = router.best_path(&g, 1, 2, &bss, &mut obs).unwrap();
        assert!(result.bike.is_none());
        assert!(result.first_walk.is_some());
    }
}
