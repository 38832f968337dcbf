use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::err::SearchError;
use crate::graph::{Graph, NodeId};
use crate::observer::Observer;

use super::cost::Cost;
use super::ids::EdgeId;
use super::labels::{EdgeLabel, LabelStore};
use super::queue::PriorityQueue;
use super::status::EdgeStatus;

/// Single-mode isochrone: `AStar` specialised to `cost_factor = 0` (pure Dijkstra), no single
/// destination, and a time budget. Grounded on
/// `examples/original_source/algorithms/isochrone.py`'s `Isocrhone` class.
pub struct Isochrone {
    pub speed: f64,
    pub time_limit_secs: f64,
    pub queue_capacity: usize,
}

impl Isochrone {
    pub fn new(speed: f64, time_limit_secs: f64, queue_capacity: usize) -> Self {
        Isochrone {
            speed,
            time_limit_secs,
            queue_capacity,
        }
    }

    /// Seeds the frontier at `orig` with inherited `init_cost`/`init_seconds`, so multiple
    /// isochrones can be chained (the multimodal isochrone, C11, does exactly this).
    fn seed<G: Graph>(
        &self,
        graph: &G,
        orig: NodeId,
        init_cost: f64,
        init_seconds: f64,
        labels: &mut LabelStore,
        status: &mut HashMap<EdgeId, EdgeStatus>,
        queue: &mut PriorityQueue,
    ) {
        for n in graph.out_neighbors(orig) {
            let length = graph.edge_length(orig, n);
            let cost = Cost::with_init(
                length + init_cost,
                length / self.speed + init_seconds,
                init_cost,
                init_seconds,
            );
            let edge_id = EdgeId::new(orig, n);
            let idx = labels.push(EdgeLabel::seed(cost, cost.cost, edge_id, n));
            status.insert(edge_id, EdgeStatus::Temporary(idx));
            queue.insert(cost.cost, idx);
        }
    }

    /// Runs the isochrone from scratch; equivalent to `get_isochrone(g, orig, targets, 0, 0)`.
    pub fn get_isochrone<G: Graph>(
        &self,
        graph: &G,
        orig: NodeId,
        targets: &HashSet<NodeId>,
        observer: &mut dyn Observer,
    ) -> Result<HashMap<NodeId, Cost>, SearchError> {
        self.get_isochrone_with_offset(graph, orig, targets, 0.0, 0.0, observer)
    }

    pub fn get_isochrone_with_offset<G: Graph>(
        &self,
        graph: &G,
        orig: NodeId,
        targets: &HashSet<NodeId>,
        init_cost: f64,
        init_seconds: f64,
        observer: &mut dyn Observer,
    ) -> Result<HashMap<NodeId, Cost>, SearchError> {
        let mut labels = LabelStore::new();
        let mut status: HashMap<EdgeId, EdgeStatus> = HashMap::new();
        let mut queue = PriorityQueue::new();
        let mut result: HashMap<NodeId, Cost> = HashMap::new();

        self.seed(
            graph,
            orig,
            init_cost,
            init_seconds,
            &mut labels,
            &mut status,
            &mut queue,
        );

        let mut tick: u64 = 0;
        while let Some((_, idx)) = queue.pop() {
            tick += 1;
            if tick % 200 == 0 {
                observer.on_tick(tick);
            }

            if labels.len() > self.queue_capacity {
                warn!("isochrone: label store exceeded queue capacity, aborting search");
                return Err(SearchError::CapacityExceeded);
            }

            let lab = labels.get(idx).clone();
            if lab.cost.leg_seconds() > self.time_limit_secs {
                continue;
            }

            if targets.contains(&lab.end_node) {
                let improves = result
                    .get(&lab.end_node)
                    .map(|existing| lab.cost.cost < existing.cost)
                    .unwrap_or(true);
                if improves {
                    result.insert(lab.end_node, lab.cost);
                }
            }

            let is_seed = lab.is_origin;
            if !is_seed {
                status.insert(lab.edge_id, EdgeStatus::Permanent(idx));
            }

            for m in graph.out_neighbors(lab.end_node) {
                let candidate_edge = EdgeId::new(lab.end_node, m);
                if let Some(existing) = status.get(&candidate_edge) {
                    if existing.is_permanent() {
                        continue;
                    }
                }

                let length = graph.edge_length(lab.end_node, m);
                let new_cost = lab.cost + Cost::new(length, length / self.speed);

                match status.get(&candidate_edge).copied() {
                    Some(EdgeStatus::Temporary(existing_idx)) => {
                        if new_cost.cost < labels.get(existing_idx).cost.cost {
                            let l = labels.get_mut(existing_idx);
                            l.pred_idx = Some(idx);
                            l.end_node = m;
                            l.cost = new_cost;
                            l.sort_cost = new_cost.cost;
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

        debug!("isochrone: {} targets reached", result.len());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LonLat;
    use crate::observer::NullObserver;
    use std::collections::HashMap as Map;

    struct ChainGraph {
        edges: Map<(NodeId, NodeId), f64>,
    }

    impl Graph for ChainGraph {
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

    /// S3: a chain with a tight time budget excludes everything past the first hop.
    #[test]
    fn isochrone_limit_s3() {
        let mut edges = Map::new();
        edges.insert((1, 2), 700.0);
        edges.insert((2, 3), 700.0);
        edges.insert((3, 4), 700.0);
        let g = ChainGraph { edges };

        let iso = Isochrone::new(1.4, 900.0, 50_000);
        let mut obs = NullObserver;
        let targets: HashSet<NodeId> = [2, 3, 4].iter().copied().collect();
        let result = iso.get_isochrone(&g, 1, &targets, &mut obs).unwrap();

        assert_eq!(result.len(), 1);
        assert!(result.contains_key(&2));
        assert!((result[&2].seconds - 500.0).abs() < 1e-6);
    }
}
