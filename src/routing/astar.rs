use std::collections::{HashMap, HashSet};

use log::{debug, trace, warn};

use crate::config::EngineConfig;
use crate::err::SearchError;
use crate::geo::haversine_distance_m;
use crate::graph::{Graph, NodeId};
use crate::observer::Observer;

use super::cost::Cost;
use super::ids::EdgeId;
use super::labels::{EdgeLabel, LabelStore};
use super::path::RoutePath;
use super::queue::PriorityQueue;
use super::status::EdgeStatus;

/// Forward label-setting A* with an admissible geographic heuristic. Grounded on
/// `examples/original_source/algorithms/astar.py`'s `AStar` class and the teacher's
/// `routing::astar::unidirectional::GenericAstar`; unlike the teacher, each `best_path` call
/// allocates its own label store, status map, and queue rather than reusing buffers across
/// calls, per this crate's per-search lifecycle (no struct-level mutable scratch survives a
/// call).
pub struct AStar {
    config: EngineConfig,
}

impl AStar {
    pub fn new(config: EngineConfig) -> Self {
        AStar { config }
    }

    fn heuristic<G: Graph>(&self, graph: &G, from: NodeId, to: NodeId) -> f64 {
        if self.config.cost_factor == 0.0 {
            return 0.0;
        }
        self.config.cost_factor * haversine_distance_m(graph.coord(from), graph.coord(to))
    }

    pub fn best_path<G: Graph>(
        &self,
        graph: &G,
        orig: NodeId,
        dest: NodeId,
        observer: &mut dyn Observer,
    ) -> Result<RoutePath, SearchError> {
        let mut labels = LabelStore::new();
        let mut status: HashMap<EdgeId, EdgeStatus> = HashMap::new();
        let mut queue = PriorityQueue::new();

        // destination-touch set: reaching any of these edges means the search has arrived.
        let destinations: HashSet<EdgeId> = graph
            .out_neighbors(dest)
            .into_iter()
            .map(|m| EdgeId::new(dest, m))
            .collect();

        for n in graph.out_neighbors(orig) {
            let length = graph.edge_length(orig, n);
            let cost = Cost::new(length, length / self.config.speed);
            let sort_cost = cost.cost + self.heuristic(graph, n, dest);
            let edge_id = EdgeId::new(orig, n);
            let idx = labels.push(EdgeLabel::seed(cost, sort_cost, edge_id, n));
            status.insert(edge_id, EdgeStatus::Temporary(idx));
            queue.insert(sort_cost, idx);
        }

        let mut tick: u64 = 0;
        let mut best: Option<usize> = None;

        while let Some((_, idx)) = queue.pop() {
            tick += 1;
            if tick % 200 == 0 {
                observer.on_tick(tick);
            }

            if labels.len() > self.config.queue_capacity {
                warn!("astar: label store exceeded queue capacity, aborting search");
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

            let u = labels.get(idx).end_node;
            let pred_cost = labels.get(idx).cost;
            for m in graph.out_neighbors(u) {
                let candidate_edge = EdgeId::new(u, m);
                if let Some(existing) = status.get(&candidate_edge) {
                    if existing.is_permanent() {
                        continue;
                    }
                }

                let length = graph.edge_length(u, m);
                let new_cost = pred_cost + Cost::new(length, length / self.config.speed);
                let sort_cost = new_cost.cost + self.heuristic(graph, m, dest);

                match status.get(&candidate_edge).copied() {
                    Some(EdgeStatus::Temporary(existing_idx)) => {
                        if new_cost.cost < labels.get(existing_idx).cost.cost {
                            let lab = labels.get_mut(existing_idx);
                            lab.pred_idx = Some(idx);
                            lab.end_node = m;
                            lab.cost = new_cost;
                            lab.sort_cost = sort_cost;
                            queue.insert(sort_cost, existing_idx);
                            trace!("astar: relaxed edge {:?} to cost {}", candidate_edge, new_cost.cost);
                        }
                    }
                    Some(EdgeStatus::Permanent(_)) => unreachable!("filtered above"),
                    None => {
                        let new_idx =
                            labels.push(EdgeLabel::relaxed(new_cost, sort_cost, candidate_edge, idx, m));
                        status.insert(candidate_edge, EdgeStatus::Temporary(new_idx));
                        queue.insert(sort_cost, new_idx);
                    }
                }
            }
        }

        match best {
            Some(idx) => {
                let seconds = labels.get(idx).cost.seconds;
                let nodes = reconstruct(&labels, idx, orig);
                debug!("astar: path found, {} nodes, {} s", nodes.len(), seconds);
                Ok(RoutePath::new(nodes, seconds))
            }
            None => Err(SearchError::NoPath),
        }
    }
}

/// Walks the predecessor chain from `idx` back to a seed label, prepending `end_node`s, then
/// prepends the true origin (the seed's `edge_id.start`).
fn reconstruct(labels: &LabelStore, mut idx: usize, orig: NodeId) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    loop {
        let lab = labels.get(idx);
        nodes.push(lab.end_node);
        match lab.pred_idx {
            Some(pred) => idx = pred,
            None => break,
        }
    }
    nodes.push(orig);
    nodes.reverse();
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LonLat;
    use crate::observer::NullObserver;
    use std::collections::HashMap as Map;

    struct LineGraph {
        edges: Map<(NodeId, NodeId), f64>,
        coords: Map<NodeId, LonLat>,
    }

    impl Graph for LineGraph {
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
        fn coord(&self, node: NodeId) -> LonLat {
            self.coords[&node]
        }
    }

    /// S1: a trivial three-node line.
    #[test]
    fn trivial_path_s1() {
        let mut edges = Map::new();
        edges.insert((1, 2), 100.0);
        edges.insert((2, 3), 150.0);
        // road networks expose edges in both directions; the reverse direction is what lets
        // the destination-touch set (keyed on `dest`'s out-neighbors) ever become non-empty.
        edges.insert((3, 2), 150.0);
        let mut coords = Map::new();
        coords.insert(1, LonLat::new(0.0, 0.0));
        coords.insert(2, LonLat::new(0.0, 0.001));
        coords.insert(3, LonLat::new(0.0, 0.002));
        let g = LineGraph { edges, coords };

        let astar = AStar::new(EngineConfig {
            speed: 1.4,
            cost_factor: 1.0,
            queue_capacity: 50_000,
        });
        let mut obs = NullObserver;
        let result = astar.best_path(&g, 1, 3, &mut obs).unwrap();
        assert_eq!(result.nodes, vec![1, 2, 3]);
        assert!((result.seconds - 250.0 / 1.4).abs() < 1e-6);
    }

    #[test]
    fn no_path_when_disconnected() {
        let mut edges = Map::new();
        edges.insert((1, 2), 100.0);
        let mut coords = Map::new();
        coords.insert(1, LonLat::new(0.0, 0.0));
        coords.insert(2, LonLat::new(0.0, 0.001));
        coords.insert(3, LonLat::new(0.0, 0.002));
        let g = LineGraph { edges, coords };

        let astar = AStar::new(EngineConfig::dijkstra(1.4));
        let mut obs = NullObserver;
        let result = astar.best_path(&g, 1, 3, &mut obs);
        assert!(matches!(result, Err(SearchError::NoPath)));
    }
}
