use std::collections::HashMap;

use log::{debug, trace, warn};

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

/// Cost-equivalent slack added to the first connection's `sort_cost` to get the termination
/// threshold, grounded on `examples/original_source/algorithms/double_astar.py`'s
/// `kThresholdDelta = 20.`.
const THRESHOLD_DELTA: f64 = 20.0;

/// One half of a bidirectional search: its own labels, status map and queue. Exposed so the
/// sequenced multimodal router (C8) can pre-seed a frontier at several bike-share stations
/// before handing it to `BidirectionalAStar::run`, rather than only ever seeding at a single
/// node the way `best_path` does.
pub struct Frontier {
    labels: LabelStore,
    status: HashMap<EdgeId, EdgeStatus>,
    queue: PriorityQueue,
}

impl Frontier {
    pub fn new() -> Self {
        Frontier {
            labels: LabelStore::new(),
            status: HashMap::new(),
            queue: PriorityQueue::new(),
        }
    }

    /// Seeds this frontier at `node`, with the A* heuristic admissibly anchored at
    /// `heuristic_anchor` -- which need not be the node the opposing frontier is physically
    /// searching from. The sequenced multimodal router (C8) relies on this: its backward bike
    /// frontier is seeded at a bike-share station but its heuristic still targets the true walk
    /// origin, matching `examples/original_source/algorithms/multimodal_astar.py`'s
    /// `init_backward(g, orig, node, ...)` call.
    pub fn seed<G: Graph>(
        &mut self,
        graph: &G,
        node: NodeId,
        heuristic_anchor: NodeId,
        cost_factor: f64,
        speed: f64,
        init_cost: f64,
        init_seconds: f64,
    ) {
        for n in graph.out_neighbors(node) {
            let length = graph.edge_length(node, n);
            let cost = Cost::with_init(
                length + init_cost,
                length / speed + init_seconds,
                init_cost,
                init_seconds,
            );
            let h = if cost_factor == 0.0 {
                0.0
            } else {
                cost_factor * haversine_distance_m(graph.coord(n), graph.coord(heuristic_anchor))
            };
            let sort_cost = cost.cost + h;
            let edge_id = EdgeId::new(node, n);

            match self.status.get(&edge_id).copied() {
                Some(EdgeStatus::Temporary(existing_idx)) => {
                    if cost.cost < self.labels.get(existing_idx).cost.cost {
                        let lab = self.labels.get_mut(existing_idx);
                        lab.pred_idx = None;
                        lab.end_node = n;
                        lab.cost = cost;
                        lab.sort_cost = sort_cost;
                        lab.is_origin = true;
                        self.queue.insert(sort_cost, existing_idx);
                    }
                }
                _ => {
                    let idx = self.labels.push(EdgeLabel::seed(cost, sort_cost, edge_id, n));
                    self.status.insert(edge_id, EdgeStatus::Temporary(idx));
                    self.queue.insert(sort_cost, idx);
                }
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for Frontier {
    fn default() -> Self {
        Frontier::new()
    }
}

/// Two-frontier A* that meets in the middle, grounded on
/// `examples/original_source/algorithms/double_astar.py`'s `DoubleAstar` class and the
/// teacher's `routing::astar::bidirectional::GenericAstar`.
pub struct BidirectionalAStar {
    pub cost_factor: f64,
    pub speed: f64,
    pub queue_capacity: usize,
}

impl BidirectionalAStar {
    pub fn new(cost_factor: f64, speed: f64, queue_capacity: usize) -> Self {
        BidirectionalAStar {
            cost_factor,
            speed,
            queue_capacity,
        }
    }

    pub fn best_path<G: Graph>(
        &self,
        graph: &G,
        orig: NodeId,
        dest: NodeId,
        observer: &mut dyn Observer,
    ) -> Result<RoutePath, SearchError> {
        let mut fwd = Frontier::new();
        fwd.seed(graph, orig, dest, self.cost_factor, self.speed, 0.0, 0.0);
        let mut bwd = Frontier::new();
        bwd.seed(graph, dest, orig, self.cost_factor, self.speed, 0.0, 0.0);
        self.run(graph, fwd, bwd, orig, dest, observer)
    }

    /// Runs the meet-in-the-middle search given two already-seeded frontiers. `orig`/`dest` are
    /// used only for path reconstruction (prepending/appending the true endpoints), not for
    /// seeding -- callers that pre-seeded `fwd`/`bwd` at other nodes (bike-share stations) still
    /// pass the walk endpoints here.
    pub fn run<G: Graph>(
        &self,
        graph: &G,
        mut fwd: Frontier,
        mut bwd: Frontier,
        orig: NodeId,
        dest: NodeId,
        observer: &mut dyn Observer,
    ) -> Result<RoutePath, SearchError> {
        let mut threshold = f64::INFINITY;
        let mut best: Option<(f64, usize, usize, f64)> = None; // (cost, fwd_idx, bwd_meeting_idx, seconds)
        let mut tick: u64 = 0;

        loop {
            if fwd.is_empty() && bwd.is_empty() {
                break;
            }

            let fwd_top = fwd.queue.peek();
            let bwd_top = bwd.queue.peek();

            let advance_forward = match (fwd_top, bwd_top) {
                (Some((fk, _)), Some((bk, _))) => fk <= bk,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };

            tick += 1;
            if tick % 15 == 0 {
                observer.on_tick(tick);
            }
            if fwd.labels.len() + bwd.labels.len() > self.queue_capacity {
                warn!("bidirectional: label stores exceeded queue capacity, aborting search");
                return Err(SearchError::CapacityExceeded);
            }

            if advance_forward {
                let (sort_cost, idx) = fwd.queue.pop().expect("checked non-empty above");
                if sort_cost > threshold {
                    break;
                }
                let edge_id = fwd.labels.get(idx).edge_id;
                let is_seed = fwd.labels.get(idx).is_origin;
                if !is_seed {
                    fwd.status.insert(edge_id, EdgeStatus::Permanent(idx));
                }
                if let Some(EdgeStatus::Permanent(bwd_idx)) = bwd.status.get(&edge_id).copied() {
                    self.consider_connection(graph, &fwd, idx, &bwd, bwd_idx, sort_cost, &mut best, &mut threshold);
                }
                let u = fwd.labels.get(idx).end_node;
                let pred_cost = fwd.labels.get(idx).cost;
                self.expand(graph, &mut fwd, u, idx, pred_cost, dest);
            } else {
                let (sort_cost, idx) = bwd.queue.pop().expect("checked non-empty above");
                if sort_cost > threshold {
                    break;
                }
                let edge_id = bwd.labels.get(idx).edge_id;
                let is_seed = bwd.labels.get(idx).is_origin;
                if !is_seed {
                    bwd.status.insert(edge_id, EdgeStatus::Permanent(idx));
                }
                if let Some(EdgeStatus::Permanent(fwd_idx)) = fwd.status.get(&edge_id).copied() {
                    self.consider_connection(graph, &fwd, fwd_idx, &bwd, idx, sort_cost, &mut best, &mut threshold);
                }
                let u = bwd.labels.get(idx).end_node;
                let pred_cost = bwd.labels.get(idx).cost;
                self.expand(graph, &mut bwd, u, idx, pred_cost, orig);
            }
        }

        match best {
            Some((_, fwd_idx, bwd_idx, seconds)) => {
                let mut nodes = reconstruct(&fwd.labels, fwd_idx, orig);
                nodes.extend(backward_suffix(&bwd.labels, bwd_idx, dest));
                debug!("bidirectional: path found, {} nodes, {} s", nodes.len(), seconds);
                Ok(RoutePath::new(nodes, seconds))
            }
            None => Err(SearchError::NoPath),
        }
    }

    fn consider_connection<G: Graph>(
        &self,
        graph: &G,
        fwd: &Frontier,
        fwd_idx: usize,
        bwd: &Frontier,
        bwd_idx: usize,
        popped_sort_cost: f64,
        best: &mut Option<(f64, usize, usize, f64)>,
        threshold: &mut f64,
    ) {
        let fwd_lab = fwd.labels.get(fwd_idx);
        let bwd_lab = bwd.labels.get(bwd_idx);
        debug_assert_ne!(
            fwd_lab.end_node, bwd_lab.end_node,
            "meeting labels are expected to sit at opposite ends of the shared edge"
        );
        let shared_length = graph.edge_length(fwd_lab.edge_id.start, fwd_lab.edge_id.end);

        let cost = fwd_lab.cost.cost + bwd_lab.cost.cost - shared_length;
        // leg_seconds() excludes whatever a chained caller (the sequenced multimodal router)
        // seeded each frontier with, so `seconds` here is this search's own travel time alone.
        let seconds =
            fwd_lab.cost.leg_seconds() + bwd_lab.cost.leg_seconds() - shared_length / self.speed;

        let improves = best.map(|(c, ..)| cost < c).unwrap_or(true);
        if improves {
            trace!("bidirectional: new best connection at cost {}", cost);
            *best = Some((cost, fwd_idx, bwd_idx, seconds));
            if threshold.is_infinite() {
                // the threshold is keyed off the popped label's own sort_cost (cost + heuristic
                // toward its own side), not the combined connection cost: the heuristic is only
                // zero at the true destination, not at an interior meeting point.
                *threshold = popped_sort_cost + THRESHOLD_DELTA;
            }
        }
    }

    fn expand<G: Graph>(
        &self,
        graph: &G,
        frontier: &mut Frontier,
        u: NodeId,
        pred_idx: usize,
        pred_cost: Cost,
        heuristic_anchor: NodeId,
    ) {
        for m in graph.out_neighbors(u) {
            let candidate_edge = EdgeId::new(u, m);
            if let Some(existing) = frontier.status.get(&candidate_edge) {
                if existing.is_permanent() {
                    continue;
                }
            }

            let length = graph.edge_length(u, m);
            let new_cost = pred_cost + Cost::new(length, length / self.speed);
            let h = if self.cost_factor == 0.0 {
                0.0
            } else {
                self.cost_factor * haversine_distance_m(graph.coord(m), graph.coord(heuristic_anchor))
            };
            let sort_cost = new_cost.cost + h;

            match frontier.status.get(&candidate_edge).copied() {
                Some(EdgeStatus::Temporary(existing_idx)) => {
                    if new_cost.cost < frontier.labels.get(existing_idx).cost.cost {
                        let lab = frontier.labels.get_mut(existing_idx);
                        lab.pred_idx = Some(pred_idx);
                        lab.end_node = m;
                        lab.cost = new_cost;
                        lab.sort_cost = sort_cost;
                        frontier.queue.insert(sort_cost, existing_idx);
                    }
                }
                Some(EdgeStatus::Permanent(_)) => unreachable!("filtered above"),
                None => {
                    let new_idx = frontier.labels.push(EdgeLabel::relaxed(
                        new_cost,
                        sort_cost,
                        candidate_edge,
                        pred_idx,
                        m,
                    ));
                    frontier.status.insert(candidate_edge, EdgeStatus::Temporary(new_idx));
                    frontier.queue.insert(sort_cost, new_idx);
                }
            }
        }
    }
}

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

/// The path from the node just past the meeting edge (on the backward side) through to `dest`,
/// excluding the meeting node itself (the forward chain already ends there).
fn backward_suffix(labels: &LabelStore, meeting_idx: usize, dest: NodeId) -> Vec<NodeId> {
    let meeting = labels.get(meeting_idx);
    let v_idx = match meeting.pred_idx {
        Some(p) => p,
        None => return Vec::new(),
    };
    let mut chain = reconstruct(labels, v_idx, dest);
    chain.reverse();
    chain.remove(0);
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LonLat;
    use crate::observer::NullObserver;
    use std::collections::HashMap as Map;

    struct SquareGraph {
        edges: Map<(NodeId, NodeId), f64>,
        coords: Map<NodeId, LonLat>,
    }

    impl Graph for SquareGraph {
        fn out_neighbors(&self, node: NodeId) -> Vec<NodeId> {
            self.edges
                .keys()
                .filter(|(u, _)| *u == node)
                .map(|(_, v)| *v)
                .collect()
        }
        fn edge_length(&self, u: NodeId, v: NodeId) -> f64 {
            *self.edges.get(&(u, v)).unwrap_or(&0.0)
        }
        fn coord(&self, node: NodeId) -> LonLat {
            self.coords[&node]
        }
    }

    /// S2: a symmetric square graph; bidirectional search should find a total of 200 m.
    #[test]
    fn bidirectional_tie_s2() {
        let mut edges = Map::new();
        for &(a, b) in &[(1, 2), (2, 1), (1, 3), (3, 1), (2, 4), (4, 2), (3, 4), (4, 3)] {
            edges.insert((a, b), 100.0);
        }
        let mut coords = Map::new();
        coords.insert(1, LonLat::new(0.0, 0.0));
        coords.insert(2, LonLat::new(0.001, 0.0));
        coords.insert(3, LonLat::new(0.0, 0.001));
        coords.insert(4, LonLat::new(0.001, 0.001));
        let g = SquareGraph { edges, coords };

        let engine = BidirectionalAStar::new(1.0, 1.4, 50_000);
        let mut obs = NullObserver;
        let result = engine.best_path(&g, 1, 4, &mut obs).unwrap();
        assert!((result.seconds - 200.0 / 1.4).abs() < 1e-6, "{:?}", result);
    }
}
