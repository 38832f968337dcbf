use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::config::MultiModalConfig;
use crate::err::SearchError;
use crate::graph::{Graph, NodeId};
use crate::observer::Observer;

use crate::routing::cost::Cost;
use crate::routing::ids::EdgeId;
use crate::routing::labels::{EdgeLabel, LabelStore};
use crate::routing::queue::PriorityQueue;
use crate::routing::status::EdgeStatus;

/// Walking-phase, biking-phase and overall circuit-breaker limits, grounded on
/// `examples/original_source/algorithms/multimodal_double_expansions_isochrone.py`'s hardcoded
/// `1200`/`1800`/`3600 * WALKING_SPEED` constants.
const WALK_PHASE_LIMIT_SECS: f64 = 1200.0;
const BIKE_PHASE_LIMIT_SECS: f64 = 1800.0;
const OVERALL_LIMIT_FACTOR_SECS: f64 = 3600.0;

/// Multimodal isochrone realized as two concurrently-advancing frontiers (walking and biking)
/// rather than C11's three sequential phases. A walking label is tagged `can_change_mode`: once
/// a walking leg has passed through a bike leg, it loses the ability to seed another bike leg,
/// so the second walking phase can only ever close out the trip. The walking status map is
/// additionally keyed by this flag (`examples/original_source`'s `EdgeId(start, end,
/// can_change_mode)`) so the first and second walking phases settle the same physical edge
/// independently.
///
/// This crate's `get_isochrone` fills in the reachable-target accumulation that the recovered
/// source only stubbed with a `print` statement -- see DESIGN.md.
pub struct DoubleExpansionMultiModalIsochrone {
    pub config: MultiModalConfig,
}

struct WalkingFrontier {
    labels: LabelStore,
    status: HashMap<(EdgeId, bool), EdgeStatus>,
    queue: PriorityQueue,
}

struct BikeFrontier {
    labels: LabelStore,
    status: HashMap<EdgeId, EdgeStatus>,
    queue: PriorityQueue,
}

impl DoubleExpansionMultiModalIsochrone {
    pub fn new(config: MultiModalConfig) -> Self {
        DoubleExpansionMultiModalIsochrone { config }
    }

    fn append_walking<G: Graph>(
        &self,
        graph: &G,
        frontier: &mut WalkingFrontier,
        orig: NodeId,
        can_change_mode: bool,
        init_cost: f64,
        init_seconds: f64,
    ) {
        for n in graph.out_neighbors(orig) {
            let length = graph.edge_length(orig, n);
            let cost = Cost::with_init(
                length + init_cost,
                length / self.config.walking_speed + init_seconds,
                init_cost,
                init_seconds,
            );
            let edge_id = EdgeId::new(orig, n);
            let key = (edge_id, can_change_mode);
            match frontier.status.get(&key).copied() {
                Some(EdgeStatus::Temporary(idx)) if frontier.labels.get(idx).end_node == n => {
                    if cost.cost < frontier.labels.get(idx).cost.cost {
                        let lab = frontier.labels.get_mut(idx);
                        lab.pred_idx = None;
                        lab.end_node = n;
                        lab.cost = cost;
                        lab.is_origin = true;
                        lab.can_change_mode = can_change_mode;
                        frontier.queue.insert(cost.cost, idx);
                    }
                }
                _ => {
                    let mut seed = EdgeLabel::seed(cost, cost.cost, edge_id, n);
                    seed.can_change_mode = can_change_mode;
                    let idx = frontier.labels.push(seed);
                    frontier.status.insert(key, EdgeStatus::Temporary(idx));
                    frontier.queue.insert(cost.cost, idx);
                }
            }
        }
    }

    fn append_bike<G: Graph>(
        &self,
        graph: &G,
        frontier: &mut BikeFrontier,
        bss_node: NodeId,
        init_cost: f64,
        init_seconds: f64,
    ) {
        for n in graph.out_neighbors(bss_node) {
            let length = graph.edge_length(bss_node, n);
            let cost = Cost::with_init(
                length * (self.config.walking_speed / self.config.bike_speed) + init_cost,
                length / self.config.bike_speed + init_seconds,
                init_cost,
                init_seconds,
            );
            let edge_id = EdgeId::new(bss_node, n);
            match frontier.status.get(&edge_id).copied() {
                Some(EdgeStatus::Temporary(idx)) if frontier.labels.get(idx).end_node == n => {
                    if cost.cost < frontier.labels.get(idx).cost.cost {
                        let lab = frontier.labels.get_mut(idx);
                        lab.pred_idx = None;
                        lab.end_node = n;
                        lab.cost = cost;
                        frontier.queue.insert(cost.cost, idx);
                    }
                }
                _ => {
                    let idx = frontier.labels.push(EdgeLabel::seed(cost, cost.cost, edge_id, n));
                    frontier.status.insert(edge_id, EdgeStatus::Temporary(idx));
                    frontier.queue.insert(cost.cost, idx);
                }
            }
        }
    }

    fn expand_walking<G: Graph>(&self, graph: &G, frontier: &mut WalkingFrontier, node: NodeId, pred_idx: usize) {
        let pred = frontier.labels.get(pred_idx).clone();
        for n in graph.out_neighbors(node) {
            let length = graph.edge_length(node, n);
            let new_cost = pred.cost + Cost::new(length, length / self.config.walking_speed);
            let edge_id = EdgeId::new(node, n);
            let key = (edge_id, pred.can_change_mode);

            match frontier.status.get(&key).copied() {
                Some(EdgeStatus::Temporary(idx)) => {
                    let existing = frontier.labels.get(idx);
                    if existing.end_node == n {
                        if new_cost.cost < existing.cost.cost {
                            let lab = frontier.labels.get_mut(idx);
                            lab.pred_idx = Some(pred_idx);
                            lab.end_node = n;
                            lab.cost = new_cost;
                            lab.can_change_mode = pred.can_change_mode;
                            frontier.queue.insert(new_cost.cost, idx);
                        }
                    } else if existing.end_node == node && new_cost.cost < existing.cost.cost - length {
                        let lab = frontier.labels.get_mut(idx);
                        lab.edge_id = edge_id;
                        lab.pred_idx = Some(pred_idx);
                        lab.end_node = n;
                        lab.cost = new_cost;
                        lab.can_change_mode = pred.can_change_mode;
                        frontier.queue.insert(new_cost.cost, idx);
                    }
                }
                Some(EdgeStatus::Permanent(_)) => continue,
                None => {
                    let mut lab = EdgeLabel::relaxed(new_cost, new_cost.cost, edge_id, pred_idx, n);
                    lab.can_change_mode = pred.can_change_mode;
                    let idx = frontier.labels.push(lab);
                    frontier.status.insert(key, EdgeStatus::Temporary(idx));
                    frontier.queue.insert(new_cost.cost, idx);
                }
            }
        }
    }

    fn expand_bike<G: Graph>(&self, graph: &G, frontier: &mut BikeFrontier, node: NodeId, pred_idx: usize) {
        let pred_cost = frontier.labels.get(pred_idx).cost;
        for n in graph.out_neighbors(node) {
            let length = graph.edge_length(node, n);
            let step = Cost::new(
                length * (self.config.walking_speed / self.config.bike_speed),
                length / self.config.bike_speed,
            );
            let new_cost = pred_cost + step;
            let edge_id = EdgeId::new(node, n);

            match frontier.status.get(&edge_id).copied() {
                Some(EdgeStatus::Temporary(idx)) => {
                    let existing = frontier.labels.get(idx);
                    if existing.end_node == n {
                        if new_cost.cost < existing.cost.cost {
                            let lab = frontier.labels.get_mut(idx);
                            lab.pred_idx = Some(pred_idx);
                            lab.end_node = n;
                            lab.cost = new_cost;
                            frontier.queue.insert(new_cost.cost, idx);
                        }
                    } else if existing.end_node == node && new_cost.cost < existing.cost.cost - step.cost {
                        let lab = frontier.labels.get_mut(idx);
                        lab.edge_id = edge_id;
                        lab.pred_idx = Some(pred_idx);
                        lab.end_node = n;
                        lab.cost = new_cost;
                        frontier.queue.insert(new_cost.cost, idx);
                    }
                }
                Some(EdgeStatus::Permanent(_)) => continue,
                None => {
                    let idx = frontier.labels.push(EdgeLabel::relaxed(new_cost, new_cost.cost, edge_id, pred_idx, n));
                    frontier.status.insert(edge_id, EdgeStatus::Temporary(idx));
                    frontier.queue.insert(new_cost.cost, idx);
                }
            }
        }
    }

    pub fn get_isochrone<G: Graph>(
        &self,
        graph: &G,
        orig: NodeId,
        dest_nodes: &HashSet<NodeId>,
        bss_nodes: &HashSet<NodeId>,
        observer: &mut dyn Observer,
    ) -> Result<HashMap<NodeId, Cost>, SearchError> {
        let mut walking = WalkingFrontier {
            labels: LabelStore::new(),
            status: HashMap::new(),
            queue: PriorityQueue::new(),
        };
        let mut bike = BikeFrontier {
            labels: LabelStore::new(),
            status: HashMap::new(),
            queue: PriorityQueue::new(),
        };

        self.append_walking(graph, &mut walking, orig, true, 0.0, 0.0);

        let mut result: HashMap<NodeId, Cost> = HashMap::new();
        let mut tick: u64 = 0;

        loop {
            let walking_top = walking.queue.peek();
            let bike_top = bike.queue.peek();

            let (advance_walking, top_cost) = match (walking_top, bike_top) {
                (Some((wc, _)), Some((bc, _))) => (wc <= bc, wc.min(bc)),
                (Some((wc, _)), None) => (true, wc),
                (None, Some((bc, _))) => (false, bc),
                (None, None) => break,
            };

            tick += 1;
            if tick % 50 == 0 {
                observer.on_tick(tick);
            }
            if walking.labels.len() + bike.labels.len() > self.config.queue_capacity {
                warn!("double-expansion multimodal isochrone: exceeded queue capacity, aborting search");
                return Err(SearchError::CapacityExceeded);
            }

            if top_cost > OVERALL_LIMIT_FACTOR_SECS * self.config.walking_speed {
                debug!("double-expansion multimodal isochrone: overall distance budget exceeded");
                return Ok(HashMap::new());
            }

            if advance_walking {
                let (_, idx) = walking.queue.pop().unwrap();
                let lab = walking.labels.get(idx).clone();

                let over_budget = if lab.can_change_mode {
                    lab.cost.seconds > WALK_PHASE_LIMIT_SECS
                } else {
                    lab.cost.leg_seconds() > WALK_PHASE_LIMIT_SECS
                };
                if over_budget {
                    continue;
                }

                if dest_nodes.contains(&lab.end_node) {
                    let improves = result
                        .get(&lab.end_node)
                        .map(|existing| lab.cost.cost < existing.cost)
                        .unwrap_or(true);
                    if improves {
                        result.insert(lab.end_node, lab.cost);
                    }
                }

                if lab.can_change_mode && bss_nodes.contains(&lab.end_node) {
                    self.append_bike(graph, &mut bike, lab.end_node, lab.cost.seconds * self.config.walking_speed, lab.cost.seconds);
                }

                self.expand_walking(graph, &mut walking, lab.end_node, idx);
            } else {
                let (_, idx) = bike.queue.pop().unwrap();
                let lab = bike.labels.get(idx).clone();

                if lab.cost.leg_seconds() > BIKE_PHASE_LIMIT_SECS {
                    continue;
                }

                if bss_nodes.contains(&lab.end_node) {
                    self.append_walking(graph, &mut walking, lab.end_node, false, lab.cost.seconds * self.config.bike_speed, lab.cost.seconds);
                }

                self.expand_bike(graph, &mut bike, lab.end_node, idx);
            }
        }

        debug!("double-expansion multimodal isochrone: {} targets reached", result.len());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LonLat;
    use crate::observer::NullObserver;
    use std::collections::HashMap as Map;

    struct LineGraph {
        edges: Map<(NodeId, NodeId), f64>,
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
        fn coord(&self, _node: NodeId) -> LonLat {
            LonLat::new(0.0, 0.0)
        }
    }

    #[test]
    fn double_expansion_isochrone_reaches_destination_through_bike_share() {
        let mut edges = Map::new();
        for &(a, b, len) in &[(1, 2, 200.0), (2, 3, 1_000.0), (3, 4, 200.0)] {
            edges.insert((a, b), len);
            edges.insert((b, a), len);
        }
        let g = LineGraph { edges };

        let mut bss = HashSet::new();
        bss.insert(2);
        bss.insert(3);
        let mut dest = HashSet::new();
        dest.insert(4);

        let iso = DoubleExpansionMultiModalIsochrone::new(MultiModalConfig::default());
        let mut obs = NullObserver;
        let result = iso.get_isochrone(&g, 1, &dest, &bss, &mut obs).unwrap();

        assert!(result.contains_key(&4));
    }

    #[test]
    fn double_expansion_isochrone_empty_past_overall_circuit_breaker() {
        // a single hop far longer than the overall distance-equivalent budget allows.
        let mut edges = Map::new();
        let huge = OVERALL_LIMIT_FACTOR_SECS * MultiModalConfig::default().walking_speed * 10.0;
        edges.insert((1, 2), huge);
        edges.insert((2, 1), huge);
        let g = LineGraph { edges };

        let bss: HashSet<NodeId> = HashSet::new();
        let mut dest = HashSet::new();
        dest.insert(2);

        let iso = DoubleExpansionMultiModalIsochrone::new(MultiModalConfig::default());
        let mut obs = NullObserver;
        let result = iso.get_isochrone(&g, 1, &dest, &bss, &mut obs).unwrap();
        assert!(result.is_empty());
    }
}
