use std::collections::{HashMap, HashSet};

use log::{debug, trace, warn};

use crate::config::MultiModalConfig;
use crate::err::SearchError;
use crate::graph::{Graph, NodeId};
use crate::observer::Observer;

use crate::routing::cost::Cost;
use crate::routing::ids::EdgeId;
use crate::routing::labels::{EdgeLabel, LabelStore};
use crate::routing::path::RoutePath;
use crate::routing::queue::PriorityQueue;
use crate::routing::status::EdgeStatus;

/// Cost-equivalent slack added to the first connection's cost to get the termination threshold,
/// grounded on `examples/original_source/algorithms/multimodal_double_expansion_astart.py`'s
/// `kThresholdDelta = 200.`.
const THRESHOLD_DELTA: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TravelMode {
    Walking,
    Bike,
}

/// Picks the cheaper of a direction's walking and bike queue tops. Bike is only passed in once
/// that mode is actually eligible (both sides have touched a bike-share node), so `None` here
/// means "not available yet", not "empty queue".
fn pick_mode(walk_top: Option<f64>, bike_top: Option<f64>) -> Option<(TravelMode, f64)> {
    match (walk_top, bike_top) {
        (Some(w), Some(b)) if b < w => Some((TravelMode::Bike, b)),
        (Some(w), Some(_)) => Some((TravelMode::Walking, w)),
        (Some(w), None) => Some((TravelMode::Walking, w)),
        (None, Some(b)) => Some((TravelMode::Bike, b)),
        (None, None) => None,
    }
}

/// One of the four coupled frontiers (walk-forward, walk-backward, bike-forward,
/// bike-backward). Bike frontiers additionally remember, per seed label, which walking label in
/// the matching walking frontier produced it -- needed to stitch the full walk-bike-walk path
/// back together at reconstruction time, since a bike seed's own `pred_idx` is `None`.
struct ModeFrontier {
    labels: LabelStore,
    status: HashMap<EdgeId, EdgeStatus>,
    queue: PriorityQueue,
    bike_origin: HashMap<usize, usize>,
}

impl ModeFrontier {
    fn new() -> Self {
        ModeFrontier {
            labels: LabelStore::new(),
            status: HashMap::new(),
            queue: PriorityQueue::new(),
            bike_origin: HashMap::new(),
        }
    }

    fn seed_walk<G: Graph>(&mut self, graph: &G, node: NodeId, walking_speed: f64) {
        for n in graph.out_neighbors(node) {
            let length = graph.edge_length(node, n);
            let cost = Cost::new(length, length / walking_speed);
            let edge_id = EdgeId::new(node, n);
            let idx = self.labels.push(EdgeLabel::seed(cost, cost.cost, edge_id, n));
            self.status.insert(edge_id, EdgeStatus::Temporary(idx));
            self.queue.insert(cost.cost, idx);
        }
    }

    /// Seeds a bike frontier at `bss_node`, remembering `walk_label_idx` (the walking label
    /// that reached the station) so the bike leg can later be stitched to the walking leg.
    fn seed_bike<G: Graph>(
        &mut self,
        graph: &G,
        bss_node: NodeId,
        walk_cost: Cost,
        walk_label_idx: usize,
        walking_speed: f64,
        bike_speed: f64,
    ) {
        for n in graph.out_neighbors(bss_node) {
            let length = graph.edge_length(bss_node, n);
            let cost = Cost::with_init(
                length * (walking_speed / bike_speed) + walk_cost.cost,
                length / bike_speed + walk_cost.seconds,
                walk_cost.cost,
                walk_cost.seconds,
            );
            let edge_id = EdgeId::new(bss_node, n);
            let idx = self.labels.push(EdgeLabel::seed(cost, cost.cost, edge_id, n));
            self.status.insert(edge_id, EdgeStatus::Temporary(idx));
            self.queue.insert(cost.cost, idx);
            self.bike_origin.insert(idx, walk_label_idx);
        }
    }

    fn expand<G: Graph>(
        &mut self,
        graph: &G,
        node: NodeId,
        pred_idx: usize,
        mode: TravelMode,
        walking_speed: f64,
        bike_speed: f64,
    ) {
        let pred_cost = self.labels.get(pred_idx).cost;
        for m in graph.out_neighbors(node) {
            let length = graph.edge_length(node, m);
            let step = match mode {
                TravelMode::Walking => Cost::new(length, length / walking_speed),
                TravelMode::Bike => Cost::new(
                    length * (walking_speed / bike_speed),
                    length / bike_speed,
                ),
            };
            let new_cost = pred_cost + step;
            let edge_id = EdgeId::new(node, m);

            match self.status.get(&edge_id).copied() {
                Some(EdgeStatus::Temporary(existing_idx)) => {
                    let existing = self.labels.get(existing_idx);
                    if existing.end_node == m {
                        if new_cost.cost < existing.cost.cost {
                            let lab = self.labels.get_mut(existing_idx);
                            lab.pred_idx = Some(pred_idx);
                            lab.end_node = m;
                            lab.cost = new_cost;
                            lab.sort_cost = new_cost.cost;
                            self.queue.insert(new_cost.cost, existing_idx);
                        }
                    } else if existing.end_node == node {
                        // opposing-direction revisit: accept a cheaper traversal of the same
                        // undirected edge taken the other way.
                        if new_cost.cost < existing.cost.cost - step.cost {
                            let lab = self.labels.get_mut(existing_idx);
                            lab.edge_id = edge_id;
                            lab.pred_idx = Some(pred_idx);
                            lab.end_node = m;
                            lab.cost = new_cost;
                            lab.sort_cost = new_cost.cost;
                            self.queue.insert(new_cost.cost, existing_idx);
                        }
                    }
                }
                Some(EdgeStatus::Permanent(_)) => continue,
                None => {
                    let idx = self.labels.push(EdgeLabel::relaxed(
                        new_cost,
                        new_cost.cost,
                        edge_id,
                        pred_idx,
                        m,
                    ));
                    self.status.insert(edge_id, EdgeStatus::Temporary(idx));
                    self.queue.insert(new_cost.cost, idx);
                }
            }
        }
    }

    fn peek_cost(&mut self) -> Option<f64> {
        self.queue.peek().map(|(k, _)| k)
    }
}

/// Reconstructs the node chain this frontier's label `idx` belongs to, walking the predecessor
/// chain; when a bike seed's origin reference is hit, continues into `walk_frontier`'s own
/// chain so the whole walk-bike(-walk) path comes out in one list ending at `terminal`.
fn chain_from(
    frontier: &ModeFrontier,
    mut idx: usize,
    walk_frontier: Option<&ModeFrontier>,
    terminal: NodeId,
) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    loop {
        let lab = frontier.labels.get(idx);
        nodes.push(lab.end_node);
        if let Some(pred) = lab.pred_idx {
            idx = pred;
            continue;
        }
        // seed label: either the true walking origin/destination, or a bike seed stitched to
        // a walking chain.
        if let (Some(walk_idx), Some(wf)) = (frontier.bike_origin.get(&idx), walk_frontier) {
            let mut walk_chain = chain_from(wf, *walk_idx, None, terminal);
            walk_chain.reverse();
            nodes.extend(walk_chain);
        } else {
            nodes.push(terminal);
        }
        break;
    }
    nodes.reverse();
    nodes
}

/// Runs four coupled frontiers (walk-forward, walk-backward, bike-forward, bike-backward),
/// gating mode transitions at bike-share stations, until a meeting is found in either mode.
/// Grounded on
/// `examples/original_source/algorithms/multimodal_double_expansion_astart.py`'s
/// `MultiModalDoubleExpansionAStar`.
pub struct DoubleExpansionMultiModalRouter {
    pub config: MultiModalConfig,
}

impl DoubleExpansionMultiModalRouter {
    pub fn new(config: MultiModalConfig) -> Self {
        DoubleExpansionMultiModalRouter { config }
    }

    pub fn best_path<G: Graph>(
        &self,
        graph: &G,
        orig: NodeId,
        dest: NodeId,
        bss_nodes: &HashSet<NodeId>,
        observer: &mut dyn Observer,
    ) -> Result<RoutePath, SearchError> {
        let mut walk_fwd = ModeFrontier::new();
        walk_fwd.seed_walk(graph, orig, self.config.walking_speed);
        let mut walk_bwd = ModeFrontier::new();
        walk_bwd.seed_walk(graph, dest, self.config.walking_speed);
        let mut bike_fwd = ModeFrontier::new();
        let mut bike_bwd = ModeFrontier::new();

        let mut bss_reached_fwd: HashSet<NodeId> = HashSet::new();
        let mut bss_reached_bwd: HashSet<NodeId> = HashSet::new();

        // Captured once, right after seeding, so the two walking frontiers' queue tops stay
        // comparable across the whole search even though they start from opposite ends.
        let walking_diff = match (walk_fwd.peek_cost(), walk_bwd.peek_cost()) {
            (Some(f), Some(b)) => f - b,
            _ => 0.0,
        };
        let mut bike_diff: Option<f64> = None;

        let mut threshold = f64::INFINITY;
        let mut best: Option<(f64, TravelMode, usize, usize, f64)> = None;
        let mut tick: u64 = 0;

        loop {
            let bike_ready = !bss_reached_fwd.is_empty() && !bss_reached_bwd.is_empty();
            if bike_ready && bike_diff.is_none() {
                if let (Some(f), Some(b)) = (bike_fwd.peek_cost(), bike_bwd.peek_cost()) {
                    bike_diff = Some(f - b);
                }
            }

            let fwd_choice = pick_mode(
                walk_fwd.peek_cost(),
                if bike_ready { bike_fwd.peek_cost() } else { None },
            );
            let bwd_choice = pick_mode(
                walk_bwd.peek_cost(),
                if bike_ready { bike_bwd.peek_cost() } else { None },
            );
            let bwd_adjusted = bwd_choice.map(|(mode, cost)| {
                cost + match mode {
                    TravelMode::Walking => walking_diff,
                    TravelMode::Bike => bike_diff.unwrap_or(0.0),
                }
            });

            // Direction first (balanced by the captured diff), mode second.
            let advance_forward = match (fwd_choice, bwd_adjusted) {
                (Some((_, fc)), Some(bc)) => fc <= bc,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            let (mode, top_cost) = if advance_forward {
                fwd_choice.expect("advance_forward only set true when fwd_choice is Some")
            } else {
                bwd_choice.expect("advance_forward only set false when bwd_choice is Some")
            };
            if top_cost > threshold {
                break;
            }
            let which = match (advance_forward, mode) {
                (true, TravelMode::Walking) => 0usize,
                (false, TravelMode::Walking) => 1usize,
                (true, TravelMode::Bike) => 2usize,
                (false, TravelMode::Bike) => 3usize,
            };

            tick += 1;
            if tick % 50 == 0 {
                observer.on_tick(tick);
            }
            let total_labels =
                walk_fwd.labels.len() + walk_bwd.labels.len() + bike_fwd.labels.len() + bike_bwd.labels.len();
            if total_labels > self.config.queue_capacity {
                warn!("double-expansion multimodal: exceeded queue capacity, aborting search");
                return Err(SearchError::CapacityExceeded);
            }

            match which {
                0 => {
                    let (_, idx) = walk_fwd.queue.pop().unwrap();
                    let edge_id = walk_fwd.labels.get(idx).edge_id;
                    let is_seed = walk_fwd.labels.get(idx).is_origin;
                    if !is_seed {
                        walk_fwd.status.insert(edge_id, EdgeStatus::Permanent(idx));
                    }
                    if let Some(EdgeStatus::Permanent(bwd_idx)) = walk_bwd.status.get(&edge_id).copied() {
                        self.consider_connection(
                            graph,
                            TravelMode::Walking,
                            &walk_fwd,
                            idx,
                            &walk_bwd,
                            bwd_idx,
                            &mut best,
                            &mut threshold,
                        );
                    }
                    let lab = walk_fwd.labels.get(idx).clone();
                    if bss_nodes.contains(&lab.end_node) && bss_reached_fwd.insert(lab.end_node) {
                        bike_fwd.seed_bike(
                            graph,
                            lab.end_node,
                            lab.cost,
                            idx,
                            self.config.walking_speed,
                            self.config.bike_speed,
                        );
                    }
                    walk_fwd.expand(graph, lab.end_node, idx, TravelMode::Walking, self.config.walking_speed, self.config.bike_speed);
                }
                1 => {
                    let (_, idx) = walk_bwd.queue.pop().unwrap();
                    let edge_id = walk_bwd.labels.get(idx).edge_id;
                    let is_seed = walk_bwd.labels.get(idx).is_origin;
                    if !is_seed {
                        walk_bwd.status.insert(edge_id, EdgeStatus::Permanent(idx));
                    }
                    if let Some(EdgeStatus::Permanent(fwd_idx)) = walk_fwd.status.get(&edge_id).copied() {
                        self.consider_connection(
                            graph,
                            TravelMode::Walking,
                            &walk_fwd,
                            fwd_idx,
                            &walk_bwd,
                            idx,
                            &mut best,
                            &mut threshold,
                        );
                    }
                    let lab = walk_bwd.labels.get(idx).clone();
                    if bss_nodes.contains(&lab.end_node) && bss_reached_bwd.insert(lab.end_node) {
                        bike_bwd.seed_bike(
                            graph,
                            lab.end_node,
                            lab.cost,
                            idx,
                            self.config.walking_speed,
                            self.config.bike_speed,
                        );
                    }
                    walk_bwd.expand(graph, lab.end_node, idx, TravelMode::Walking, self.config.walking_speed, self.config.bike_speed);
                }
                2 => {
                    let (_, idx) = bike_fwd.queue.pop().unwrap();
                    let edge_id = bike_fwd.labels.get(idx).edge_id;
                    let is_seed = bike_fwd.labels.get(idx).is_origin;
                    if !is_seed {
                        bike_fwd.status.insert(edge_id, EdgeStatus::Permanent(idx));
                    }
                    if let Some(EdgeStatus::Permanent(bwd_idx)) = bike_bwd.status.get(&edge_id).copied() {
                        self.consider_connection(
                            graph,
                            TravelMode::Bike,
                            &bike_fwd,
                            idx,
                            &bike_bwd,
                            bwd_idx,
                            &mut best,
                            &mut threshold,
                        );
                    }
                    let end_node = bike_fwd.labels.get(idx).end_node;
                    bike_fwd.expand(graph, end_node, idx, TravelMode::Bike, self.config.walking_speed, self.config.bike_speed);
                }
                3 => {
                    let (_, idx) = bike_bwd.queue.pop().unwrap();
                    let edge_id = bike_bwd.labels.get(idx).edge_id;
                    let is_seed = bike_bwd.labels.get(idx).is_origin;
                    if !is_seed {
                        bike_bwd.status.insert(edge_id, EdgeStatus::Permanent(idx));
                    }
                    if let Some(EdgeStatus::Permanent(fwd_idx)) = bike_fwd.status.get(&edge_id).copied() {
                        self.consider_connection(
                            graph,
                            TravelMode::Bike,
                            &bike_fwd,
                            fwd_idx,
                            &bike_bwd,
                            idx,
                            &mut best,
                            &mut threshold,
                        );
                    }
                    let end_node = bike_bwd.labels.get(idx).end_node;
                    bike_bwd.expand(graph, end_node, idx, TravelMode::Bike, self.config.walking_speed, self.config.bike_speed);
                }
                _ => unreachable!(),
            }
        }

        match best {
            Some((_, mode, fwd_idx, bwd_idx, seconds)) => {
                let (fwd_frontier, bwd_frontier, walk_fwd_ref, walk_bwd_ref) = match mode {
                    TravelMode::Walking => (&walk_fwd, &walk_bwd, None, None),
                    TravelMode::Bike => (&bike_fwd, &bike_bwd, Some(&walk_fwd), Some(&walk_bwd)),
                };
                let mut nodes = chain_from(fwd_frontier, fwd_idx, walk_fwd_ref, orig);
                let mut tail = chain_from(bwd_frontier, bwd_idx, walk_bwd_ref, dest);
                // `chain_from` returns a complete orig/dest-terminated chain for the meeting
                // label's own side; drop the duplicated meeting node from the tail before
                // splicing, then drop everything up to (not including) the node after it.
                if let Some(first_new) = tail.iter().position(|n| Some(n) == nodes.last()) {
                    tail.drain(0..=first_new);
                }
                nodes.append(&mut tail);
                debug!(
                    "double-expansion multimodal: path found via {:?}, {} nodes, {} s",
                    mode,
                    nodes.len(),
                    seconds
                );
                Ok(RoutePath::new(nodes, seconds))
            }
            None => Err(SearchError::NoPath),
        }
    }

    fn consider_connection<G: Graph>(
        &self,
        graph: &G,
        mode: TravelMode,
        fwd: &ModeFrontier,
        fwd_idx: usize,
        bwd: &ModeFrontier,
        bwd_idx: usize,
        best: &mut Option<(f64, TravelMode, usize, usize, f64)>,
        threshold: &mut f64,
    ) {
        let fwd_lab = fwd.labels.get(fwd_idx);
        let bwd_lab = bwd.labels.get(bwd_idx);
        let shared_length = graph.edge_length(fwd_lab.edge_id.start, fwd_lab.edge_id.end);
        let length_cost = match mode {
            TravelMode::Walking => shared_length,
            TravelMode::Bike => shared_length * (self.config.walking_speed / self.config.bike_speed),
        };
        let secs_per_length = match mode {
            TravelMode::Walking => self.config.walking_speed,
            TravelMode::Bike => self.config.bike_speed,
        };

        let cost = fwd_lab.cost.cost + bwd_lab.cost.cost - length_cost;
        let seconds = fwd_lab.cost.seconds + bwd_lab.cost.seconds - shared_length / secs_per_length;

        let improves = best.map(|(c, ..)| cost < c).unwrap_or(true);
        if improves {
            trace!("double-expansion multimodal: new best {:?} connection at {}", mode, cost);
            *best = Some((cost, mode, fwd_idx, bwd_idx, seconds));
            if threshold.is_infinite() {
                *threshold = cost + THRESHOLD_DELTA;
            }
        }
    }
}
