use std::collections::{HashMap, HashSet};

use log::debug;

use crate::config::MultiModalConfig;
use crate::err::SearchError;
use crate::graph::{Graph, NodeId};
use crate::observer::Observer;

use crate::routing::cost::Cost;
use crate::routing::isochrone::Isochrone;

/// Walking-phase and biking-phase time budgets, grounded on
/// `examples/original_source/algorithms/multimodal_isochrone.py`'s hardcoded limits.
const WALK_LIMIT_SECS: f64 = 900.0;
const BIKE_LIMIT_SECS: f64 = 1800.0;

/// Three chained isochrones: walk to bike-share, bike to another bike-share, walk to the final
/// targets. Each phase's time-budget check subtracts the inherited `init_seconds` so only the
/// current leg's duration counts against its own limit. Grounded on
/// `examples/original_source/algorithms/multimodal_isochrone.py`'s `MultiModalIsochrone`.
pub struct ChainedMultiModalIsochrone {
    pub config: MultiModalConfig,
}

impl ChainedMultiModalIsochrone {
    pub fn new(config: MultiModalConfig) -> Self {
        ChainedMultiModalIsochrone { config }
    }

    pub fn get_isochrone<G: Graph>(
        &self,
        graph: &G,
        orig: NodeId,
        dest_nodes: &HashSet<NodeId>,
        bss_nodes: &HashSet<NodeId>,
        observer: &mut dyn Observer,
    ) -> Result<HashMap<NodeId, Cost>, SearchError> {
        let walk_iso = Isochrone::new(self.config.walking_speed, WALK_LIMIT_SECS, self.config.queue_capacity);
        let bike_iso = Isochrone::new(self.config.bike_speed, BIKE_LIMIT_SECS, self.config.queue_capacity);

        let phase1 = walk_iso.get_isochrone(graph, orig, bss_nodes, observer)?;
        if phase1.is_empty() {
            debug!("chained multimodal isochrone: no bike-share station reachable on foot");
            return Ok(HashMap::new());
        }

        let mut phase2: HashMap<NodeId, Cost> = HashMap::new();
        for (&bss, cost) in phase1.iter() {
            // phase 2's target set excludes stations already reached in phase 1, matching the
            // recovered source's `bss_nodes - phase1.keys()`.
            let remaining_bss: HashSet<NodeId> = bss_nodes.difference(&phase1.keys().copied().collect()).copied().collect();
            let reached = bike_iso.get_isochrone_with_offset(
                graph,
                bss,
                &remaining_bss,
                cost.seconds * self.config.bike_speed,
                cost.seconds,
                observer,
            )?;
            for (node, c) in reached {
                let improves = phase2.get(&node).map(|existing| c.cost < existing.cost).unwrap_or(true);
                if improves {
                    phase2.insert(node, c);
                }
            }
        }

        let mut result: HashMap<NodeId, Cost> = HashMap::new();
        for (&bss, cost) in phase2.iter() {
            let reached = walk_iso.get_isochrone_with_offset(
                graph,
                bss,
                dest_nodes,
                cost.seconds * self.config.walking_speed,
                cost.seconds,
                observer,
            )?;
            for (node, c) in reached {
                let improves = result.get(&node).map(|existing| c.cost < existing.cost).unwrap_or(true);
                if improves {
                    result.insert(node, c);
                }
            }
        }

        debug!("chained multimodal isochrone: {} targets reached", result.len());
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

    /// orig(1) -- 200m -- bss_a(2) -- 1000m -- bss_b(3) -- 200m -- dest(4), entirely within both
    /// phase budgets.
    #[test]
    fn chained_isochrone_reaches_destination_through_bike_share() {
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

        let iso = ChainedMultiModalIsochrone::new(MultiModalConfig::default());
        let mut obs = NullObserver;
        let result = iso.get_isochrone(&g, 1, &dest, &bss, &mut obs).unwrap();

        assert!(result.contains_key(&4));
    }

    #[test]
    fn chained_isochrone_empty_when_no_station_reachable() {
        let mut edges = Map::new();
        edges.insert((1, 2), 100.0);
        edges.insert((2, 1), 100.0);
        let g = LineGraph { edges };

        let bss: HashSet<NodeId> = HashSet::new();
        let mut dest = HashSet::new();
        dest.insert(2);

        let iso = ChainedMultiModalIsochrone::new(MultiModalConfig::default());
        let mut obs = NullObserver;
        let result = iso.get_isochrone(&g, 1, &dest, &bss, &mut obs).unwrap();
        assert!(result.is_empty());
    }
}
