use std::collections::HashSet;

use log::debug;

use crate::config::MultiModalConfig;
use crate::err::SearchError;
use crate::graph::{Graph, NodeId};
use crate::observer::Observer;

use crate::routing::astar::AStar;
use crate::routing::bidirectional::{BidirectionalAStar, Frontier};
use crate::routing::isochrone::Isochrone;
use crate::routing::path::{MultiModalRoutePath, RoutePath};

/// Walking-leg time budget before reaching a bike-share station, grounded on
/// `examples/original_source/algorithms/multimodal_astar.py`'s hardcoded `900` second limit.
const WALK_LIMIT_SECS: f64 = 900.0;

/// Composes three engines end to end: two walking isochrones seed a bidirectional bike search,
/// whose endpoints are then joined to `orig`/`dest` by two more walking legs. Grounded on
/// `examples/original_source/algorithms/multimodal_astar.py`'s `MultiModalAStart`.
pub struct SequencedMultiModalRouter {
    pub config: MultiModalConfig,
}

impl SequencedMultiModalRouter {
    pub fn new(config: MultiModalConfig) -> Self {
        SequencedMultiModalRouter { config }
    }

    pub fn best_path<G: Graph>(
        &self,
        graph: &G,
        orig: NodeId,
        dest: NodeId,
        bss_nodes: &HashSet<NodeId>,
        observer: &mut dyn Observer,
    ) -> Result<MultiModalRoutePath, SearchError> {
        let walk_iso = Isochrone::new(
            self.config.walking_speed,
            WALK_LIMIT_SECS,
            self.config.queue_capacity,
        );

        let reached_forward = walk_iso.get_isochrone(graph, orig, bss_nodes, observer)?;
        let reached_backward = walk_iso.get_isochrone(graph, dest, bss_nodes, observer)?;

        if reached_forward.is_empty() || reached_backward.is_empty() {
            debug!("sequenced multimodal: no bike-share station reachable on one side");
            return Err(SearchError::NoPath);
        }

        let mut fwd = Frontier::new();
        for (&bss, cost) in reached_forward.iter() {
            fwd.seed(
                graph,
                bss,
                dest,
                0.0,
                self.config.bike_speed,
                cost.seconds * self.config.bike_speed,
                cost.seconds,
            );
        }

        let mut bwd = Frontier::new();
        for (&bss, cost) in reached_backward.iter() {
            // Heuristic anchor stays the true walk origin, not the notional bidirectional
            // "dest" this frontier is physically seeded near -- see SPEC_FULL.md #10.5.
            bwd.seed(
                graph,
                bss,
                orig,
                0.0,
                self.config.bike_speed,
                cost.seconds * self.config.bike_speed,
                cost.seconds,
            );
        }

        let bike_engine = BidirectionalAStar::new(0.0, self.config.bike_speed, self.config.queue_capacity);
        let bike_path = bike_engine.run(graph, fwd, bwd, orig, dest, observer)?;

        let entry_bss = *bike_path
            .nodes
            .first()
            .expect("a found bike path always has at least one node");
        let exit_bss = *bike_path
            .nodes
            .last()
            .expect("a found bike path always has at least one node");

        let walk_engine = AStar::new(crate::config::EngineConfig {
            speed: self.config.walking_speed,
            cost_factor: 1.0,
            queue_capacity: self.config.queue_capacity,
        });

        let first_walk = if orig != entry_bss {
            Some(walk_engine.best_path(graph, orig, entry_bss, observer)?)
        } else {
            None
        };

        let second_walk = if exit_bss != dest {
            Some(walk_engine.best_path(graph, exit_bss, dest, observer)?)
        } else {
            None
        };

        Ok(MultiModalRoutePath {
            first_walk,
            bike: Some(RoutePath::new(bike_path.nodes, bike_path.seconds)),
            second_walk,
        })
    }
}
