use crate::graph::NodeId;

/// A reconstructed route: the node sequence and its total travel time in seconds. Returned by
/// every route-shaped engine (as opposed to the isochrone engines, which return a cost mapping).
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePath {
    pub nodes: Vec<NodeId>,
    pub seconds: f64,
}

impl RoutePath {
    pub fn new(nodes: Vec<NodeId>, seconds: f64) -> Self {
        RoutePath { nodes, seconds }
    }
}

/// The sequenced multimodal router's result: a first walking leg to a bike-share station, a
/// bike leg between stations, and a last walking leg to the destination. A leg is `None` when
/// its endpoints coincide (e.g. origin is itself a bike-share station).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiModalRoutePath {
    pub first_walk: Option<RoutePath>,
    pub bike: Option<RoutePath>,
    pub second_walk: Option<RoutePath>,
}

impl MultiModalRoutePath {
    pub fn total_seconds(&self) -> f64 {
        self.first_walk.as_ref().map(|p| p.seconds).unwrap_or(0.0)
            + self.bike.as_ref().map(|p| p.seconds).unwrap_or(0.0)
            + self.second_walk.as_ref().map(|p| p.seconds).unwrap_or(0.0)
    }
}
