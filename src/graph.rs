use crate::geo::LonLat;

/// Opaque node identifier assigned by the external graph.
pub type NodeId = usize;

/// The read-only collaborator every search engine is generic over. Loading a graph from OSM,
/// projecting a query point onto its nearest node, and any plotting of the result are explicitly
/// the caller's concern, not this crate's.
pub trait Graph {
    /// Node ids directly reachable from `node` by a single outgoing edge.
    fn out_neighbors(&self, node: NodeId) -> Vec<NodeId>;

    /// Length in metres of the first parallel edge `u -> v`. Disambiguating further parallel
    /// edges is out of scope.
    fn edge_length(&self, u: NodeId, v: NodeId) -> f64;

    /// Geographic coordinate of `node`, used only by the A* heuristic.
    fn coord(&self, node: NodeId) -> LonLat;
}
