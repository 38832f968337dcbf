//! Integration tests exercising the literal scenarios from SPEC_FULL.md's testable-properties
//! section, end to end against a small in-memory graph fixture -- grounded in shape on the
//! teacher's `tests/helpers/mod.rs` (there the fixture comes from parsing a `.fmi` map; here it
//! is built directly since the graph is an external collaborator this crate never loads).

use std::collections::{HashMap, HashSet};

use multimodal_routing::config::{EngineConfig, MultiModalConfig};
use multimodal_routing::err::SearchError;
use multimodal_routing::geo::LonLat;
use multimodal_routing::graph::{Graph, NodeId};
use multimodal_routing::observer::NullObserver;
use multimodal_routing::routing::astar::AStar;
use multimodal_routing::routing::bidirectional::BidirectionalAStar;
use multimodal_routing::routing::isochrone::Isochrone;
use multimodal_routing::routing::multimodal::sequenced::SequencedMultiModalRouter;

struct FixtureGraph {
    edges: HashMap<(NodeId, NodeId), f64>,
    coords: HashMap<NodeId, LonLat>,
}

impl FixtureGraph {
    fn new() -> Self {
        FixtureGraph {
            edges: HashMap::new(),
            coords: HashMap::new(),
        }
    }

    fn with_node(mut self, id: NodeId, lon: f64, lat: f64) -> Self {
        self.coords.insert(id, LonLat::new(lon, lat));
        self
    }

    /// Adds a symmetric (bidirectional) edge, matching how a road network exposes a
    /// two-way street as a pair of directed edges of equal length.
    fn with_edge(mut self, a: NodeId, b: NodeId, length: f64) -> Self {
        self.edges.insert((a, b), length);
        self.edges.insert((b, a), length);
        self
    }
}

impl Graph for FixtureGraph {
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

const WALKING_SPEED: f64 = 1.4;
const BIKE_SPEED: f64 = 3.3;

/// Mirrors the teacher's `env_logger::Builder::from_env("RUST_LOG").init()` convention; `try_init`
/// tolerates being called from more than one test in the same binary.
fn init_logging() {
    let _ = env_logger::Builder::from_env("RUST_LOG").is_test(true).try_init();
}

/// S1: a trivial three-node line.
#[test]
fn s1_trivial_path() {
    init_logging();
    let g = FixtureGraph::new()
        .with_node(1, 0.0, 0.0)
        .with_node(2, 0.0, 0.001)
        .with_node(3, 0.0, 0.002)
        .with_edge(1, 2, 100.0)
        .with_edge(2, 3, 150.0);

    let astar = AStar::new(EngineConfig {
        speed: WALKING_SPEED,
        cost_factor: 1.0,
        queue_capacity: 50_000,
    });
    let mut obs = NullObserver;
    let path = astar.best_path(&g, 1, 3, &mut obs).unwrap();

    assert_eq!(path.nodes, vec![1, 2, 3]);
    assert!((path.seconds - 250.0 / WALKING_SPEED).abs() < 1e-6);
}

/// S2: a symmetric square; bidirectional search should agree on total cost with unimodal
/// Dijkstra (invariant 8.6).
#[test]
fn s2_bidirectional_matches_unimodal_dijkstra() {
    init_logging();
    let g = FixtureGraph::new()
        .with_node(1, 0.0, 0.0)
        .with_node(2, 0.001, 0.0)
        .with_node(3, 0.0, 0.001)
        .with_node(4, 0.001, 0.001)
        .with_edge(1, 2, 100.0)
        .with_edge(1, 3, 100.0)
        .with_edge(2, 4, 100.0)
        .with_edge(3, 4, 100.0);

    let bidir = BidirectionalAStar::new(1.0, WALKING_SPEED, 50_000);
    let mut obs = NullObserver;
    let bidir_path = bidir.best_path(&g, 1, 4, &mut obs).unwrap();

    let unimodal = AStar::new(EngineConfig::dijkstra(WALKING_SPEED));
    let unimodal_path = unimodal.best_path(&g, 1, 4, &mut obs).unwrap();

    assert!((bidir_path.seconds - unimodal_path.seconds).abs() < 1e-6);
    assert!((bidir_path.seconds - 200.0 / WALKING_SPEED).abs() < 1e-6);
}

/// S3: a chain with a 900s budget excludes anything past the first 700m hop.
#[test]
fn s3_isochrone_time_budget() {
    init_logging();
    let g = FixtureGraph::new()
        .with_node(1, 0.0, 0.0)
        .with_node(2, 0.0, 0.006)
        .with_node(3, 0.0, 0.012)
        .with_node(4, 0.0, 0.018)
        .with_edge(1, 2, 700.0)
        .with_edge(2, 3, 700.0)
        .with_edge(3, 4, 700.0);

    let iso = Isochrone::new(WALKING_SPEED, 900.0, 50_000);
    let mut obs = NullObserver;
    let targets: HashSet<NodeId> = [2, 3, 4].iter().copied().collect();
    let result = iso.get_isochrone(&g, 1, &targets, &mut obs).unwrap();

    assert_eq!(result.len(), 1);
    let reached = result.get(&2).expect("node 2 is within budget");
    assert!((reached.seconds - 500.0).abs() < 1e-6);
}

/// S4: a star graph wide enough to blow the label budget aborts cleanly instead of panicking.
#[test]
fn s4_capacity_exceeded_does_not_panic() {
    init_logging();
    let mut g = FixtureGraph::new().with_node(0, 0.0, 0.0);
    // one edge per leaf keeps each search iteration cheap while still forcing the label count
    // past a small artificial capacity.
    for leaf in 1..=50 {
        g = g.with_node(leaf, 0.0, leaf as f64 * 0.0001).with_edge(0, leaf, 10.0);
    }

    let astar = AStar::new(EngineConfig {
        speed: WALKING_SPEED,
        cost_factor: 0.0,
        queue_capacity: 10,
    });
    let mut obs = NullObserver;
    let result = astar.best_path(&g, 0, 999, &mut obs);
    assert!(matches!(result, Err(SearchError::CapacityExceeded)));
}

/// S5: a sequenced multimodal route beats pure walking once a bike-share pair is available.
#[test]
fn s5_sequenced_multimodal_beats_walking() {
    init_logging();
    let mut g = FixtureGraph::new()
        .with_node(1, 0.0, 0.0) // orig
        .with_node(2, 0.0, 0.003) // walk -> bss_a (~300m)
        .with_node(3, 0.0, 0.048) // bss_b, ~5km further along
        .with_node(4, 0.0, 0.051) // dest
        .with_edge(1, 2, 300.0)
        .with_edge(2, 3, 5_000.0)
        .with_edge(3, 4, 300.0);
    // a slow direct walking shortcut exists too, so the engine has to actually prefer biking.
    g = g.with_edge(1, 4, 5_600.0);

    let mut bss = HashSet::new();
    bss.insert(2);
    bss.insert(3);

    let router = SequencedMultiModalRouter::new(MultiModalConfig {
        walking_speed: WALKING_SPEED,
        bike_speed: BIKE_SPEED,
        queue_capacity: 50_000,
    });
    let mut obs = NullObserver;
    let result = router.best_path(&g, 1, 4, &bss, &mut obs).unwrap();

    let pure_walk_seconds = 5_600.0 / WALKING_SPEED;
    assert!(result.total_seconds() < pure_walk_seconds);
    assert_eq!(result.bike.as_ref().unwrap().nodes.first(), Some(&2));
    assert_eq!(result.bike.as_ref().unwrap().nodes.last(), Some(&3));
}

/// S6: decrease-key relaxation leaves exactly one live queue entry for the improved label.
#[test]
fn s6_decrease_key_relaxation() {
    init_logging();
    use multimodal_routing::routing::queue::PriorityQueue;

    let mut q = PriorityQueue::new();
    q.insert(100.0, 1);
    q.insert(60.0, 1);
    assert_eq!(q.len(), 1);
    assert_eq!(q.pop(), Some((60.0, 1)));
    assert_eq!(q.pop(), None);
}
