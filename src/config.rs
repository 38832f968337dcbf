//! Per-call engine configuration. Kept deliberately small compared to the teacher's
//! `configs::graph::Config` YAML schema, which exists to drive OSM parsing and per-metric
//! columns -- out of scope here, since the graph itself is an external collaborator.

/// Hard ceiling on the number of labels a single search may create, matching
/// `examples/original_source/priority_queue.py`'s `QUEUE_MAX_SIZE`.
pub const QUEUE_MAX_SIZE: usize = 50_000;

/// Default pedestrian walking speed in m/s, matching the recovered `WALKING_SPEED`.
pub const DEFAULT_WALKING_SPEED: f64 = 1.4;

/// Default bike-share cycling speed in m/s, matching the recovered `BIKE_SPEED`.
pub const DEFAULT_BIKE_SPEED: f64 = 3.3;

/// Tunables shared by the unimodal/bidirectional engines.
#[derive(Debug, Clone, Copy, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EngineConfig {
    /// Travel speed in m/s used to convert edge length into seconds.
    pub speed: f64,
    /// Heuristic weight. `0.0` degenerates A* into Dijkstra; `1.0` is the fully admissible
    /// great-circle heuristic.
    pub cost_factor: f64,
    /// Upper bound on labels created before a search aborts with `CapacityExceeded`.
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            speed: DEFAULT_WALKING_SPEED,
            cost_factor: 1.0,
            queue_capacity: QUEUE_MAX_SIZE,
        }
    }
}

impl EngineConfig {
    pub fn dijkstra(speed: f64) -> Self {
        EngineConfig {
            speed,
            cost_factor: 0.0,
            ..EngineConfig::default()
        }
    }
}

/// The two travel speeds a multimodal engine juggles at once.
#[derive(Debug, Clone, Copy)]
pub struct MultiModalConfig {
    pub walking_speed: f64,
    pub bike_speed: f64,
    pub queue_capacity: usize,
}

impl Default for MultiModalConfig {
    fn default() -> Self {
        MultiModalConfig {
            walking_speed: DEFAULT_WALKING_SPEED,
            bike_speed: DEFAULT_BIKE_SPEED,
            queue_capacity: QUEUE_MAX_SIZE,
        }
    }
}
