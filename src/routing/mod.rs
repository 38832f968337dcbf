//! Label-setting search engines over an external, read-only [`crate::graph::Graph`].
//!
//! The primitives in this module -- the append-only label store, the per-edge tri-state status
//! map, the decrease-key priority queue, and the relaxation protocol built from them -- are
//! shared by every engine in [`astar`], [`isochrone`], [`bidirectional`], and [`multimodal`].

pub mod astar;
pub mod bidirectional;
pub mod cost;
pub mod ids;
pub mod isochrone;
pub mod labels;
pub mod multimodal;
pub mod path;
pub mod queue;
pub mod status;

pub use cost::Cost;
pub use ids::{EdgeId, LabelIdx, Mode};
pub use path::{MultiModalRoutePath, RoutePath};
