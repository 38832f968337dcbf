//! Walk + bike-share multimodal engines: three routers answering the same walk-bike-walk
//! shortest-path problem by different architectures, and two isochrone variants chaining or
//! coupling a walking and a biking frontier. Bike travel is only permitted between designated
//! bike-share station (BSS) nodes.

pub mod double_expansion;
pub mod double_expansion_isochrone;
pub mod isochrone;
pub mod one_queue;
pub mod sequenced;
