//! Diagnostic hook invoked at sampled cadences by the search engines, decoupled from any
//! plotting concern (`examples/original_source/call_backs.py`'s callbacks are all
//! `osmnx`/`matplotlib`-based and stay out of this crate).

/// A side-effect-only capability. Implementations must not mutate engine state; they exist to
/// let a caller sample progress (e.g. render the frontier, log metrics) without the engine
/// knowing or caring what the caller does with `tick`.
pub trait Observer {
    fn on_tick(&mut self, tick: u64);
}

/// The default observer: does nothing. Engines take `&mut dyn Observer` and fall back to this
/// when the caller passes none.
pub struct NullObserver;

impl Observer for NullObserver {
    fn on_tick(&mut self, _tick: u64) {}
}
