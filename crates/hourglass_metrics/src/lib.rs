//! Hourglass Metrics - timing and counting for the bake and tick loops
//!
//! Everything here vanishes when the `metrics` feature is off: the types
//! become empty structs with no-op methods so call sites don't need `cfg`.
//!
//! # Usage
//!
//! ```ignore
//! use hourglass_metrics::{StageProfiler, TickTimer};
//!
//! let mut timer = TickTimer::new(120);
//! let mut profiler = StageProfiler::new();
//! timer.begin();
//! profiler.time_stage("integrate", || { /* ... */ });
//! timer.end();
//! println!("{:.1} ticks/s", timer.ticks_per_second());
//! ```

#[cfg(feature = "metrics")]
mod counter;
#[cfg(feature = "metrics")]
mod ring_buffer;
#[cfg(feature = "metrics")]
mod stage_profiler;
#[cfg(feature = "metrics")]
mod tick_timer;

#[cfg(feature = "metrics")]
pub use counter::Counter;
#[cfg(feature = "metrics")]
pub use ring_buffer::RingBuffer;
#[cfg(feature = "metrics")]
pub use stage_profiler::{StageProfiler, StageTiming};
#[cfg(feature = "metrics")]
pub use tick_timer::TickTimer;

/// Whether instrumentation is compiled in.
pub const ENABLED: bool = cfg!(feature = "metrics");

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
pub struct TickTimer;

#[cfg(not(feature = "metrics"))]
impl TickTimer {
    pub fn new(_capacity: usize) -> Self { Self }
    pub fn begin(&mut self) {}
    pub fn end(&mut self) {}
    pub fn ticks_per_second(&self) -> f64 { 0.0 }
    pub fn tick_time_ms(&self) -> f64 { 0.0 }
    pub fn tick_time_range_ms(&self) -> (f64, f64) { (0.0, 0.0) }
}

#[cfg(not(feature = "metrics"))]
pub struct RingBuffer<T>(std::marker::PhantomData<T>);

#[cfg(not(feature = "metrics"))]
impl<T> RingBuffer<T> {
    pub fn new(_capacity: usize) -> Self { Self(std::marker::PhantomData) }
    pub fn push(&mut self, _value: T) {}
    pub fn len(&self) -> usize { 0 }
    pub fn is_empty(&self) -> bool { true }
}

#[cfg(not(feature = "metrics"))]
pub struct Counter;

#[cfg(not(feature = "metrics"))]
impl Counter {
    pub fn new() -> Self { Self }
    pub fn add(&mut self, _name: &'static str, _value: u64) {}
    pub fn get(&self, _name: &str) -> u64 { 0 }
    pub fn reset_all(&mut self) {}
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ { std::iter::empty() }
}

#[cfg(not(feature = "metrics"))]
impl Default for Counter {
    fn default() -> Self { Self }
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct StageTiming {
    pub calls: u64,
    pub total: std::time::Duration,
}

#[cfg(not(feature = "metrics"))]
pub struct StageProfiler;

#[cfg(not(feature = "metrics"))]
impl StageProfiler {
    pub fn new() -> Self { Self }
    pub fn time_stage<F, R>(&mut self, _name: &'static str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        f()
    }
    pub fn timing(&self, _name: &str) -> StageTiming { StageTiming::default() }
    pub fn mean_ms(&self, _name: &str) -> f64 { 0.0 }
    pub fn summary(&self) -> String { String::new() }
    pub fn reset(&mut self) {}
}

#[cfg(not(feature = "metrics"))]
impl Default for StageProfiler {
    fn default() -> Self { Self }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stubs_and_real_types_share_an_api() {
        let mut timer = TickTimer::new(60);
        timer.begin();
        timer.end();
        let mut profiler = StageProfiler::new();
        let value = profiler.time_stage("work", || 41 + 1);
        assert_eq!(value, 42);
        let mut counter = Counter::new();
        counter.add("reverted", 2);
        if ENABLED {
            assert_eq!(counter.get("reverted"), 2);
            assert_eq!(profiler.timing("work").calls, 1);
        } else {
            assert_eq!(counter.get("reverted"), 0);
        }
    }
}
