//! Simulation time
//!
//! Variable tick length with a hard upper clamp so frame hitches can't
//! blow up the integrator.

use std::time::{Duration, Instant};

/// Nominal simulation tick rate (60 Hz = 16.666ms per tick)
pub const TICK_RATE_HZ: u32 = 60;
pub const TICK_DURATION: Duration = Duration::from_micros(16_666); // ~16.666ms

/// Largest step the integrator accepts, in seconds.
pub const MAX_TICK_SECS: f32 = 1.0 / TICK_RATE_HZ as f32;

/// Clamp an elapsed time to `[0, max]`. Non-finite input becomes zero.
#[inline]
pub fn clamp_dt(dt: f32, max: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, max)
    } else {
        0.0
    }
}

/// Simulation time tracker
pub struct SimulationTime {
    tick_count: u64,
    accumulated_time: Duration,
}

impl SimulationTime {
    pub fn new() -> Self {
        Self {
            tick_count: 0,
            accumulated_time: Duration::ZERO,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Record one completed tick of `dt` seconds.
    pub fn advance_tick(&mut self, dt: f32) {
        self.tick_count += 1;
        self.accumulated_time += Duration::from_secs_f32(dt.max(0.0));
    }

    pub fn total_time(&self) -> Duration {
        self.accumulated_time
    }
}

impl Default for SimulationTime {
    fn default() -> Self {
        Self::new()
    }
}

/// Source of per-tick elapsed time.
pub enum FrameClock {
    /// Measure wall-clock time between ticks.
    Wall { last: Instant, max_step: f32 },
    /// Always report the same step (headless and test runs).
    Fixed { step: f32 },
}

impl FrameClock {
    pub fn wall(max_step: f32) -> Self {
        FrameClock::Wall {
            last: Instant::now(),
            max_step,
        }
    }

    pub fn fixed(step: f32) -> Self {
        FrameClock::Fixed { step }
    }

    /// Elapsed seconds since the previous call, clamped.
    pub fn next_dt(&mut self) -> f32 {
        match self {
            FrameClock::Wall { last, max_step } => {
                let now = Instant::now();
                let elapsed = now.duration_since(*last).as_secs_f32();
                *last = now;
                clamp_dt(elapsed, *max_step)
            }
            FrameClock::Fixed { step } => *step,
        }
    }
}
