//! Tick timing utilities

use super::ring_buffer::RingBuffer;
use std::time::Instant;

/// Rolling wall-clock cost of simulation ticks.
pub struct TickTimer {
    tick_start: Instant,
    tick_ms: RingBuffer<f64>,
}

impl TickTimer {
    pub fn new(capacity: usize) -> Self {
        Self {
            tick_start: Instant::now(),
            tick_ms: RingBuffer::new(capacity),
        }
    }

    pub fn begin(&mut self) {
        self.tick_start = Instant::now();
    }

    pub fn end(&mut self) {
        self.tick_ms
            .push(self.tick_start.elapsed().as_secs_f64() * 1000.0);
    }

    pub fn ticks_per_second(&self) -> f64 {
        let avg = self.tick_ms.mean();
        if avg > 0.0 {
            1000.0 / avg
        } else {
            0.0
        }
    }

    pub fn tick_time_ms(&self) -> f64 {
        self.tick_ms.mean()
    }

    pub fn tick_time_range_ms(&self) -> (f64, f64) {
        self.tick_ms.min_max()
    }
}
