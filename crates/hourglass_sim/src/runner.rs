//! Tick loop driving a [`Simulation`] until told to stop.

use crate::simulation::{Simulation, TickReport};
use crate::state::ParticleView;
use glam::Quat;
use hourglass_core::time::FrameClock;
use hourglass_metrics::TickTimer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Supplies the cavity orientation for each tick.
pub trait OrientationSource {
    fn orientation(&mut self, dt: f32) -> Quat;
}

impl OrientationSource for Quat {
    fn orientation(&mut self, _dt: f32) -> Quat {
        *self
    }
}

/// Receives every committed tick. The view is only valid for the call.
pub trait FrameSink {
    fn publish(&mut self, report: &TickReport, view: ParticleView<'_>);
}

impl<F> FrameSink for F
where
    F: FnMut(&TickReport, ParticleView<'_>),
{
    fn publish(&mut self, report: &TickReport, view: ParticleView<'_>) {
        self(report, view)
    }
}

/// Sink that drops every frame (headless runs).
pub struct NullSink;

impl FrameSink for NullSink {
    fn publish(&mut self, _report: &TickReport, _view: ParticleView<'_>) {}
}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Signal,
    TickLimit,
}

#[derive(Debug, Clone)]
pub struct LoopSummary {
    pub ticks: u64,
    pub reverted: usize,
    pub degenerate_normals: usize,
    pub stopped_by: StopReason,
    pub elapsed: Duration,
}

pub struct SimulationLoop {
    clock: FrameClock,
    stop: StopSignal,
    max_ticks: Option<u64>,
    /// Log a stats line every this many ticks (0 disables).
    log_every: u64,
    timer: TickTimer,
}

impl SimulationLoop {
    pub fn new(clock: FrameClock, stop: StopSignal) -> Self {
        Self {
            clock,
            stop,
            max_ticks: None,
            log_every: 120,
            timer: TickTimer::new(120),
        }
    }

    /// Limit the number of frames. Skipped zero-length frames count too.
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    pub fn with_log_every(mut self, ticks: u64) -> Self {
        self.log_every = ticks;
        self
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Tick until the stop signal is raised or the tick limit is reached.
    /// The signal is only checked between ticks, so a sink never sees a
    /// partially written state.
    pub fn run(
        &mut self,
        sim: &mut Simulation,
        orientation: &mut dyn OrientationSource,
        sink: &mut dyn FrameSink,
    ) -> LoopSummary {
        let start = Instant::now();
        let mut frames = 0u64;
        let mut ticks = 0u64;
        let mut reverted = 0usize;
        let mut degenerate_normals = 0usize;

        let stopped_by = loop {
            if self.stop.is_raised() {
                break StopReason::Signal;
            }
            if self.max_ticks.is_some_and(|max| frames >= max) {
                break StopReason::TickLimit;
            }
            frames += 1;

            let dt = self.clock.next_dt();
            let q = orientation.orientation(dt);
            self.timer.begin();
            let report = sim.step(dt, q);
            self.timer.end();
            if report.skipped {
                continue;
            }

            ticks += 1;
            reverted += report.reverted;
            degenerate_normals += report.degenerate_normals;
            let view = sim.view();
            sink.publish(&report, view);

            if self.log_every > 0 && ticks % self.log_every == 0 {
                info!(
                    tick = report.tick,
                    inside = view.inside_count(),
                    mean_speed = view.mean_speed(),
                    tick_ms = self.timer.tick_time_ms(),
                    "simulation running"
                );
            }
        };

        let summary = LoopSummary {
            ticks,
            reverted,
            degenerate_normals,
            stopped_by,
            elapsed: start.elapsed(),
        };
        info!(
            ticks,
            reverted,
            stopped_by = ?summary.stopped_by,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "simulation stopped"
        );
        summary
    }
}
