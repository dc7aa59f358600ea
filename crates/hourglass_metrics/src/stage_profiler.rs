//! Accumulated timings for named pipeline stages

use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default)]
pub struct StageTiming {
    pub calls: u64,
    pub total: Duration,
}

impl StageTiming {
    pub fn mean_ms(&self) -> f64 {
        if self.calls == 0 {
            return 0.0;
        }
        self.total.as_secs_f64() * 1000.0 / self.calls as f64
    }
}

#[derive(Default)]
pub struct StageProfiler {
    stages: BTreeMap<&'static str, StageTiming>,
}

impl StageProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time_stage<F, R>(&mut self, name: &'static str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        let stage = self.stages.entry(name).or_default();
        stage.calls += 1;
        stage.total += start.elapsed();
        result
    }

    pub fn timing(&self, name: &str) -> StageTiming {
        self.stages.get(name).copied().unwrap_or_default()
    }

    pub fn mean_ms(&self, name: &str) -> f64 {
        self.timing(name).mean_ms()
    }

    /// One-line `stage=mean_ms` listing, sorted by stage name.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for (name, timing) in &self.stages {
            if !out.is_empty() {
                out.push_str(", ");
            }
            let _ = write!(out, "{name}={:.3}ms", timing.mean_ms());
        }
        out
    }

    pub fn reset(&mut self) {
        self.stages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_every_stage() {
        let mut profiler = StageProfiler::new();
        profiler.time_stage("integrate", || ());
        profiler.time_stage("integrate", || ());
        profiler.time_stage("hash", || ());
        assert_eq!(profiler.timing("integrate").calls, 2);
        let summary = profiler.summary();
        assert!(summary.starts_with("hash="));
        assert!(summary.contains("integrate="));
        profiler.reset();
        assert_eq!(profiler.timing("hash").calls, 0);
    }
}
