//! Simulation context: volume, particle columns and the tick barrier.

use crate::config::{NeighborStrategy, SimConfig};
use crate::error::SimError;
use crate::integrator::{step_particle, PrevState, TickContext};
use crate::neighbors::{IndexWindow, Neighbors, SpatialHashGrid};
use crate::seed::{seed_particles, SeedConfig};
use crate::state::{ParticleBuffers, ParticleView};
use glam::{Quat, Vec3};
use hourglass_asset::SdfVolume;
use hourglass_core::time::{clamp_dt, SimulationTime};
use hourglass_core::ConfigError;
use hourglass_metrics::{Counter, StageProfiler};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    /// Tick number after this step (0 when the step was skipped).
    pub tick: u64,
    /// Step actually integrated, after clamping.
    pub dt: f32,
    /// A zero step: nothing was integrated and the committed state is unchanged.
    pub skipped: bool,
    /// Particles that fell back to their previous position.
    pub reverted: usize,
    /// Wall contacts without a usable SDF normal.
    pub degenerate_normals: usize,
}

/// Per-strategy neighbor state kept between ticks.
enum NeighborIndex {
    Window { radius: usize },
    Hash(SpatialHashGrid),
}

pub struct Simulation {
    volume: Arc<SdfVolume>,
    config: SimConfig,
    particles: ParticleBuffers,
    time: SimulationTime,
    neighbors: NeighborIndex,
    profiler: StageProfiler,
    counters: Counter,
}

impl Simulation {
    /// Seed particles inside `volume` and get ready to tick. Without a volume
    /// nothing is spawned.
    pub fn new(
        volume: Option<Arc<SdfVolume>>,
        config: SimConfig,
        seed: &SeedConfig,
    ) -> Result<Self, SimError> {
        let volume = volume.ok_or(SimError::MissingVolume)?;
        config.validate()?;
        seed.validate()?;
        let positions = seed_particles(&volume, seed)?;
        let velocities = vec![Vec3::ZERO; positions.len()];
        Ok(Self::assemble(volume, config, ParticleBuffers::new(positions, velocities)))
    }

    /// Start from explicit particle state. Each `w` tag is resampled.
    pub fn from_particles(
        volume: Option<Arc<SdfVolume>>,
        config: SimConfig,
        positions: Vec<Vec3>,
        velocities: Vec<Vec3>,
    ) -> Result<Self, SimError> {
        let volume = volume.ok_or(SimError::MissingVolume)?;
        config.validate()?;
        if positions.len() != velocities.len() {
            return Err(SimError::LengthMismatch {
                positions: positions.len(),
                velocities: velocities.len(),
            });
        }
        ConfigError::require_count("particle_count", positions.len())?;
        let positions = positions
            .into_iter()
            .map(|p| p.extend(volume.sample(p)))
            .collect();
        Ok(Self::assemble(volume, config, ParticleBuffers::new(positions, velocities)))
    }

    fn assemble(volume: Arc<SdfVolume>, config: SimConfig, particles: ParticleBuffers) -> Self {
        let neighbors = match config.neighbors {
            NeighborStrategy::IndexWindow { radius } => NeighborIndex::Window { radius },
            NeighborStrategy::SpatialHash => {
                NeighborIndex::Hash(SpatialHashGrid::new(config.repulsion_radius()))
            }
        };
        info!(
            particles = particles.len(),
            neighbors = ?config.neighbors,
            grid = volume.size(),
            "simulation ready"
        );
        Self {
            volume,
            config,
            particles,
            time: SimulationTime::new(),
            neighbors,
            profiler: StageProfiler::new(),
            counters: Counter::new(),
        }
    }

    /// Run one tick: read the committed state, write the next one in
    /// parallel, then swap. `dt` is clamped to `max_dt`.
    pub fn step(&mut self, dt: f32, orientation: Quat) -> TickReport {
        let dt = clamp_dt(dt, self.config.max_dt);
        if dt <= 0.0 || self.particles.is_empty() {
            trace!("skipping zero-length tick");
            return TickReport {
                skipped: true,
                ..TickReport::default()
            };
        }
        let orientation = if orientation.is_finite() && orientation.length_squared() > 0.0 {
            orientation.normalize()
        } else {
            Quat::IDENTITY
        };
        let tick = self.time.tick_count() + 1;
        let count = self.particles.len();

        if let NeighborIndex::Hash(grid) = &mut self.neighbors {
            let positions = self.particles.positions.read();
            self.profiler.time_stage("hash_rebuild", || grid.rebuild(positions));
        }
        let neighbors = match &self.neighbors {
            NeighborIndex::Window { radius } => Neighbors::Window(IndexWindow::new(count, *radius)),
            NeighborIndex::Hash(grid) => Neighbors::Hash {
                grid,
                radius: self.config.repulsion_radius(),
            },
        };
        let ctx = TickContext::new(&self.volume, &self.config, neighbors, orientation, dt, tick);

        let ParticleBuffers {
            positions,
            velocities,
        } = &mut self.particles;
        let (pos_read, pos_write) = positions.slice_rw();
        let (vel_read, vel_write) = velocities.slice_rw();
        let prev = PrevState {
            positions: pos_read,
            velocities: vel_read,
        };

        let (reverted, degenerate_normals) = self.profiler.time_stage("integrate", || {
            pos_write
                .par_iter_mut()
                .zip(vel_write.par_iter_mut())
                .enumerate()
                .map(|(i, (position, velocity))| {
                    let step = step_particle(i, &prev, &ctx);
                    *position = step.position;
                    *velocity = step.velocity;
                    (step.reverted as usize, step.degenerate_normals as usize)
                })
                .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1))
        });

        self.particles.swap_buffers();
        self.time.advance_tick(dt);
        self.counters.add("reverted", reverted as u64);
        self.counters.add("degenerate_normals", degenerate_normals as u64);

        if reverted > 0 || degenerate_normals > 0 {
            debug!(tick, reverted, degenerate_normals, "recovered particles");
        }

        TickReport {
            tick,
            dt,
            skipped: false,
            reverted,
            degenerate_normals,
        }
    }

    /// Read-only view of the last committed tick.
    pub fn view(&self) -> ParticleView<'_> {
        self.particles.view()
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn tick_count(&self) -> u64 {
        self.time.tick_count()
    }

    pub fn time(&self) -> &SimulationTime {
        &self.time
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn volume(&self) -> &Arc<SdfVolume> {
        &self.volume
    }

    pub fn profiler(&self) -> &StageProfiler {
        &self.profiler
    }

    pub fn counters(&self) -> &Counter {
        &self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::SeedRegion;

    fn ball() -> Arc<SdfVolume> {
        Arc::new(
            SdfVolume::from_fn(24, Vec3::splat(-0.6), Vec3::splat(0.6), |p| p.length() - 0.5)
                .unwrap(),
        )
    }

    #[test]
    fn refuses_to_start_without_a_volume() {
        let result = Simulation::new(None, SimConfig::default(), &SeedConfig::default());
        assert!(matches!(result, Err(SimError::MissingVolume)));
        let result = Simulation::from_particles(
            None,
            SimConfig::default(),
            vec![Vec3::ZERO],
            vec![Vec3::ZERO],
        );
        assert!(matches!(result, Err(SimError::MissingVolume)));
    }

    #[test]
    fn invalid_config_is_rejected_before_seeding() {
        let config = SimConfig {
            substeps: 0,
            ..SimConfig::default()
        };
        let result = Simulation::new(Some(ball()), config, &SeedConfig::default());
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn zero_particles_are_rejected_before_seeding() {
        let seed = SeedConfig {
            count: 0,
            ..SeedConfig::default()
        };
        let result = Simulation::new(Some(ball()), SimConfig::default(), &seed);
        assert!(matches!(
            result,
            Err(SimError::Config(ConfigError::NotPositive {
                name: "particle_count",
                ..
            }))
        ));

        let result =
            Simulation::from_particles(Some(ball()), SimConfig::default(), Vec::new(), Vec::new());
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn zero_dt_leaves_state_untouched() {
        let mut sim = Simulation::from_particles(
            Some(ball()),
            SimConfig::default(),
            vec![Vec3::new(0.0, 0.1, 0.0)],
            vec![Vec3::new(0.5, 0.0, 0.0)],
        )
        .unwrap();
        let report = sim.step(0.0, Quat::IDENTITY);
        assert!(report.skipped);
        assert_eq!(sim.tick_count(), 0);
        assert_eq!(sim.view().velocities()[0], Vec3::new(0.5, 0.0, 0.0));

        let report = sim.step(f32::NAN, Quat::IDENTITY);
        assert!(report.skipped);
    }

    #[test]
    fn long_frames_are_clamped() {
        let mut sim = Simulation::from_particles(
            Some(ball()),
            SimConfig::default(),
            vec![Vec3::ZERO],
            vec![Vec3::ZERO],
        )
        .unwrap();
        let report = sim.step(0.5, Quat::IDENTITY);
        assert_eq!(report.dt, sim.config().max_dt);
        assert_eq!(report.tick, 1);
    }

    #[test]
    fn particles_fall_along_rotated_gravity() {
        let config = SimConfig {
            gravity_scale: 1.0,
            ..SimConfig::default()
        };
        let start = Vec3::new(0.0, 0.0, 0.0);
        let mut upright =
            Simulation::from_particles(Some(ball()), config.clone(), vec![start], vec![Vec3::ZERO])
                .unwrap();
        let mut inverted =
            Simulation::from_particles(Some(ball()), config, vec![start], vec![Vec3::ZERO])
                .unwrap();
        let flip = Quat::from_rotation_x(std::f32::consts::PI);
        for _ in 0..10 {
            upright.step(1.0 / 60.0, Quat::IDENTITY);
            inverted.step(1.0 / 60.0, flip);
        }
        assert!(upright.view().positions()[0].y < -0.01);
        assert!(inverted.view().positions()[0].y > 0.01);
    }

    #[test]
    fn spatial_hash_strategy_runs() {
        let config = SimConfig {
            neighbors: NeighborStrategy::SpatialHash,
            ..SimConfig::default()
        };
        let seed = SeedConfig {
            count: 200,
            region: SeedRegion::Box {
                min: Vec3::splat(-0.3),
                max: Vec3::splat(0.3),
            },
            ..SeedConfig::default()
        };
        let mut sim = Simulation::new(Some(ball()), config, &seed).unwrap();
        for _ in 0..5 {
            let report = sim.step(1.0 / 60.0, Quat::IDENTITY);
            assert!(!report.skipped);
        }
        assert_eq!(sim.tick_count(), 5);
        assert!(sim.view().max_sdf() <= sim.config().boundary_threshold);
    }
}
