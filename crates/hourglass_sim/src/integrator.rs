//! Per-particle tick kernel.
//!
//! `step_particle` reads only the committed state and returns the new state
//! of one particle, so the whole tick is a parallel map over indices with no
//! shared writes.

use crate::collision::{advance_with_collisions, validate_position, CollisionParams, Validation};
use crate::config::{SimConfig, SlowParticlePolicy};
use crate::neighbors::Neighbors;
use glam::{Quat, Vec3, Vec4};
use hourglass_asset::SdfVolume;
use hourglass_core::math::hashed_direction;

/// Committed state of the previous tick.
#[derive(Clone, Copy)]
pub struct PrevState<'a> {
    pub positions: &'a [Vec4],
    pub velocities: &'a [Vec3],
}

/// Everything shared by all particles during one tick.
pub struct TickContext<'a> {
    pub volume: &'a SdfVolume,
    pub config: &'a SimConfig,
    pub collision: CollisionParams,
    pub neighbors: Neighbors<'a>,
    /// Gravity in cavity space, already scaled.
    pub gravity: Vec3,
    /// Clamped step in seconds.
    pub dt: f32,
    pub tick: u64,
}

impl<'a> TickContext<'a> {
    pub fn new(
        volume: &'a SdfVolume,
        config: &'a SimConfig,
        neighbors: Neighbors<'a>,
        orientation: Quat,
        dt: f32,
        tick: u64,
    ) -> Self {
        Self {
            volume,
            config,
            collision: CollisionParams::from(config),
            neighbors,
            gravity: local_gravity(config.gravity, orientation, config.gravity_scale),
            dt,
            tick,
        }
    }
}

/// Gravity expressed in the frame of a cavity rotated by `orientation`.
pub fn local_gravity(gravity: Vec3, orientation: Quat, scale: f32) -> Vec3 {
    orientation.inverse() * gravity * scale
}

/// New state of one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleStep {
    pub position: Vec4,
    pub velocity: Vec3,
    /// Fell back to the previous position.
    pub reverted: bool,
    pub degenerate_normals: u32,
}

/// Repulsion plus viscous drag on particle `i` from its neighbors.
pub fn repulsion(i: usize, prev: &PrevState<'_>, ctx: &TickContext<'_>) -> Vec3 {
    let config = ctx.config;
    let r = config.repulsion_radius();
    let r_squared = r * r;
    let p = prev.positions[i].truncate();
    let v = prev.velocities[i];
    let mut force = Vec3::ZERO;

    ctx.neighbors.for_each(i, prev.positions, |j| {
        let delta = p - prev.positions[j].truncate();
        let d_squared = delta.length_squared();
        if d_squared >= r_squared || d_squared <= f32::EPSILON * r_squared {
            return;
        }
        let d = d_squared.sqrt();
        let falloff = 1.0 - d / r;
        force += delta / d * (config.stiffness * falloff * falloff);
        force += (prev.velocities[j] - v) * (config.viscosity * falloff);
    });
    force
}

/// Advance particle `i` by one tick.
pub fn step_particle(i: usize, prev: &PrevState<'_>, ctx: &TickContext<'_>) -> ParticleStep {
    let config = ctx.config;
    let dt = ctx.dt;
    let start = prev.positions[i];
    let mut velocity = prev.velocities[i];

    let force = repulsion(i, prev, ctx);
    velocity += (ctx.gravity + force) * dt / config.mass;
    velocity *= config.damping;
    velocity = clamp_speed(velocity, i, ctx);

    let mut position = start.truncate();
    let degenerate_normals =
        advance_with_collisions(ctx.volume, &mut position, &mut velocity, dt, &ctx.collision);

    match validate_position(ctx.volume, position, config.boundary_threshold) {
        Validation::Accepted { position, sdf } | Validation::Snapped { position, sdf }
            if velocity.is_finite() =>
        {
            ParticleStep {
                position: position.extend(sdf),
                velocity,
                reverted: false,
                degenerate_normals,
            }
        }
        _ => ParticleStep {
            position: start,
            velocity: Vec3::ZERO,
            reverted: true,
            degenerate_normals,
        },
    }
}

fn clamp_speed(velocity: Vec3, i: usize, ctx: &TickContext<'_>) -> Vec3 {
    let config = ctx.config;
    let speed = velocity.length();
    if !speed.is_finite() {
        return Vec3::ZERO;
    }
    if speed > config.max_speed {
        return velocity * (config.max_speed / speed);
    }
    if speed < config.min_speed {
        return match config.slow_policy {
            SlowParticlePolicy::Jitter { amplitude } => {
                velocity + hashed_direction(i as u32, ctx.tick as u32) * amplitude
            }
            SlowParticlePolicy::Zero => Vec3::ZERO,
        };
    }
    velocity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neighbors::IndexWindow;

    fn open_box() -> SdfVolume {
        // Large cube; particles near the middle never touch a wall.
        SdfVolume::from_fn(16, Vec3::splat(-1.0), Vec3::splat(1.0), |p| {
            (p.abs() - Vec3::splat(0.9)).max_element()
        })
        .unwrap()
    }

    fn weightless() -> SimConfig {
        SimConfig {
            gravity: Vec3::ZERO,
            slow_policy: SlowParticlePolicy::Zero,
            ..SimConfig::default()
        }
    }

    #[test]
    fn gravity_follows_cavity_rotation() {
        let g = Vec3::new(0.0, -10.0, 0.0);
        assert_eq!(local_gravity(g, Quat::IDENTITY, 0.5), Vec3::new(0.0, -5.0, 0.0));
        // Cavity turned upside down: gravity points along its +Y.
        let flipped = local_gravity(g, Quat::from_rotation_z(std::f32::consts::PI), 1.0);
        assert!((flipped - Vec3::new(0.0, 10.0, 0.0)).length() < 1e-4);
        // Cavity tipped 90° about Z: gravity runs along its -X.
        let tipped = local_gravity(g, Quat::from_rotation_z(std::f32::consts::FRAC_PI_2), 1.0);
        assert!((tipped - Vec3::new(-10.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn repulsion_is_equal_and_opposite() {
        let volume = open_box();
        let config = weightless();
        let positions = [Vec4::new(0.0, 0.0, 0.0, -0.9), Vec4::new(0.01, 0.002, 0.0, -0.9)];
        let velocities = [Vec3::new(0.1, 0.0, 0.0), Vec3::new(-0.2, 0.05, 0.0)];
        let prev = PrevState {
            positions: &positions,
            velocities: &velocities,
        };
        let ctx = TickContext::new(
            &volume,
            &config,
            Neighbors::Window(IndexWindow::new(2, 3)),
            Quat::IDENTITY,
            0.01,
            0,
        );

        let f0 = repulsion(0, &prev, &ctx);
        let f1 = repulsion(1, &prev, &ctx);
        assert!(f0.length() > 0.0);
        assert!((f0 + f1).length() < 1e-6, "{f0:?} vs {f1:?}");

        // Without relative motion the force lies along the separation.
        let still = [Vec3::ZERO; 2];
        let prev = PrevState {
            positions: &positions,
            velocities: &still,
        };
        let f0 = repulsion(0, &prev, &ctx);
        let axis = (positions[0] - positions[1]).truncate().normalize();
        assert!(f0.normalize().dot(axis) > 0.9999);
    }

    #[test]
    fn far_and_coincident_neighbors_are_ignored() {
        let volume = open_box();
        let config = weightless();
        let positions = [
            Vec4::new(0.0, 0.0, 0.0, -0.9),
            Vec4::new(0.0, 0.0, 0.0, -0.9),
            Vec4::new(0.5, 0.0, 0.0, -0.4),
        ];
        let velocities = [Vec3::ZERO; 3];
        let prev = PrevState {
            positions: &positions,
            velocities: &velocities,
        };
        let ctx = TickContext::new(
            &volume,
            &config,
            Neighbors::Window(IndexWindow::new(3, 3)),
            Quat::IDENTITY,
            0.01,
            0,
        );
        assert_eq!(repulsion(0, &prev, &ctx), Vec3::ZERO);
    }

    #[test]
    fn speed_is_capped_and_slow_particles_follow_policy() {
        let volume = open_box();
        let mut config = SimConfig {
            gravity: Vec3::new(0.0, -1000.0, 0.0),
            gravity_scale: 1.0,
            ..SimConfig::default()
        };
        let positions = [Vec4::new(0.0, 0.5, 0.0, -0.4)];
        let velocities = [Vec3::ZERO];
        let prev = PrevState {
            positions: &positions,
            velocities: &velocities,
        };

        let step = {
            let ctx = TickContext::new(
                &volume,
                &config,
                Neighbors::Window(IndexWindow::new(1, 3)),
                Quat::IDENTITY,
                0.016,
                0,
            );
            step_particle(0, &prev, &ctx)
        };
        assert!(step.velocity.length() <= config.max_speed + 1e-5);
        assert!(!step.reverted);

        config.gravity = Vec3::ZERO;
        config.slow_policy = SlowParticlePolicy::Zero;
        let ctx = TickContext::new(
            &volume,
            &config,
            Neighbors::Window(IndexWindow::new(1, 3)),
            Quat::IDENTITY,
            0.016,
            0,
        );
        assert_eq!(step_particle(0, &prev, &ctx).velocity, Vec3::ZERO);

        config.slow_policy = SlowParticlePolicy::Jitter { amplitude: 1e-3 };
        let ctx = TickContext::new(
            &volume,
            &config,
            Neighbors::Window(IndexWindow::new(1, 3)),
            Quat::IDENTITY,
            0.016,
            5,
        );
        let jittered = step_particle(0, &prev, &ctx);
        assert!((jittered.velocity.length() - 1e-3).abs() < 1e-5);
        let again = step_particle(0, &prev, &ctx);
        assert_eq!(jittered, again, "jitter must be deterministic");
    }

    #[test]
    fn committed_position_stays_inside_and_tags_sdf() {
        let volume = open_box();
        let config = SimConfig {
            max_speed: 100.0,
            ..weightless()
        };
        let positions = [Vec4::new(0.85, 0.0, 0.0, -0.05)];
        let velocities = [Vec3::new(80.0, 0.0, 0.0)];
        let prev = PrevState {
            positions: &positions,
            velocities: &velocities,
        };
        let ctx = TickContext::new(
            &volume,
            &config,
            Neighbors::Window(IndexWindow::new(1, 3)),
            Quat::IDENTITY,
            0.016,
            0,
        );
        let step = step_particle(0, &prev, &ctx);
        // The first substep already leaves the grid, so the particle falls back.
        assert!(step.reverted);
        assert_eq!(step.velocity, Vec3::ZERO);
        assert!(step.position.w <= config.boundary_threshold);
        assert!((volume.sample(step.position.truncate()) - step.position.w).abs() < 1e-6);
    }
}
