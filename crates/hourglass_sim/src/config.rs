//! Integrator parameters.

use glam::Vec3;
use hourglass_core::time::MAX_TICK_SECS;
use hourglass_core::ConfigError;

/// How candidate neighbors for repulsion are found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NeighborStrategy {
    /// Particles adjacent in the implicit square index layout
    /// (`(2·radius + 1)²` window). Cheap, but only approximates spatial
    /// neighborhood; relies on the seed order being spatially coherent.
    IndexWindow { radius: usize },
    /// Uniform 3D hash grid rebuilt from the committed positions every tick.
    SpatialHash,
}

impl Default for NeighborStrategy {
    fn default() -> Self {
        NeighborStrategy::IndexWindow { radius: 3 }
    }
}

/// What happens to particles slower than `min_speed`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlowParticlePolicy {
    /// Nudge by a deterministic per-particle, per-tick direction so piles keep
    /// settling instead of locking up.
    Jitter { amplitude: f32 },
    /// Bring the particle to rest.
    Zero,
}

impl Default for SlowParticlePolicy {
    fn default() -> Self {
        SlowParticlePolicy::Jitter { amplitude: 1.0e-3 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub particle_radius: f32,
    /// Repulsion reaches `repulsion_factor × particle_radius`.
    pub repulsion_factor: f32,
    pub stiffness: f32,
    pub viscosity: f32,
    pub mass: f32,
    /// World-space gravity before orientation and scaling.
    pub gravity: Vec3,
    /// Scales gravity down so sand trickles at a readable pace.
    pub gravity_scale: f32,
    /// Velocity multiplier applied once per tick.
    pub damping: f32,
    pub max_speed: f32,
    pub min_speed: f32,
    pub slow_policy: SlowParticlePolicy,
    /// Upper clamp on the step, in seconds.
    pub max_dt: f32,
    pub substeps: usize,
    /// Width of the band inside the wall where contacts are resolved.
    pub boundary_threshold: f32,
    /// Fraction of the normal speed kept after a wall bounce.
    pub restitution: f32,
    /// Fraction of the tangential speed kept after a wall contact.
    pub friction_damping: f32,
    pub neighbors: NeighborStrategy,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            particle_radius: 0.01,
            repulsion_factor: 2.5,
            stiffness: 2.0,
            viscosity: 0.1,
            mass: 1.0,
            gravity: Vec3::new(0.0, -9.81, 0.0),
            gravity_scale: 0.35,
            damping: 0.98,
            max_speed: 2.0,
            min_speed: 1.0e-3,
            slow_policy: SlowParticlePolicy::default(),
            max_dt: MAX_TICK_SECS,
            substeps: 6,
            boundary_threshold: 0.01,
            restitution: 0.3,
            friction_damping: 0.9,
            neighbors: NeighborStrategy::default(),
        }
    }
}

impl SimConfig {
    #[inline]
    pub fn repulsion_radius(&self) -> f32 {
        self.particle_radius * self.repulsion_factor
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_positive("particle_radius", self.particle_radius)?;
        ConfigError::require_positive("repulsion_factor", self.repulsion_factor)?;
        ConfigError::require_range("stiffness", self.stiffness, 0.0, f32::MAX)?;
        ConfigError::require_range("viscosity", self.viscosity, 0.0, f32::MAX)?;
        ConfigError::require_positive("mass", self.mass)?;
        if !self.gravity.is_finite() {
            return Err(ConfigError::NotFinite { name: "gravity" });
        }
        ConfigError::require_range("gravity_scale", self.gravity_scale, 0.0, f32::MAX)?;
        ConfigError::require_range("damping", self.damping, 0.0, 1.0)?;
        ConfigError::require_positive("max_speed", self.max_speed)?;
        ConfigError::require_range("min_speed", self.min_speed, 0.0, self.max_speed)?;
        if let SlowParticlePolicy::Jitter { amplitude } = self.slow_policy {
            // A jittered particle must still respect the speed cap.
            ConfigError::require_range(
                "jitter_amplitude",
                amplitude,
                0.0,
                self.max_speed - self.min_speed,
            )?;
        }
        ConfigError::require_positive("max_dt", self.max_dt)?;
        ConfigError::require_count("substeps", self.substeps)?;
        ConfigError::require_range("boundary_threshold", self.boundary_threshold, 0.0, f32::MAX)?;
        ConfigError::require_range("restitution", self.restitution, 0.0, 1.0)?;
        ConfigError::require_range("friction_damping", self.friction_damping, 0.0, 1.0)?;
        if let NeighborStrategy::IndexWindow { radius } = self.neighbors {
            ConfigError::require_count("index_window_radius", radius)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.repulsion_radius() - 0.025).abs() < 1e-7);
        assert!(config.gravity_scale < 1.0);
    }

    #[test]
    fn rejects_bad_values() {
        let zero_substeps = SimConfig {
            substeps: 0,
            ..SimConfig::default()
        };
        assert_eq!(
            zero_substeps.validate(),
            Err(ConfigError::NotPositive {
                name: "substeps",
                value: 0.0
            })
        );

        let bouncy = SimConfig {
            restitution: 1.5,
            ..SimConfig::default()
        };
        assert!(bouncy.validate().is_err());

        let wild_jitter = SimConfig {
            slow_policy: SlowParticlePolicy::Jitter { amplitude: 10.0 },
            ..SimConfig::default()
        };
        assert!(wild_jitter.validate().is_err());

        let nan_dt = SimConfig {
            max_dt: f32::NAN,
            ..SimConfig::default()
        };
        assert!(matches!(nan_dt.validate(), Err(ConfigError::NotFinite { name: "max_dt" })));
    }
}
