//! Settings management
//!
//! Every field has a default, so a settings file only needs the keys it
//! changes. Values are checked later, when the builder or simulation
//! validates the config they are converted into.

use glam::Vec3;
use hourglass_sdf::BuildConfig;
use hourglass_sim::{NeighborStrategy, SeedConfig, SeedRegion, SimConfig, SlowParticlePolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub build: BuildSettings,
    pub simulation: SimSettings,
}

/// Baker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    pub resolution: usize,
    pub ray_count: usize,
    pub padding: f32,
    pub surface_band: f32,
    pub first_hit_ratio: f32,
    pub smooth: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self::from(&BuildConfig::default())
    }
}

impl From<&BuildConfig> for BuildSettings {
    fn from(config: &BuildConfig) -> Self {
        Self {
            resolution: config.resolution,
            ray_count: config.ray_count,
            padding: config.padding,
            surface_band: config.surface_band,
            first_hit_ratio: config.first_hit_ratio,
            smooth: config.smooth,
        }
    }
}

impl BuildSettings {
    pub fn to_config(&self) -> BuildConfig {
        BuildConfig {
            resolution: self.resolution,
            ray_count: self.ray_count,
            padding: self.padding,
            surface_band: self.surface_band,
            first_hit_ratio: self.first_hit_ratio,
            smooth: self.smooth,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NeighborSettings {
    IndexWindow { radius: usize },
    SpatialHash,
}

impl From<NeighborStrategy> for NeighborSettings {
    fn from(strategy: NeighborStrategy) -> Self {
        match strategy {
            NeighborStrategy::IndexWindow { radius } => NeighborSettings::IndexWindow { radius },
            NeighborStrategy::SpatialHash => NeighborSettings::SpatialHash,
        }
    }
}

impl From<NeighborSettings> for NeighborStrategy {
    fn from(settings: NeighborSettings) -> Self {
        match settings {
            NeighborSettings::IndexWindow { radius } => NeighborStrategy::IndexWindow { radius },
            NeighborSettings::SpatialHash => NeighborStrategy::SpatialHash,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlowParticleSettings {
    Jitter { amplitude: f32 },
    Zero,
}

impl From<SlowParticlePolicy> for SlowParticleSettings {
    fn from(policy: SlowParticlePolicy) -> Self {
        match policy {
            SlowParticlePolicy::Jitter { amplitude } => SlowParticleSettings::Jitter { amplitude },
            SlowParticlePolicy::Zero => SlowParticleSettings::Zero,
        }
    }
}

impl From<SlowParticleSettings> for SlowParticlePolicy {
    fn from(settings: SlowParticleSettings) -> Self {
        match settings {
            SlowParticleSettings::Jitter { amplitude } => SlowParticlePolicy::Jitter { amplitude },
            SlowParticleSettings::Zero => SlowParticlePolicy::Zero,
        }
    }
}

/// Simulation and seeding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    pub particle_count: usize,
    pub seed: u64,
    /// Share of the upper half of the volume that starts filled.
    pub fill_fraction: f32,
    pub seed_margin: f32,
    pub particle_radius: f32,
    pub repulsion_factor: f32,
    pub stiffness: f32,
    pub viscosity: f32,
    pub mass: f32,
    pub gravity: Vec3,
    pub gravity_scale: f32,
    pub damping: f32,
    pub max_speed: f32,
    pub min_speed: f32,
    pub slow_particles: SlowParticleSettings,
    pub max_dt: f32,
    pub substeps: usize,
    pub boundary_threshold: f32,
    pub restitution: f32,
    pub friction_damping: f32,
    pub neighbors: NeighborSettings,
}

impl Default for SimSettings {
    fn default() -> Self {
        let sim = SimConfig::default();
        let seed = SeedConfig::default();
        let fill_fraction = match seed.region {
            SeedRegion::UpperCavity { fill_fraction } => fill_fraction,
            SeedRegion::Box { .. } => 0.6,
        };
        Self {
            particle_count: seed.count,
            seed: seed.seed,
            fill_fraction,
            seed_margin: seed.margin,
            particle_radius: sim.particle_radius,
            repulsion_factor: sim.repulsion_factor,
            stiffness: sim.stiffness,
            viscosity: sim.viscosity,
            mass: sim.mass,
            gravity: sim.gravity,
            gravity_scale: sim.gravity_scale,
            damping: sim.damping,
            max_speed: sim.max_speed,
            min_speed: sim.min_speed,
            slow_particles: sim.slow_policy.into(),
            max_dt: sim.max_dt,
            substeps: sim.substeps,
            boundary_threshold: sim.boundary_threshold,
            restitution: sim.restitution,
            friction_damping: sim.friction_damping,
            neighbors: sim.neighbors.into(),
        }
    }
}

impl SimSettings {
    pub fn to_config(&self) -> SimConfig {
        SimConfig {
            particle_radius: self.particle_radius,
            repulsion_factor: self.repulsion_factor,
            stiffness: self.stiffness,
            viscosity: self.viscosity,
            mass: self.mass,
            gravity: self.gravity,
            gravity_scale: self.gravity_scale,
            damping: self.damping,
            max_speed: self.max_speed,
            min_speed: self.min_speed,
            slow_policy: self.slow_particles.into(),
            max_dt: self.max_dt,
            substeps: self.substeps,
            boundary_threshold: self.boundary_threshold,
            restitution: self.restitution,
            friction_damping: self.friction_damping,
            neighbors: self.neighbors.into(),
        }
    }

    pub fn to_seed_config(&self) -> SeedConfig {
        SeedConfig {
            count: self.particle_count,
            region: SeedRegion::UpperCavity {
                fill_fraction: self.fill_fraction,
            },
            margin: self.seed_margin,
            seed: self.seed,
            ..SeedConfig::default()
        }
    }
}

impl Settings {
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json_str(&text)?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        fs::write(path, self.to_json_string()?).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
