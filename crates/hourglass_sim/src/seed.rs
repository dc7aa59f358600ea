//! Initial particle placement.
//!
//! Positions are rejection-sampled inside the cavity and then ordered along
//! a Morton curve, so particles that are close in index start out close in
//! space. The index-window neighbor strategy depends on that ordering.

use crate::error::SimError;
use glam::{Vec3, Vec4};
use hourglass_asset::SdfVolume;
use hourglass_core::ConfigError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};

/// Where particles are spawned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeedRegion {
    /// The part of the volume above its vertical midpoint, filled from the
    /// midpoint up to `fill_fraction` of the remaining height.
    UpperCavity { fill_fraction: f32 },
    /// An explicit world-space box.
    Box { min: Vec3, max: Vec3 },
}

impl Default for SeedRegion {
    fn default() -> Self {
        SeedRegion::UpperCavity { fill_fraction: 0.6 }
    }
}

impl SeedRegion {
    /// World-space sampling box for `volume`, clipped to its bounds.
    pub fn resolve(&self, volume: &SdfVolume) -> (Vec3, Vec3) {
        let (vmin, vmax) = (volume.min(), volume.max());
        match *self {
            SeedRegion::UpperCavity { fill_fraction } => {
                let mid = 0.5 * (vmin.y + vmax.y);
                let top = mid + fill_fraction.clamp(0.0, 1.0) * (vmax.y - mid);
                (
                    Vec3::new(vmin.x, mid, vmin.z),
                    Vec3::new(vmax.x, top, vmax.z),
                )
            }
            SeedRegion::Box { min, max } => (min.max(vmin), max.min(vmax)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeedConfig {
    pub count: usize,
    pub region: SeedRegion,
    /// Accepted samples satisfy `sdf < -margin`.
    pub margin: f32,
    pub seed: u64,
    /// Rejection budget per requested particle.
    pub attempts_per_particle: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            count: 10_000,
            region: SeedRegion::default(),
            margin: 0.02,
            seed: 0x5A4D,
            attempts_per_particle: 64,
        }
    }
}

impl SeedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_count("particle_count", self.count)?;
        ConfigError::require_count("attempts_per_particle", self.attempts_per_particle)?;
        ConfigError::require_range("seed_margin", self.margin, 0.0, f32::MAX)?;
        match self.region {
            SeedRegion::UpperCavity { fill_fraction } => {
                ConfigError::require_range("fill_fraction", fill_fraction, 0.0, 1.0)?;
            }
            SeedRegion::Box { min, max } => {
                if !(min.is_finite() && max.is_finite()) {
                    return Err(ConfigError::NotFinite { name: "seed_box" });
                }
            }
        }
        Ok(())
    }
}

/// Place `config.count` particles strictly inside the cavity. The `w`
/// component of each position holds its sampled SDF value.
pub fn seed_particles(volume: &SdfVolume, config: &SeedConfig) -> Result<Vec<Vec4>, SimError> {
    config.validate()?;
    let (lo, hi) = config.region.resolve(volume);
    let budget = config.count.saturating_mul(config.attempts_per_particle);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut positions = Vec::with_capacity(config.count);
    let mut attempts = 0usize;

    if lo.cmplt(hi).all() {
        let extent = hi - lo;
        while positions.len() < config.count && attempts < budget {
            attempts += 1;
            let p = lo + extent * Vec3::new(rng.random(), rng.random(), rng.random());
            let d = volume.sample(p);
            if d < -config.margin {
                positions.push(p.extend(d));
            }
        }
    }

    if positions.len() < config.count {
        return Err(SimError::SeedingFailed {
            requested: config.count,
            placed: positions.len(),
            attempts,
        });
    }
    debug!(attempts, accepted = positions.len(), "rejection sampling done");

    positions.par_sort_unstable_by_key(|p| morton_key(p.truncate(), lo, hi));
    info!(count = positions.len(), "seeded particles");
    Ok(positions)
}

/// 30-bit Z-order key of `p` quantized to 10 bits per axis inside `[lo, hi]`.
pub fn morton_key(p: Vec3, lo: Vec3, hi: Vec3) -> u32 {
    let t = ((p - lo) / (hi - lo).max(Vec3::splat(f32::EPSILON))).clamp(Vec3::ZERO, Vec3::ONE);
    let q = (t * 1023.0).as_uvec3();
    spread_bits(q.x) | (spread_bits(q.y) << 1) | (spread_bits(q.z) << 2)
}

/// Insert two zero bits between each of the low 10 bits of `v`.
fn spread_bits(v: u32) -> u32 {
    let mut x = v & 0x3ff;
    x = (x | (x << 16)) & 0x0300_00ff;
    x = (x | (x << 8)) & 0x0300_f00f;
    x = (x | (x << 4)) & 0x030c_30c3;
    x = (x | (x << 2)) & 0x0924_9249;
    x
}
