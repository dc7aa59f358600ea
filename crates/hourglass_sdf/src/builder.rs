//! Mesh → signed-distance volume.

use crate::bvh::TriangleBvh;
use crate::error::BuildError;
use crate::sign::{SignClassifier, SignMethod};
use crate::smooth::gaussian_3x3x3;
use glam::Vec3;
use hourglass_asset::{AssetError, Mesh, SdfVolume};
use hourglass_core::ConfigError;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Largest accepted grid resolution per axis.
pub const MAX_RESOLUTION: usize = 512;

/// Smallest number of sign rays per voxel.
pub const MIN_RAYS: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    /// Voxels per axis (grid is N×N×N).
    pub resolution: usize,
    /// Parity rays per voxel.
    pub ray_count: usize,
    /// World units added around the mesh bounds on every side.
    pub padding: f32,
    /// Width, in voxels, of the band around the surface where the sign comes
    /// from the distance gradient instead of ray parity.
    pub surface_band: f32,
    /// A voxel only counts as inside when its unsigned distance is below this
    /// multiple of the mean first-hit distance of its rays.
    pub first_hit_ratio: f32,
    /// Run the 3×3×3 Gaussian pass after signing.
    pub smooth: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            resolution: 64,
            ray_count: 14,
            padding: 0.05,
            surface_band: 0.5,
            first_hit_ratio: 1.1,
            smooth: true,
        }
    }
}

impl BuildConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_count("resolution", self.resolution)?;
        if self.resolution > MAX_RESOLUTION {
            return Err(ConfigError::OutOfRange {
                name: "resolution",
                value: self.resolution as f64,
                min: 1.0,
                max: MAX_RESOLUTION as f64,
            });
        }
        if self.ray_count < MIN_RAYS {
            return Err(ConfigError::OutOfRange {
                name: "ray_count",
                value: self.ray_count as f64,
                min: MIN_RAYS as f64,
                max: f64::INFINITY,
            });
        }
        ConfigError::require_range("padding", self.padding, 0.0, f32::MAX)?;
        ConfigError::require_range("surface_band", self.surface_band, 0.0, 8.0)?;
        ConfigError::require_range("first_hit_ratio", self.first_hit_ratio, 1.0, f32::MAX)?;
        Ok(())
    }
}

/// Summary of one bake.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    pub resolution: usize,
    pub triangles: usize,
    pub voxels: usize,
    pub inside_voxels: usize,
    /// Voxels signed by the near-surface gradient test.
    pub gradient_decisions: usize,
    /// Voxels whose rays disagreed (typically near seams of open meshes).
    pub contested_votes: usize,
    pub elapsed: Duration,
}

impl BuildStats {
    fn merge(mut self, other: BuildStats) -> BuildStats {
        self.inside_voxels += other.inside_voxels;
        self.gradient_decisions += other.gradient_decisions;
        self.contested_votes += other.contested_votes;
        self
    }
}

pub struct SdfBuilder {
    config: BuildConfig,
}

impl SdfBuilder {
    pub fn new(config: BuildConfig) -> Result<Self, BuildError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn build(&self, mesh: &Mesh) -> Result<SdfVolume, BuildError> {
        self.build_with_stats(mesh).map(|(volume, _)| volume)
    }

    pub fn build_with_stats(&self, mesh: &Mesh) -> Result<(SdfVolume, BuildStats), BuildError> {
        if mesh.is_empty() {
            return Err(AssetError::MissingCavity { name: None }.into());
        }

        let start = Instant::now();
        let n = self.config.resolution;
        let bounds = mesh.bounds().padded(self.config.padding);
        let min = bounds.min;
        let voxel = bounds.extent() / n as f32;
        let voxel_edge = voxel.min_element();

        let outward = mesh.signed_volume() >= 0.0;
        if !outward {
            warn!("cavity mesh winds inward; flipping normal orientation for sign tests");
        }

        info!(
            triangles = mesh.triangle_count(),
            resolution = n,
            rays = self.config.ray_count,
            smooth = self.config.smooth,
            "baking SDF"
        );

        let bvh = TriangleBvh::build(mesh);
        debug!(nodes = bvh.node_count(), "built triangle BVH");

        let classifier = SignClassifier::new(
            &bvh,
            self.config.ray_count,
            self.config.surface_band * voxel_edge,
            0.25 * voxel_edge,
            self.config.first_hit_ratio,
            outward,
        );

        let mut data = vec![0.0f32; n * n * n];
        let completed = AtomicUsize::new(0);

        let stats = data
            .par_chunks_mut(n * n)
            .enumerate()
            .map(|(z, slab)| {
                let mut stats = BuildStats::default();
                let mut hits = Vec::with_capacity(16);
                for y in 0..n {
                    for x in 0..n {
                        let p = min + (Vec3::new(x as f32, y as f32, z as f32) + 0.5) * voxel;
                        let Some(nearest) = bvh.closest_point(p) else {
                            continue;
                        };
                        let decision = classifier.classify(p, &nearest, &mut hits);
                        match decision.method {
                            SignMethod::SurfaceGradient => stats.gradient_decisions += 1,
                            SignMethod::RayVote => {
                                if decision.inside_votes > 0.0 && decision.inside_votes < 1.0 {
                                    stats.contested_votes += 1;
                                }
                            }
                        }
                        if decision.inside {
                            stats.inside_voxels += 1;
                        }
                        let sign = if decision.inside { -1.0 } else { 1.0 };
                        slab[x + y * n] = nearest.distance * sign;
                    }
                }

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if (done * 10 / n) != ((done - 1) * 10 / n) {
                    let percent = done as f32 * 100.0 / n as f32;
                    info!(progress = format!("{percent:.0}%"), "baking SDF");
                }
                stats
            })
            .reduce(BuildStats::default, BuildStats::merge);

        let voxels = n * n * n;
        if stats.inside_voxels == 0 {
            return Err(BuildError::NoInterior { voxels });
        }

        if self.config.smooth {
            gaussian_3x3x3(&mut data, n);
            if !data.iter().any(|v| *v < 0.0) {
                return Err(BuildError::NoInterior { voxels });
            }
        }

        let volume = SdfVolume::new(n, bounds.min, bounds.max, data)?;
        let stats = BuildStats {
            resolution: n,
            triangles: mesh.triangle_count(),
            voxels,
            elapsed: start.elapsed(),
            ..stats
        };

        if stats.contested_votes > 0 {
            debug!(
                contested = stats.contested_votes,
                "some voxels had split ray votes; mesh may not be watertight"
            );
        }
        info!(
            inside = stats.inside_voxels,
            voxels,
            gradient = stats.gradient_decisions,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "SDF bake complete"
        );
        Ok((volume, stats))
    }
}
