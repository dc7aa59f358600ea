//! Sampled signed-distance volume.
//!
//! The volume is an N×N×N grid of voxel-centre distances over an
//! axis-aligned box. Negative values are inside the cavity. Once built it
//! never changes and is shared read-only between every particle.

use crate::error::AssetError;
use crate::mesh::Aabb;
use glam::{UVec3, Vec3};

/// Distance reported for points outside the grid bounds.
pub const OUTSIDE_DISTANCE: f32 = 1.0e3;

#[derive(Debug, Clone, PartialEq)]
pub struct SdfVolume {
    size: usize,
    min: Vec3,
    max: Vec3,
    data: Vec<f32>,
    // derived
    voxel: Vec3,
    inv_voxel: Vec3,
}

impl SdfVolume {
    /// Validate and wrap a grid. `data` is x-fastest, then y, then z.
    pub fn new(size: usize, min: Vec3, max: Vec3, data: Vec<f32>) -> Result<Self, AssetError> {
        if size == 0 {
            return Err(AssetError::EmptyGrid);
        }
        let expected = size
            .checked_pow(3)
            .ok_or(AssetError::SizeMismatch {
                size,
                expected: usize::MAX,
                actual: data.len(),
            })?;
        if data.len() != expected {
            return Err(AssetError::SizeMismatch {
                size,
                expected,
                actual: data.len(),
            });
        }
        if !(min.is_finite() && max.is_finite() && min.cmplt(max).all()) {
            return Err(AssetError::InvalidBounds {
                min: min.to_array(),
                max: max.to_array(),
            });
        }
        if let Some(index) = data.iter().position(|v| !v.is_finite()) {
            return Err(AssetError::NonFiniteValue { index });
        }

        let voxel = (max - min) / size as f32;
        Ok(Self {
            size,
            min,
            max,
            data,
            voxel,
            inv_voxel: voxel.recip(),
        })
    }

    /// Fill a grid by evaluating `f` at every voxel centre.
    pub fn from_fn(
        size: usize,
        min: Vec3,
        max: Vec3,
        f: impl Fn(Vec3) -> f32,
    ) -> Result<Self, AssetError> {
        let voxel = (max - min) / size.max(1) as f32;
        let mut data = Vec::with_capacity(size * size * size);
        for z in 0..size {
            for y in 0..size {
                for x in 0..size {
                    let p = min + (Vec3::new(x as f32, y as f32, z as f32) + 0.5) * voxel;
                    data.push(f(p));
                }
            }
        }
        Self::new(size, min, max, data)
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn min(&self) -> Vec3 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> Vec3 {
        self.max
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.min, self.max)
    }

    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// World-space edge lengths of one voxel.
    #[inline]
    pub fn voxel_size(&self) -> Vec3 {
        self.voxel
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.size + z * self.size * self.size
    }

    #[inline]
    pub fn value(&self, x: usize, y: usize, z: usize) -> f32 {
        self.data[self.index(x, y, z)]
    }

    pub fn voxel_center(&self, x: usize, y: usize, z: usize) -> Vec3 {
        self.min + (UVec3::new(x as u32, y as u32, z as u32).as_vec3() + 0.5) * self.voxel
    }

    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Trilinear sample between voxel centres.
    ///
    /// Points outside the grid report [`OUTSIDE_DISTANCE`]. Within the half
    /// voxel between the outermost centres and the bounds the edge values are
    /// held constant.
    pub fn sample(&self, p: Vec3) -> f32 {
        if !self.contains(p) {
            return OUTSIDE_DISTANCE;
        }
        self.sample_clamped(p)
    }

    /// Trilinear sample with `p` clamped into the grid bounds.
    pub fn sample_clamped(&self, p: Vec3) -> f32 {
        if !p.is_finite() {
            return OUTSIDE_DISTANCE;
        }
        let last = (self.size - 1) as f32;
        let g = ((p - self.min) * self.inv_voxel - 0.5).clamp(Vec3::ZERO, Vec3::splat(last));
        let i0 = g.floor();
        let t = g - i0;
        let (x0, y0, z0) = (i0.x as usize, i0.y as usize, i0.z as usize);
        let n = self.size - 1;
        let (x1, y1, z1) = ((x0 + 1).min(n), (y0 + 1).min(n), (z0 + 1).min(n));

        let c00 = lerp(self.value(x0, y0, z0), self.value(x1, y0, z0), t.x);
        let c10 = lerp(self.value(x0, y1, z0), self.value(x1, y1, z0), t.x);
        let c01 = lerp(self.value(x0, y0, z1), self.value(x1, y0, z1), t.x);
        let c11 = lerp(self.value(x0, y1, z1), self.value(x1, y1, z1), t.x);
        lerp(lerp(c00, c10, t.y), lerp(c01, c11, t.y), t.z)
    }

    /// Default finite-difference step: half the smallest voxel edge.
    #[inline]
    pub fn gradient_step(&self) -> f32 {
        self.voxel.min_element() * 0.5
    }

    /// Central-difference gradient. Samples are clamped into the grid so the
    /// out-of-bounds sentinel never leaks into the derivative.
    pub fn gradient(&self, p: Vec3, eps: f32) -> Vec3 {
        let dx = Vec3::X * eps;
        let dy = Vec3::Y * eps;
        let dz = Vec3::Z * eps;
        Vec3::new(
            self.sample_clamped(p + dx) - self.sample_clamped(p - dx),
            self.sample_clamped(p + dy) - self.sample_clamped(p - dy),
            self.sample_clamped(p + dz) - self.sample_clamped(p - dz),
        ) / (2.0 * eps)
    }

    /// Outward surface normal at `p`, or `None` when `p` is outside the grid
    /// or the field is flat there.
    pub fn normal(&self, p: Vec3) -> Option<Vec3> {
        if !self.contains(p) {
            return None;
        }
        let grad = self.gradient(p, self.gradient_step());
        let len = grad.length();
        (len.is_finite() && len > 1e-6).then(|| grad / len)
    }

    /// Fraction of voxels with negative distance.
    pub fn inside_fraction(&self) -> f32 {
        let inside = self.data.iter().filter(|v| **v < 0.0).count();
        inside as f32 / self.data.len() as f32
    }

    pub fn min_value(&self) -> f32 {
        self.data.iter().copied().fold(f32::INFINITY, f32::min)
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
