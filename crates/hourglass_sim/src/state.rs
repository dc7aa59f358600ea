//! Double-buffered particle state and the read-only view handed to renderers.

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use hourglass_core::Column;

/// Per-particle columns. `position.w` caches the SDF value sampled at the
/// committed position; negative means inside the cavity.
pub struct ParticleBuffers {
    pub(crate) positions: Column<Vec4>,
    pub(crate) velocities: Column<Vec3>,
}

impl ParticleBuffers {
    pub fn new(positions: Vec<Vec4>, velocities: Vec<Vec3>) -> Self {
        debug_assert_eq!(positions.len(), velocities.len());
        Self {
            positions: Column::from_vec(positions),
            velocities: Column::from_vec(velocities),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Flip read/write roles of every column. Called once per tick after all
    /// particles have been written.
    pub fn swap_buffers(&mut self) {
        self.positions.swap_buffers();
        self.velocities.swap_buffers();
    }

    pub fn view(&self) -> ParticleView<'_> {
        ParticleView {
            positions: self.positions.read(),
            velocities: self.velocities.read(),
        }
    }
}

/// Instance record uploaded to the GPU: `[x, y, z, sdf]`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct RenderParticle {
    pub position: [f32; 4],
}

impl RenderParticle {
    /// The renderer discards particles whose tag is not negative.
    #[inline]
    pub fn is_inside(&self) -> bool {
        self.position[3] < 0.0
    }
}

/// Borrow of the last committed tick.
#[derive(Clone, Copy)]
pub struct ParticleView<'a> {
    positions: &'a [Vec4],
    velocities: &'a [Vec3],
}

impl<'a> ParticleView<'a> {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &'a [Vec4] {
        self.positions
    }

    pub fn velocities(&self) -> &'a [Vec3] {
        self.velocities
    }

    pub fn inside_count(&self) -> usize {
        self.positions.iter().filter(|p| p.w < 0.0).count()
    }

    /// Largest cached SDF value (how close the worst particle is to the wall).
    pub fn max_sdf(&self) -> f32 {
        self.positions
            .iter()
            .map(|p| p.w)
            .fold(f32::NEG_INFINITY, f32::max)
    }

    pub fn mean_speed(&self) -> f32 {
        if self.velocities.is_empty() {
            return 0.0;
        }
        let total: f64 = self.velocities.iter().map(|v| v.length() as f64).sum();
        (total / self.velocities.len() as f64) as f32
    }

    pub fn max_speed(&self) -> f32 {
        self.velocities
            .iter()
            .map(|v| v.length())
            .fold(0.0, f32::max)
    }

    /// Copy positions into GPU instance records.
    pub fn write_packed(&self, out: &mut Vec<RenderParticle>) {
        out.clear();
        out.extend(self.positions.iter().map(|p| RenderParticle {
            position: p.to_array(),
        }));
    }

    pub fn packed(&self) -> Vec<RenderParticle> {
        let mut out = Vec::with_capacity(self.len());
        self.write_packed(&mut out);
        out
    }
}

/// Raw bytes of packed instance records, ready for a buffer upload.
pub fn as_bytes(records: &[RenderParticle]) -> &[u8] {
    bytemuck::cast_slice(records)
}
