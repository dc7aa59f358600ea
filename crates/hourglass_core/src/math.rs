//! Math utilities
//!
//! Re-exports glam with stateless hashing helpers for per-element kernels

pub use glam::*;

/// Stateless 32-bit hash (lowbias32). Kernels running in parallel use this
/// instead of a shared RNG so results don't depend on scheduling order.
#[inline]
pub fn hash_u32(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

/// Hash two values into one.
#[inline]
pub fn hash_pair(a: u32, b: u32) -> u32 {
    hash_u32(a ^ hash_u32(b).wrapping_add(0x9e37_79b9))
}

/// Map a hash to `[0, 1)`.
#[inline]
pub fn unit_from_hash(h: u32) -> f32 {
    (h >> 8) as f32 / (1u32 << 24) as f32
}

/// Pseudo-random direction derived from `(a, b)`, uniform on the sphere.
pub fn hashed_direction(a: u32, b: u32) -> Vec3 {
    let h0 = hash_pair(a, b);
    let h1 = hash_u32(h0);
    let z = unit_from_hash(h0) * 2.0 - 1.0;
    let phi = unit_from_hash(h1) * std::f32::consts::TAU;
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

/// Near-uniform directions on the unit sphere from a golden-ratio spiral.
///
/// The spiral is rotated off the coordinate axes so no direction lines up
/// with axis-aligned mesh edges.
pub fn fibonacci_sphere(count: usize) -> Vec<Vec3> {
    let golden_angle = std::f32::consts::PI * (3.0 - 5.0f32.sqrt());
    let tilt = Quat::from_euler(EulerRot::XYZ, 0.137, 0.311, 0.071);
    (0..count)
        .map(|i| {
            let z = 1.0 - 2.0 * (i as f32 + 0.5) / count as f32;
            let r = (1.0 - z * z).max(0.0).sqrt();
            let theta = golden_angle * i as f32;
            tilt * Vec3::new(r * theta.cos(), r * theta.sin(), z)
        })
        .collect()
}
