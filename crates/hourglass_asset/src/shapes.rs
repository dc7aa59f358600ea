//! Procedural closed meshes: surfaces of revolution, spheres, boxes and
//! the default hourglass cavity.

use crate::mesh::{Mesh, Triangle};
use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

const POLE_EPSILON: f32 = 1e-6;

/// Revolve a profile around the Y axis.
///
/// `profile` holds `(radius, y)` pairs ordered bottom to top. Open ends are
/// closed with flat caps so the result is always watertight. Triangles wind
/// counter-clockwise seen from outside.
pub fn lathe(profile: &[Vec2], segments: usize) -> Mesh {
    let segments = segments.max(3);
    let mut points: Vec<Vec2> = profile.to_vec();
    if let Some(first) = points.first().copied() {
        if first.x > POLE_EPSILON {
            points.insert(0, Vec2::new(0.0, first.y));
        }
    }
    if let Some(last) = points.last().copied() {
        if last.x > POLE_EPSILON {
            points.push(Vec2::new(0.0, last.y));
        }
    }

    let ring = |p: Vec2, j: usize| -> Vec3 {
        let theta = TAU * (j % segments) as f32 / segments as f32;
        Vec3::new(p.x * theta.cos(), p.y, p.x * theta.sin())
    };

    let mut mesh = Mesh::new();
    for pair in points.windows(2) {
        let (lower, upper) = (pair[0], pair[1]);
        for j in 0..segments {
            let a = ring(lower, j);
            let b = ring(lower, j + 1);
            let c = ring(upper, j + 1);
            let d = ring(upper, j);
            if lower.x > POLE_EPSILON {
                mesh.push(Triangle::new(a, d, b));
            }
            if upper.x > POLE_EPSILON {
                mesh.push(Triangle::new(b, d, c));
            }
        }
    }
    mesh
}

/// Closed UV sphere.
pub fn uv_sphere(center: Vec3, radius: f32, segments: usize, rings: usize) -> Mesh {
    let rings = rings.max(2);
    let profile: Vec<Vec2> = (0..=rings)
        .map(|i| {
            let phi = PI * i as f32 / rings as f32;
            Vec2::new(radius * phi.sin(), -radius * phi.cos())
        })
        .collect();
    let mut mesh = lathe(&profile, segments);
    if center != Vec3::ZERO {
        mesh = mesh.transformed(glam::Mat4::from_translation(center));
    }
    mesh
}

/// Closed axis-aligned box.
pub fn cuboid(min: Vec3, max: Vec3) -> Mesh {
    let corner = |i: usize| {
        Vec3::new(
            if i & 1 == 0 { min.x } else { max.x },
            if i & 2 == 0 { min.y } else { max.y },
            if i & 4 == 0 { min.z } else { max.z },
        )
    };
    let positions: Vec<Vec3> = (0..8).map(corner).collect();
    let faces: [[u32; 3]; 12] = [
        [0, 2, 1], [1, 2, 3], // -z
        [4, 5, 6], [5, 7, 6], // +z
        [0, 1, 4], [1, 5, 4], // -y
        [2, 6, 3], [3, 6, 7], // +y
        [0, 4, 2], [2, 4, 6], // -x
        [1, 3, 5], [3, 7, 5], // +x
    ];
    Mesh::from_indexed(&positions, &faces)
}

/// Shape parameters for the procedural hourglass cavity.
#[derive(Debug, Clone, Copy)]
pub struct HourglassShape {
    pub height: f32,
    pub bulb_radius: f32,
    pub neck_radius: f32,
    pub profile_samples: usize,
    pub segments: usize,
}

impl Default for HourglassShape {
    fn default() -> Self {
        Self {
            height: 2.0,
            bulb_radius: 0.6,
            neck_radius: 0.06,
            profile_samples: 48,
            segments: 48,
        }
    }
}

impl HourglassShape {
    /// Radius of the cavity at height `y`.
    pub fn radius_at(&self, y: f32) -> f32 {
        let half = self.height * 0.5;
        let t = (y.abs() / half).clamp(0.0, 1.0);
        // Narrow neck at t = 0 widening into a rounded bulb that flattens
        // towards the ends.
        let s = (t * 1.6).min(1.0);
        self.neck_radius + (self.bulb_radius - self.neck_radius) * (s * PI * 0.5).sin()
    }

    pub fn profile(&self) -> Vec<Vec2> {
        let n = self.profile_samples.max(4);
        let half = self.height * 0.5;
        (0..=n)
            .map(|i| {
                let y = -half + self.height * i as f32 / n as f32;
                Vec2::new(self.radius_at(y), y)
            })
            .collect()
    }

    pub fn mesh(&self) -> Mesh {
        lathe(&self.profile(), self.segments)
    }
}

/// Default hourglass cavity centred at the origin, neck at `y = 0`.
pub fn hourglass(shape: &HourglassShape) -> Mesh {
    shape.mesh()
}
