//! World-space triangle meshes.

use glam::{Mat4, Vec3};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An inverted box that any `grow` call will replace.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut bounds = Aabb::EMPTY;
        for p in points {
            bounds.grow(p);
        }
        bounds
    }

    #[inline]
    pub fn grow(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    #[inline]
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn padded(&self, padding: f32) -> Aabb {
        Aabb {
            min: self.min - Vec3::splat(padding),
            max: self.max + Vec3::splat(padding),
        }
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Squared distance from `p` to the box (zero inside).
    #[inline]
    pub fn distance_squared(&self, p: Vec3) -> f32 {
        let d = (self.min - p).max(p - self.max).max(Vec3::ZERO);
        d.length_squared()
    }

    /// Slab test. Returns the entry/exit parameters along the ray if it
    /// touches the box at some `t >= 0`.
    #[inline]
    pub fn ray_interval(&self, origin: Vec3, inv_dir: Vec3) -> Option<(f32, f32)> {
        let t0 = (self.min - origin) * inv_dir;
        let t1 = (self.max - origin) * inv_dir;
        let near = t0.min(t1).max_element().max(0.0);
        let far = t0.max(t1).min_element();
        (near <= far).then_some((near, far))
    }
}

/// A single triangle in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }

    /// Unnormalized face normal (length = twice the area).
    #[inline]
    pub fn scaled_normal(&self) -> Vec3 {
        (self.b - self.a).cross(self.c - self.a)
    }

    /// Unit face normal, following counter-clockwise winding.
    pub fn normal(&self) -> Vec3 {
        self.scaled_normal().normalize_or_zero()
    }

    pub fn area(&self) -> f32 {
        self.scaled_normal().length() * 0.5
    }

    pub fn centroid(&self) -> Vec3 {
        (self.a + self.b + self.c) / 3.0
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points([self.a, self.b, self.c])
    }
}

/// Ordered triangle soup, already in the space the SDF is expressed in.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        Self { triangles }
    }

    /// Build from an indexed vertex list. Out-of-range indices are dropped.
    pub fn from_indexed(positions: &[Vec3], indices: &[[u32; 3]]) -> Self {
        let triangles = indices
            .iter()
            .filter_map(|&[i, j, k]| {
                Some(Triangle::new(
                    *positions.get(i as usize)?,
                    *positions.get(j as usize)?,
                    *positions.get(k as usize)?,
                ))
            })
            .collect();
        Self { triangles }
    }

    pub fn push(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for tri in &self.triangles {
            bounds = bounds.union(&tri.bounds());
        }
        bounds
    }

    /// Signed enclosed volume. Positive when triangles wind counter-clockwise
    /// seen from outside; only meaningful for closed meshes.
    pub fn signed_volume(&self) -> f32 {
        self.triangles
            .iter()
            .map(|t| t.a.dot(t.b.cross(t.c)))
            .sum::<f32>()
            / 6.0
    }

    /// Apply a world transform to every vertex.
    pub fn transformed(&self, transform: Mat4) -> Mesh {
        let flips = transform.determinant() < 0.0;
        let triangles = self
            .triangles
            .iter()
            .map(|t| {
                let a = transform.transform_point3(t.a);
                let b = transform.transform_point3(t.b);
                let c = transform.transform_point3(t.c);
                if flips {
                    Triangle::new(a, c, b)
                } else {
                    Triangle::new(a, b, c)
                }
            })
            .collect();
        Mesh { triangles }
    }

    /// Reverse the winding of every triangle.
    pub fn flipped(&self) -> Mesh {
        Mesh {
            triangles: self
                .triangles
                .iter()
                .map(|t| Triangle::new(t.a, t.c, t.b))
                .collect(),
        }
    }

    /// Copy of the mesh without the triangles at `indices`.
    pub fn without(&self, indices: &[usize]) -> Mesh {
        Mesh {
            triangles: self
                .triangles
                .iter()
                .enumerate()
                .filter(|(i, _)| !indices.contains(i))
                .map(|(_, t)| *t)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_tetrahedron() -> Mesh {
        let p = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z];
        Mesh::from_indexed(&p, &[[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]])
    }

    #[test]
    fn tetrahedron_volume_and_bounds() {
        let mesh = unit_tetrahedron();
        assert_eq!(mesh.triangle_count(), 4);
        assert!((mesh.signed_volume() - 1.0 / 6.0).abs() < 1e-6);
        assert!((mesh.flipped().signed_volume() + 1.0 / 6.0).abs() < 1e-6);
        let bounds = mesh.bounds();
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::ONE);
    }

    #[test]
    fn mirrored_transform_keeps_orientation() {
        let mesh = unit_tetrahedron();
        let mirrored = mesh.transformed(Mat4::from_scale(Vec3::new(-2.0, 1.0, 1.0)));
        assert!((mirrored.signed_volume() - 2.0 / 6.0).abs() < 1e-5);
    }

    #[test]
    fn aabb_ray_interval() {
        let bounds = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let inv_dir = Vec3::new(1.0, f32::INFINITY, f32::INFINITY);
        let hit = bounds.ray_interval(Vec3::new(-5.0, 0.0, 0.0), inv_dir);
        assert_eq!(hit, Some((4.0, 6.0)));
        let miss = bounds.ray_interval(Vec3::new(-5.0, 3.0, 0.0), inv_dir);
        assert!(miss.is_none());
        assert_eq!(bounds.distance_squared(Vec3::new(3.0, 0.0, 0.0)), 4.0);
        assert!(Aabb::EMPTY.is_empty());
    }

    #[test]
    fn from_indexed_skips_bad_indices() {
        let mesh = Mesh::from_indexed(&[Vec3::ZERO, Vec3::X, Vec3::Y], &[[0, 1, 2], [0, 1, 9]]);
        assert_eq!(mesh.triangle_count(), 1);
        assert!((mesh.triangles()[0].area() - 0.5).abs() < 1e-6);
    }
}
