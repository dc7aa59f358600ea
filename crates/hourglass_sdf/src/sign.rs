//! Inside/outside classification.
//!
//! Away from the surface a point is classified by casting rays along a
//! golden-spiral set of directions and letting each ray vote with its
//! crossing parity. Close to the surface parity is unreliable (rays start
//! almost on a triangle), so the side is read from the gradient of the
//! unsigned distance instead.
//!
//! Neither test is a proof of correctness on meshes with holes; the vote
//! only makes single bad rays through a seam harmless.

use crate::bvh::{ClosestHit, TriangleBvh};
use glam::Vec3;
use hourglass_core::math::fibonacci_sphere;

/// How a voxel's sign was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignMethod {
    RayVote,
    SurfaceGradient,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignDecision {
    pub inside: bool,
    pub method: SignMethod,
    /// Fraction of rays that voted inside (1.0/0.0 for gradient decisions).
    pub inside_votes: f32,
}

pub struct SignClassifier<'a> {
    bvh: &'a TriangleBvh,
    directions: Vec<Vec3>,
    /// Below this unsigned distance the gradient test is used.
    surface_band: f32,
    /// Step of the unsigned-distance central differences.
    gradient_step: f32,
    /// Maximum ratio of unsigned distance to mean first-hit distance.
    first_hit_ratio: f32,
    /// +1 when triangles wind outward, -1 when the mesh is inside out.
    orientation: f32,
}

impl<'a> SignClassifier<'a> {
    pub fn new(
        bvh: &'a TriangleBvh,
        ray_count: usize,
        surface_band: f32,
        gradient_step: f32,
        first_hit_ratio: f32,
        outward_winding: bool,
    ) -> Self {
        Self {
            bvh,
            directions: fibonacci_sphere(ray_count),
            surface_band,
            gradient_step,
            first_hit_ratio,
            orientation: if outward_winding { 1.0 } else { -1.0 },
        }
    }

    pub fn ray_count(&self) -> usize {
        self.directions.len()
    }

    /// Decide which side of the surface `p` lies on. `nearest` is the
    /// closest-point result already computed for `p`; `hits` is scratch.
    pub fn classify(&self, p: Vec3, nearest: &ClosestHit, hits: &mut Vec<f32>) -> SignDecision {
        if nearest.distance < self.surface_band {
            if let Some(inside) = self.gradient_side(p, nearest) {
                return SignDecision {
                    inside,
                    method: SignMethod::SurfaceGradient,
                    inside_votes: if inside { 1.0 } else { 0.0 },
                };
            }
        }
        self.ray_vote(p, nearest.distance, hits)
    }

    /// Multi-ray parity vote with the first-hit distance cross-check.
    pub fn ray_vote(&self, p: Vec3, unsigned: f32, hits: &mut Vec<f32>) -> SignDecision {
        let mut inside_votes = 0usize;
        let mut first_hit_sum = 0.0f32;
        let mut valid_rays = 0usize;

        for dir in &self.directions {
            self.bvh.ray_hits(p, *dir, hits);
            if let Some(first) = hits.first() {
                first_hit_sum += *first;
                valid_rays += 1;
            }
            if hits.len() % 2 == 1 {
                inside_votes += 1;
            }
        }

        let total = self.directions.len().max(1);
        let majority = inside_votes * 2 > total;
        let close_enough = valid_rays > 0
            && unsigned < self.first_hit_ratio * (first_hit_sum / valid_rays as f32);

        SignDecision {
            inside: majority && close_enough,
            method: SignMethod::RayVote,
            inside_votes: inside_votes as f32 / total as f32,
        }
    }

    /// Side of the surface from the unsigned-distance gradient compared with
    /// the nearest face's outward normal. `None` when the two are orthogonal
    /// or the gradient vanishes.
    fn gradient_side(&self, p: Vec3, nearest: &ClosestHit) -> Option<bool> {
        let h = self.gradient_step;
        let d = |q: Vec3| self.bvh.closest_point(q).map_or(0.0, |hit| hit.distance);
        let grad = Vec3::new(
            d(p + Vec3::X * h) - d(p - Vec3::X * h),
            d(p + Vec3::Y * h) - d(p - Vec3::Y * h),
            d(p + Vec3::Z * h) - d(p - Vec3::Z * h),
        );
        let facing = grad.dot(nearest.normal) * self.orientation;
        if !facing.is_finite() || facing.abs() <= f32::EPSILON * h {
            return None;
        }
        Some(facing < 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hourglass_asset::shapes::cuboid;

    fn classifier(bvh: &TriangleBvh) -> SignClassifier<'_> {
        SignClassifier::new(bvh, 14, 0.05, 0.01, 1.1, true)
    }

    #[test]
    fn votes_inside_and_outside_a_box() {
        let mesh = cuboid(Vec3::splat(-1.0), Vec3::splat(1.0));
        let bvh = TriangleBvh::build(&mesh);
        let sign = classifier(&bvh);
        let mut hits = Vec::new();

        let inside = Vec3::new(0.2, -0.3, 0.1);
        let nearest = bvh.closest_point(inside).unwrap();
        let decision = sign.classify(inside, &nearest, &mut hits);
        assert!(decision.inside);
        assert_eq!(decision.method, SignMethod::RayVote);
        assert_eq!(decision.inside_votes, 1.0);

        let outside = Vec3::new(1.7, 0.4, -0.2);
        let nearest = bvh.closest_point(outside).unwrap();
        assert!(!sign.classify(outside, &nearest, &mut hits).inside);
    }

    #[test]
    fn near_surface_uses_gradient() {
        let mesh = cuboid(Vec3::splat(-1.0), Vec3::splat(1.0));
        let bvh = TriangleBvh::build(&mesh);
        let sign = classifier(&bvh);
        let mut hits = Vec::new();

        let just_inside = Vec3::new(0.99, 0.1, 0.2);
        let nearest = bvh.closest_point(just_inside).unwrap();
        let decision = sign.classify(just_inside, &nearest, &mut hits);
        assert_eq!(decision.method, SignMethod::SurfaceGradient);
        assert!(decision.inside);

        let just_outside = Vec3::new(1.01, 0.1, 0.2);
        let nearest = bvh.closest_point(just_outside).unwrap();
        assert!(!sign.classify(just_outside, &nearest, &mut hits).inside);
    }

    #[test]
    fn inside_out_mesh_is_corrected() {
        let mesh = cuboid(Vec3::splat(-1.0), Vec3::splat(1.0)).flipped();
        let bvh = TriangleBvh::build(&mesh);
        let sign = SignClassifier::new(&bvh, 14, 0.05, 0.01, 1.1, false);
        let mut hits = Vec::new();
        let p = Vec3::new(-0.98, 0.0, 0.3);
        let nearest = bvh.closest_point(p).unwrap();
        assert!(sign.classify(p, &nearest, &mut hits).inside);
    }
}
