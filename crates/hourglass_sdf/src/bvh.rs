//! Bounding volume hierarchy over mesh triangles.
//!
//! Built once with median splits along the longest centroid axis, then
//! queried read-only (and concurrently) by the voxel loop.

use crate::geometry::{closest_point_on_triangle, ray_triangle};
use glam::Vec3;
use hourglass_asset::{Aabb, Mesh, Triangle};

const LEAF_SIZE: usize = 4;

#[derive(Debug, Clone, Copy)]
struct BvhNode {
    bounds: Aabb,
    /// Leaf: first triangle. Interior: index of the left child (right = left + 1).
    first: u32,
    /// Triangle count for leaves, zero for interior nodes.
    count: u32,
}

impl BvhNode {
    #[inline]
    fn is_leaf(&self) -> bool {
        self.count > 0
    }
}

/// Result of a closest-point query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestHit {
    pub point: Vec3,
    pub distance: f32,
    /// Index of the triangle in the input mesh.
    pub triangle: usize,
    /// Unit face normal of the source triangle (zero for slivers).
    pub normal: Vec3,
}

pub struct TriangleBvh {
    nodes: Vec<BvhNode>,
    triangles: Vec<Triangle>,
    /// Maps reordered triangle slots back to mesh indices.
    source: Vec<u32>,
    /// Distance below which two ray hits are treated as one crossing.
    merge_tolerance: f32,
}

impl TriangleBvh {
    pub fn build(mesh: &Mesh) -> Self {
        let mut order: Vec<u32> = (0..mesh.triangle_count() as u32).collect();
        let centroids: Vec<Vec3> = mesh.triangles().iter().map(Triangle::centroid).collect();
        let mut nodes = Vec::with_capacity(2 * mesh.triangle_count() / LEAF_SIZE + 1);

        if !order.is_empty() {
            nodes.push(BvhNode {
                bounds: Aabb::EMPTY,
                first: 0,
                count: 0,
            });
            subdivide(&mut nodes, 0, &mut order, 0, mesh.triangles(), &centroids);
        }

        let triangles = order.iter().map(|&i| mesh.triangles()[i as usize]).collect();
        let scale = mesh.bounds().extent().max_element();
        Self {
            nodes,
            triangles,
            source: order,
            merge_tolerance: if scale.is_finite() { scale * 1e-6 } else { 0.0 },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nearest point on the surface to `p`.
    pub fn closest_point(&self, p: Vec3) -> Option<ClosestHit> {
        let mut best_d2 = f32::INFINITY;
        let mut best: Option<(Vec3, usize)> = None;
        let mut stack: Vec<u32> = Vec::with_capacity(64);
        if !self.nodes.is_empty() {
            stack.push(0);
        }

        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx as usize];
            if node.bounds.distance_squared(p) >= best_d2 {
                continue;
            }
            if node.is_leaf() {
                let start = node.first as usize;
                for slot in start..start + node.count as usize {
                    let q = closest_point_on_triangle(p, &self.triangles[slot]);
                    let d2 = q.distance_squared(p);
                    if d2 < best_d2 {
                        best_d2 = d2;
                        best = Some((q, slot));
                    }
                }
            } else {
                let left = node.first;
                let right = left + 1;
                let dl = self.nodes[left as usize].bounds.distance_squared(p);
                let dr = self.nodes[right as usize].bounds.distance_squared(p);
                // Nearer child goes on top of the stack.
                if dl <= dr {
                    stack.push(right);
                    stack.push(left);
                } else {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }

        best.map(|(point, slot)| ClosestHit {
            point,
            distance: best_d2.sqrt(),
            triangle: self.source[slot] as usize,
            normal: self.triangles[slot].normal(),
        })
    }

    /// Collect every surface crossing along the ray into `hits` (sorted,
    /// ascending). Hits closer together than the merge tolerance, e.g. a ray
    /// through a shared edge, count once.
    pub fn ray_hits(&self, origin: Vec3, dir: Vec3, hits: &mut Vec<f32>) {
        hits.clear();
        if self.nodes.is_empty() {
            return;
        }
        let inv_dir = dir.recip();
        let mut stack: Vec<u32> = Vec::with_capacity(64);
        stack.push(0);

        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx as usize];
            if node.bounds.ray_interval(origin, inv_dir).is_none() {
                continue;
            }
            if node.is_leaf() {
                let start = node.first as usize;
                for tri in &self.triangles[start..start + node.count as usize] {
                    if let Some(t) = ray_triangle(origin, dir, tri, 0.0) {
                        hits.push(t);
                    }
                }
            } else {
                stack.push(node.first);
                stack.push(node.first + 1);
            }
        }

        hits.sort_unstable_by(f32::total_cmp);
        let tol = self.merge_tolerance;
        hits.dedup_by(|later, earlier| (*later - *earlier).abs() <= tol);
    }
}

fn subdivide(
    nodes: &mut Vec<BvhNode>,
    node_idx: usize,
    order: &mut [u32],
    offset: usize,
    triangles: &[Triangle],
    centroids: &[Vec3],
) {
    let bounds = order
        .iter()
        .fold(Aabb::EMPTY, |acc, &i| acc.union(&triangles[i as usize].bounds()));
    nodes[node_idx].bounds = bounds;

    if order.len() <= LEAF_SIZE {
        nodes[node_idx].first = offset as u32;
        nodes[node_idx].count = order.len() as u32;
        return;
    }

    let centroid_bounds = Aabb::from_points(order.iter().map(|&i| centroids[i as usize]));
    let axis = longest_axis(centroid_bounds.extent());
    let mid = order.len() / 2;
    order.select_nth_unstable_by(mid, |&a, &b| {
        centroids[a as usize][axis].total_cmp(&centroids[b as usize][axis])
    });

    let left = nodes.len();
    let placeholder = BvhNode {
        bounds: Aabb::EMPTY,
        first: 0,
        count: 0,
    };
    nodes.push(placeholder);
    nodes.push(placeholder);
    nodes[node_idx].first = left as u32;

    let (lo, hi) = order.split_at_mut(mid);
    subdivide(nodes, left, lo, offset, triangles, centroids);
    subdivide(nodes, left + 1, hi, offset + mid, triangles, centroids);
}

fn longest_axis(extent: Vec3) -> usize {
    if extent.x >= extent.y && extent.x >= extent.z {
        0
    } else if extent.y >= extent.z {
        1
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hourglass_asset::shapes::{cuboid, uv_sphere};

    #[test]
    fn closest_point_matches_brute_force() {
        let mesh = uv_sphere(Vec3::ZERO, 1.0, 24, 12);
        let bvh = TriangleBvh::build(&mesh);
        assert_eq!(bvh.triangle_count(), mesh.triangle_count());

        for i in 0..50 {
            let f = i as f32;
            let p = Vec3::new(
                (f * 0.37).sin() * 1.6,
                (f * 0.91).cos() * 1.3,
                (f * 0.13).sin() * 0.9,
            );
            let brute = mesh
                .triangles()
                .iter()
                .map(|t| closest_point_on_triangle(p, t).distance(p))
                .fold(f32::INFINITY, f32::min);
            let hit = bvh.closest_point(p).unwrap();
            assert!((hit.distance - brute).abs() < 1e-5, "p={p:?}");
            let source = &mesh.triangles()[hit.triangle];
            assert!((closest_point_on_triangle(p, source).distance(p) - hit.distance).abs() < 1e-5);
            assert!((hit.normal - source.normal()).length() < 1e-6);
        }
    }

    #[test]
    fn ray_through_box_crosses_twice() {
        let mesh = cuboid(Vec3::splat(-1.0), Vec3::splat(1.0));
        let bvh = TriangleBvh::build(&mesh);
        let mut hits = Vec::new();

        // Straight through the diagonal shared by the two triangles of a face.
        bvh.ray_hits(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, &mut hits);
        assert_eq!(hits.len(), 2, "{hits:?}");
        assert!((hits[0] - 4.0).abs() < 1e-5 && (hits[1] - 6.0).abs() < 1e-5);

        // From the inside a ray crosses once.
        bvh.ray_hits(Vec3::ZERO, Vec3::new(0.3, 0.5, 0.81).normalize(), &mut hits);
        assert_eq!(hits.len(), 1);

        bvh.ray_hits(Vec3::new(0.0, 5.0, 0.0), Vec3::Y, &mut hits);
        assert!(hits.is_empty());
    }

    #[test]
    fn empty_mesh_answers_nothing() {
        let bvh = TriangleBvh::build(&Mesh::new());
        assert!(bvh.is_empty());
        assert!(bvh.closest_point(Vec3::ZERO).is_none());
        let mut hits = vec![1.0];
        bvh.ray_hits(Vec3::ZERO, Vec3::X, &mut hits);
        assert!(hits.is_empty());
    }
}
