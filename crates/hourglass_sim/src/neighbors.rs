//! Neighbor candidates for particle repulsion.

use glam::{IVec3, Vec3, Vec4};
use std::collections::HashMap;

/// Particles laid out row-major on an implicit `width`-wide square.
///
/// Neighbors of `i` are the other indices inside the `(2r + 1)²` window
/// around it. This is an index heuristic, not a spatial query: it only finds
/// real neighbors as long as index order follows spatial order.
#[derive(Debug, Clone, Copy)]
pub struct IndexWindow {
    count: usize,
    width: usize,
    radius: usize,
}

impl IndexWindow {
    pub fn new(count: usize, radius: usize) -> Self {
        Self {
            count,
            width: layout_width(count),
            radius,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn for_each_neighbor(&self, i: usize, mut f: impl FnMut(usize)) {
        let width = self.width as isize;
        let row = (i / self.width) as isize;
        let col = (i % self.width) as isize;
        let r = self.radius as isize;
        for dr in -r..=r {
            let nr = row + dr;
            if nr < 0 {
                continue;
            }
            for dc in -r..=r {
                let nc = col + dc;
                if (dr == 0 && dc == 0) || nc < 0 || nc >= width {
                    continue;
                }
                let j = (nr * width + nc) as usize;
                if j < self.count {
                    f(j);
                }
            }
        }
    }
}

/// Side of the square index layout for `count` particles.
pub fn layout_width(count: usize) -> usize {
    let mut w = (count as f64).sqrt().ceil() as usize;
    // Guard against float rounding on large counts.
    while w * w < count {
        w += 1;
    }
    w.max(1)
}

/// Grid cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CellCoord(IVec3);

impl CellCoord {
    /// The 26 surrounding cells and self.
    fn neighbors(self) -> impl Iterator<Item = CellCoord> {
        (-1..=1).flat_map(move |dz| {
            (-1..=1).flat_map(move |dy| {
                (-1..=1).map(move |dx| CellCoord(self.0 + IVec3::new(dx, dy, dz)))
            })
        })
    }
}

/// Uniform-grid hash over committed particle positions.
///
/// Cell edge equals the query radius, so every neighbor within the radius
/// lies in the 3×3×3 block around the query cell.
pub struct SpatialHashGrid {
    cell_size: f32,
    inv_cell: f32,
    cells: HashMap<CellCoord, Vec<u32>>,
}

impl SpatialHashGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            inv_cell: cell_size.recip(),
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Reindex all particles. Cell vectors are kept to reuse their capacity.
    pub fn rebuild(&mut self, positions: &[Vec4]) {
        self.clear();
        for (i, p) in positions.iter().enumerate() {
            if p.is_finite() {
                self.insert(i as u32, p.truncate());
            }
        }
        self.cells.retain(|_, entries| !entries.is_empty());
    }

    /// Visit every indexed particle within `radius` of `p` (including one
    /// sitting exactly at `p`). `positions` must be the slice passed to
    /// [`rebuild`](Self::rebuild).
    pub fn query_radius(&self, p: Vec3, radius: f32, positions: &[Vec4], mut f: impl FnMut(usize)) {
        let radius_squared = radius * radius;
        for cell in self.pos_to_cell(p).neighbors() {
            let Some(entries) = self.cells.get(&cell) else {
                continue;
            };
            for &j in entries {
                let q = positions[j as usize].truncate();
                if q.distance_squared(p) <= radius_squared {
                    f(j as usize);
                }
            }
        }
    }

    fn pos_to_cell(&self, p: Vec3) -> CellCoord {
        CellCoord((p * self.inv_cell).floor().as_ivec3())
    }

    fn insert(&mut self, index: u32, p: Vec3) {
        let cell = self.pos_to_cell(p);
        self.cells.entry(cell).or_default().push(index);
    }

    fn clear(&mut self) {
        for entries in self.cells.values_mut() {
            entries.clear();
        }
    }
}

/// Neighbor source for one tick.
#[derive(Clone, Copy)]
pub enum Neighbors<'a> {
    Window(IndexWindow),
    Hash {
        grid: &'a SpatialHashGrid,
        radius: f32,
    },
}

impl Neighbors<'_> {
    /// Call `f` with every candidate neighbor index of particle `i` (never `i`
    /// itself). Candidates may still be out of range; callers check distance.
    #[inline]
    pub fn for_each(&self, i: usize, positions: &[Vec4], mut f: impl FnMut(usize)) {
        match self {
            Neighbors::Window(window) => window.for_each_neighbor(i, f),
            Neighbors::Hash { grid, radius } => {
                grid.query_radius(positions[i].truncate(), *radius, positions, |j| {
                    if j != i {
                        f(j)
                    }
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_width_covers_count() {
        assert_eq!(layout_width(0), 1);
        assert_eq!(layout_width(1), 1);
        assert_eq!(layout_width(2), 2);
        assert_eq!(layout_width(1024), 32);
        assert_eq!(layout_width(1025), 33);
    }

    #[test]
    fn index_window_stays_in_bounds() {
        // 10 particles on a 4-wide layout:
        //  0 1 2 3
        //  4 5 6 7
        //  8 9
        let window = IndexWindow::new(10, 1);
        let collect = |i| {
            let mut v = Vec::new();
            window.for_each_neighbor(i, |j| v.push(j));
            v.sort_unstable();
            v
        };
        assert_eq!(collect(0), vec![1, 4, 5]);
        assert_eq!(collect(5), vec![0, 1, 2, 4, 6, 8, 9]);
        assert_eq!(collect(3), vec![2, 6, 7]);
        assert_eq!(collect(9), vec![4, 5, 6, 8]);
    }

    #[test]
    fn window_radius_three_visits_48_neighbors_in_the_interior() {
        let window = IndexWindow::new(400, 3);
        let mut count = 0;
        window.for_each_neighbor(10 * 20 + 10, |_| count += 1);
        assert_eq!(count, 48);
    }

    #[test]
    fn hash_query_matches_brute_force() {
        let positions: Vec<Vec4> = (0..300)
            .map(|i| {
                let f = i as f32;
                Vec4::new((f * 0.731).sin(), (f * 0.377).cos(), (f * 0.193).sin() * -1.0, 0.0) * 0.3
            })
            .collect();
        let radius = 0.07;
        let mut grid = SpatialHashGrid::new(radius);
        grid.rebuild(&positions);
        assert!(grid.occupied_cells() > 1);
        let neighbors = Neighbors::Hash { grid: &grid, radius };

        for i in 0..positions.len() {
            let mut found = Vec::new();
            neighbors.for_each(i, &positions, |j| found.push(j));
            found.sort_unstable();
            let p = positions[i].truncate();
            let expected: Vec<usize> = (0..positions.len())
                .filter(|&j| {
                    j != i && positions[j].truncate().distance_squared(p) <= radius * radius
                })
                .collect();
            assert_eq!(found, expected, "particle {i}");
        }
    }
}
