//! 3×3×3 Gaussian smoothing of a cubic grid.
//!
//! Applied as three separable 1-2-1 binomial passes with clamped edges,
//! which is the same as one pass with the full 27-tap kernel.

use rayon::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Axis {
    X,
    Y,
    Z,
}

/// Smooth `data` (an `n`×`n`×`n` grid, x fastest) in place.
pub fn gaussian_3x3x3(data: &mut [f32], n: usize) {
    debug_assert_eq!(data.len(), n * n * n);
    if n < 2 {
        return;
    }
    let mut scratch = vec![0.0f32; data.len()];
    blur_axis(data, &mut scratch, n, Axis::X);
    blur_axis(&scratch, data, n, Axis::Y);
    scratch.copy_from_slice(data);
    blur_axis(&scratch, data, n, Axis::Z);
}

fn blur_axis(src: &[f32], dst: &mut [f32], n: usize, axis: Axis) {
    let slab = n * n;
    dst.par_chunks_mut(slab).enumerate().for_each(|(z, plane)| {
        for y in 0..n {
            for x in 0..n {
                let (lo, hi) = match axis {
                    Axis::X => (
                        idx(x.saturating_sub(1), y, z, n),
                        idx((x + 1).min(n - 1), y, z, n),
                    ),
                    Axis::Y => (
                        idx(x, y.saturating_sub(1), z, n),
                        idx(x, (y + 1).min(n - 1), z, n),
                    ),
                    Axis::Z => (
                        idx(x, y, z.saturating_sub(1), n),
                        idx(x, y, (z + 1).min(n - 1), n),
                    ),
                };
                let center = src[idx(x, y, z, n)];
                plane[x + y * n] = 0.25 * src[lo] + 0.5 * center + 0.25 * src[hi];
            }
        }
    });
}

#[inline]
fn idx(x: usize, y: usize, z: usize, n: usize) -> usize {
    x + y * n + z * n * n
}
