use glam::Vec3;
use hourglass_asset::shapes::{hourglass, uv_sphere, HourglassShape};
use hourglass_asset::{AssetError, Mesh, SdfVolume};
use hourglass_sdf::{BuildConfig, BuildError, SdfBuilder};

const RADIUS: f32 = 1.0;

fn sphere() -> Mesh {
    uv_sphere(Vec3::ZERO, RADIUS, 64, 32)
}

fn bake(mesh: &Mesh, resolution: usize, smooth: bool) -> SdfVolume {
    SdfBuilder::new(BuildConfig {
        resolution,
        padding: 0.25,
        smooth,
        ..BuildConfig::default()
    })
    .unwrap()
    .build(mesh)
    .unwrap()
}

/// Voxels further than `margin` from the analytic surface, with their exact distance.
fn voxels_away_from_surface(volume: &SdfVolume, margin: f32) -> Vec<(f32, f32)> {
    let n = volume.size();
    let mut out = Vec::new();
    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                let exact = volume.voxel_center(x, y, z).length() - RADIUS;
                if exact.abs() > margin {
                    out.push((volume.value(x, y, z), exact));
                }
            }
        }
    }
    out
}

#[test]
fn sphere_signs_match_analytic_field() {
    let volume = bake(&sphere(), 20, false);
    let voxel = volume.voxel_size().max_element();

    let checked = voxels_away_from_surface(&volume, voxel);
    assert!(!checked.is_empty());
    for (value, exact) in checked {
        assert_eq!(
            value < 0.0,
            exact < 0.0,
            "sign mismatch: value {value}, analytic {exact}"
        );
    }
    assert!(volume.sample(Vec3::ZERO) < -0.8);
}

#[test]
fn smoothed_error_shrinks_with_resolution() {
    let mesh = sphere();
    let mean_error = |resolution: usize| {
        let volume = bake(&mesh, resolution, true);
        let n = volume.size();
        let mut sum = 0.0f64;
        let mut count = 0usize;
        for z in 0..n {
            for y in 0..n {
                for x in 0..n {
                    let r = volume.voxel_center(x, y, z).length();
                    // Stay clear of the kink at the centre.
                    if r > 0.5 * RADIUS && r < 1.1 * RADIUS {
                        sum += (volume.value(x, y, z) - (r - RADIUS)).abs() as f64;
                        count += 1;
                    }
                }
            }
        }
        sum / count as f64
    };

    let coarse = mean_error(12);
    let fine = mean_error(24);
    assert!(fine < coarse, "coarse {coarse}, fine {fine}");
    assert!(fine < 0.02, "fine error {fine}");
}

#[test]
fn one_missing_triangle_keeps_most_signs() {
    let full = sphere();
    let holed = full.without(&[full.triangle_count() / 2]);
    assert_eq!(holed.triangle_count(), full.triangle_count() - 1);

    let volume = bake(&holed, 16, false);
    let voxel = volume.voxel_size().max_element();
    let checked = voxels_away_from_surface(&volume, voxel);
    let agree = checked
        .iter()
        .filter(|(value, exact)| (*value < 0.0) == (*exact < 0.0))
        .count();
    let ratio = agree as f32 / checked.len() as f32;
    assert!(ratio > 0.95, "only {ratio:.3} of signs agree");
    assert!(volume.sample(Vec3::ZERO) < 0.0);
}

#[test]
fn invalid_inputs_are_rejected() {
    let zero = SdfBuilder::new(BuildConfig {
        resolution: 0,
        ..BuildConfig::default()
    });
    assert!(matches!(zero, Err(BuildError::Config(_))));

    let builder = SdfBuilder::new(BuildConfig::default()).unwrap();
    assert!(matches!(
        builder.build(&Mesh::new()),
        Err(BuildError::Asset(AssetError::MissingCavity { name: None }))
    ));
}

#[test]
fn hourglass_cavity_bakes_with_both_bulbs_inside() {
    let shape = HourglassShape::default();
    let (volume, stats) = SdfBuilder::new(BuildConfig {
        resolution: 24,
        ..BuildConfig::default()
    })
    .unwrap()
    .build_with_stats(&hourglass(&shape))
    .unwrap();

    assert!(stats.inside_voxels > 0);
    assert!(volume.sample(Vec3::new(0.0, 0.5, 0.0)) < -0.2);
    assert!(volume.sample(Vec3::new(0.0, -0.5, 0.0)) < -0.2);
    assert!(volume.sample(Vec3::new(0.45, 0.0, 0.0)) > 0.15);
    let inside = volume.inside_fraction();
    assert!(inside > 0.05 && inside < 0.9, "inside fraction {inside}");
}
