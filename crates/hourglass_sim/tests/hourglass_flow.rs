use glam::Quat;
use hourglass_asset::shapes::{hourglass, HourglassShape};
use hourglass_core::time::FrameClock;
use hourglass_sdf::{BuildConfig, SdfBuilder};
use hourglass_sim::{
    NeighborStrategy, OrientationSource, ParticleView, SeedConfig, SimConfig, Simulation,
    SimulationLoop, StopReason, StopSignal, TickReport,
};
use std::sync::Arc;

/// Tips the cavity steadily around Z.
struct Tumble {
    angle: f32,
}

impl OrientationSource for Tumble {
    fn orientation(&mut self, dt: f32) -> Quat {
        self.angle += 1.5 * dt;
        Quat::from_rotation_z(self.angle)
    }
}

fn baked_hourglass() -> Arc<hourglass_asset::SdfVolume> {
    let builder = SdfBuilder::new(BuildConfig {
        resolution: 32,
        ..BuildConfig::default()
    })
    .unwrap();
    Arc::new(builder.build(&hourglass(&HourglassShape::default())).unwrap())
}

fn run_tumbling(neighbors: NeighborStrategy) {
    let volume = baked_hourglass();
    let config = SimConfig {
        neighbors,
        ..SimConfig::default()
    };
    let threshold = config.boundary_threshold;
    let max_speed = config.max_speed;
    let seed = SeedConfig {
        count: 2000,
        ..SeedConfig::default()
    };
    let mut sim = Simulation::new(Some(volume), config, &seed).unwrap();
    assert!(sim.view().positions().iter().all(|p| p.y >= 0.0));

    let mut worst_sdf = f32::NEG_INFINITY;
    let mut fastest = 0.0f32;
    let mut sink = |_: &TickReport, view: ParticleView<'_>| {
        worst_sdf = worst_sdf.max(view.max_sdf());
        fastest = fastest.max(view.max_speed());
    };
    let summary = SimulationLoop::new(FrameClock::fixed(1.0 / 60.0), StopSignal::new())
        .with_max_ticks(240)
        .run(&mut sim, &mut Tumble { angle: 0.0 }, &mut sink);

    assert_eq!(summary.stopped_by, StopReason::TickLimit);
    assert_eq!(summary.ticks, 240);
    assert!(worst_sdf <= threshold, "a particle left the cavity: sdf {worst_sdf}");
    assert!(fastest <= max_speed + 1e-4);
}

#[test]
fn tumbling_hourglass_keeps_every_grain_inside() {
    run_tumbling(NeighborStrategy::default());
}

#[test]
fn spatial_hash_neighbors_keep_every_grain_inside() {
    run_tumbling(NeighborStrategy::SpatialHash);
}
