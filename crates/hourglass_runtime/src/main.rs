//! Hourglass Runtime
//!
//! Binary that bakes cavity meshes and runs headless sand simulations.

mod cli;

use anyhow::{Context, Result};
use cli::{BakeArgs, Command, DemoArgs, SimulateArgs};
use glam::Vec3;
use hourglass_asset::shapes::{hourglass, HourglassShape};
use hourglass_asset::{format, obj, SdfVolume};
use hourglass_core::time::FrameClock;
use hourglass_sdf::{BuildStats, SdfBuilder};
use hourglass_services::{AutoRotate, Fixed, OrientationSource, Settings};
use hourglass_sim::{
    LoopSummary, ParticleView, Simulation, SimulationLoop, StopSignal, TickReport,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Hourglass v{}", hourglass_core::VERSION);

    match cli::parse(std::env::args().skip(1))? {
        Command::Bake(args) => bake(args),
        Command::Simulate(args) => simulate(args),
        Command::Demo(args) => demo(args),
        Command::Help => {
            println!("{}", cli::USAGE);
            Ok(())
        }
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display())),
        None => Ok(Settings::default()),
    }
}

fn log_bake(stats: &BuildStats) {
    info!(
        resolution = stats.resolution,
        triangles = stats.triangles,
        inside = stats.inside_voxels,
        inside_fraction = stats.inside_voxels as f64 / stats.voxels.max(1) as f64,
        contested = stats.contested_votes,
        elapsed_ms = stats.elapsed.as_millis() as u64,
        "bake finished"
    );
}

fn bake(args: BakeArgs) -> Result<()> {
    let mut settings = load_settings(args.settings.as_deref())?.build;
    if let Some(resolution) = args.resolution {
        settings.resolution = resolution;
    }
    if let Some(rays) = args.rays {
        settings.ray_count = rays;
    }
    if let Some(padding) = args.padding {
        settings.padding = padding;
    }
    if args.no_smooth {
        settings.smooth = false;
    }

    let mesh = obj::load_obj(&args.mesh, args.object.as_deref())
        .with_context(|| format!("reading cavity mesh {}", args.mesh.display()))?;
    info!(path = %args.mesh.display(), triangles = mesh.triangle_count(), "mesh loaded");

    let builder = SdfBuilder::new(settings.to_config()).context("invalid bake settings")?;
    let (volume, stats) = builder.build_with_stats(&mesh).context("baking SDF")?;
    log_bake(&stats);

    format::write_json(&volume, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!(path = %args.output.display(), "SDF written");
    Ok(())
}

fn simulate(args: SimulateArgs) -> Result<()> {
    let mut settings = load_settings(args.settings.as_deref())?.simulation;
    if let Some(particles) = args.particles {
        settings.particle_count = particles;
    }
    let volume = format::read_json(&args.sdf)
        .with_context(|| format!("loading SDF {}", args.sdf.display()))?;

    let clock = match (args.realtime, args.dt) {
        (true, _) => FrameClock::wall(settings.max_dt),
        (false, Some(dt)) => FrameClock::fixed(dt),
        (false, None) => FrameClock::fixed(settings.max_dt),
    };
    let mut orientation: Box<dyn OrientationSource> = match args.spin {
        Some(speed) => Box::new(AutoRotate::new(Vec3::Z, speed)),
        None => Box::new(Fixed::default()),
    };
    let summary = run_headless(
        volume,
        &settings,
        clock,
        orientation.as_mut(),
        args.ticks.unwrap_or(600),
    )?;
    info!(ticks = summary.ticks, "simulate finished");
    Ok(())
}

fn demo(args: DemoArgs) -> Result<()> {
    let mesh = hourglass(&HourglassShape::default());
    info!(triangles = mesh.triangle_count(), "procedural hourglass built");

    let mut build = Settings::default().build;
    build.resolution = args.resolution;
    let (volume, stats) = SdfBuilder::new(build.to_config())
        .context("invalid demo resolution")?
        .build_with_stats(&mesh)
        .context("baking demo hourglass")?;
    log_bake(&stats);

    if let Some(path) = &args.output {
        format::write_json(&volume, path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "SDF written");
    }

    let mut settings = Settings::default().simulation;
    settings.particle_count = args.particles;
    let clock = FrameClock::fixed(settings.max_dt);
    let mut spin = AutoRotate::new(Vec3::Z, 0.8);
    run_headless(volume, &settings, clock, &mut spin, args.ticks)?;
    Ok(())
}

fn run_headless(
    volume: SdfVolume,
    settings: &hourglass_services::SimSettings,
    clock: FrameClock,
    orientation: &mut dyn OrientationSource,
    ticks: u64,
) -> Result<LoopSummary> {
    let mut sim = Simulation::new(
        Some(Arc::new(volume)),
        settings.to_config(),
        &settings.to_seed_config(),
    )
    .context("starting simulation")?;

    let mut worst_sdf = f32::NEG_INFINITY;
    let mut escaped_ticks = 0u64;
    let threshold = sim.config().boundary_threshold;
    let mut sink = |_: &TickReport, view: ParticleView<'_>| {
        let max = view.max_sdf();
        worst_sdf = worst_sdf.max(max);
        if max > threshold {
            escaped_ticks += 1;
        }
    };

    let summary = SimulationLoop::new(clock, StopSignal::new())
        .with_max_ticks(ticks)
        .run(&mut sim, orientation, &mut sink);

    let view = sim.view();
    info!(
        particles = view.len(),
        inside = view.inside_count(),
        worst_sdf,
        escaped_ticks,
        reverted = summary.reverted,
        degenerate_normals = summary.degenerate_normals,
        mean_speed = view.mean_speed(),
        "final state"
    );
    info!("stage timings: {}", sim.profiler().summary());
    for (name, total) in sim.counters().iter() {
        info!(counter = name, total, "tick counter");
    }
    Ok(summary)
}
