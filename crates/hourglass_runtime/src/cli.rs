//! Command-line parsing.

use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

pub const USAGE: &str = "\
usage:
  hourglass bake <mesh.obj> <out.json> [--object NAME] [--resolution N]
                 [--rays K] [--padding P] [--no-smooth] [--settings FILE]
  hourglass simulate <sdf.json> [--particles P] [--ticks T] [--dt S]
                 [--spin RAD_PER_S] [--realtime] [--settings FILE]
  hourglass demo [--resolution N] [--particles P] [--ticks T] [--out sdf.json]";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Bake(BakeArgs),
    Simulate(SimulateArgs),
    Demo(DemoArgs),
    Help,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BakeArgs {
    pub mesh: PathBuf,
    pub output: PathBuf,
    pub object: Option<String>,
    pub resolution: Option<usize>,
    pub rays: Option<usize>,
    pub padding: Option<f32>,
    pub no_smooth: bool,
    pub settings: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulateArgs {
    pub sdf: PathBuf,
    pub particles: Option<usize>,
    pub ticks: Option<u64>,
    pub dt: Option<f32>,
    /// Auto-rotation speed about Z; upright when absent.
    pub spin: Option<f32>,
    /// Step by wall-clock time instead of a fixed step.
    pub realtime: bool,
    pub settings: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemoArgs {
    pub resolution: usize,
    pub particles: usize,
    pub ticks: u64,
    pub output: Option<PathBuf>,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            resolution: 48,
            particles: 4000,
            ticks: 600,
            output: None,
        }
    }
}

/// Parse everything after the program name.
pub fn parse<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let Some(command) = args.next() else {
        return Ok(Command::Help);
    };
    match command.as_str() {
        "bake" => parse_bake(args).map(Command::Bake),
        "simulate" => parse_simulate(args).map(Command::Simulate),
        "demo" => parse_demo(args).map(Command::Demo),
        "help" | "-h" | "--help" => Ok(Command::Help),
        other => bail!("unknown command `{other}`"),
    }
}

fn parse_bake(mut args: impl Iterator<Item = String>) -> Result<BakeArgs> {
    let mut out = BakeArgs::default();
    let mut positional = Vec::new();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--object" => out.object = Some(value(&arg, &mut args)?),
            "--resolution" => out.resolution = Some(value(&arg, &mut args)?),
            "--rays" => out.rays = Some(value(&arg, &mut args)?),
            "--padding" => out.padding = Some(value(&arg, &mut args)?),
            "--no-smooth" => out.no_smooth = true,
            "--settings" => out.settings = Some(value(&arg, &mut args)?),
            flag if flag.starts_with("--") => bail!("unknown flag `{flag}` for bake"),
            _ => positional.push(PathBuf::from(&arg)),
        }
    }
    let [mesh, output]: [PathBuf; 2] = positional
        .try_into()
        .map_err(|_| anyhow!("bake expects <mesh.obj> <out.json>"))?;
    out.mesh = mesh;
    out.output = output;
    Ok(out)
}

fn parse_simulate(mut args: impl Iterator<Item = String>) -> Result<SimulateArgs> {
    let mut out = SimulateArgs::default();
    let mut sdf = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--particles" => out.particles = Some(value(&arg, &mut args)?),
            "--ticks" => out.ticks = Some(value(&arg, &mut args)?),
            "--dt" => out.dt = Some(value(&arg, &mut args)?),
            "--spin" => out.spin = Some(value(&arg, &mut args)?),
            "--realtime" => out.realtime = true,
            "--settings" => out.settings = Some(value(&arg, &mut args)?),
            flag if flag.starts_with("--") => bail!("unknown flag `{flag}` for simulate"),
            _ if sdf.is_none() => sdf = Some(PathBuf::from(&arg)),
            _ => bail!("unexpected argument `{arg}`"),
        }
    }
    out.sdf = sdf.ok_or_else(|| anyhow!("simulate expects <sdf.json>"))?;
    Ok(out)
}

fn parse_demo(mut args: impl Iterator<Item = String>) -> Result<DemoArgs> {
    let mut out = DemoArgs::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--resolution" => out.resolution = value(&arg, &mut args)?,
            "--particles" => out.particles = value(&arg, &mut args)?,
            "--ticks" => out.ticks = value(&arg, &mut args)?,
            "--out" => out.output = Some(value(&arg, &mut args)?),
            other => bail!("unexpected argument `{other}` for demo"),
        }
    }
    Ok(out)
}

fn value<T>(flag: &str, args: &mut impl Iterator<Item = String>) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = args
        .next()
        .ok_or_else(|| anyhow!("`{flag}` needs a value"))?;
    raw.parse()
        .with_context(|| format!("invalid value `{raw}` for `{flag}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn no_arguments_prints_help() {
        assert_eq!(parse(Vec::new()).unwrap(), Command::Help);
        assert_eq!(parse(args("--help")).unwrap(), Command::Help);
    }

    #[test]
    fn bake_with_flags() {
        let cmd = parse(args(
            "bake glass.obj out.json --object Cavity --resolution 96 \
             --rays 20 --padding 0.1 --no-smooth",
        ))
        .unwrap();
        let Command::Bake(bake) = cmd else {
            panic!("expected bake");
        };
        assert_eq!(bake.mesh, PathBuf::from("glass.obj"));
        assert_eq!(bake.output, PathBuf::from("out.json"));
        assert_eq!(bake.object.as_deref(), Some("Cavity"));
        assert_eq!(bake.resolution, Some(96));
        assert_eq!(bake.rays, Some(20));
        assert_eq!(bake.padding, Some(0.1));
        assert!(bake.no_smooth);
    }

    #[test]
    fn bake_needs_two_paths() {
        assert!(parse(args("bake only.obj")).is_err());
        assert!(parse(args("bake a.obj b.json c.json")).is_err());
    }

    #[test]
    fn simulate_with_flags() {
        let cmd = parse(args(
            "simulate sdf.json --particles 2000 --ticks 50 --dt 0.01 --spin 0.5",
        ))
        .unwrap();
        let Command::Simulate(sim) = cmd else {
            panic!("expected simulate");
        };
        assert_eq!(sim.sdf, PathBuf::from("sdf.json"));
        assert_eq!(sim.particles, Some(2000));
        assert_eq!(sim.ticks, Some(50));
        assert_eq!(sim.dt, Some(0.01));
        assert_eq!(sim.spin, Some(0.5));
        assert!(!sim.realtime);
    }

    #[test]
    fn bad_values_are_reported() {
        let err = parse(args("simulate sdf.json --ticks many")).unwrap_err();
        assert!(format!("{err:#}").contains("--ticks"));
        assert!(parse(args("simulate sdf.json --dt")).is_err());
        assert!(parse(args("simulate")).is_err());
        assert!(parse(args("demo --fast")).is_err());
        assert!(parse(args("melt")).is_err());
    }

    #[test]
    fn demo_defaults() {
        assert_eq!(parse(args("demo")).unwrap(), Command::Demo(DemoArgs::default()));
        let Command::Demo(demo) = parse(args("demo --resolution 32 --out h.json")).unwrap() else {
            panic!("expected demo");
        };
        assert_eq!(demo.resolution, 32);
        assert_eq!(demo.output, Some(PathBuf::from("h.json")));
    }
}
