//! Hourglass Sand Simulation
//!
//! Particles integrated against a baked signed-distance volume:
//! - [`seed`]: rejection-sampled, Morton-ordered spawn inside the cavity
//! - [`integrator`]: pure per-particle kernel (gravity, repulsion, clamps)
//! - [`collision`]: sub-stepped wall response and final containment check
//! - [`simulation`]: double-buffered state and the per-tick barrier
//! - [`runner`]: stoppable tick loop publishing frames to a sink

pub mod collision;
pub mod config;
pub mod error;
pub mod integrator;
pub mod neighbors;
pub mod runner;
pub mod seed;
pub mod simulation;
pub mod state;

pub use config::{NeighborStrategy, SimConfig, SlowParticlePolicy};
pub use error::SimError;
pub use runner::{
    FrameSink, LoopSummary, NullSink, OrientationSource, SimulationLoop, StopReason, StopSignal,
};
pub use seed::{seed_particles, SeedConfig, SeedRegion};
pub use simulation::{Simulation, TickReport};
pub use state::{ParticleView, RenderParticle};
