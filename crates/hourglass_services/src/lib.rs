//! Hourglass Services Layer
//!
//! Host-side collaborators for the simulation: JSON settings and the
//! orientation drivers fed to the integrator each tick.

pub mod orientation;
pub mod settings;

pub use orientation::{AutoRotate, DragRotation, Fixed, OrientationSource};
pub use settings::{BuildSettings, Settings, SettingsError, SimSettings};
