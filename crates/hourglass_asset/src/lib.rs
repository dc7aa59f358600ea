//! Hourglass Asset Pipeline
//!
//! Cavity meshes in, signed-distance volumes out:
//! - [`Mesh`]: world-space triangle soup with procedural shapes
//! - [`obj`]: minimal Wavefront OBJ reader with named-object selection
//! - [`SdfVolume`]: immutable sampled distance field
//! - [`format`]: the JSON asset record shared by the baker and the runtime

pub mod error;
pub mod format;
pub mod mesh;
pub mod obj;
pub mod shapes;
pub mod volume;

pub use error::AssetError;
pub use mesh::{Aabb, Mesh, Triangle};
pub use volume::{SdfVolume, OUTSIDE_DISTANCE};
