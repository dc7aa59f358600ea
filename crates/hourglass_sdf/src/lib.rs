//! Hourglass SDF Baker
//!
//! Turns a closed cavity mesh into a dense signed-distance volume:
//! - [`bvh`]: triangle BVH for closest-point and ray-crossing queries
//! - [`sign`]: inside/outside classification by multi-ray parity vote
//! - [`smooth`]: optional 3×3×3 Gaussian clean-up pass
//! - [`builder`]: the parallel voxel loop tying it together

pub mod builder;
pub mod bvh;
pub mod error;
pub mod geometry;
pub mod sign;
pub mod smooth;

pub use builder::{BuildConfig, BuildStats, SdfBuilder};
pub use bvh::{ClosestHit, TriangleBvh};
pub use error::BuildError;
