//! Hourglass Core
//!
//! Shared building blocks for the sand simulation crates:
//! - Double-buffered columns for per-tick state
//! - Tick timing with step clamping
//! - Math re-exports and stateless hashing
//! - Configuration validation errors

pub mod buffer;
pub mod error;
pub mod math;
pub mod time;

pub use glam;

pub use buffer::Column;
pub use error::ConfigError;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
