use hourglass_core::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid simulation config: {0}")]
    Config(#[from] ConfigError),

    #[error("no SDF volume loaded; refusing to spawn particles")]
    MissingVolume,

    #[error("seeding placed {placed} of {requested} particles after {attempts} attempts")]
    SeedingFailed {
        requested: usize,
        placed: usize,
        attempts: usize,
    },

    #[error("particle columns disagree: {positions} positions, {velocities} velocities")]
    LengthMismatch { positions: usize, velocities: usize },
}
