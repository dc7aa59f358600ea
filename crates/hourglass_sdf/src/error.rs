use hourglass_asset::AssetError;
use hourglass_core::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid build configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Every voxel classified outside. Emitting such a field would let the
    /// simulation start against an empty cavity.
    #[error(
        "no voxel ended up inside the mesh ({voxels} voxels sampled); \
         is the cavity closed and large enough for the grid?"
    )]
    NoInterior { voxels: usize },
}
