use std::path::PathBuf;
use thiserror::Error;

/// Failures loading or validating cavity meshes and SDF assets.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error(
        "no cavity geometry found{}",
        .name.as_ref().map(|n| format!(" (object '{n}')")).unwrap_or_default()
    )]
    MissingCavity { name: Option<String> },

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed SDF asset: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SDF data has {actual} values, expected {expected} for size {size}")]
    SizeMismatch {
        size: usize,
        expected: usize,
        actual: usize,
    },

    #[error("SDF size must be positive")]
    EmptyGrid,

    #[error("SDF bounds are degenerate: min {min:?}, max {max:?}")]
    InvalidBounds { min: [f32; 3], max: [f32; 3] },

    #[error("SDF value at index {index} is not finite")]
    NonFiniteValue { index: usize },

    #[error("OBJ parse error on line {line}: {message}")]
    Obj { line: usize, message: String },
}

impl AssetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AssetError::Io {
            path: path.into(),
            source,
        }
    }
}
