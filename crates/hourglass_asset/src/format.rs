//! SDF asset record.
//!
//! ```json
//! { "size": 30, "min": [x, y, z], "max": [x, y, z], "data": [ ...size³ floats ] }
//! ```
//!
//! `data` is x-fastest, then y, then z. Floats are written with shortest
//! round-trip formatting, so reading a file back reproduces the grid bit for
//! bit.

use crate::error::AssetError;
use crate::volume::SdfVolume;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdfRecord {
    pub size: usize,
    pub min: [f32; 3],
    pub max: [f32; 3],
    pub data: Vec<f32>,
}

impl From<&SdfVolume> for SdfRecord {
    fn from(volume: &SdfVolume) -> Self {
        Self {
            size: volume.size(),
            min: volume.min().to_array(),
            max: volume.max().to_array(),
            data: volume.data().to_vec(),
        }
    }
}

impl TryFrom<SdfRecord> for SdfVolume {
    type Error = AssetError;

    fn try_from(record: SdfRecord) -> Result<Self, Self::Error> {
        SdfVolume::new(
            record.size,
            Vec3::from_array(record.min),
            Vec3::from_array(record.max),
            record.data,
        )
    }
}

pub fn to_json_string(volume: &SdfVolume) -> Result<String, AssetError> {
    Ok(serde_json::to_string(&SdfRecord::from(volume))?)
}

pub fn from_json_str(text: &str) -> Result<SdfVolume, AssetError> {
    let record: SdfRecord = serde_json::from_str(text)?;
    SdfVolume::try_from(record)
}

/// Write a volume as a JSON asset.
pub fn write_json(volume: &SdfVolume, path: impl AsRef<Path>) -> Result<(), AssetError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| AssetError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &SdfRecord::from(volume))?;
    writer.flush().map_err(|e| AssetError::io(path, e))?;
    info!(path = %path.display(), size = volume.size(), "wrote SDF asset");
    Ok(())
}

/// Read and validate a JSON asset.
pub fn read_json(path: impl AsRef<Path>) -> Result<SdfVolume, AssetError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| AssetError::io(path, e))?;
    let record: SdfRecord = serde_json::from_reader(BufReader::new(file))?;
    let volume = SdfVolume::try_from(record)?;
    info!(
        path = %path.display(),
        size = volume.size(),
        inside = volume.inside_fraction(),
        "loaded SDF asset"
    );
    Ok(volume)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncated_data_is_rejected() {
        let text = r#"{"size": 2, "min": [0,0,0], "max": [1,1,1], "data": [0.5, 1.0]}"#;
        assert!(matches!(
            from_json_str(text),
            Err(AssetError::SizeMismatch { expected: 8, actual: 2, .. })
        ));
    }

    #[test]
    fn garbage_is_a_json_error() {
        assert!(matches!(from_json_str("{\"size\": "), Err(AssetError::Json(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_json("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn accepts_the_reference_layout() {
        let text = r#"{
            "size": 1,
            "min": [-1.0, -1.0, -1.0],
            "max": [1.0, 1.0, 1.0],
            "data": [-0.25]
        }"#;
        let volume = from_json_str(text).unwrap();
        assert_eq!(volume.size(), 1);
        assert_eq!(volume.value(0, 0, 0), -0.25);
    }
}
