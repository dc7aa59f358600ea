//! Minimal Wavefront OBJ reader.
//!
//! Only geometry is read: `v` positions, `f` faces (fan-triangulated) and
//! `o`/`g` object names. Texture coordinates, normals and materials are
//! ignored.

use crate::error::AssetError;
use crate::mesh::{Mesh, Triangle};
use glam::Vec3;
use std::path::Path;
use tracing::{debug, info};

/// Read a mesh from an OBJ file.
///
/// When `object` is given, only faces that belong to the object or group
/// with that name are kept.
pub fn load_obj(path: impl AsRef<Path>, object: Option<&str>) -> Result<Mesh, AssetError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| AssetError::io(path, e))?;
    let mesh = parse_obj(&text, object)?;
    info!(
        path = %path.display(),
        object = object.unwrap_or("<all>"),
        triangles = mesh.triangle_count(),
        "loaded cavity mesh"
    );
    Ok(mesh)
}

/// Parse OBJ text. See [`load_obj`].
pub fn parse_obj(text: &str, object: Option<&str>) -> Result<Mesh, AssetError> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut mesh = Mesh::new();
    let mut current: Option<String> = None;
    let mut seen_object = object.is_none();

    for (line_no, raw) in text.lines().enumerate() {
        let line_no = line_no + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };

        match keyword {
            "v" => {
                let mut coords = [0.0f32; 3];
                for c in &mut coords {
                    *c = parse_float(tokens.next(), line_no)?;
                }
                positions.push(Vec3::from_array(coords));
            }
            "o" | "g" => {
                let name = tokens.collect::<Vec<_>>().join(" ");
                if object == Some(name.as_str()) {
                    seen_object = true;
                }
                current = Some(name);
            }
            "f" => {
                if let Some(wanted) = object {
                    if current.as_deref() != Some(wanted) {
                        continue;
                    }
                }
                let indices = tokens
                    .map(|t| resolve_index(t, positions.len(), line_no))
                    .collect::<Result<Vec<_>, _>>()?;
                if indices.len() < 3 {
                    return Err(AssetError::Obj {
                        line: line_no,
                        message: format!("face has {} vertices", indices.len()),
                    });
                }
                for k in 1..indices.len() - 1 {
                    mesh.push(Triangle::new(
                        positions[indices[0]],
                        positions[indices[k]],
                        positions[indices[k + 1]],
                    ));
                }
            }
            _ => {}
        }
    }

    if !seen_object || mesh.is_empty() {
        return Err(AssetError::MissingCavity {
            name: object.map(str::to_owned),
        });
    }
    debug!(vertices = positions.len(), triangles = mesh.triangle_count(), "parsed OBJ");
    Ok(mesh)
}

fn parse_float(token: Option<&str>, line: usize) -> Result<f32, AssetError> {
    let token = token.ok_or_else(|| AssetError::Obj {
        line,
        message: "missing vertex coordinate".into(),
    })?;
    token.parse().map_err(|_| AssetError::Obj {
        line,
        message: format!("invalid number '{token}'"),
    })
}

/// Resolve a `v/vt/vn` face token to a zero-based position index.
fn resolve_index(token: &str, vertex_count: usize, line: usize) -> Result<usize, AssetError> {
    let head = token.split('/').next().unwrap_or(token);
    let raw: i64 = head.parse().map_err(|_| AssetError::Obj {
        line,
        message: format!("invalid face index '{token}'"),
    })?;
    let resolved = if raw > 0 {
        raw - 1
    } else {
        vertex_count as i64 + raw
    };
    if raw == 0 || resolved < 0 || resolved >= vertex_count as i64 {
        return Err(AssetError::Obj {
            line,
            message: format!("face index {raw} out of range"),
        });
    }
    Ok(resolved as usize)
}
