//! Source mesh conversion

use crate::assets::model::{AssetMesh, PrimitiveType};
use crate::render::{pack_vertices, Face, PackedGeometry, Vertex};

/// Flatten a source mesh into packed geometry
///
/// Only triangle meshes are accepted. Each vertex takes its normal, the first
/// colour channel and the first uv channel when present. Faces that are not
/// triangles are dropped. Returns `None` (with a warning) when nothing
/// drawable is left.
#[must_use]
pub fn convert_mesh(mesh: &AssetMesh) -> Option<PackedGeometry> {
    if mesh.primitive != PrimitiveType::Triangle {
        log::warn!("Skipping mesh '{}': primitive type {:?} is not triangles", mesh.name, mesh.primitive);
        return None;
    }

    let colors = mesh.colors.first();
    let uvs = mesh.uvs.first();
    let vertices: Vec<Vertex> = mesh
        .positions
        .iter()
        .enumerate()
        .map(|(i, &position)| Vertex {
            position,
            normal: mesh.normals.get(i).copied(),
            color: colors.and_then(|channel| channel.get(i)).copied(),
            uv: uvs.and_then(|channel| channel.get(i)).copied(),
        })
        .collect();
    let faces: Vec<Face> = mesh.faces.iter().map(|indices| Face::from(indices.clone())).collect();

    let geometry = pack_vertices(&vertices, &faces);
    if geometry.skipped_faces > 0 {
        log::warn!(
            "Mesh '{}': {} of {} faces skipped",
            mesh.name,
            geometry.skipped_faces,
            faces.len()
        );
    }
    if geometry.vertices.is_empty() || geometry.indices.is_empty() {
        log::warn!("Skipping mesh '{}': no vertices or no triangles", mesh.name);
        return None;
    }
    Some(geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::mesh::{DEFAULT_COLOR, DEFAULT_NORMAL};

    fn quad() -> AssetMesh {
        AssetMesh {
            name: "quad".into(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            uvs: vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]],
            faces: vec![vec![0, 1, 2], vec![2, 3, 0]],
            ..AssetMesh::default()
        }
    }

    #[test]
    fn test_missing_channels_use_defaults() {
        let geometry = convert_mesh(&quad()).unwrap();
        assert_eq!(geometry.indices.len(), 6);
        let vertex = geometry.vertices.vertex(2).unwrap();
        assert_eq!(&vertex[3..6], &DEFAULT_NORMAL);
        assert_eq!(&vertex[6..10], &DEFAULT_COLOR);
        assert_eq!(&vertex[10..12], &[1.0, 1.0]);
    }

    #[test]
    fn test_non_triangle_faces_are_dropped() {
        let mut mesh = quad();
        mesh.faces.push(vec![0, 1, 2, 3]);
        let geometry = convert_mesh(&mesh).unwrap();
        assert_eq!(geometry.skipped_faces, 1);
        assert_eq!(geometry.indices.len(), 6);
    }

    #[test]
    fn test_degenerate_meshes_are_skipped() {
        let mut no_faces = quad();
        no_faces.faces.clear();
        assert!(convert_mesh(&no_faces).is_none());

        let mut lines = quad();
        lines.primitive = PrimitiveType::Line;
        assert!(convert_mesh(&lines).is_none());

        assert!(convert_mesh(&AssetMesh::default()).is_none());
    }
}
