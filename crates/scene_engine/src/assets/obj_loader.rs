//! Wavefront OBJ/MTL parser
//!
//! Loads through `tobj` with triangulation and a single index buffer. The
//! resulting asset has one root node with one child node per OBJ model. OBJ
//! carries no cameras or lights.

use std::path::Path;

use crate::assets::model::{AssetMaterial, AssetMesh, AssetNode, AssetScene, PrimitiveType};
use crate::assets::{AssetError, AssetParser};

/// [`AssetParser`] for `.obj` files
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjParser;

impl AssetParser for ObjParser {
    fn parse(&self, path: &Path) -> Result<AssetScene, AssetError> {
        if !path.exists() {
            return Err(AssetError::NotFound(path.display().to_string()));
        }

        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|e| AssetError::LoadFailed(format!("{}: {e}", path.display())))?;

        let materials = materials.unwrap_or_else(|e| {
            log::warn!("No usable MTL for {}: {e}", path.display());
            Vec::new()
        });

        let mut scene = AssetScene::default();
        let root_name = path
            .file_stem()
            .map_or_else(|| "root".to_string(), |stem| stem.to_string_lossy().into_owned());
        let root = scene.add_node(AssetNode::new(root_name), None);

        scene.materials = materials.iter().map(convert_material).collect();

        for (index, model) in models.iter().enumerate() {
            scene.meshes.push(convert_mesh(model));
            let node_name = if model.name.is_empty() {
                format!("model_{index}")
            } else {
                model.name.clone()
            };
            scene.add_node(AssetNode::new(node_name).with_mesh(index), Some(root));
        }

        log::debug!(
            "Parsed OBJ {}: {} models, {} materials",
            path.display(),
            scene.meshes.len(),
            scene.materials.len()
        );
        Ok(scene)
    }
}

fn convert_material(material: &tobj::Material) -> AssetMaterial {
    AssetMaterial {
        name: material.name.clone(),
        diffuse_color: material
            .diffuse
            .map(|[r, g, b]| [r, g, b, material.dissolve.unwrap_or(1.0)]),
        diffuse_texture: material.diffuse_texture.clone().filter(|t| !t.is_empty()),
    }
}

fn convert_mesh(model: &tobj::Model) -> AssetMesh {
    let mesh = &model.mesh;
    let vertex_count = mesh.positions.len() / 3;

    let normals = if mesh.normals.len() == vertex_count * 3 {
        mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]).collect()
    } else {
        Vec::new()
    };
    let uvs = if mesh.texcoords.len() == vertex_count * 2 {
        vec![mesh.texcoords.chunks_exact(2).map(|t| [t[0], t[1]]).collect()]
    } else {
        Vec::new()
    };
    let colors = if mesh.vertex_color.len() == vertex_count * 3 {
        vec![mesh
            .vertex_color
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2], 1.0])
            .collect()]
    } else {
        Vec::new()
    };

    AssetMesh {
        name: model.name.clone(),
        primitive: PrimitiveType::Triangle,
        positions: mesh.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]).collect(),
        normals,
        colors,
        uvs,
        faces: mesh.indices.chunks(3).map(<[u32]>::to_vec).collect(),
        material: mesh.material_id,
    }
}
