//! Scene importer
//!
//! Converts a parsed [`AssetScene`] into an engine [`Scene`].
//!
//! # Failure policy
//! An unreadable or unparseable file, or an asset that yields no drawable
//! mesh, is an [`ImportError`]. Everything else (a bad mesh, a missing
//! texture, a camera or light without a node) is logged and skipped, and the
//! rest of the asset is still imported.
//!
//! # Cameras and lights
//! A camera is attached to the node whose metadata carries its index under
//! [`ImportConfig::camera_index_key`], or failing that the node with the
//! camera's name. Lights are matched by name only. The first camera imported
//! becomes the active one.

pub mod geometry;
pub mod hierarchy;
pub mod materials;

use std::path::Path;

use thiserror::Error;

use crate::assets::image_loader::{ImageCrateDecoder, ImageDecoder};
use crate::assets::model::{AssetCamera, AssetLight, AssetLightType, AssetNode, AssetScene};
use crate::assets::scene_file::FileAssetParser;
use crate::assets::{AssetError, AssetParser};
use crate::core::ImportConfig;
use crate::foundation::math::{decompose_trs, utils, Vec3};
use crate::render::Mesh;
use crate::scene::{Camera, Light, Scene, Transform, DEFAULT_FAR, DEFAULT_NEAR};

use self::materials::MaterialResolver;

/// Fatal import outcomes
#[derive(Error, Debug)]
pub enum ImportError {
    /// The file could not be read or parsed
    #[error("Failed to parse asset: {0}")]
    Parse(#[from] AssetError),

    /// Parsing worked but nothing drawable came out of it
    #[error("Asset '{0}' contains no usable meshes")]
    NoUsableContent(String),
}

/// Builds scenes from asset files
pub struct SceneImporter {
    parser: Box<dyn AssetParser>,
    decoder: Box<dyn ImageDecoder>,
    config: ImportConfig,
}

impl SceneImporter {
    /// Importer reading `.ron`/`.obj` files and decoding images with the `image` crate
    ///
    /// Invalid fallback values in `config` are replaced by their defaults.
    #[must_use]
    pub fn new(config: ImportConfig) -> Self {
        Self {
            parser: Box::new(FileAssetParser),
            decoder: Box::new(ImageCrateDecoder),
            config: config.or_defaults(),
        }
    }

    /// Builder pattern: replace the file parser
    #[must_use]
    pub fn with_parser(mut self, parser: impl AssetParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    /// Builder pattern: replace the image decoder
    #[must_use]
    pub fn with_decoder(mut self, decoder: impl ImageDecoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Import configuration
    #[must_use]
    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Parse the file at `path` and import it
    pub fn import(&self, path: impl AsRef<Path>) -> Result<Scene, ImportError> {
        let path = path.as_ref();
        log::info!("Importing scene from {}", path.display());

        let asset = self.parser.parse(path).map_err(|e| {
            log::error!("Cannot import {}: {e}", path.display());
            ImportError::Parse(e)
        })?;
        let source_dir = path.parent().unwrap_or_else(|| Path::new(""));
        self.import_parsed(&asset, source_dir)
    }

    /// Import an already parsed asset
    ///
    /// External texture paths are resolved relative to `source_dir`.
    pub fn import_parsed(&self, asset: &AssetScene, source_dir: &Path) -> Result<Scene, ImportError> {
        let scene_name = asset
            .nodes
            .first()
            .map(|root| root.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("scene");
        let mut scene = Scene::new(scene_name);
        let mut resolver = MaterialResolver::new(asset, source_dir, self.decoder.as_ref());

        let mesh_count = self.import_meshes(asset, &mut resolver, &mut scene);
        if mesh_count == 0 {
            log::error!("Asset '{scene_name}' has no usable meshes");
            return Err(ImportError::NoUsableContent(scene_name.to_string()));
        }

        for (index, camera) in asset.cameras.iter().enumerate() {
            if let Some(camera) = self.import_camera(asset, index, camera) {
                scene.add_camera(camera);
            }
        }
        for light in &asset.lights {
            if let Some(light) = self.import_light(asset, light) {
                scene.add_light(light);
            }
        }

        log::info!(
            "Imported scene '{}': {} meshes, {} cameras, {} lights, {} textures",
            scene.name(),
            scene.meshes().len(),
            scene.cameras().len(),
            scene.lights().len(),
            scene.textures().len()
        );
        Ok(scene)
    }

    fn import_meshes(&self, asset: &AssetScene, resolver: &mut MaterialResolver<'_>, scene: &mut Scene) -> usize {
        let mut imported = 0;

        for (node_index, node) in asset.nodes.iter().enumerate() {
            if node.meshes.is_empty() {
                continue;
            }
            let world = hierarchy::world_transform(asset, node_index);
            for &mesh_index in &node.meshes {
                let transform = Transform::from_matrix(&world);
                if self.import_mesh(asset, mesh_index, transform, resolver, scene) {
                    imported += 1;
                }
            }
        }

        if self.config.import_unreferenced_meshes {
            for mesh_index in 0..asset.meshes.len() {
                if asset.is_mesh_unreferenced(mesh_index)
                    && self.import_mesh(asset, mesh_index, Transform::identity(), resolver, scene)
                {
                    imported += 1;
                }
            }
        }
        imported
    }

    fn import_mesh(
        &self,
        asset: &AssetScene,
        mesh_index: usize,
        transform: Transform,
        resolver: &mut MaterialResolver<'_>,
        scene: &mut Scene,
    ) -> bool {
        let Some(source) = asset.meshes.get(mesh_index) else {
            log::warn!("Node references missing mesh {mesh_index}");
            return false;
        };
        let Some(geometry) = geometry::convert_mesh(source) else {
            return false;
        };

        let name = if source.name.is_empty() {
            format!("mesh_{mesh_index}")
        } else {
            source.name.clone()
        };
        let mesh = Mesh::from_geometry(name, geometry)
            .with_transform(transform)
            .with_material(resolver.material(source.material));
        log::debug!(
            "Imported mesh '{}' ({} vertices, {} triangles)",
            mesh.name(),
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        scene.add_mesh(mesh)
    }

    fn import_camera(&self, asset: &AssetScene, index: usize, source: &AssetCamera) -> Option<Camera> {
        let node_index = hierarchy::find_node_by_metadata_index(asset, &self.config.camera_index_key, index)
            .or_else(|| hierarchy::find_node_by_name(asset, &source.name));
        let Some(node_index) = node_index else {
            log::warn!("Skipping camera '{}': no node found", source.name);
            return None;
        };

        let aspect = if source.aspect > 0.0 {
            source.aspect
        } else {
            self.config.default_aspect_ratio
        };
        let (near, far) = if source.near > 0.0 && source.far > source.near {
            (source.near, source.far)
        } else {
            log::warn!(
                "Camera '{}': invalid clip planes {}..{}, using defaults",
                source.name,
                source.near,
                source.far
            );
            (DEFAULT_NEAR, DEFAULT_FAR)
        };

        let mut camera = Camera::new(
            source.name.clone(),
            utils::rad_to_deg(source.fov_radians),
            aspect,
            near,
            far,
        );
        let (position, rotation, _) = decompose_trs(&hierarchy::world_transform(asset, node_index));
        camera.transform_mut().set_position(position);
        camera.transform_mut().set_rotation(rotation);

        log::debug!(
            "Imported camera '{}' at node '{}' (fov {:.1}°)",
            source.name,
            asset.nodes[node_index].name,
            camera.field_of_view_degrees()
        );
        Some(camera)
    }

    fn import_light(&self, asset: &AssetScene, source: &AssetLight) -> Option<Light> {
        let Some(node_index) = hierarchy::find_node_by_name(asset, &source.name) else {
            log::warn!("Skipping light '{}': no node found", source.name);
            return None;
        };
        let node = &asset.nodes[node_index];

        let [r, g, b] = source.diffuse.map(|channel| channel.clamp(0.0, 1.0));
        let color = Vec3::new(r, g, b);

        let light = match source.kind {
            AssetLightType::Directional => Light::directional(color, 1.0),
            AssetLightType::Spot => Light::spot(
                color,
                1.0,
                utils::rad_to_deg(source.inner_cone_radians),
                utils::rad_to_deg(source.outer_cone_radians),
                self.spot_range(node),
            ),
            AssetLightType::Point => {
                log::debug!("Point light '{}' is not supported, skipping", source.name);
                return None;
            }
        };
        let mut light = light.with_name(source.name.clone());

        let (position, rotation, _) = decompose_trs(&hierarchy::world_transform(asset, node_index));
        light.transform_mut().set_position(position);
        light.transform_mut().set_rotation(rotation);
        Some(light)
    }

    fn spot_range(&self, node: &AssetNode) -> f32 {
        let default = self.config.default_spot_range;
        let Some(value) = node.metadata.get(&self.config.range_key) else {
            return default;
        };
        match value.as_float().map(|range| range as f32) {
            Some(range) if range.is_finite() && range > 0.0 => range,
            _ => {
                log::warn!(
                    "Node '{}': unusable spot range {value:?}, using {default}",
                    node.name
                );
                default
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::model::{AssetMaterial, AssetMesh, MetadataValue};
    use crate::foundation::math::{Mat4, Quat};
    use crate::render::texture::is_placeholder;
    use crate::scene::LightKind;
    use approx::assert_relative_eq;

    fn grid_mesh(name: &str, triangles: u32) -> AssetMesh {
        let mut mesh = AssetMesh {
            name: name.into(),
            ..AssetMesh::default()
        };
        for t in 0..triangles {
            let x = t as f32;
            mesh.positions.extend([[x, 0.0, 0.0], [x + 1.0, 0.0, 0.0], [x, 1.0, 0.0]]);
            mesh.faces.push(vec![t * 3, t * 3 + 1, t * 3 + 2]);
        }
        mesh
    }

    fn asset_with_meshes(meshes: Vec<AssetMesh>) -> AssetScene {
        let mut asset = AssetScene::default();
        let root = asset.add_node(AssetNode::new("root"), None);
        for index in 0..meshes.len() {
            asset.add_node(AssetNode::new(format!("node_{index}")).with_mesh(index), Some(root));
        }
        asset.meshes = meshes;
        asset
    }

    fn import(asset: &AssetScene) -> Result<Scene, ImportError> {
        SceneImporter::new(ImportConfig::default()).import_parsed(asset, Path::new("."))
    }

    #[test]
    fn test_degenerate_mesh_is_skipped() {
        let asset = asset_with_meshes(vec![grid_mesh("A", 10), grid_mesh("B", 0)]);
        let scene = import(&asset).unwrap();
        assert_eq!(scene.meshes().len(), 1);
        assert_eq!(scene.meshes()[0].name(), "A");
        assert_eq!(scene.meshes()[0].triangle_count(), 10);
    }

    #[test]
    fn test_no_usable_mesh_is_fatal() {
        let asset = asset_with_meshes(vec![grid_mesh("B", 0)]);
        assert!(matches!(import(&asset), Err(ImportError::NoUsableContent(_))));
        assert!(matches!(import(&AssetScene::default()), Err(ImportError::NoUsableContent(_))));
    }

    #[test]
    fn test_mesh_gets_node_world_transform() {
        let mut asset = asset_with_meshes(vec![grid_mesh("A", 1)]);
        asset.nodes[0].transform = AssetNode::new("")
            .with_local_matrix(&Mat4::new_translation(&Vec3::new(0.0, 5.0, 0.0)))
            .transform;
        asset.nodes[1].transform = AssetNode::new("")
            .with_local_matrix(&Mat4::new_nonuniform_scaling(&Vec3::new(2.0, 2.0, 2.0)))
            .transform;

        let scene = import(&asset).unwrap();
        let transform = scene.meshes()[0].transform();
        assert_relative_eq!(transform.position(), Vec3::new(0.0, 5.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(transform.scale(), Vec3::new(2.0, 2.0, 2.0), epsilon = 1e-5);
    }

    #[test]
    fn test_unreferenced_meshes_follow_config() {
        let mut asset = asset_with_meshes(vec![grid_mesh("A", 1)]);
        asset.meshes.push(grid_mesh("loose", 2));

        assert_eq!(import(&asset).unwrap().meshes().len(), 2);

        let mut config = ImportConfig::default();
        config.import_unreferenced_meshes = false;
        let scene = SceneImporter::new(config).import_parsed(&asset, Path::new(".")).unwrap();
        assert_eq!(scene.meshes().len(), 1);
    }

    #[test]
    fn test_material_without_texture_uses_placeholder() {
        let mut asset = asset_with_meshes(vec![grid_mesh("A", 1)]);
        asset.meshes[0].material = Some(0);
        asset.materials.push(AssetMaterial {
            name: "red".into(),
            diffuse_color: Some([1.0, 0.0, 0.0, 1.0]),
            diffuse_texture: None,
        });

        let scene = import(&asset).unwrap();
        let material = scene.meshes()[0].material().unwrap();
        assert_eq!(material.tint, [1.0, 0.0, 0.0, 1.0]);
        let albedo = material.resolved_albedo();
        assert!(is_placeholder(&albedo));
        assert_eq!(albedo.borrow().pixel(0, 0), Some([255, 0, 255, 255]));
    }

    #[test]
    fn test_camera_fov_and_aspect() {
        let mut asset = asset_with_meshes(vec![grid_mesh("A", 1)]);
        asset.add_node(
            AssetNode::new("CameraNode")
                .with_local_matrix(&Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0)))
                .with_metadata("camera_index", MetadataValue::I64(0)),
            Some(0),
        );
        asset.cameras.push(AssetCamera {
            name: "Main".into(),
            fov_radians: std::f32::consts::FRAC_PI_3,
            near: 0.5,
            far: 50.0,
            aspect: 0.0,
        });

        let scene = import(&asset).unwrap();
        let camera = scene.active_camera().unwrap();
        assert_relative_eq!(camera.field_of_view_degrees(), 60.0, epsilon = 1e-4);
        assert_relative_eq!(camera.aspect_ratio(), 16.0 / 9.0);
        assert_relative_eq!(camera.near(), 0.5);
        assert_relative_eq!(camera.far(), 50.0);
        assert_relative_eq!(camera.transform().position(), Vec3::new(1.0, 2.0, 3.0), epsilon = 1e-5);
    }

    #[test]
    fn test_invalid_clip_planes_fall_back_to_defaults() {
        let mut asset = asset_with_meshes(vec![grid_mesh("A", 1)]);
        asset.add_node(AssetNode::new("Flat"), Some(0));
        asset.add_node(AssetNode::new("Inverted"), Some(0));
        for (name, near, far) in [("Flat", 0.0, 10.0), ("Inverted", 5.0, 1.0)] {
            asset.cameras.push(AssetCamera {
                name: name.into(),
                fov_radians: 1.0,
                near,
                far,
                aspect: 1.0,
            });
        }

        let scene = import(&asset).unwrap();
        assert_eq!(scene.cameras().len(), 2);
        for camera in scene.cameras() {
            assert_relative_eq!(camera.near(), DEFAULT_NEAR);
            assert_relative_eq!(camera.far(), DEFAULT_FAR);
        }
    }

    #[test]
    fn test_invalid_config_fallbacks_are_replaced() {
        let config = ImportConfig::default().with_default_aspect_ratio(-1.0);
        assert!(config.validate().is_err());

        let importer = SceneImporter::new(config);
        assert!(importer.config().validate().is_ok());
        assert_relative_eq!(importer.config().default_aspect_ratio, 16.0 / 9.0);

        let mut asset = asset_with_meshes(vec![grid_mesh("A", 1)]);
        asset.add_node(AssetNode::new("Cam"), Some(0));
        asset.cameras.push(AssetCamera {
            name: "Cam".into(),
            fov_radians: 1.0,
            near: 0.1,
            far: 10.0,
            aspect: 0.0,
        });
        let scene = importer.import_parsed(&asset, Path::new(".")).unwrap();
        assert_relative_eq!(scene.active_camera().unwrap().aspect_ratio(), 16.0 / 9.0);
    }

    #[test]
    fn test_mirrored_node_keeps_reflection() {
        let mut asset = asset_with_meshes(vec![grid_mesh("A", 1)]);
        asset.nodes[1].transform = AssetNode::new("")
            .with_local_matrix(&Mat4::new_nonuniform_scaling(&Vec3::new(-1.0, 1.0, 1.0)))
            .transform;

        let scene = import(&asset).unwrap();
        let world = scene.meshes()[0].transform().world_matrix();
        let point = world.transform_point(&nalgebra::Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(point.coords, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-5);
        assert!(world.fixed_view::<3, 3>(0, 0).into_owned().determinant() < 0.0);
    }

    #[test]
    fn test_camera_matched_by_name_and_first_wins() {
        let mut asset = asset_with_meshes(vec![grid_mesh("A", 1)]);
        asset.add_node(AssetNode::new("First"), Some(0));
        asset.add_node(AssetNode::new("Second"), Some(0));
        for name in ["Orphan", "First", "Second"] {
            asset.cameras.push(AssetCamera {
                name: name.into(),
                fov_radians: 1.0,
                near: 0.1,
                far: 10.0,
                aspect: 1.0,
            });
        }

        let scene = import(&asset).unwrap();
        assert_eq!(scene.cameras().len(), 2);
        assert_eq!(scene.active_camera().map(Camera::name), Some("First"));
    }

    #[test]
    fn test_lights_are_imported_by_name() {
        let mut asset = asset_with_meshes(vec![grid_mesh("A", 1)]);
        let down = Quat::from_axis_angle(&Vec3::x_axis(), -std::f32::consts::FRAC_PI_2);
        asset.add_node(
            AssetNode::new("Spot")
                .with_local_matrix(&(Mat4::new_translation(&Vec3::new(0.0, 4.0, 0.0)) * down.to_homogeneous()))
                .with_metadata("range", MetadataValue::String("12.5".into())),
            Some(0),
        );
        let tilt = Quat::from_axis_angle(&Vec3::x_axis(), -std::f32::consts::FRAC_PI_4);
        asset.add_node(AssetNode::new("Sun").with_local_matrix(&tilt.to_homogeneous()), Some(0));
        asset.add_node(AssetNode::new("Bulb"), Some(0));
        asset.lights.push(AssetLight {
            name: "Spot".into(),
            kind: AssetLightType::Spot,
            diffuse: [2.0, 0.5, -1.0],
            inner_cone_radians: 0.2,
            outer_cone_radians: 0.4,
        });
        asset.lights.push(AssetLight {
            name: "Sun".into(),
            kind: AssetLightType::Directional,
            diffuse: [1.0, 1.0, 1.0],
            ..AssetLight::default()
        });
        asset.lights.push(AssetLight {
            name: "Bulb".into(),
            kind: AssetLightType::Point,
            ..AssetLight::default()
        });
        asset.lights.push(AssetLight {
            name: "Nowhere".into(),
            ..AssetLight::default()
        });

        let scene = import(&asset).unwrap();
        assert_eq!(scene.lights().len(), 2);

        let spot = scene.active_light().unwrap();
        assert_eq!(spot.name(), "Spot");
        assert_eq!(spot.color, Vec3::new(1.0, 0.5, 0.0));
        match spot.kind() {
            LightKind::Spot { cos_inner, cos_outer, range } => {
                assert_relative_eq!(cos_inner, 0.2f32.cos(), epsilon = 1e-5);
                assert_relative_eq!(cos_outer, 0.4f32.cos(), epsilon = 1e-5);
                assert_relative_eq!(range, 12.5);
            }
            LightKind::Directional => panic!("expected a spot light"),
        }
        assert_relative_eq!(spot.transform().forward(), -Vec3::y(), epsilon = 1e-5);
        assert_relative_eq!(spot.transform().position(), Vec3::new(0.0, 4.0, 0.0), epsilon = 1e-5);

        let sun = scene.lights().iter().find(|l| l.name() == "Sun").unwrap();
        assert_eq!(sun.kind(), LightKind::Directional);
        let half = std::f32::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(sun.transform().forward(), Vec3::new(0.0, -half, -half), epsilon = 1e-5);
        assert_relative_eq!(sun.direction_to_light(Vec3::zeros()), Vec3::new(0.0, half, half), epsilon = 1e-5);
        assert_relative_eq!(sun.intensity_at(Vec3::zeros(), Vec3::y()), 1.0);
        assert_relative_eq!(sun.intensity_at(Vec3::zeros(), -Vec3::y()), 0.0);
    }

    #[test]
    fn test_bad_spot_range_is_defaulted() {
        let importer = SceneImporter::new(ImportConfig::default());
        for value in [
            MetadataValue::F64(-3.0),
            MetadataValue::F32(f32::NAN),
            MetadataValue::F64(f64::INFINITY),
            MetadataValue::String("wide".into()),
        ] {
            let node = AssetNode::new("n").with_metadata("range", value);
            assert_relative_eq!(importer.spot_range(&node), 10.0);
        }
        assert_relative_eq!(importer.spot_range(&AssetNode::new("n")), 10.0);
        let node = AssetNode::new("n").with_metadata("range", MetadataValue::U32(7));
        assert_relative_eq!(importer.spot_range(&node), 7.0);
    }

    #[test]
    fn test_missing_file_is_parse_error() {
        let importer = SceneImporter::new(ImportConfig::default());
        assert!(matches!(
            importer.import("does/not/exist.ron"),
            Err(ImportError::Parse(AssetError::NotFound(_)))
        ));
    }
}
