//! Scene files
//!
//! `.ron` files hold a serialized [`AssetScene`] and cover every feature of
//! the model (hierarchy, metadata, embedded textures, cameras, lights).
//! [`FileAssetParser`] picks a parser from the file extension.

use std::fs;
use std::path::Path;

use crate::assets::model::AssetScene;
use crate::assets::obj_loader::ObjParser;
use crate::assets::{AssetError, AssetParser};

/// [`AssetParser`] for RON scene files
#[derive(Debug, Clone, Copy, Default)]
pub struct RonSceneParser;

impl RonSceneParser {
    /// Parse RON text
    pub fn parse_str(text: &str) -> Result<AssetScene, AssetError> {
        ron::from_str(text).map_err(|e| AssetError::InvalidData(format!("RON scene: {e}")))
    }

    /// Write a scene as pretty-printed RON
    pub fn save(scene: &AssetScene, path: &Path) -> Result<(), AssetError> {
        let text = ron::ser::to_string_pretty(scene, ron::ser::PrettyConfig::default())
            .map_err(|e| AssetError::InvalidData(format!("RON scene: {e}")))?;
        fs::write(path, text)?;
        Ok(())
    }
}

impl AssetParser for RonSceneParser {
    fn parse(&self, path: &Path) -> Result<AssetScene, AssetError> {
        if !path.exists() {
            return Err(AssetError::NotFound(path.display().to_string()));
        }
        let text = fs::read_to_string(path)?;
        let scene = Self::parse_str(&text)?;
        log::debug!(
            "Parsed scene file {}: {} nodes, {} meshes",
            path.display(),
            scene.nodes.len(),
            scene.meshes.len()
        );
        Ok(scene)
    }
}

/// [`AssetParser`] that dispatches on the file extension
///
/// `.ron` goes to [`RonSceneParser`], `.obj` to [`ObjParser`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FileAssetParser;

impl AssetParser for FileAssetParser {
    fn parse(&self, path: &Path) -> Result<AssetScene, AssetError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("ron") => RonSceneParser.parse(path),
            Some("obj") => ObjParser.parse(path),
            _ => Err(AssetError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::model::{AssetNode, MetadataValue};

    #[test]
    fn test_unknown_extension_is_unsupported() {
        assert!(matches!(
            FileAssetParser.parse(Path::new("scene.fbx")),
            Err(AssetError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            FileAssetParser.parse(Path::new("scene")),
            Err(AssetError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_bad_ron_is_invalid_data() {
        assert!(matches!(
            RonSceneParser::parse_str("(nodes: [oops"),
            Err(AssetError::InvalidData(_))
        ));
    }

    #[test]
    fn test_save_and_parse_file() {
        let path = std::env::temp_dir().join(format!("scene_engine_ron_{}.ron", std::process::id()));
        let mut scene = AssetScene::default();
        scene.add_node(
            AssetNode::new("root").with_metadata("range", MetadataValue::String("4.5".into())),
            None,
        );
        RonSceneParser::save(&scene, &path).unwrap();

        let parsed = FileAssetParser.parse(&path).unwrap();
        assert_eq!(parsed, scene);
        std::fs::remove_file(&path).ok();
    }
}
