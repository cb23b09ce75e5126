//! Asset loading
//!
//! External files are turned into an [`AssetScene`], a plain data model of
//! nodes, meshes, materials, textures, cameras and lights. The
//! [`SceneImporter`] then converts that model into an engine
//! [`Scene`](crate::scene::Scene).
//!
//! ```text
//! file ──AssetParser──▶ AssetScene ──SceneImporter──▶ Scene
//!                                        │
//!                                  ImageDecoder (textures)
//! ```

pub mod image_loader;
pub mod importer;
pub mod model;
pub mod obj_loader;
pub mod scene_file;

use std::path::Path;

use thiserror::Error;

pub use image_loader::{ImageCrateDecoder, ImageData, ImageDecoder};
pub use importer::{ImportError, SceneImporter};
pub use model::{
    AssetCamera, AssetLight, AssetLightType, AssetMaterial, AssetMesh, AssetNode, AssetScene, AssetTexture,
    MetadataValue, PrimitiveType, Texel, TexelData,
};
pub use obj_loader::ObjParser;
pub use scene_file::{FileAssetParser, RonSceneParser};

/// Produces an [`AssetScene`] from a file
pub trait AssetParser {
    /// Parse the file at `path`
    fn parse(&self, path: &Path) -> Result<AssetScene, AssetError>;
}

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset not found
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Failed to load asset
    #[error("Failed to load asset: {0}")]
    LoadFailed(String),

    /// Invalid asset data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Unsupported asset format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// IO error during asset loading
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
