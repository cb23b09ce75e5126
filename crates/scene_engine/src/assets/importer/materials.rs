//! Material and texture resolution
//!
//! Materials and textures are resolved once per import and shared between
//! every mesh that uses them. Anything that cannot be resolved falls back to
//! the placeholder texture with a warning.

use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use crate::assets::image_loader::ImageDecoder;
use crate::assets::model::{AssetScene, AssetTexture, Texel, TexelData, EMBEDDED_TEXTURE_PREFIX};
use crate::assets::AssetError;
use crate::render::texture::{placeholder_texture, SharedTexture, Texture2D};
use crate::render::Material;

/// Per-import cache of engine materials and textures
pub struct MaterialResolver<'a> {
    asset: &'a AssetScene,
    source_dir: &'a Path,
    decoder: &'a dyn ImageDecoder,
    textures: HashMap<String, SharedTexture>,
    materials: HashMap<usize, Rc<Material>>,
    fallback: Option<Rc<Material>>,
}

impl<'a> MaterialResolver<'a> {
    /// Create a resolver; external texture paths are relative to `source_dir`
    pub fn new(asset: &'a AssetScene, source_dir: &'a Path, decoder: &'a dyn ImageDecoder) -> Self {
        Self {
            asset,
            source_dir,
            decoder,
            textures: HashMap::new(),
            materials: HashMap::new(),
            fallback: None,
        }
    }

    /// Engine material for source material slot `index`
    ///
    /// Meshes without a slot, or with a slot that does not exist, share a
    /// white material showing the placeholder texture.
    pub fn material(&mut self, index: Option<usize>) -> Rc<Material> {
        let Some(index) = index else {
            return self.fallback_material();
        };
        if let Some(material) = self.materials.get(&index) {
            return Rc::clone(material);
        }
        let Some(source) = self.asset.materials.get(index) else {
            log::warn!("Material index {index} out of range, using default material");
            return self.fallback_material();
        };

        let name = if source.name.is_empty() {
            format!("material_{index}")
        } else {
            source.name.clone()
        };
        let albedo = match source.diffuse_texture.as_deref() {
            Some(reference) => self.texture(reference),
            None => placeholder_texture(),
        };
        let mut material = Material::new(name).with_albedo(albedo);
        if let Some(color) = source.diffuse_color {
            material.tint = color;
        }

        let material = Rc::new(material);
        self.materials.insert(index, Rc::clone(&material));
        material
    }

    fn fallback_material(&mut self) -> Rc<Material> {
        Rc::clone(
            self.fallback
                .get_or_insert_with(|| Rc::new(Material::new("default").with_albedo(placeholder_texture()))),
        )
    }

    /// Texture for a diffuse texture reference, or the placeholder
    pub fn texture(&mut self, reference: &str) -> SharedTexture {
        if let Some(texture) = self.textures.get(reference) {
            return Rc::clone(texture);
        }
        let texture = match self.load_texture(reference) {
            Ok(texture) => {
                log::debug!(
                    "Resolved texture '{reference}' ({}x{})",
                    texture.width(),
                    texture.height()
                );
                texture.into_shared()
            }
            Err(e) => {
                log::warn!("Texture '{reference}' unavailable ({e}), using placeholder");
                placeholder_texture()
            }
        };
        self.textures.insert(reference.to_string(), Rc::clone(&texture));
        texture
    }

    fn load_texture(&self, reference: &str) -> Result<Texture2D, AssetError> {
        if let Some(index) = self.embedded_index(reference)? {
            return self.decode_embedded(index, reference);
        }
        let path = self.source_dir.join(reference);
        let image = self.decoder.decode_file(&path)?;
        Texture2D::from_image(reference, image).map_err(|e| AssetError::InvalidData(e.to_string()))
    }

    /// Embedded texture index for `reference`, if it names one
    ///
    /// `*N` always refers to the embedded table and fails when `N` is out of
    /// range. Other references match an embedded texture by file name hint.
    fn embedded_index(&self, reference: &str) -> Result<Option<usize>, AssetError> {
        let textures = &self.asset.textures;
        if let Some(number) = reference.strip_prefix(EMBEDDED_TEXTURE_PREFIX) {
            let index: usize = number
                .parse()
                .map_err(|_| AssetError::InvalidData(format!("bad embedded texture reference '{reference}'")))?;
            if index >= textures.len() {
                return Err(AssetError::NotFound(format!(
                    "embedded texture {index} (asset has {})",
                    textures.len()
                )));
            }
            return Ok(Some(index));
        }

        let file_name = Path::new(reference).file_name();
        Ok(textures.iter().position(|texture| {
            !texture.filename_hint.is_empty()
                && (texture.filename_hint == reference || Path::new(&texture.filename_hint).file_name() == file_name)
        }))
    }

    fn decode_embedded(&self, index: usize, reference: &str) -> Result<Texture2D, AssetError> {
        let texture = &self.asset.textures[index];
        let name = if texture.filename_hint.is_empty() {
            reference.to_string()
        } else {
            texture.filename_hint.clone()
        };
        let (width, height, pixels) = match &texture.data {
            TexelData::Compressed(bytes) => {
                let image = self.decoder.decode(bytes)?;
                (image.width, image.height, image.data)
            }
            TexelData::Raw(texels) => (texture.width, texture.height, expand_texels(texture, texels)?),
        };
        Texture2D::from_rgba8(name, width, height, pixels).map_err(|e| AssetError::InvalidData(e.to_string()))
    }
}

fn expand_texels(texture: &AssetTexture, texels: &[Texel]) -> Result<Vec<u8>, AssetError> {
    let expected = texture.width as usize * texture.height as usize;
    if expected == 0 || texels.len() != expected {
        return Err(AssetError::InvalidData(format!(
            "raw texture {}x{} has {} texels",
            texture.width,
            texture.height,
            texels.len()
        )));
    }
    Ok(texels.iter().flat_map(|texel| texel.to_rgba()).collect())
}
