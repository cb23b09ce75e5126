//! Surface description used when drawing a mesh

use crate::render::texture::{placeholder_texture, SharedTexture};

/// Tint colour plus an optional albedo texture
///
/// The albedo texture is shared: several materials may reference the same
/// [`SharedTexture`], and it lives as long as its longest holder.
#[derive(Debug, Clone)]
pub struct Material {
    /// Material name
    pub name: String,
    /// RGBA multiplier applied to the sampled albedo
    pub tint: [f32; 4],
    /// Albedo texture; the placeholder is used when absent
    pub albedo: Option<SharedTexture>,
}

impl Material {
    /// Create an untextured white material
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tint: [1.0, 1.0, 1.0, 1.0],
            albedo: None,
        }
    }

    /// Builder pattern: set the tint
    #[must_use]
    pub fn with_tint(mut self, tint: [f32; 4]) -> Self {
        self.tint = tint;
        self
    }

    /// Builder pattern: set the albedo texture
    #[must_use]
    pub fn with_albedo(mut self, texture: SharedTexture) -> Self {
        self.albedo = Some(texture);
        self
    }

    /// Texture to bind for this material, falling back to the placeholder
    #[must_use]
    pub fn resolved_albedo(&self) -> SharedTexture {
        self.albedo.clone().unwrap_or_else(placeholder_texture)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new("default")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::texture::{is_placeholder, Texture2D};

    #[test]
    fn test_missing_albedo_resolves_to_placeholder() {
        let material = Material::new("plain");
        assert!(is_placeholder(&material.resolved_albedo()));
    }

    #[test]
    fn test_albedo_is_shared() {
        let texture = Texture2D::new("shared", 1, 1).unwrap().into_shared();
        let a = Material::new("a").with_albedo(texture.clone());
        let b = Material::new("b").with_albedo(texture.clone()).with_tint([0.5, 0.5, 0.5, 1.0]);
        assert!(std::rc::Rc::ptr_eq(&a.resolved_albedo(), &b.resolved_albedo()));
        assert_eq!(std::rc::Rc::strong_count(&texture), 3);
    }
}
