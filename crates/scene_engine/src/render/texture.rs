//! CPU-side RGBA8 textures and their GPU counterpart
//!
//! A [`Texture2D`] is created with its pixels, then uploaded once. Uploading an
//! already uploaded texture is a no-op; changing pixels after upload is
//! refused, release the texture first.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::assets::ImageData;
use crate::render::api::{GraphicsApi, TextureHandle};
use crate::render::{RenderError, RenderResult};

/// A texture shared between materials
pub type SharedTexture = Rc<RefCell<Texture2D>>;

/// Colour of the missing-texture placeholder (opaque magenta)
pub const PLACEHOLDER_COLOR: [u8; 4] = [255, 0, 255, 255];

/// Name given to the placeholder texture
pub const PLACEHOLDER_NAME: &str = "placeholder";

/// 2D texture with tightly packed RGBA8 pixels
pub struct Texture2D {
    name: String,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    gpu: Option<TextureHandle>,
}

impl Texture2D {
    /// Create a texture of the given size filled with transparent black
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> RenderResult<Self> {
        let len = Self::expected_len(width, height)?;
        Ok(Self {
            name: name.into(),
            width,
            height,
            pixels: vec![0; len],
            gpu: None,
        })
    }

    /// Create a texture from RGBA8 pixels
    pub fn from_rgba8(name: impl Into<String>, width: u32, height: u32, pixels: Vec<u8>) -> RenderResult<Self> {
        let mut texture = Self::new(name, width, height)?;
        texture.set_pixels(pixels)?;
        Ok(texture)
    }

    /// Create a texture from decoded image data
    pub fn from_image(name: impl Into<String>, image: ImageData) -> RenderResult<Self> {
        Self::from_rgba8(name, image.width, image.height, image.data)
    }

    fn expected_len(width: u32, height: u32) -> RenderResult<usize> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidTextureData(format!(
                "texture size {width}x{height} is empty"
            )));
        }
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| RenderError::InvalidTextureData(format!("texture size {width}x{height} overflows")))
    }

    /// Replace the pixel data
    ///
    /// `pixels` must hold exactly `width * height * 4` bytes. Fails once the
    /// texture is on the GPU.
    pub fn set_pixels(&mut self, pixels: Vec<u8>) -> RenderResult<()> {
        if self.gpu.is_some() {
            return Err(RenderError::InvalidTextureData(format!(
                "texture '{}' is already uploaded; release it before changing pixels",
                self.name
            )));
        }
        let expected = Self::expected_len(self.width, self.height)?;
        if pixels.len() != expected {
            return Err(RenderError::InvalidTextureData(format!(
                "texture '{}' ({}x{}) needs {expected} bytes, got {}",
                self.name,
                self.width,
                self.height,
                pixels.len()
            )));
        }
        self.pixels = pixels;
        Ok(())
    }

    /// Texture name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Width in pixels
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 pixels, row by row
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA value of one pixel
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y as usize * self.width as usize + x as usize) * 4;
        let texel = self.pixels.get(start..start + 4)?;
        Some([texel[0], texel[1], texel[2], texel[3]])
    }

    /// GPU handle, when uploaded
    #[must_use]
    pub fn handle(&self) -> Option<TextureHandle> {
        self.gpu
    }

    /// Whether the texture is on the GPU
    #[must_use]
    pub fn is_uploaded(&self) -> bool {
        self.gpu.is_some()
    }

    /// Upload to the GPU, or return the existing handle
    pub fn upload(&mut self, gfx: &mut dyn GraphicsApi) -> RenderResult<TextureHandle> {
        if let Some(handle) = self.gpu {
            return Ok(handle);
        }
        let handle = gfx.create_texture(self.width, self.height, &self.pixels)?;
        log::trace!("Uploaded texture '{}' ({}x{})", self.name, self.width, self.height);
        self.gpu = Some(handle);
        Ok(handle)
    }

    /// Free the GPU texture; does nothing when not uploaded
    pub fn release(&mut self, gfx: &mut dyn GraphicsApi) {
        if let Some(handle) = self.gpu.take() {
            gfx.delete_texture(handle);
            log::trace!("Released texture '{}'", self.name);
        }
    }

    /// Wrap for sharing between materials
    #[must_use]
    pub fn into_shared(self) -> SharedTexture {
        Rc::new(RefCell::new(self))
    }
}

impl fmt::Debug for Texture2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture2D")
            .field("name", &self.name)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("gpu", &self.gpu)
            .finish_non_exhaustive()
    }
}

impl Drop for Texture2D {
    fn drop(&mut self) {
        if self.gpu.is_some() {
            log::warn!(
                "Texture '{}' dropped while still on the GPU; call release first",
                self.name
            );
        }
    }
}

thread_local! {
    static PLACEHOLDER: SharedTexture = Rc::new(RefCell::new(Texture2D {
        name: PLACEHOLDER_NAME.to_string(),
        width: 1,
        height: 1,
        pixels: PLACEHOLDER_COLOR.to_vec(),
        gpu: None,
    }));
}

/// The shared 1x1 magenta texture used wherever a texture is missing
///
/// Created on first use and reused afterwards. Uploaded lazily like any
/// other texture.
#[must_use]
pub fn placeholder_texture() -> SharedTexture {
    PLACEHOLDER.with(Rc::clone)
}

/// Whether `texture` is the placeholder
#[must_use]
pub fn is_placeholder(texture: &SharedTexture) -> bool {
    PLACEHOLDER.with(|placeholder| Rc::ptr_eq(placeholder, texture))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::HeadlessGraphics;

    #[test]
    fn test_placeholder_is_opaque_magenta() {
        let placeholder = placeholder_texture();
        let texture = placeholder.borrow();
        assert_eq!((texture.width(), texture.height()), (1, 1));
        assert_eq!(texture.pixel(0, 0), Some([255, 0, 255, 255]));
    }

    #[test]
    fn test_placeholder_is_cached() {
        let a = placeholder_texture();
        let b = placeholder_texture();
        assert!(Rc::ptr_eq(&a, &b));
        assert!(is_placeholder(&a));

        let other = Texture2D::from_rgba8("other", 1, 1, vec![0, 0, 0, 255]).unwrap().into_shared();
        assert!(!is_placeholder(&other));
    }

    #[test]
    fn test_pixel_length_is_checked() {
        assert!(Texture2D::from_rgba8("bad", 2, 2, vec![0; 12]).is_err());
        assert!(Texture2D::new("empty", 0, 4).is_err());

        let texture = Texture2D::from_rgba8("ok", 2, 1, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert_eq!(texture.pixel(1, 0), Some([5, 6, 7, 8]));
        assert_eq!(texture.pixel(2, 0), None);
    }

    #[test]
    fn test_upload_once_and_refuse_pixel_changes() {
        let mut gfx = HeadlessGraphics::new();
        let mut texture = Texture2D::new("tex", 2, 2).unwrap();
        let first = texture.upload(&mut gfx).unwrap();
        let second = texture.upload(&mut gfx).unwrap();
        assert_eq!(first, second);
        assert_eq!(gfx.live_texture_count(), 1);

        assert!(texture.set_pixels(vec![255; 16]).is_err());

        texture.release(&mut gfx);
        assert_eq!(gfx.live_texture_count(), 0);
        texture.set_pixels(vec![255; 16]).unwrap();
    }
}
