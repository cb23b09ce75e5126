//! Image decoding for texture data
//!
//! Compressed image bytes (PNG, JPEG) are decoded with the `image` crate and
//! always converted to RGBA8.

use std::path::Path;

use crate::assets::AssetError;

/// Decoded image data ready for GPU upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Raw RGBA pixel data
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageData {
    /// Load an image from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path_ref = path.as_ref();
        if !path_ref.exists() {
            return Err(AssetError::NotFound(path_ref.display().to_string()));
        }

        log::debug!("Loading image from: {:?}", path_ref);

        let img = image::open(path_ref)
            .map_err(|e| AssetError::LoadFailed(format!("Failed to load image {}: {e}", path_ref.display())))?;
        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();

        log::debug!("Loaded image {}x{} from {:?}", width, height, path_ref);

        Ok(Self {
            data: rgba_img.into_raw(),
            width,
            height,
        })
    }

    /// Decode an image held in memory (embedded textures)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| AssetError::LoadFailed(format!("Failed to load image from bytes: {e}")))?;

        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();

        log::debug!("Decoded image {}x{} from memory", width, height);

        Ok(Self {
            data: rgba_img.into_raw(),
            width,
            height,
        })
    }

    /// Create a solid colour image
    #[must_use]
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = width as usize * height as usize;
        Self {
            data: color.repeat(pixel_count),
            width,
            height,
        }
    }

    /// Size of the pixel data in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

/// Turns compressed image bytes into RGBA8 pixels
pub trait ImageDecoder {
    /// Decode an in-memory image
    fn decode(&self, bytes: &[u8]) -> Result<ImageData, AssetError>;

    /// Decode an image file
    fn decode_file(&self, path: &Path) -> Result<ImageData, AssetError> {
        if !path.exists() {
            return Err(AssetError::NotFound(path.display().to_string()));
        }
        let bytes = std::fs::read(path)?;
        self.decode(&bytes)
    }
}

/// [`ImageDecoder`] backed by the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateDecoder;

impl ImageDecoder for ImageCrateDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<ImageData, AssetError> {
        ImageData::from_bytes(bytes)
    }

    fn decode_file(&self, path: &Path) -> Result<ImageData, AssetError> {
        ImageData::from_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba(color));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_solid_color_image() {
        let img = ImageData::solid_color(4, 4, [255, 0, 0, 255]);
        assert_eq!(img.width, 4);
        assert_eq!(img.height, 4);
        assert_eq!(img.size_bytes(), 4 * 4 * 4);
        assert_eq!(&img.data[0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_decode_png() {
        let decoded = ImageCrateDecoder.decode(&png_bytes(3, 2, [1, 2, 3, 4])).unwrap();
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert_eq!(decoded, ImageData::solid_color(3, 2, [1, 2, 3, 4]));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            ImageCrateDecoder.decode(b"not an image"),
            Err(AssetError::LoadFailed(_))
        ));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let missing = Path::new("definitely/not/here.png");
        assert!(matches!(
            ImageCrateDecoder.decode_file(missing),
            Err(AssetError::NotFound(_))
        ));
    }
}
