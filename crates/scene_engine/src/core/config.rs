//! # Unified Configuration System
//!
//! Configuration structures for the engine subsystems. Every structure has
//! sensible defaults and can be loaded from TOML or RON through the [`Config`]
//! trait, so an application only writes down the values it wants to change.
//!
//! ## Configuration Categories
//!
//! - **Engine Config**: Logging behaviour
//! - **Import Config**: Fallback values and metadata keys used by the scene importer
//! - **Renderer Config**: Internal render resolution, clear colour, lighting constants

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};

/// # Engine Configuration
///
/// Core engine behaviour that is not tied to a single subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
}

impl EngineConfig {
    /// Create a new engine configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }

    /// Set log level
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Import Configuration
///
/// Fallback values applied while converting a parsed asset into a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Aspect ratio used when the source camera carries none (or a non-positive one)
    pub default_aspect_ratio: f32,
    /// Spot light range used when node metadata has no usable range value
    pub default_spot_range: f32,
    /// Node metadata key holding an explicit camera index annotation
    pub camera_index_key: String,
    /// Node metadata key holding a spot light range
    pub range_key: String,
    /// Import meshes that no node references, placed at the origin
    pub import_unreferenced_meshes: bool,
}

impl ImportConfig {
    /// Create a new import configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_aspect_ratio: 16.0 / 9.0,
            default_spot_range: 10.0,
            camera_index_key: "camera_index".to_string(),
            range_key: "range".to_string(),
            import_unreferenced_meshes: true,
        }
    }

    /// Set the fallback aspect ratio
    #[must_use]
    pub fn with_default_aspect_ratio(mut self, aspect: f32) -> Self {
        self.default_aspect_ratio = aspect;
        self
    }

    /// Set the fallback spot light range
    #[must_use]
    pub fn with_default_spot_range(mut self, range: f32) -> Self {
        self.default_spot_range = range;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.default_aspect_ratio.is_finite() && self.default_aspect_ratio > 0.0) {
            return Err(format!(
                "Default aspect ratio must be positive, got {}",
                self.default_aspect_ratio
            ));
        }
        if !(self.default_spot_range.is_finite() && self.default_spot_range > 0.0) {
            return Err(format!(
                "Default spot range must be positive, got {}",
                self.default_spot_range
            ));
        }
        if self.camera_index_key.is_empty() || self.range_key.is_empty() {
            return Err("Metadata keys cannot be empty".to_string());
        }
        Ok(())
    }

    /// Replace every field that fails [`Self::validate`] with its default
    #[must_use]
    pub fn or_defaults(mut self) -> Self {
        let defaults = Self::new();
        if !(self.default_aspect_ratio.is_finite() && self.default_aspect_ratio > 0.0) {
            log::warn!(
                "Invalid default aspect ratio {}, using {}",
                self.default_aspect_ratio,
                defaults.default_aspect_ratio
            );
            self.default_aspect_ratio = defaults.default_aspect_ratio;
        }
        if !(self.default_spot_range.is_finite() && self.default_spot_range > 0.0) {
            log::warn!(
                "Invalid default spot range {}, using {}",
                self.default_spot_range,
                defaults.default_spot_range
            );
            self.default_spot_range = defaults.default_spot_range;
        }
        if self.camera_index_key.is_empty() {
            self.camera_index_key = defaults.camera_index_key;
        }
        if self.range_key.is_empty() {
            self.range_key = defaults.range_key;
        }
        self
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Renderer Configuration
///
/// The renderer draws at a fixed internal resolution; window size changes are
/// the caller's business and never leak into these values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Internal render target width in pixels
    pub render_width: u32,
    /// Internal render target height in pixels
    pub render_height: u32,
    /// RGBA colour the frame is cleared to
    pub clear_color: [f32; 4],
    /// Ambient term added to every lit fragment
    pub ambient_intensity: f32,
}

impl RendererConfig {
    /// Create a new renderer configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            render_width: 1280,
            render_height: 720,
            clear_color: [0.1, 0.1, 0.12, 1.0],
            ambient_intensity: 0.15,
        }
    }

    /// Set the internal render resolution
    #[must_use]
    pub fn with_render_resolution(mut self, width: u32, height: u32) -> Self {
        self.render_width = width;
        self.render_height = height;
        self
    }

    /// Aspect ratio of the internal render resolution
    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        self.render_width as f32 / self.render_height.max(1) as f32
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.render_width == 0 || self.render_height == 0 {
            return Err(format!(
                "Render resolution must be non-zero, got {}x{}",
                self.render_width, self.render_height
            ));
        }
        if !(0.0..=1.0).contains(&self.ambient_intensity) {
            return Err(format!(
                "Ambient intensity must be within [0, 1], got {}",
                self.ambient_intensity
            ));
        }
        Ok(())
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Scene import configuration
    pub import: ImportConfig,
    /// Rendering configuration
    pub renderer: RendererConfig,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), String> {
        self.import.validate()?;
        self.renderer.validate()?;
        Ok(())
    }
}

impl Config for ApplicationConfig {}
