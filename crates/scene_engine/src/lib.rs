//! # Scene Engine
//!
//! A minimal real-time 3D scene renderer.
//!
//! ## Features
//!
//! - **Scene graph**: meshes, cameras and lights, each with a cached transform
//! - **Asset import**: node hierarchies, materials, embedded and external
//!   textures, cameras and lights from RON scene files or Wavefront OBJ
//! - **Lighting**: one directional or spot light per draw
//! - **Backend-agnostic rendering**: everything goes through the
//!   [`GraphicsApi`](render::GraphicsApi) trait; a headless backend is included
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApplicationConfig::default();
//!     scene_engine::foundation::logging::init(&config.engine.log_level);
//!
//!     let mut scene = SceneImporter::new(config.import.clone()).import("assets/room.ron")?;
//!     let mut renderer = Renderer::new(HeadlessGraphics::new(), config.renderer.clone())?;
//!
//!     if let Some(stats) = scene.draw(&mut renderer) {
//!         log::info!("{} draw calls", stats.draw_calls);
//!     }
//!
//!     scene.dispose(renderer.gfx_mut());
//!     renderer.release();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod assets;
pub mod config;
pub mod core;
pub mod foundation;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{AssetError, AssetParser, AssetScene, FileAssetParser, ImportError, SceneImporter},
        core::{ApplicationConfig, Config, ImportConfig, RendererConfig},
        foundation::math::{Mat4, Quat, Vec3},
        render::{
            FrameStats, GraphicsApi, HeadlessGraphics, Material, Mesh, RenderError, Renderer, SharedTexture,
            Texture2D,
        },
        scene::{Camera, EntityId, Light, LightKind, Scene, Space, Transform},
    };
}
