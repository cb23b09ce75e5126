//! Rendering system
//!
//! Backend-agnostic rendering built on the [`GraphicsApi`] trait. The types in
//! this module never talk to a concrete graphics library; they issue logical
//! operations ("upload vertex data", "bind texture unit 0") against whatever
//! backend the application plugs in.
//!
//! # Resource lifetime
//! GPU objects are released explicitly (`release` / `Scene::dispose`) while the
//! graphics context is still current. Dropping a mesh or texture that still
//! owns GPU objects logs a warning: the handles cannot be freed without the
//! context, so they leak.

pub mod api;
pub mod material;
pub mod mesh;
pub mod primitives;
pub mod renderer;
pub mod shaders;
pub mod texture;

pub use api::{
    BufferHandle, BufferKind, ClearFlags, GraphicsApi, HeadlessGraphics, GpuCall, ProgramHandle,
    TextureHandle, UniformLocation, UniformValue, VertexArrayHandle, VertexAttribute,
};
pub use material::Material;
pub use mesh::{pack_vertices, Face, Mesh, PackedGeometry, Vertex, VertexBuffer, VERTEX_STRIDE};
pub use renderer::{FrameStats, Renderer};
pub use texture::{placeholder_texture, SharedTexture, Texture2D};

use thiserror::Error;

/// High-level rendering error types
///
/// Represents errors that can occur during rendering operations, abstracted
/// from specific graphics API error types.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Renderer initialization failed during setup
    ///
    /// Occurs when the renderer cannot compile its shader program or the
    /// backend refuses the initial configuration.
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// A rendering operation failed during execution
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// Resource creation or management failed
    ///
    /// Occurs when GPU resources (buffers, textures, shaders) cannot be created
    /// or managed properly, typically due to memory constraints or invalid data.
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// CPU-side mesh data is malformed
    #[error("Invalid mesh data: {0}")]
    InvalidMeshData(String),

    /// CPU-side texture data is malformed
    #[error("Invalid texture data: {0}")]
    InvalidTextureData(String),

    /// Backend-specific error occurred
    ///
    /// Wraps backend-specific errors in a generic form for consistent error
    /// handling across different graphics backends.
    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
