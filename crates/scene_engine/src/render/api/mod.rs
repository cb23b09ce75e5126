//! Graphics backend abstraction
//!
//! [`GraphicsApi`] is the seam between the renderer and a concrete graphics
//! library. [`HeadlessGraphics`] implements it without a GPU and is what the
//! tests and the inspection tool run against.

pub mod graphics_api;
pub mod headless;

pub use graphics_api::{
    BufferHandle, BufferKind, ClearFlags, GraphicsApi, ProgramHandle, TextureHandle, UniformLocation,
    UniformValue, VertexArrayHandle, VertexAttribute,
};
pub use headless::{GpuCall, HeadlessGraphics};
