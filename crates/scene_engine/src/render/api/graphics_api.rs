//! Backend abstraction traits for the rendering system
//!
//! This module defines the operations a graphics binding must provide. All
//! calls assume the backend's context is current on the calling thread.

use bitflags::bitflags;

use crate::render::RenderResult;

/// Handle to a GPU buffer object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Handle to a vertex array (vertex layout + bound buffers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayHandle(pub u32);

/// Handle to a GPU texture object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Handle to a linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Location of a uniform inside a shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

/// What a buffer object holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Interleaved vertex data
    Vertex,
    /// `u32` triangle indices
    Index,
}

/// Layout of one float vertex attribute inside an interleaved buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader input location
    pub location: u32,
    /// Number of `f32` components
    pub components: u32,
    /// Byte offset from the start of a vertex
    pub offset_bytes: u32,
    /// Byte distance between consecutive vertices
    pub stride_bytes: u32,
}

/// Value written to a shader uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// Integer (also used for sampler units)
    Int(i32),
    /// Scalar float
    Float(f32),
    /// 3-component vector
    Vec3([f32; 3]),
    /// 4-component vector
    Vec4([f32; 4]),
    /// Column-major 4x4 matrix
    Mat4([f32; 16]),
}

bitflags! {
    /// Framebuffer attachments cleared at the start of a frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        /// Colour attachment
        const COLOR = 0b01;
        /// Depth attachment
        const DEPTH = 0b10;
    }
}

/// Logical graphics operations the renderer relies on
///
/// Creation calls return a [`RenderResult`] because a backend may run out of
/// memory or reject the data; deletion and binding calls are infallible from
/// the caller's point of view and are expected to log problems themselves.
pub trait GraphicsApi {
    /// Allocate an empty buffer object
    fn create_buffer(&mut self, kind: BufferKind) -> RenderResult<BufferHandle>;

    /// Replace the contents of a buffer
    fn upload_buffer(&mut self, buffer: BufferHandle, data: &[u8]) -> RenderResult<()>;

    /// Free a buffer object
    fn delete_buffer(&mut self, buffer: BufferHandle);

    /// Allocate a vertex array object
    fn create_vertex_array(&mut self) -> RenderResult<VertexArrayHandle>;

    /// Bind a vertex and index buffer to a vertex array
    fn attach_buffers(
        &mut self,
        vertex_array: VertexArrayHandle,
        vertex_buffer: BufferHandle,
        index_buffer: BufferHandle,
    ) -> RenderResult<()>;

    /// Declare one attribute of the vertex array's vertex buffer
    fn vertex_attribute(&mut self, vertex_array: VertexArrayHandle, attribute: VertexAttribute) -> RenderResult<()>;

    /// Free a vertex array object
    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle);

    /// Create a texture from tightly packed RGBA8 pixels
    fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> RenderResult<TextureHandle>;

    /// Free a texture object
    fn delete_texture(&mut self, texture: TextureHandle);

    /// Bind a texture to a numbered texture unit
    fn bind_texture(&mut self, unit: u32, texture: TextureHandle);

    /// Compile and link a shader program
    fn create_program(&mut self, vertex_source: &str, fragment_source: &str) -> RenderResult<ProgramHandle>;

    /// Make a program current
    fn use_program(&mut self, program: ProgramHandle);

    /// Free a shader program
    fn delete_program(&mut self, program: ProgramHandle);

    /// Look up a uniform; `None` when the program has no such active uniform
    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    /// Write a uniform of the current program
    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue);

    /// Set the viewport size in pixels
    fn set_viewport(&mut self, width: u32, height: u32);

    /// Clear framebuffer attachments
    fn clear(&mut self, flags: ClearFlags, color: [f32; 4]);

    /// Draw indexed triangles from a vertex array
    fn draw_indexed(&mut self, vertex_array: VertexArrayHandle, index_count: u32) -> RenderResult<()>;
}
