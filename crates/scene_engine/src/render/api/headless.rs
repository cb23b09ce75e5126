//! Headless graphics backend
//!
//! Implements [`GraphicsApi`] entirely on the CPU. It hands out handles,
//! validates that every handle it is given is alive, keeps the most recent
//! uniform values, and records each call as a [`GpuCall`]. Nothing is
//! rasterized.
//!
//! Failure injection (`set_fail_buffer_creation`, `with_missing_uniform`)
//! lets callers exercise the renderer's soft-failure paths.

use std::collections::{HashMap, HashSet};

use super::graphics_api::{
    BufferHandle, BufferKind, ClearFlags, GraphicsApi, ProgramHandle, TextureHandle, UniformLocation,
    UniformValue, VertexArrayHandle, VertexAttribute,
};
use crate::render::{RenderError, RenderResult};

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    /// A buffer object was created
    CreateBuffer(BufferHandle, BufferKind),
    /// Data was uploaded into a buffer
    UploadBuffer {
        /// Target buffer
        buffer: BufferHandle,
        /// Size of the upload in bytes
        bytes: usize,
    },
    /// A buffer object was deleted
    DeleteBuffer(BufferHandle),
    /// A vertex array was created
    CreateVertexArray(VertexArrayHandle),
    /// Buffers were attached to a vertex array
    AttachBuffers(VertexArrayHandle, BufferHandle, BufferHandle),
    /// A vertex attribute was declared
    VertexAttribute(VertexArrayHandle, VertexAttribute),
    /// A vertex array was deleted
    DeleteVertexArray(VertexArrayHandle),
    /// A texture was created
    CreateTexture {
        /// New texture
        texture: TextureHandle,
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// A texture was deleted
    DeleteTexture(TextureHandle),
    /// A texture was bound to a unit
    BindTexture {
        /// Texture unit
        unit: u32,
        /// Bound texture
        texture: TextureHandle,
    },
    /// A program was created
    CreateProgram(ProgramHandle),
    /// A program was made current
    UseProgram(ProgramHandle),
    /// A program was deleted
    DeleteProgram(ProgramHandle),
    /// A uniform was written
    SetUniform {
        /// Uniform name
        name: String,
        /// Written value
        value: UniformValue,
    },
    /// The viewport changed
    SetViewport(u32, u32),
    /// The framebuffer was cleared
    Clear(ClearFlags),
    /// Indexed triangles were drawn
    DrawIndexed {
        /// Source vertex array
        vertex_array: VertexArrayHandle,
        /// Number of indices
        index_count: u32,
    },
}

#[derive(Debug, Default)]
struct VertexArrayState {
    buffers: Option<(BufferHandle, BufferHandle)>,
    attributes: Vec<VertexAttribute>,
}

/// CPU-only [`GraphicsApi`] implementation
///
/// Every call is appended to a log that grows without bound by default. Long
/// running callers should either call [`HeadlessGraphics::clear_calls`] between
/// frames or keep only the newest calls with
/// [`HeadlessGraphics::with_call_limit`].
#[derive(Debug, Default)]
pub struct HeadlessGraphics {
    next_handle: u32,
    buffers: HashMap<BufferHandle, (BufferKind, usize)>,
    vertex_arrays: HashMap<VertexArrayHandle, VertexArrayState>,
    textures: HashMap<TextureHandle, (u32, u32)>,
    programs: HashSet<ProgramHandle>,
    current_program: Option<ProgramHandle>,
    uniform_names: HashMap<UniformLocation, String>,
    uniform_values: HashMap<String, UniformValue>,
    missing_uniforms: HashSet<String>,
    bound_textures: HashMap<u32, TextureHandle>,
    fail_buffer_creation: bool,
    calls: Vec<GpuCall>,
    call_limit: Option<usize>,
}

impl HeadlessGraphics {
    /// Create an empty backend
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            ..Self::default()
        }
    }

    /// Builder pattern: pretend the program has no active uniform called `name`
    #[must_use]
    pub fn with_missing_uniform(mut self, name: impl Into<String>) -> Self {
        self.missing_uniforms.insert(name.into());
        self
    }

    /// Builder pattern: keep at most `limit` of the newest recorded calls
    #[must_use]
    pub fn with_call_limit(mut self, limit: usize) -> Self {
        self.call_limit = Some(limit);
        self
    }

    /// Make every subsequent `create_buffer` call fail
    pub fn set_fail_buffer_creation(&mut self, fail: bool) {
        self.fail_buffer_creation = fail;
    }

    /// All calls recorded so far
    #[must_use]
    pub fn calls(&self) -> &[GpuCall] {
        &self.calls
    }

    /// Forget the recorded calls (live objects are kept)
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn record(&mut self, call: GpuCall) {
        self.calls.push(call);
        if let Some(limit) = self.call_limit {
            if self.calls.len() > limit {
                let excess = self.calls.len() - limit;
                self.calls.drain(..excess);
            }
        }
    }

    /// Number of live buffer objects
    #[must_use]
    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Number of live vertex arrays
    #[must_use]
    pub fn live_vertex_array_count(&self) -> usize {
        self.vertex_arrays.len()
    }

    /// Number of live textures
    #[must_use]
    pub fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Number of live programs
    #[must_use]
    pub fn live_program_count(&self) -> usize {
        self.programs.len()
    }

    /// Number of recorded draw calls
    #[must_use]
    pub fn draw_call_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, GpuCall::DrawIndexed { .. }))
            .count()
    }

    /// Most recent value written to the uniform `name`
    #[must_use]
    pub fn uniform_value(&self, name: &str) -> Option<UniformValue> {
        self.uniform_values.get(name).copied()
    }

    /// Texture currently bound to `unit`
    #[must_use]
    pub fn bound_texture(&self, unit: u32) -> Option<TextureHandle> {
        self.bound_textures.get(&unit).copied()
    }

    /// Size of a live texture
    #[must_use]
    pub fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.textures.get(&texture).copied()
    }

    /// Attributes declared on a live vertex array
    #[must_use]
    pub fn vertex_attributes(&self, vertex_array: VertexArrayHandle) -> Option<&[VertexAttribute]> {
        self.vertex_arrays
            .get(&vertex_array)
            .map(|state| state.attributes.as_slice())
    }

    fn allocate_handle(&mut self) -> u32 {
        let handle = self.next_handle.max(1);
        self.next_handle = handle + 1;
        handle
    }

    fn unknown(kind: &str, id: u32) -> RenderError {
        RenderError::BackendError(format!("unknown {kind} handle {id}"))
    }
}

impl GraphicsApi for HeadlessGraphics {
    fn create_buffer(&mut self, kind: BufferKind) -> RenderResult<BufferHandle> {
        if self.fail_buffer_creation {
            return Err(RenderError::ResourceCreationFailed(format!(
                "headless backend refused {kind:?} buffer"
            )));
        }
        let buffer = BufferHandle(self.allocate_handle());
        self.buffers.insert(buffer, (kind, 0));
        self.record(GpuCall::CreateBuffer(buffer, kind));
        Ok(buffer)
    }

    fn upload_buffer(&mut self, buffer: BufferHandle, data: &[u8]) -> RenderResult<()> {
        let entry = self
            .buffers
            .get_mut(&buffer)
            .ok_or_else(|| Self::unknown("buffer", buffer.0))?;
        entry.1 = data.len();
        self.record(GpuCall::UploadBuffer {
            buffer,
            bytes: data.len(),
        });
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(&buffer).is_none() {
            log::warn!("Headless backend: deleting unknown buffer {}", buffer.0);
            return;
        }
        self.record(GpuCall::DeleteBuffer(buffer));
    }

    fn create_vertex_array(&mut self) -> RenderResult<VertexArrayHandle> {
        let vertex_array = VertexArrayHandle(self.allocate_handle());
        self.vertex_arrays.insert(vertex_array, VertexArrayState::default());
        self.record(GpuCall::CreateVertexArray(vertex_array));
        Ok(vertex_array)
    }

    fn attach_buffers(
        &mut self,
        vertex_array: VertexArrayHandle,
        vertex_buffer: BufferHandle,
        index_buffer: BufferHandle,
    ) -> RenderResult<()> {
        match self.buffers.get(&vertex_buffer) {
            Some((BufferKind::Vertex, _)) => {}
            Some(_) => {
                return Err(RenderError::BackendError(format!(
                    "buffer {} is not a vertex buffer",
                    vertex_buffer.0
                )))
            }
            None => return Err(Self::unknown("buffer", vertex_buffer.0)),
        }
        match self.buffers.get(&index_buffer) {
            Some((BufferKind::Index, _)) => {}
            Some(_) => {
                return Err(RenderError::BackendError(format!(
                    "buffer {} is not an index buffer",
                    index_buffer.0
                )))
            }
            None => return Err(Self::unknown("buffer", index_buffer.0)),
        }

        let state = self
            .vertex_arrays
            .get_mut(&vertex_array)
            .ok_or_else(|| Self::unknown("vertex array", vertex_array.0))?;
        state.buffers = Some((vertex_buffer, index_buffer));
        self.record(GpuCall::AttachBuffers(vertex_array, vertex_buffer, index_buffer));
        Ok(())
    }

    fn vertex_attribute(&mut self, vertex_array: VertexArrayHandle, attribute: VertexAttribute) -> RenderResult<()> {
        let state = self
            .vertex_arrays
            .get_mut(&vertex_array)
            .ok_or_else(|| Self::unknown("vertex array", vertex_array.0))?;
        if state.buffers.is_none() {
            return Err(RenderError::BackendError(format!(
                "vertex array {} has no vertex buffer attached",
                vertex_array.0
            )));
        }
        state.attributes.push(attribute);
        self.record(GpuCall::VertexAttribute(vertex_array, attribute));
        Ok(())
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle) {
        if self.vertex_arrays.remove(&vertex_array).is_none() {
            log::warn!("Headless backend: deleting unknown vertex array {}", vertex_array.0);
            return;
        }
        self.record(GpuCall::DeleteVertexArray(vertex_array));
    }

    fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> RenderResult<TextureHandle> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || rgba.len() != expected {
            return Err(RenderError::ResourceCreationFailed(format!(
                "texture {width}x{height} needs {expected} bytes, got {}",
                rgba.len()
            )));
        }
        let texture = TextureHandle(self.allocate_handle());
        self.textures.insert(texture, (width, height));
        self.record(GpuCall::CreateTexture { texture, width, height });
        Ok(texture)
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(&texture).is_none() {
            log::warn!("Headless backend: deleting unknown texture {}", texture.0);
            return;
        }
        self.bound_textures.retain(|_, bound| *bound != texture);
        self.record(GpuCall::DeleteTexture(texture));
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        if !self.textures.contains_key(&texture) {
            log::error!("Headless backend: binding unknown texture {} to unit {}", texture.0, unit);
            return;
        }
        self.bound_textures.insert(unit, texture);
        self.record(GpuCall::BindTexture { unit, texture });
    }

    fn create_program(&mut self, vertex_source: &str, fragment_source: &str) -> RenderResult<ProgramHandle> {
        if vertex_source.trim().is_empty() || fragment_source.trim().is_empty() {
            return Err(RenderError::ResourceCreationFailed(
                "shader source is empty".to_string(),
            ));
        }
        let program = ProgramHandle(self.allocate_handle());
        self.programs.insert(program);
        self.record(GpuCall::CreateProgram(program));
        Ok(program)
    }

    fn use_program(&mut self, program: ProgramHandle) {
        if !self.programs.contains(&program) {
            log::error!("Headless backend: using unknown program {}", program.0);
            return;
        }
        self.current_program = Some(program);
        self.record(GpuCall::UseProgram(program));
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if !self.programs.remove(&program) {
            log::warn!("Headless backend: deleting unknown program {}", program.0);
            return;
        }
        if self.current_program == Some(program) {
            self.current_program = None;
        }
        self.record(GpuCall::DeleteProgram(program));
    }

    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        if !self.programs.contains(&program) || self.missing_uniforms.contains(name) {
            return None;
        }
        if let Some((location, _)) = self.uniform_names.iter().find(|(_, known)| known.as_str() == name) {
            return Some(*location);
        }
        let location = UniformLocation(self.uniform_names.len() as i32);
        self.uniform_names.insert(location, name.to_string());
        Some(location)
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        if self.current_program.is_none() {
            log::error!("Headless backend: setting uniform {} with no program in use", location.0);
            return;
        }
        let Some(name) = self.uniform_names.get(&location).cloned() else {
            log::error!("Headless backend: unknown uniform location {}", location.0);
            return;
        };
        self.uniform_values.insert(name.clone(), value);
        self.record(GpuCall::SetUniform { name, value });
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.record(GpuCall::SetViewport(width, height));
    }

    fn clear(&mut self, flags: ClearFlags, _color: [f32; 4]) {
        self.record(GpuCall::Clear(flags));
    }

    fn draw_indexed(&mut self, vertex_array: VertexArrayHandle, index_count: u32) -> RenderResult<()> {
        let state = self
            .vertex_arrays
            .get(&vertex_array)
            .ok_or_else(|| Self::unknown("vertex array", vertex_array.0))?;
        if state.buffers.is_none() {
            return Err(RenderError::RenderingFailed(format!(
                "vertex array {} has no buffers attached",
                vertex_array.0
            )));
        }
        if index_count % 3 != 0 {
            return Err(RenderError::RenderingFailed(format!(
                "index count {index_count} is not a multiple of 3"
            )));
        }
        self.record(GpuCall::DrawIndexed {
            vertex_array,
            index_count,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_unique_and_tracked() {
        let mut gfx = HeadlessGraphics::new();
        let a = gfx.create_buffer(BufferKind::Vertex).unwrap();
        let b = gfx.create_buffer(BufferKind::Index).unwrap();
        assert_ne!(a, b);
        assert_eq!(gfx.live_buffer_count(), 2);

        gfx.delete_buffer(a);
        assert_eq!(gfx.live_buffer_count(), 1);
        assert!(gfx.upload_buffer(a, &[0; 4]).is_err());
    }

    #[test]
    fn test_texture_size_is_validated() {
        let mut gfx = HeadlessGraphics::new();
        assert!(gfx.create_texture(2, 2, &[0; 15]).is_err());
        let texture = gfx.create_texture(2, 2, &[0; 16]).unwrap();
        assert_eq!(gfx.texture_size(texture), Some((2, 2)));
    }

    #[test]
    fn test_missing_uniform_has_no_location() {
        let mut gfx = HeadlessGraphics::new().with_missing_uniform("uTint");
        let program = gfx.create_program("void main() {}", "void main() {}").unwrap();
        assert!(gfx.uniform_location(program, "uTint").is_none());

        let location = gfx.uniform_location(program, "uModel").unwrap();
        assert_eq!(gfx.uniform_location(program, "uModel"), Some(location));

        gfx.use_program(program);
        gfx.set_uniform(location, UniformValue::Float(2.0));
        assert_eq!(gfx.uniform_value("uModel"), Some(UniformValue::Float(2.0)));
    }

    #[test]
    fn test_draw_requires_attached_buffers() {
        let mut gfx = HeadlessGraphics::new();
        let vertex_array = gfx.create_vertex_array().unwrap();
        assert!(gfx.draw_indexed(vertex_array, 3).is_err());

        let vertices = gfx.create_buffer(BufferKind::Vertex).unwrap();
        let indices = gfx.create_buffer(BufferKind::Index).unwrap();
        assert!(gfx.attach_buffers(vertex_array, indices, vertices).is_err());
        gfx.attach_buffers(vertex_array, vertices, indices).unwrap();
        gfx.draw_indexed(vertex_array, 3).unwrap();
        assert_eq!(gfx.draw_call_count(), 1);
    }

    #[test]
    fn test_buffer_creation_failure_injection() {
        let mut gfx = HeadlessGraphics::new();
        gfx.set_fail_buffer_creation(true);
        assert!(matches!(
            gfx.create_buffer(BufferKind::Vertex),
            Err(RenderError::ResourceCreationFailed(_))
        ));
    }

    #[test]
    fn test_call_log_keeps_newest_calls_within_limit() {
        let mut gfx = HeadlessGraphics::new().with_call_limit(3);
        let mut last = None;
        for _ in 0..10 {
            last = Some(gfx.create_buffer(BufferKind::Vertex).unwrap());
        }
        assert_eq!(gfx.calls().len(), 3);
        assert_eq!(gfx.live_buffer_count(), 10);
        assert_eq!(gfx.calls().last(), last.map(|b| GpuCall::CreateBuffer(b, BufferKind::Vertex)).as_ref());

        gfx.clear_calls();
        assert!(gfx.calls().is_empty());
        assert_eq!(gfx.live_buffer_count(), 10);
    }
}
