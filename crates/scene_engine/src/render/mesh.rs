//! Mesh geometry and its GPU buffers
//!
//! Every mesh stores its vertices in one interleaved float array with a fixed
//! stride of [`VERTEX_STRIDE`] floats:
//!
//! | floats | attribute  | byte offset |
//! |--------|------------|-------------|
//! | 0..3   | position   | 0           |
//! | 3..6   | normal     | 12          |
//! | 6..10  | colour     | 24          |
//! | 10..12 | uv         | 40          |
//!
//! Three construction paths end in this layout: procedural primitives
//! (see [`crate::render::primitives`]), pre-packed arrays
//! ([`Mesh::from_packed`]) and logical vertices plus faces
//! ([`Mesh::from_vertices`] via [`pack_vertices`]).
//!
//! GPU buffers are owned by the mesh and must be freed with
//! [`Mesh::release`] while the graphics context is current.

use std::rc::Rc;

use crate::render::api::{BufferHandle, BufferKind, GraphicsApi, VertexArrayHandle, VertexAttribute};
use crate::render::{Material, RenderError, RenderResult};
use crate::scene::{EntityId, Transform};

/// Floats per packed vertex
pub const VERTEX_STRIDE: usize = 12;

/// Bytes per packed vertex
pub const VERTEX_STRIDE_BYTES: u32 = (VERTEX_STRIDE * std::mem::size_of::<f32>()) as u32;

/// Normal used when a vertex has none
pub const DEFAULT_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];

/// Colour used when a vertex has none (opaque white)
pub const DEFAULT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Texture coordinate used when a vertex has none
pub const DEFAULT_UV: [f32; 2] = [0.0, 0.0];

/// Shader attribute layout of a packed vertex
pub const VERTEX_ATTRIBUTES: [VertexAttribute; 4] = [
    VertexAttribute {
        location: 0,
        components: 3,
        offset_bytes: 0,
        stride_bytes: VERTEX_STRIDE_BYTES,
    },
    VertexAttribute {
        location: 1,
        components: 3,
        offset_bytes: 12,
        stride_bytes: VERTEX_STRIDE_BYTES,
    },
    VertexAttribute {
        location: 2,
        components: 4,
        offset_bytes: 24,
        stride_bytes: VERTEX_STRIDE_BYTES,
    },
    VertexAttribute {
        location: 3,
        components: 2,
        offset_bytes: 40,
        stride_bytes: VERTEX_STRIDE_BYTES,
    },
];

/// A logical vertex whose optional attributes fall back to defaults when packed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],
    /// Surface normal
    pub normal: Option<[f32; 3]>,
    /// RGBA vertex colour
    pub color: Option<[f32; 4]>,
    /// Texture coordinate
    pub uv: Option<[f32; 2]>,
}

impl Vertex {
    /// Create a vertex with only a position
    #[must_use]
    pub fn new(position: [f32; 3]) -> Self {
        Self {
            position,
            normal: None,
            color: None,
            uv: None,
        }
    }

    /// Builder pattern: set the normal
    #[must_use]
    pub fn with_normal(mut self, normal: [f32; 3]) -> Self {
        self.normal = Some(normal);
        self
    }

    /// Builder pattern: set the colour
    #[must_use]
    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = Some(color);
        self
    }

    /// Builder pattern: set the texture coordinate
    #[must_use]
    pub fn with_uv(mut self, uv: [f32; 2]) -> Self {
        self.uv = Some(uv);
        self
    }

    fn write_packed(&self, out: &mut Vec<f32>) {
        out.extend_from_slice(&self.position);
        out.extend_from_slice(&self.normal.unwrap_or(DEFAULT_NORMAL));
        out.extend_from_slice(&self.color.unwrap_or(DEFAULT_COLOR));
        out.extend_from_slice(&self.uv.unwrap_or(DEFAULT_UV));
    }
}

/// A polygon given as vertex indices; only triangles are accepted when packing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Face {
    /// Indices into the vertex list
    pub indices: Vec<u32>,
}

impl Face {
    /// Create a triangle face
    #[must_use]
    pub fn triangle(a: u32, b: u32, c: u32) -> Self {
        Self { indices: vec![a, b, c] }
    }
}

impl From<Vec<u32>> for Face {
    fn from(indices: Vec<u32>) -> Self {
        Self { indices }
    }
}

/// Interleaved vertex data with a stride of [`VERTEX_STRIDE`] floats
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexBuffer {
    data: Vec<f32>,
}

impl VertexBuffer {
    /// Wrap already packed data
    pub fn from_packed(data: Vec<f32>) -> RenderResult<Self> {
        if data.len() % VERTEX_STRIDE != 0 {
            return Err(RenderError::InvalidMeshData(format!(
                "packed vertex data has {} floats, not a multiple of {VERTEX_STRIDE}",
                data.len()
            )));
        }
        Ok(Self { data })
    }

    /// Number of vertices
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.data.len() / VERTEX_STRIDE
    }

    /// Packed floats
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Packed floats as bytes for upload
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// The packed record of vertex `index`
    #[must_use]
    pub fn vertex(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(VERTEX_STRIDE)?;
        self.data.get(start..start + VERTEX_STRIDE)
    }

    /// Whether the buffer holds no vertices
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Result of flattening logical vertices and faces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackedGeometry {
    /// Packed vertex data
    pub vertices: VertexBuffer,
    /// Triangle indices of the faces that passed validation
    pub indices: Vec<u32>,
    /// Number of faces dropped for having the wrong arity or bad indices
    pub skipped_faces: usize,
}

/// Flatten vertices and faces into the packed layout
///
/// Missing attributes are replaced by [`DEFAULT_NORMAL`], [`DEFAULT_COLOR`] and
/// [`DEFAULT_UV`]. Faces without exactly three indices, or referencing a
/// vertex that does not exist, are skipped with a warning, so the index count
/// can be smaller than `faces.len() * 3`.
#[must_use]
pub fn pack_vertices(vertices: &[Vertex], faces: &[Face]) -> PackedGeometry {
    let mut data = Vec::with_capacity(vertices.len() * VERTEX_STRIDE);
    for vertex in vertices {
        vertex.write_packed(&mut data);
    }

    let mut indices = Vec::with_capacity(faces.len() * 3);
    let mut skipped_faces = 0;
    for (face_index, face) in faces.iter().enumerate() {
        if face.indices.len() != 3 {
            log::warn!(
                "Skipping face {face_index}: expected 3 indices, found {}",
                face.indices.len()
            );
            skipped_faces += 1;
            continue;
        }
        if let Some(bad) = face.indices.iter().find(|&&i| i as usize >= vertices.len()) {
            log::warn!(
                "Skipping face {face_index}: index {bad} out of range for {} vertices",
                vertices.len()
            );
            skipped_faces += 1;
            continue;
        }
        indices.extend_from_slice(&face.indices);
    }

    PackedGeometry {
        vertices: VertexBuffer { data },
        indices,
        skipped_faces,
    }
}

#[derive(Debug, Clone, Copy)]
struct MeshGpuResources {
    vertex_array: VertexArrayHandle,
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
    index_count: u32,
}

impl MeshGpuResources {
    fn release(self, gfx: &mut dyn GraphicsApi) {
        gfx.delete_vertex_array(self.vertex_array);
        gfx.delete_buffer(self.vertex_buffer);
        gfx.delete_buffer(self.index_buffer);
    }
}

/// Drawable triangle geometry with a transform and an optional material
#[derive(Debug)]
pub struct Mesh {
    id: EntityId,
    name: String,
    vertices: VertexBuffer,
    indices: Vec<u32>,
    transform: Transform,
    material: Option<Rc<Material>>,
    gpu: Option<MeshGpuResources>,
}

impl Mesh {
    /// Create a mesh from packed vertex data and triangle indices
    ///
    /// Fails when the vertex data is not a whole number of vertices, the index
    /// count is not a multiple of three, or an index is out of range.
    pub fn from_packed(name: impl Into<String>, vertices: Vec<f32>, indices: Vec<u32>) -> RenderResult<Self> {
        let name = name.into();
        let vertices = VertexBuffer::from_packed(vertices)?;
        if indices.len() % 3 != 0 {
            return Err(RenderError::InvalidMeshData(format!(
                "mesh '{name}' has {} indices, not a multiple of 3",
                indices.len()
            )));
        }
        let vertex_count = vertices.vertex_count();
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(RenderError::InvalidMeshData(format!(
                "mesh '{name}' index {bad} out of range for {vertex_count} vertices"
            )));
        }
        Ok(Self::from_parts(name, vertices, indices))
    }

    /// Create a mesh from logical vertices and faces, see [`pack_vertices`]
    #[must_use]
    pub fn from_vertices(name: impl Into<String>, vertices: &[Vertex], faces: &[Face]) -> Self {
        Self::from_geometry(name, pack_vertices(vertices, faces))
    }

    /// Create a mesh from already flattened geometry
    #[must_use]
    pub fn from_geometry(name: impl Into<String>, geometry: PackedGeometry) -> Self {
        Self::from_parts(name.into(), geometry.vertices, geometry.indices)
    }

    fn from_parts(name: String, vertices: VertexBuffer, indices: Vec<u32>) -> Self {
        Self {
            id: EntityId::next(),
            name,
            vertices,
            indices,
            transform: Transform::identity(),
            material: None,
            gpu: None,
        }
    }

    /// Builder pattern: attach a material
    #[must_use]
    pub fn with_material(mut self, material: Rc<Material>) -> Self {
        self.material = Some(material);
        self
    }

    /// Builder pattern: set the transform
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Unique identity of this mesh
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Mesh name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Packed vertex data
    #[must_use]
    pub fn vertex_buffer(&self) -> &VertexBuffer {
        &self.vertices
    }

    /// Number of vertices
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.vertex_count()
    }

    /// Triangle indices
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of triangles
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Placement of the mesh
    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Mutable placement of the mesh
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Material used when drawing, if any
    #[must_use]
    pub fn material(&self) -> Option<&Rc<Material>> {
        self.material.as_ref()
    }

    /// Replace the material
    pub fn set_material(&mut self, material: Option<Rc<Material>>) {
        self.material = material;
    }

    /// Whether GPU buffers currently exist for this mesh
    #[must_use]
    pub fn is_uploaded(&self) -> bool {
        self.gpu.is_some()
    }

    /// Upload vertex and index data to the GPU
    ///
    /// Calling this again frees the previous buffers first. If any step fails
    /// the objects created so far are deleted and the mesh is left without
    /// GPU resources.
    pub fn upload_to_gpu(&mut self, gfx: &mut dyn GraphicsApi) -> RenderResult<()> {
        self.release(gfx);

        if self.indices.is_empty() || self.vertices.is_empty() {
            return Err(RenderError::InvalidMeshData(format!(
                "mesh '{}' has no triangles to upload",
                self.name
            )));
        }
        let index_count = u32::try_from(self.indices.len()).map_err(|_| {
            RenderError::InvalidMeshData(format!("mesh '{}' has too many indices", self.name))
        })?;

        let vertex_buffer = gfx.create_buffer(BufferKind::Vertex)?;
        let index_buffer = match gfx.create_buffer(BufferKind::Index) {
            Ok(buffer) => buffer,
            Err(e) => {
                gfx.delete_buffer(vertex_buffer);
                return Err(e);
            }
        };
        let vertex_array = match gfx.create_vertex_array() {
            Ok(vertex_array) => vertex_array,
            Err(e) => {
                gfx.delete_buffer(vertex_buffer);
                gfx.delete_buffer(index_buffer);
                return Err(e);
            }
        };
        let resources = MeshGpuResources {
            vertex_array,
            vertex_buffer,
            index_buffer,
            index_count,
        };

        if let Err(e) = Self::fill_buffers(gfx, &resources, &self.vertices, &self.indices) {
            log::error!("Upload of mesh '{}' failed: {e}", self.name);
            resources.release(gfx);
            return Err(e);
        }

        log::trace!(
            "Uploaded mesh '{}' ({} vertices, {} triangles)",
            self.name,
            self.vertex_count(),
            self.triangle_count()
        );
        self.gpu = Some(resources);
        Ok(())
    }

    fn fill_buffers(
        gfx: &mut dyn GraphicsApi,
        resources: &MeshGpuResources,
        vertices: &VertexBuffer,
        indices: &[u32],
    ) -> RenderResult<()> {
        gfx.upload_buffer(resources.vertex_buffer, vertices.as_bytes())?;
        gfx.upload_buffer(resources.index_buffer, bytemuck::cast_slice(indices))?;
        gfx.attach_buffers(resources.vertex_array, resources.vertex_buffer, resources.index_buffer)?;
        for attribute in VERTEX_ATTRIBUTES {
            gfx.vertex_attribute(resources.vertex_array, attribute)?;
        }
        Ok(())
    }

    /// Issue the indexed draw call, uploading first if needed
    ///
    /// Returns `false` (after logging) when the mesh could not be uploaded or
    /// the backend rejected the draw.
    pub fn draw(&mut self, gfx: &mut dyn GraphicsApi) -> bool {
        if self.gpu.is_none() {
            if let Err(e) = self.upload_to_gpu(gfx) {
                log::error!("Cannot draw mesh '{}': upload failed: {e}", self.name);
                return false;
            }
        }
        let Some(resources) = self.gpu else {
            return false;
        };
        match gfx.draw_indexed(resources.vertex_array, resources.index_count) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Draw of mesh '{}' failed: {e}", self.name);
                false
            }
        }
    }

    /// Free the GPU buffers; does nothing when not uploaded
    pub fn release(&mut self, gfx: &mut dyn GraphicsApi) {
        if let Some(resources) = self.gpu.take() {
            resources.release(gfx);
            log::trace!("Released GPU buffers of mesh '{}'", self.name);
        }
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        if self.gpu.is_some() {
            log::warn!(
                "Mesh '{}' dropped while GPU buffers are still allocated; call release first",
                self.name
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::{GpuCall, HeadlessGraphics};

    fn triangle_vertices() -> Vec<Vertex> {
        vec![
            Vertex::new([0.0, 0.0, 0.0]),
            Vertex::new([1.0, 0.0, 0.0]).with_normal([0.0, 0.0, 1.0]),
            Vertex::new([0.0, 1.0, 0.0]).with_color([1.0, 0.0, 0.0, 1.0]).with_uv([0.5, 1.0]),
        ]
    }

    #[test]
    fn test_pack_vertices_applies_defaults() {
        let packed = pack_vertices(&triangle_vertices(), &[Face::triangle(0, 1, 2)]);
        assert_eq!(packed.vertices.as_slice().len(), 3 * VERTEX_STRIDE);

        let first = packed.vertices.vertex(0).unwrap();
        assert_eq!(&first[3..6], &DEFAULT_NORMAL);
        assert_eq!(&first[6..10], &DEFAULT_COLOR);
        assert_eq!(&first[10..12], &DEFAULT_UV);

        let third = packed.vertices.vertex(2).unwrap();
        assert_eq!(&third[6..10], &[1.0, 0.0, 0.0, 1.0]);
        assert_eq!(&third[10..12], &[0.5, 1.0]);
    }

    #[test]
    fn test_pack_vertices_skips_bad_faces() {
        let faces = vec![
            Face::triangle(0, 1, 2),
            Face::from(vec![0, 1]),
            Face::from(vec![0, 1, 2, 0]),
            Face::triangle(0, 1, 7),
        ];
        let packed = pack_vertices(&triangle_vertices(), &faces);
        assert_eq!(packed.indices, vec![0, 1, 2]);
        assert_eq!(packed.skipped_faces, 3);
        assert_eq!(packed.vertices.vertex_count(), 3);
    }

    #[test]
    fn test_from_packed_validation() {
        assert!(Mesh::from_packed("short", vec![0.0; 11], vec![]).is_err());
        assert!(Mesh::from_packed("odd", vec![0.0; 36], vec![0, 1]).is_err());
        assert!(Mesh::from_packed("range", vec![0.0; 36], vec![0, 1, 3]).is_err());

        let mesh = Mesh::from_packed("ok", vec![0.0; 36], vec![0, 1, 2]).unwrap();
        assert_eq!(mesh.vertex_buffer().as_slice().len(), mesh.vertex_count() * VERTEX_STRIDE);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_upload_declares_attributes() {
        let mut gfx = HeadlessGraphics::new();
        let mut mesh = Mesh::from_vertices("tri", &triangle_vertices(), &[Face::triangle(0, 1, 2)]);
        mesh.upload_to_gpu(&mut gfx).unwrap();
        assert!(mesh.is_uploaded());

        let offsets: Vec<u32> = gfx
            .calls()
            .iter()
            .filter_map(|call| match call {
                GpuCall::VertexAttribute(_, attribute) => Some(attribute.offset_bytes),
                _ => None,
            })
            .collect();
        assert_eq!(offsets, vec![0, 12, 24, 40]);
        assert!(gfx.calls().contains(&GpuCall::UploadBuffer {
            buffer: BufferHandle(1),
            bytes: 3 * 48,
        }));

        mesh.release(&mut gfx);
    }

    #[test]
    fn test_upload_is_idempotent() {
        let mut gfx = HeadlessGraphics::new();
        let mut mesh = Mesh::from_vertices("tri", &triangle_vertices(), &[Face::triangle(0, 1, 2)]);
        mesh.upload_to_gpu(&mut gfx).unwrap();
        mesh.upload_to_gpu(&mut gfx).unwrap();
        assert_eq!(gfx.live_buffer_count(), 2);
        assert_eq!(gfx.live_vertex_array_count(), 1);

        mesh.release(&mut gfx);
        mesh.release(&mut gfx);
        assert_eq!(gfx.live_buffer_count(), 0);
        assert!(!mesh.is_uploaded());
    }

    #[test]
    fn test_draw_uploads_on_first_use() {
        let mut gfx = HeadlessGraphics::new();
        let mut mesh = Mesh::from_vertices("tri", &triangle_vertices(), &[Face::triangle(0, 1, 2)]);
        assert!(mesh.draw(&mut gfx));
        assert!(mesh.is_uploaded());
        assert_eq!(gfx.draw_call_count(), 1);
        mesh.release(&mut gfx);
    }

    #[test]
    fn test_draw_fails_soft_when_upload_fails() {
        let mut gfx = HeadlessGraphics::new();
        gfx.set_fail_buffer_creation(true);
        let mut mesh = Mesh::from_vertices("tri", &triangle_vertices(), &[Face::triangle(0, 1, 2)]);
        assert!(!mesh.draw(&mut gfx));
        assert!(!mesh.is_uploaded());
        assert_eq!(gfx.draw_call_count(), 0);
        assert_eq!(gfx.live_buffer_count(), 0);
    }

    #[test]
    fn test_empty_mesh_does_not_upload() {
        let mut gfx = HeadlessGraphics::new();
        let mut mesh = Mesh::from_vertices("empty", &triangle_vertices(), &[]);
        assert!(mesh.upload_to_gpu(&mut gfx).is_err());
        assert_eq!(gfx.live_buffer_count(), 0);
    }
}
