//! Parsed asset data model
//!
//! Format-independent description of a 3D scene file as produced by an
//! [`AssetParser`](crate::assets::AssetParser). Everything here is plain data;
//! node transforms are stored row-major, as authoring tools write them.
//!
//! The model derives `serde` traits so a scene can be stored as RON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::foundation::math::Mat4;

/// Prefix of a texture reference that indexes the embedded texture table
pub const EMBEDDED_TEXTURE_PREFIX: char = '*';

const IDENTITY_ROWS: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

fn identity_rows() -> [f32; 16] {
    IDENTITY_ROWS
}

/// A node metadata value as stored by the authoring tool
///
/// Integer-like data shows up in many encodings; use [`Self::as_integer`] and
/// [`Self::as_float`] rather than matching on the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetadataValue {
    /// Boolean flag
    Bool(bool),
    /// Signed 32-bit integer
    I32(i32),
    /// Unsigned 32-bit integer
    U32(u32),
    /// Signed 64-bit integer
    I64(i64),
    /// Unsigned 64-bit integer
    U64(u64),
    /// Single precision float
    F32(f32),
    /// Double precision float
    F64(f64),
    /// Text
    String(String),
    /// Three floats
    Vec3([f32; 3]),
}

impl MetadataValue {
    /// The value as a single canonical integer
    ///
    /// Accepts every integer width, whole finite floats and strings that parse
    /// as integers.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::I32(v) => Some(i64::from(*v)),
            Self::U32(v) => Some(i64::from(*v)),
            Self::I64(v) => Some(*v),
            Self::U64(v) => i64::try_from(*v).ok(),
            Self::F32(v) => whole_float(f64::from(*v)),
            Self::F64(v) => whole_float(*v),
            Self::String(s) => s.trim().parse().ok(),
            Self::Bool(_) | Self::Vec3(_) => None,
        }
    }

    /// The value as a float
    ///
    /// Accepts every numeric variant and strings that parse as floats.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::I32(v) => Some(f64::from(*v)),
            Self::U32(v) => Some(f64::from(*v)),
            Self::I64(v) => Some(*v as f64),
            Self::U64(v) => Some(*v as f64),
            Self::F32(v) => Some(f64::from(*v)),
            Self::F64(v) => Some(*v),
            Self::String(s) => s.trim().parse().ok(),
            Self::Bool(_) | Self::Vec3(_) => None,
        }
    }
}

fn whole_float(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

/// A named transform node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetNode {
    /// Node name
    pub name: String,
    /// Local transform, row-major
    #[serde(default = "identity_rows")]
    pub transform: [f32; 16],
    /// Parent node index, `None` for the root
    pub parent: Option<usize>,
    /// Child node indices
    pub children: Vec<usize>,
    /// Indices into [`AssetScene::meshes`]
    pub meshes: Vec<usize>,
    /// Free-form key/value annotations
    pub metadata: BTreeMap<String, MetadataValue>,
}

impl Default for AssetNode {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: IDENTITY_ROWS,
            parent: None,
            children: Vec::new(),
            meshes: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }
}

impl AssetNode {
    /// Create a node with an identity transform
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder pattern: set the local transform
    #[must_use]
    pub fn with_local_matrix(mut self, matrix: &Mat4) -> Self {
        self.transform = row_major(matrix);
        self
    }

    /// Builder pattern: add a metadata entry
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: MetadataValue) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Builder pattern: reference a mesh
    #[must_use]
    pub fn with_mesh(mut self, mesh: usize) -> Self {
        self.meshes.push(mesh);
        self
    }

    /// Local transform as a matrix
    #[must_use]
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_row_slice(&self.transform)
    }
}

fn row_major(matrix: &Mat4) -> [f32; 16] {
    let mut rows = [0.0; 16];
    for (r, row) in matrix.row_iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            rows[r * 4 + c] = *value;
        }
    }
    rows
}

/// Primitive topology of a source mesh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimitiveType {
    /// Isolated points
    Point,
    /// Line segments
    Line,
    /// Triangles
    #[default]
    Triangle,
    /// Polygons with more than three corners
    Polygon,
}

/// Source mesh with per-vertex attribute channels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetMesh {
    /// Mesh name
    pub name: String,
    /// Topology
    pub primitive: PrimitiveType,
    /// Vertex positions
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals; empty when absent
    pub normals: Vec<[f32; 3]>,
    /// Vertex colour channels
    pub colors: Vec<Vec<[f32; 4]>>,
    /// Texture coordinate channels
    pub uvs: Vec<Vec<[f32; 2]>>,
    /// Faces as vertex index lists
    pub faces: Vec<Vec<u32>>,
    /// Index into [`AssetScene::materials`]
    pub material: Option<usize>,
}

/// Source material
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetMaterial {
    /// Material name
    pub name: String,
    /// RGBA diffuse colour
    pub diffuse_color: Option<[f32; 4]>,
    /// Diffuse texture reference: `*N` for embedded texture N, otherwise a
    /// path relative to the asset file
    pub diffuse_texture: Option<String>,
}

/// One uncompressed texel, in the channel order the asset stores it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Texel {
    /// Blue
    pub b: u8,
    /// Green
    pub g: u8,
    /// Red
    pub r: u8,
    /// Alpha
    pub a: u8,
}

impl Texel {
    /// Channels reordered as RGBA
    #[must_use]
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Payload of an embedded texture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TexelData {
    /// Encoded image file bytes (PNG, JPEG, ...)
    Compressed(Vec<u8>),
    /// `width * height` texels, row by row
    Raw(Vec<Texel>),
}

/// Texture stored inside the asset file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTexture {
    /// Original file name, if the tool recorded one
    #[serde(default)]
    pub filename_hint: String,
    /// Width in pixels (raw data only)
    #[serde(default)]
    pub width: u32,
    /// Height in pixels (raw data only)
    #[serde(default)]
    pub height: u32,
    /// Pixel payload
    pub data: TexelData,
}

/// Source camera
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetCamera {
    /// Camera name, also used to find its node
    pub name: String,
    /// Vertical field of view in radians
    pub fov_radians: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
    /// Width / height; non-positive means unknown
    pub aspect: f32,
}

/// Source light variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetLightType {
    /// Parallel light
    #[default]
    Directional,
    /// Omni-directional light
    Point,
    /// Cone light
    Spot,
}

/// Source light
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetLight {
    /// Light name, also used to find its node
    pub name: String,
    /// Variant
    pub kind: AssetLightType,
    /// RGB diffuse colour, not necessarily normalized
    pub diffuse: [f32; 3],
    /// Inner cone half-angle in radians
    pub inner_cone_radians: f32,
    /// Outer cone half-angle in radians
    pub outer_cone_radians: f32,
}

/// A complete parsed asset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetScene {
    /// Node hierarchy; nodes reference each other by index
    pub nodes: Vec<AssetNode>,
    /// Meshes
    pub meshes: Vec<AssetMesh>,
    /// Materials
    pub materials: Vec<AssetMaterial>,
    /// Embedded textures
    pub textures: Vec<AssetTexture>,
    /// Cameras
    pub cameras: Vec<AssetCamera>,
    /// Lights
    pub lights: Vec<AssetLight>,
}

impl AssetScene {
    /// Append a node, linking it to `parent`; returns the new node's index
    pub fn add_node(&mut self, mut node: AssetNode, parent: Option<usize>) -> usize {
        let index = self.nodes.len();
        node.parent = parent;
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.push(index);
        }
        self.nodes.push(node);
        index
    }

    /// Whether no node references mesh `index`
    #[must_use]
    pub fn is_mesh_unreferenced(&self, index: usize) -> bool {
        !self.nodes.iter().any(|node| node.meshes.contains(&index))
    }
}
