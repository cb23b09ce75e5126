//! Procedural primitive meshes
//!
//! Unit-sized shapes centred at the origin, mainly for tests and debugging.
//! Winding is counter-clockwise when viewed from outside.

use crate::render::mesh::{Face, Mesh, Vertex};

/// Per-face data of the cube: normal, u axis, v axis, colour
const CUBE_FACES: [([f32; 3], [f32; 3], [f32; 3], [f32; 4]); 6] = [
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0, 1.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [0.0, 1.0, 1.0, 1.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0, 1.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 1.0, 1.0]),
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0, 1.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0, 1.0]),
];

/// Corner offsets along (u, v) with the matching texture coordinate
const QUAD_CORNERS: [([f32; 2], [f32; 2]); 4] = [
    ([-0.5, -0.5], [0.0, 0.0]),
    ([0.5, -0.5], [1.0, 0.0]),
    ([0.5, 0.5], [1.0, 1.0]),
    ([-0.5, 0.5], [0.0, 1.0]),
];

impl Mesh {
    /// A single triangle in the XY plane facing +Z with red, green and blue corners
    #[must_use]
    pub fn triangle() -> Self {
        let normal = [0.0, 0.0, 1.0];
        let vertices = [
            Vertex::new([-0.5, -0.5, 0.0])
                .with_normal(normal)
                .with_color([1.0, 0.0, 0.0, 1.0])
                .with_uv([0.0, 0.0]),
            Vertex::new([0.5, -0.5, 0.0])
                .with_normal(normal)
                .with_color([0.0, 1.0, 0.0, 1.0])
                .with_uv([1.0, 0.0]),
            Vertex::new([0.0, 0.5, 0.0])
                .with_normal(normal)
                .with_color([0.0, 0.0, 1.0, 1.0])
                .with_uv([0.5, 1.0]),
        ];
        Self::from_vertices("Triangle", &vertices, &[Face::triangle(0, 1, 2)])
    }

    /// A unit quad in the XY plane facing +Z
    #[must_use]
    pub fn quad() -> Self {
        let vertices: Vec<Vertex> = QUAD_CORNERS
            .iter()
            .map(|&([x, y], uv)| {
                Vertex::new([x, y, 0.0])
                    .with_normal([0.0, 0.0, 1.0])
                    .with_uv(uv)
            })
            .collect();
        Self::from_vertices("Quad", &vertices, &[Face::triangle(0, 1, 2), Face::triangle(2, 3, 0)])
    }

    /// A unit cube with 4 vertices per face
    ///
    /// Faces do not share vertices, so each has its own flat normal, colour
    /// and full 0..1 texture coordinates. 24 vertices, 12 triangles.
    #[must_use]
    pub fn cube() -> Self {
        let mut vertices = Vec::with_capacity(24);
        let mut faces = Vec::with_capacity(12);

        for (normal, u, v, color) in CUBE_FACES {
            let base = vertices.len() as u32;
            for ([du, dv], uv) in QUAD_CORNERS {
                let position = [
                    normal[0] * 0.5 + u[0] * du + v[0] * dv,
                    normal[1] * 0.5 + u[1] * du + v[1] * dv,
                    normal[2] * 0.5 + u[2] * du + v[2] * dv,
                ];
                vertices.push(
                    Vertex::new(position)
                        .with_normal(normal)
                        .with_color(color)
                        .with_uv(uv),
                );
            }
            faces.push(Face::triangle(base, base + 1, base + 2));
            faces.push(Face::triangle(base + 2, base + 3, base));
        }

        Self::from_vertices("Cube", &vertices, &faces)
    }
}
