//! Scene representation
//!
//! Transform-bearing entities (meshes, cameras and lights) and the [`Scene`]
//! that owns them.
//!
//! ```text
//! Scene
//!  ├── Vec<Mesh>    ── Transform, Rc<Material> ── SharedTexture
//!  ├── Vec<Light>   ── Transform
//!  ├── Vec<Camera>  ── Transform
//!  └── active camera / active light (by EntityId)
//! ```

mod camera;
mod light;
mod scene_graph;
mod transform;

use std::sync::atomic::{AtomicU64, Ordering};

pub use camera::{Camera, DEFAULT_FAR, DEFAULT_FOV_DEGREES, DEFAULT_NEAR};
pub use light::{spot_cone_factor, Light, LightKind, LIGHT_EPSILON};
pub use scene_graph::Scene;
pub use transform::{Space, Transform};

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a mesh, camera or light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// Allocate a fresh id
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Numeric value
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}
