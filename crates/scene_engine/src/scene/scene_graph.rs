//! The scene container
//!
//! A [`Scene`] exclusively owns its meshes, lights and cameras. The active
//! camera and active light are stored as [`EntityId`]s pointing into the
//! owned lists, so they can never outlive the entity they select.
//!
//! # Active selection
//! The first camera added becomes the active camera, and the first *active*
//! light added becomes the active light. Later additions never override an
//! existing selection; use [`Scene::set_active_camera`] /
//! [`Scene::set_active_light`] to change it.

use crate::render::texture::placeholder_texture;
use crate::render::{FrameStats, GraphicsApi, Mesh, Renderer, SharedTexture};
use crate::scene::{Camera, EntityId, Light};
use std::rc::Rc;

/// Meshes, lights and cameras plus the active camera and light
#[derive(Debug, Default)]
pub struct Scene {
    name: String,
    meshes: Vec<Mesh>,
    lights: Vec<Light>,
    cameras: Vec<Camera>,
    textures: Vec<SharedTexture>,
    active_camera: Option<EntityId>,
    active_light: Option<EntityId>,
    disposed: bool,
}

impl Scene {
    /// Create an empty scene
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Scene name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a mesh; returns `false` if the same mesh is already present
    ///
    /// The albedo texture of the mesh's material is tracked so that
    /// [`Scene::dispose`] can free it. Materials attached later through
    /// [`Scene::meshes_mut`] are picked up at dispose time.
    pub fn add_mesh(&mut self, mesh: Mesh) -> bool {
        if self.meshes.iter().any(|m| m.id() == mesh.id()) {
            log::warn!("Scene '{}': mesh '{}' already added", self.name, mesh.name());
            return false;
        }
        if let Some(texture) = mesh.material().and_then(|material| material.albedo.clone()) {
            self.add_texture(texture);
        }
        self.disposed = false;
        self.meshes.push(mesh);
        true
    }

    /// Track a texture for disposal; returns `false` if already tracked
    pub fn add_texture(&mut self, texture: SharedTexture) -> bool {
        if self.textures.iter().any(|t| Rc::ptr_eq(t, &texture)) {
            return false;
        }
        self.textures.push(texture);
        true
    }

    /// Add a light; returns `false` if the same light is already present
    pub fn add_light(&mut self, light: Light) -> bool {
        if self.lights.iter().any(|l| l.id() == light.id()) {
            log::warn!("Scene '{}': light '{}' already added", self.name, light.name());
            return false;
        }
        if self.active_light.is_none() && light.active {
            self.active_light = Some(light.id());
        }
        self.disposed = false;
        self.lights.push(light);
        true
    }

    /// Add a camera; returns `false` if the same camera is already present
    pub fn add_camera(&mut self, camera: Camera) -> bool {
        if self.cameras.iter().any(|c| c.id() == camera.id()) {
            log::warn!("Scene '{}': camera '{}' already added", self.name, camera.name());
            return false;
        }
        if self.active_camera.is_none() {
            self.active_camera = Some(camera.id());
        }
        self.disposed = false;
        self.cameras.push(camera);
        true
    }

    /// Select the active camera; `false` if the scene has no such camera
    pub fn set_active_camera(&mut self, id: EntityId) -> bool {
        if self.cameras.iter().any(|c| c.id() == id) {
            self.active_camera = Some(id);
            true
        } else {
            log::warn!("Scene '{}': no camera with id {}", self.name, id.raw());
            false
        }
    }

    /// Select the active light; `false` if the scene has no such light
    pub fn set_active_light(&mut self, id: EntityId) -> bool {
        if self.lights.iter().any(|l| l.id() == id) {
            self.active_light = Some(id);
            true
        } else {
            log::warn!("Scene '{}': no light with id {}", self.name, id.raw());
            false
        }
    }

    /// Camera used for drawing
    #[must_use]
    pub fn active_camera(&self) -> Option<&Camera> {
        let id = self.active_camera?;
        self.cameras.iter().find(|c| c.id() == id)
    }

    /// Camera used for drawing, mutably
    pub fn active_camera_mut(&mut self) -> Option<&mut Camera> {
        let id = self.active_camera?;
        self.cameras.iter_mut().find(|c| c.id() == id)
    }

    /// Light used for shading
    #[must_use]
    pub fn active_light(&self) -> Option<&Light> {
        let id = self.active_light?;
        self.lights.iter().find(|l| l.id() == id)
    }

    /// Owned meshes
    #[must_use]
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// Owned meshes, mutably
    pub fn meshes_mut(&mut self) -> &mut [Mesh] {
        &mut self.meshes
    }

    /// Owned lights
    #[must_use]
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Owned cameras
    #[must_use]
    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    /// Textures tracked for disposal
    #[must_use]
    pub fn textures(&self) -> &[SharedTexture] {
        &self.textures
    }

    /// First mesh with the given name
    #[must_use]
    pub fn find_mesh(&self, name: &str) -> Option<&Mesh> {
        self.meshes.iter().find(|m| m.name() == name)
    }

    /// Whether [`Scene::dispose`] has run since the last addition
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Draw every mesh from the active camera, lit by the active light
    ///
    /// Returns `None` (after a warning) when there is no active camera.
    pub fn draw<G: GraphicsApi>(&mut self, renderer: &mut Renderer<G>) -> Option<FrameStats> {
        let camera = self
            .active_camera
            .and_then(|id| self.cameras.iter().find(|c| c.id() == id));
        let Some(camera) = camera else {
            log::warn!("Scene '{}' has no active camera; nothing drawn", self.name);
            return None;
        };
        let light = self
            .active_light
            .and_then(|id| self.lights.iter().find(|l| l.id() == id));

        renderer.begin_frame(camera);
        for mesh in &mut self.meshes {
            renderer.draw_mesh(mesh, light);
        }
        Some(renderer.end_frame())
    }

    /// Release every GPU resource and empty the scene
    ///
    /// Must run while the graphics context is current. Safe to call more
    /// than once.
    pub fn dispose(&mut self, gfx: &mut dyn GraphicsApi) {
        if self.disposed {
            log::debug!("Scene '{}' already disposed", self.name);
            return;
        }

        let attached: Vec<SharedTexture> = self
            .meshes
            .iter()
            .filter_map(|mesh| mesh.material().and_then(|material| material.albedo.clone()))
            .collect();
        for texture in attached {
            self.add_texture(texture);
        }

        for mesh in &mut self.meshes {
            mesh.release(gfx);
        }
        for texture in &self.textures {
            texture.borrow_mut().release(gfx);
        }
        placeholder_texture().borrow_mut().release(gfx);

        log::info!(
            "Disposed scene '{}' ({} meshes, {} textures, {} lights, {} cameras)",
            self.name,
            self.meshes.len(),
            self.textures.len(),
            self.lights.len(),
            self.cameras.len()
        );

        self.meshes.clear();
        self.textures.clear();
        self.lights.clear();
        self.cameras.clear();
        self.active_camera = None;
        self.active_light = None;
        self.disposed = true;
    }
}
