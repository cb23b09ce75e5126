//! Frame renderer
//!
//! [`Renderer`] owns the graphics backend and the built-in shader program. It
//! is created once and handed to whatever needs to draw; there is no global
//! instance.
//!
//! A frame is `begin_frame(camera)`, any number of `draw_mesh` calls, then
//! `end_frame()`, which returns the [`FrameStats`] for that frame.

use std::collections::{HashMap, HashSet};

use crate::core::RendererConfig;
use crate::foundation::math::{Mat4, Vec3};
use crate::render::api::{ClearFlags, GraphicsApi, ProgramHandle, UniformLocation, UniformValue};
use crate::render::shaders::{self, uniforms, ALBEDO_TEXTURE_UNIT};
use crate::render::texture::{is_placeholder, placeholder_texture, SharedTexture};
use crate::render::{Mesh, RenderError, RenderResult};
use crate::scene::{Camera, Light, LightKind};

/// Counters collected over one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Draw calls issued
    pub draw_calls: usize,
    /// Triangles submitted
    pub triangles: usize,
    /// Meshes that could not be drawn
    pub skipped_meshes: usize,
}

/// Draws meshes with the built-in program through a [`GraphicsApi`] backend
pub struct Renderer<G: GraphicsApi> {
    gfx: G,
    config: RendererConfig,
    program: Option<ProgramHandle>,
    locations: HashMap<&'static str, Option<UniformLocation>>,
    warned_uniforms: HashSet<&'static str>,
    in_frame: bool,
    stats: FrameStats,
}

impl<G: GraphicsApi> Renderer<G> {
    /// Create a renderer and compile its shader program
    pub fn new(mut gfx: G, config: RendererConfig) -> RenderResult<Self> {
        config.validate().map_err(RenderError::InitializationFailed)?;
        let program = gfx
            .create_program(shaders::VERTEX_SHADER, shaders::FRAGMENT_SHADER)
            .map_err(|e| RenderError::InitializationFailed(format!("shader program: {e}")))?;

        log::info!(
            "Renderer initialized at {}x{}",
            config.render_width,
            config.render_height
        );

        Ok(Self {
            gfx,
            config,
            program: Some(program),
            locations: HashMap::new(),
            warned_uniforms: HashSet::new(),
            in_frame: false,
            stats: FrameStats::default(),
        })
    }

    /// Renderer configuration
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// The graphics backend
    pub fn gfx(&self) -> &G {
        &self.gfx
    }

    /// The graphics backend, mutably (for uploads and releases)
    pub fn gfx_mut(&mut self) -> &mut G {
        &mut self.gfx
    }

    /// Whether a frame is in progress
    pub fn is_in_frame(&self) -> bool {
        self.in_frame
    }

    /// Start a frame seen through `camera`
    ///
    /// Clears the target and writes the per-frame uniforms. Starting a frame
    /// while another is open discards the open frame's statistics.
    pub fn begin_frame(&mut self, camera: &Camera) {
        let Some(program) = self.program else {
            log::error!("begin_frame called on a released renderer");
            return;
        };
        if self.in_frame {
            log::warn!("begin_frame called while a frame is in progress; restarting frame");
        }
        self.in_frame = true;
        self.stats = FrameStats::default();

        self.gfx
            .set_viewport(self.config.render_width, self.config.render_height);
        self.gfx
            .clear(ClearFlags::COLOR | ClearFlags::DEPTH, self.config.clear_color);
        self.gfx.use_program(program);

        self.set_uniform(uniforms::VIEW, mat4_value(&camera.view_matrix()));
        self.set_uniform(uniforms::PROJECTION, mat4_value(&camera.projection_matrix()));
        self.set_uniform(uniforms::AMBIENT, UniformValue::Float(self.config.ambient_intensity));
        self.set_uniform(uniforms::ALBEDO, UniformValue::Int(ALBEDO_TEXTURE_UNIT as i32));
    }

    /// Draw one mesh lit by at most one light
    ///
    /// Returns whether a draw call was issued. Failures are logged and counted
    /// in [`FrameStats::skipped_meshes`].
    pub fn draw_mesh(&mut self, mesh: &mut Mesh, light: Option<&Light>) -> bool {
        if !self.in_frame {
            log::error!("draw_mesh('{}') called outside begin_frame/end_frame", mesh.name());
            self.stats.skipped_meshes += 1;
            return false;
        }

        self.set_uniform(uniforms::MODEL, mat4_value(&mesh.transform().world_matrix()));

        let (tint, albedo) = match mesh.material() {
            Some(material) => (material.tint, material.resolved_albedo()),
            None => ([1.0, 1.0, 1.0, 1.0], placeholder_texture()),
        };
        self.set_uniform(uniforms::TINT, UniformValue::Vec4(tint));
        self.bind_albedo(&albedo, mesh.name());
        self.write_light(light);

        if mesh.draw(&mut self.gfx) {
            self.stats.draw_calls += 1;
            self.stats.triangles += mesh.triangle_count();
            true
        } else {
            self.stats.skipped_meshes += 1;
            false
        }
    }

    /// Finish the frame and return its statistics
    pub fn end_frame(&mut self) -> FrameStats {
        if !self.in_frame {
            log::warn!("end_frame called without begin_frame");
        }
        self.in_frame = false;
        log::trace!(
            "Frame finished: {} draw calls, {} triangles, {} skipped",
            self.stats.draw_calls,
            self.stats.triangles,
            self.stats.skipped_meshes
        );
        std::mem::take(&mut self.stats)
    }

    /// Delete the shader program; the renderer cannot draw afterwards
    pub fn release(&mut self) {
        if let Some(program) = self.program.take() {
            self.gfx.delete_program(program);
            self.locations.clear();
            self.in_frame = false;
            log::debug!("Renderer released");
        }
    }

    fn bind_albedo(&mut self, albedo: &SharedTexture, mesh_name: &str) {
        let uploaded = albedo.borrow_mut().upload(&mut self.gfx);
        let handle = match uploaded {
            Ok(handle) => Some(handle),
            Err(e) if !is_placeholder(albedo) => {
                log::warn!("Mesh '{mesh_name}': texture upload failed ({e}), using placeholder");
                placeholder_texture().borrow_mut().upload(&mut self.gfx).ok()
            }
            Err(e) => {
                log::error!("Placeholder texture upload failed: {e}");
                None
            }
        };
        if let Some(handle) = handle {
            self.gfx.bind_texture(ALBEDO_TEXTURE_UNIT, handle);
        }
    }

    fn write_light(&mut self, light: Option<&Light>) {
        let Some(light) = light.filter(|light| light.active) else {
            self.set_uniform(uniforms::LIGHT_TYPE, UniformValue::Int(0));
            return;
        };

        let light_type = match light.kind() {
            LightKind::Directional => 1,
            LightKind::Spot {
                cos_inner,
                cos_outer,
                range,
            } => {
                self.set_uniform(uniforms::SPOT_COS_INNER, UniformValue::Float(cos_inner));
                self.set_uniform(uniforms::SPOT_COS_OUTER, UniformValue::Float(cos_outer));
                self.set_uniform(uniforms::LIGHT_RANGE, UniformValue::Float(range));
                2
            }
        };
        self.set_uniform(uniforms::LIGHT_TYPE, UniformValue::Int(light_type));
        self.set_uniform(uniforms::LIGHT_COLOR, vec3_value(&light.color));
        self.set_uniform(uniforms::LIGHT_INTENSITY, UniformValue::Float(light.intensity));
        self.set_uniform(uniforms::LIGHT_DIRECTION, vec3_value(&light.transform().forward()));
        self.set_uniform(uniforms::LIGHT_POSITION, vec3_value(&light.transform().world_position()));
    }

    fn set_uniform(&mut self, name: &'static str, value: UniformValue) {
        let Some(program) = self.program else {
            return;
        };
        let location = *self
            .locations
            .entry(name)
            .or_insert_with(|| self.gfx.uniform_location(program, name));

        match location {
            Some(location) => self.gfx.set_uniform(location, value),
            None => {
                if self.warned_uniforms.insert(name) {
                    log::warn!("Shader uniform '{name}' not found; skipping");
                }
            }
        }
    }
}

impl<G: GraphicsApi> Drop for Renderer<G> {
    fn drop(&mut self) {
        if self.program.is_some() {
            log::warn!("Renderer dropped without release; shader program leaked");
        }
    }
}

fn mat4_value(matrix: &Mat4) -> UniformValue {
    let mut columns = [0.0; 16];
    columns.copy_from_slice(matrix.as_slice());
    UniformValue::Mat4(columns)
}

fn vec3_value(vector: &Vec3) -> UniformValue {
    UniformValue::Vec3([vector.x, vector.y, vector.z])
}
