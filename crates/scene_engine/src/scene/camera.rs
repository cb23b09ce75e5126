//! # 3D Camera
//!
//! A perspective camera whose placement comes from an owned [`Transform`].
//!
//! The view matrix is the inverse of the transform's world matrix and the
//! projection matrix is derived from the lens parameters. Each is cached behind
//! its own dirty flag, so moving the camera never rebuilds the projection and
//! resizing the viewport never rebuilds the view.
//!
//! ## Aspect ratio and render resolution
//! The camera renders at a fixed internal resolution. Changing the aspect ratio
//! (for example when a window is resized) leaves that resolution alone, and
//! changing the resolution only touches the aspect ratio when asked to.

use std::cell::Cell;

use crate::foundation::math::{utils, Mat4, Mat4Ext};
use crate::scene::{EntityId, Transform};

/// Default vertical field of view in degrees
pub const DEFAULT_FOV_DEGREES: f32 = 60.0;
/// Default near clipping plane distance
pub const DEFAULT_NEAR: f32 = 0.1;
/// Default far clipping plane distance
pub const DEFAULT_FAR: f32 = 1000.0;

/// Perspective camera
#[derive(Debug, Clone)]
pub struct Camera {
    id: EntityId,
    name: String,
    transform: Transform,
    fov_degrees: f32,
    aspect: f32,
    near: f32,
    far: f32,
    render_width: u32,
    render_height: u32,
    view: Cell<Mat4>,
    view_dirty: Cell<bool>,
    projection: Cell<Mat4>,
    projection_dirty: Cell<bool>,
}

impl Camera {
    /// Create a new perspective camera
    ///
    /// # Arguments
    /// * `name` - Name used in logs and lookups
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Aspect ratio (width / height)
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    #[must_use]
    pub fn new(name: impl Into<String>, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            id: EntityId::next(),
            name: name.into(),
            transform: Transform::identity(),
            fov_degrees,
            aspect,
            near,
            far,
            render_width: 1280,
            render_height: 720,
            view: Cell::new(Mat4::identity()),
            view_dirty: Cell::new(true),
            projection: Cell::new(Mat4::identity()),
            projection_dirty: Cell::new(true),
        }
    }

    /// Unique identity of this camera
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Camera name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Placement of the camera
    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Mutable placement; invalidates the cached view matrix
    pub fn transform_mut(&mut self) -> &mut Transform {
        self.view_dirty.set(true);
        &mut self.transform
    }

    /// Vertical field of view in degrees
    #[must_use]
    pub fn field_of_view_degrees(&self) -> f32 {
        self.fov_degrees
    }

    /// Aspect ratio (width / height)
    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        self.aspect
    }

    /// Near clipping plane distance
    #[must_use]
    pub fn near(&self) -> f32 {
        self.near
    }

    /// Far clipping plane distance
    #[must_use]
    pub fn far(&self) -> f32 {
        self.far
    }

    /// Internal render resolution
    #[must_use]
    pub fn render_resolution(&self) -> (u32, u32) {
        (self.render_width, self.render_height)
    }

    /// Set vertical field of view in degrees
    pub fn set_field_of_view_degrees(&mut self, fov_degrees: f32) {
        self.fov_degrees = fov_degrees;
        self.projection_dirty.set(true);
    }

    /// Set near and far clipping planes
    pub fn set_clip_planes(&mut self, near: f32, far: f32) {
        self.near = near;
        self.far = far;
        self.projection_dirty.set(true);
    }

    /// Update the aspect ratio used by the projection
    ///
    /// This is the hook for viewport resizes. The internal render resolution
    /// is not touched. Non-positive or non-finite values are rejected.
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        if !(aspect.is_finite() && aspect > 0.0) {
            log::warn!("Camera '{}': ignoring invalid aspect ratio {}", self.name, aspect);
            return;
        }
        if (self.aspect - aspect).abs() > 0.01 {
            log::debug!("Camera '{}' aspect ratio changed: {:.3} -> {:.3}", self.name, self.aspect, aspect);
        }
        self.aspect = aspect;
        self.projection_dirty.set(true);
    }

    /// Change the internal render resolution
    ///
    /// The aspect ratio follows the new resolution only when `update_aspect`
    /// is set.
    pub fn set_render_resolution(&mut self, width: u32, height: u32, update_aspect: bool) {
        if width == 0 || height == 0 {
            log::warn!("Camera '{}': ignoring zero render resolution {}x{}", self.name, width, height);
            return;
        }
        self.render_width = width;
        self.render_height = height;
        if update_aspect {
            self.set_aspect_ratio(width as f32 / height as f32);
        }
    }

    /// World-to-camera matrix
    ///
    /// Inverse of the transform's world matrix. A degenerate transform (zero
    /// scale, for instance) cannot be inverted; in that case the identity
    /// matrix is returned and an error is logged.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        if self.view_dirty.get() || self.transform.is_dirty() {
            let view = self.transform.world_matrix().try_inverse().unwrap_or_else(|| {
                log::error!("Camera '{}': transform is not invertible, using identity view", self.name);
                Mat4::identity()
            });
            self.view.set(view);
            self.view_dirty.set(false);
        }
        self.view.get()
    }

    /// Perspective projection matrix
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        if self.projection_dirty.get() {
            self.projection.set(Mat4::perspective(
                utils::deg_to_rad(self.fov_degrees),
                self.aspect,
                self.near,
                self.far,
            ));
            self.projection_dirty.set(false);
        }
        self.projection.get()
    }

    /// Combined `projection * view`
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Whether the projection cache is stale
    #[must_use]
    pub fn is_projection_dirty(&self) -> bool {
        self.projection_dirty.get()
    }

    /// Whether the view cache is stale
    #[must_use]
    pub fn is_view_dirty(&self) -> bool {
        self.view_dirty.get() || self.transform.is_dirty()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new("Camera", DEFAULT_FOV_DEGREES, 16.0 / 9.0, DEFAULT_NEAR, DEFAULT_FAR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Vec3, Vec4};
    use approx::assert_relative_eq;

    #[test]
    fn test_view_is_inverse_of_world() {
        let mut camera = Camera::default();
        camera.transform_mut().set_position(Vec3::new(0.0, 2.0, 5.0));
        camera.transform_mut().look_at(Vec3::zeros(), Vec3::y());

        let product = camera.view_matrix() * camera.transform().world_matrix();
        assert_relative_eq!(product, Mat4::identity(), epsilon = 1e-5);
    }

    #[test]
    fn test_degenerate_transform_yields_identity_view() {
        let mut camera = Camera::default();
        camera.transform_mut().set_scale(Vec3::zeros());
        assert_eq!(camera.view_matrix(), Mat4::identity());
    }

    #[test]
    fn test_view_and_projection_caches_are_independent() {
        let mut camera = Camera::default();
        let _ = camera.view_matrix();
        let _ = camera.projection_matrix();
        assert!(!camera.is_view_dirty());
        assert!(!camera.is_projection_dirty());

        camera.set_aspect_ratio(1.0);
        assert!(camera.is_projection_dirty());
        assert!(!camera.is_view_dirty());

        let _ = camera.projection_matrix();
        camera.transform_mut().set_position(Vec3::new(1.0, 0.0, 0.0));
        assert!(camera.is_view_dirty());
        assert!(!camera.is_projection_dirty());
    }

    #[test]
    fn test_aspect_change_leaves_render_resolution() {
        let mut camera = Camera::default();
        camera.set_render_resolution(640, 480, false);
        camera.set_aspect_ratio(2.0);

        assert_eq!(camera.render_resolution(), (640, 480));
        assert_relative_eq!(camera.aspect_ratio(), 2.0);

        camera.set_render_resolution(800, 400, true);
        assert_relative_eq!(camera.aspect_ratio(), 2.0);
        camera.set_render_resolution(300, 300, true);
        assert_relative_eq!(camera.aspect_ratio(), 1.0);
    }

    #[test]
    fn test_invalid_aspect_is_rejected() {
        let mut camera = Camera::default();
        let before = camera.aspect_ratio();
        camera.set_aspect_ratio(0.0);
        camera.set_aspect_ratio(f32::NAN);
        assert_relative_eq!(camera.aspect_ratio(), before);
    }

    #[test]
    fn test_projection_uses_vertical_fov() {
        let camera = Camera::new("lens", 90.0, 1.0, 1.0, 100.0);
        let projection = camera.projection_matrix();
        // tan(45°) == 1, so the y scale is exactly 1
        assert_relative_eq!(projection[(1, 1)], 1.0, epsilon = 1e-5);

        let clip = projection * Vec4::new(0.0, 1.0, -1.0, 1.0);
        assert_relative_eq!(clip.y / clip.w, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_view_projection_centres_the_look_target() {
        let mut camera = Camera::new("eye", 60.0, 1.0, 0.1, 100.0);
        camera.transform_mut().set_position(Vec3::new(3.0, 1.0, 4.0));
        camera.transform_mut().look_at(Vec3::new(-2.0, 0.0, 1.0), Vec3::y());

        let clip = camera.view_projection_matrix() * Vec4::new(-2.0, 0.0, 1.0, 1.0);
        assert!(clip.w > 0.0);
        assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-4);
        assert_relative_eq!(clip.y / clip.w, 0.0, epsilon = 1e-4);
        assert_relative_eq!(
            camera.view_projection_matrix(),
            camera.projection_matrix() * camera.view_matrix(),
            epsilon = 1e-6
        );
    }
}
