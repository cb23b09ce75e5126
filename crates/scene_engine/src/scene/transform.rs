//! Transform with a lazily cached world matrix
//!
//! A transform stores position, rotation and scale and memoizes the matrix built
//! from them. Every mutator marks the cache dirty; [`Transform::world_matrix`]
//! rebuilds it on the next read. Direction vectors (`forward`, `up`, `right`) and
//! the world position are always read back out of that matrix, never cached on
//! their own, so they cannot drift from the stored components.
//!
//! # Coordinate System
//! Right-handed, Y-up. The identity transform faces -Z.

use std::cell::Cell;

use crate::foundation::math::{decompose_trs, Mat3, Mat4, Mat4Ext, Quat, Unit, Vec3, NORMALIZE_EPSILON};

/// Reference frame for [`Transform::translate`] and [`Transform::rotate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    /// Relative to the transform's own orientation
    Local,
    /// Relative to the world axes
    World,
}

/// Position, rotation and scale of a single scene entity
///
/// Owned by exactly one mesh, camera or light.
#[derive(Debug, Clone)]
pub struct Transform {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    world: Cell<Mat4>,
    dirty: Cell<bool>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Quat::identity(), Vec3::new(1.0, 1.0, 1.0))
    }
}

impl PartialEq for Transform {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position && self.rotation == other.rotation && self.scale == other.scale
    }
}

impl Transform {
    /// Create a transform from its components
    #[must_use]
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        let mut rotation = rotation;
        rotation.renormalize();
        Self {
            position,
            rotation,
            scale,
            world: Cell::new(Mat4::identity()),
            dirty: Cell::new(true),
        }
    }

    /// Create identity transform
    #[must_use]
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create from position only
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Create from an affine matrix (decomposed into TRS)
    #[must_use]
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (position, rotation, scale) = decompose_trs(matrix);
        Self::new(position, rotation, scale)
    }

    /// Local position
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Local rotation, always unit length
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Local scale
    #[must_use]
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Set position
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.mark_dirty();
    }

    /// Set rotation; the quaternion is renormalized
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.rotation.renormalize();
        self.mark_dirty();
    }

    /// Set scale
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.mark_dirty();
    }

    /// Whether the cached world matrix is stale
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// World matrix (`T * R * S`), rebuilt only when a component changed
    #[must_use]
    pub fn world_matrix(&self) -> Mat4 {
        if self.dirty.get() {
            self.world
                .set(Mat4::from_trs(&self.position, &self.rotation, &self.scale));
            self.dirty.set(false);
        }
        self.world.get()
    }

    /// Move by `offset`
    ///
    /// In [`Space::Local`] the offset is first rotated by the current rotation,
    /// so `translate(-Z, Local)` always moves "forward".
    pub fn translate(&mut self, offset: Vec3, space: Space) {
        let delta = match space {
            Space::Local => self.rotation * offset,
            Space::World => offset,
        };
        self.set_position(self.position + delta);
    }

    /// Rotate by `angle` radians around `axis`
    ///
    /// [`Space::Local`] post-multiplies (axis expressed in the transform's own
    /// frame); [`Space::World`] pre-multiplies (axis expressed in world axes).
    pub fn rotate(&mut self, axis: Vec3, angle: f32, space: Space) {
        let Some(axis) = Unit::try_new(axis, NORMALIZE_EPSILON) else {
            log::warn!("Ignoring rotation around a zero-length axis");
            return;
        };
        let delta = Quat::from_axis_angle(&axis, angle);
        let rotation = match space {
            Space::Local => self.rotation * delta,
            Space::World => delta * self.rotation,
        };
        self.set_rotation(rotation);
    }

    /// Orient the transform so that its forward axis points at `target`
    ///
    /// A look-at *view* matrix is built from the current world position. That
    /// matrix maps world space into the viewer's space, which is the inverse of
    /// the orientation wanted here, so it is inverted into a *model* matrix and
    /// the rotation is read from the inverse's upper 3x3 block. Using the view
    /// matrix rotation directly would leave the transform facing away from the
    /// target.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let eye = self.world_position();
        let to_target = target - eye;
        if to_target.norm() < NORMALIZE_EPSILON {
            log::warn!("look_at target coincides with the transform position; orientation unchanged");
            return;
        }
        if to_target.normalize().cross(&up).norm() < NORMALIZE_EPSILON {
            log::warn!("look_at up vector is parallel to the view direction; orientation unchanged");
            return;
        }

        let view = Mat4::look_at(eye, target, up);
        let Some(model) = view.try_inverse() else {
            log::error!("look_at produced a singular view matrix; orientation unchanged");
            return;
        };
        let basis: Mat3 = model.fixed_view::<3, 3>(0, 0).into_owned();
        self.set_rotation(Quat::from_matrix(&basis));
    }

    /// World-space position (fourth column of the world matrix)
    #[must_use]
    pub fn world_position(&self) -> Vec3 {
        self.world_matrix().translation_part()
    }

    /// World rotation extracted from the world matrix
    #[must_use]
    pub fn world_rotation(&self) -> Quat {
        let (_, rotation, _) = decompose_trs(&self.world_matrix());
        rotation
    }

    /// Unit forward vector (-Z column of the world matrix)
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        -self.basis_axis(2, Vec3::z())
    }

    /// Unit up vector (+Y column of the world matrix)
    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.basis_axis(1, Vec3::y())
    }

    /// Unit right vector (+X column of the world matrix)
    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.basis_axis(0, Vec3::x())
    }

    fn basis_axis(&self, column: usize, fallback: Vec3) -> Vec3 {
        let matrix = self.world_matrix();
        let axis = Vec3::new(matrix[(0, column)], matrix[(1, column)], matrix[(2, column)]);
        axis.try_normalize(NORMALIZE_EPSILON).unwrap_or(fallback)
    }

    fn mark_dirty(&mut self) {
        self.dirty.set(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants::PI;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_transform_identity() {
        let transform = Transform::identity();

        assert_eq!(transform.world_matrix(), Mat4::identity());
        assert_relative_eq!(transform.forward(), Vec3::new(0.0, 0.0, -1.0), epsilon = EPSILON);
        assert_relative_eq!(transform.up(), Vec3::y(), epsilon = EPSILON);
        assert_relative_eq!(transform.right(), Vec3::x(), epsilon = EPSILON);
    }

    #[test]
    fn test_cache_is_rebuilt_only_after_changes() {
        let mut transform = Transform::identity();
        assert!(transform.is_dirty());

        let _ = transform.world_matrix();
        assert!(!transform.is_dirty());

        transform.set_position(Vec3::new(1.0, 2.0, 3.0));
        assert!(transform.is_dirty());
        assert_relative_eq!(transform.world_position(), Vec3::new(1.0, 2.0, 3.0), epsilon = EPSILON);
        assert!(!transform.is_dirty());

        transform.set_scale(Vec3::new(2.0, 2.0, 2.0));
        assert!(transform.is_dirty());
        assert_relative_eq!(transform.world_matrix()[(0, 0)], 2.0, epsilon = EPSILON);
    }

    #[test]
    fn test_translate_local_follows_rotation() {
        let mut transform = Transform::identity();
        transform.set_rotation(Quat::from_axis_angle(&Vec3::y_axis(), PI / 2.0));

        transform.translate(Vec3::new(0.0, 0.0, -1.0), Space::Local);
        // Facing -X after a quarter turn around +Y
        assert_relative_eq!(transform.position(), Vec3::new(-1.0, 0.0, 0.0), epsilon = EPSILON);

        transform.translate(Vec3::new(0.0, 0.0, -1.0), Space::World);
        assert_relative_eq!(transform.position(), Vec3::new(-1.0, 0.0, -1.0), epsilon = EPSILON);
    }

    #[test]
    fn test_rotate_local_and_world_order() {
        let tilt = Quat::from_axis_angle(&Vec3::x_axis(), PI / 2.0);

        let mut local = Transform::identity();
        local.set_rotation(tilt);
        local.rotate(Vec3::y(), PI / 2.0, Space::Local);
        let expected_local = tilt * Quat::from_axis_angle(&Vec3::y_axis(), PI / 2.0);
        assert!(local.rotation().angle_to(&expected_local) < 1e-4);

        let mut world = Transform::identity();
        world.set_rotation(tilt);
        world.rotate(Vec3::y(), PI / 2.0, Space::World);
        let expected_world = Quat::from_axis_angle(&Vec3::y_axis(), PI / 2.0) * tilt;
        assert!(world.rotation().angle_to(&expected_world) < 1e-4);

        assert!(local.rotation().angle_to(&world.rotation()) > 0.1);
    }

    #[test]
    fn test_rotation_stays_unit_after_many_mutations() {
        let mut transform = Transform::identity();
        for step in 0..1000 {
            transform.rotate(Vec3::new(1.0, 0.3, -0.2), 0.013 * step as f32, Space::Local);
            transform.rotate(Vec3::new(0.0, 1.0, 0.5), -0.007, Space::World);
        }
        assert_relative_eq!(transform.rotation().into_inner().norm(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_zero_axis_rotation_is_ignored() {
        let mut transform = Transform::identity();
        transform.rotate(Vec3::zeros(), 1.0, Space::Local);
        assert_eq!(transform.rotation(), Quat::identity());
    }

    #[test]
    fn test_look_at_points_forward_at_target() {
        let mut transform = Transform::from_position(Vec3::new(0.0, 0.0, 5.0));
        transform.look_at(Vec3::new(5.0, 0.0, 5.0), Vec3::y());
        assert_relative_eq!(transform.forward(), Vec3::new(1.0, 0.0, 0.0), epsilon = EPSILON);

        let mut transform = Transform::from_position(Vec3::new(3.0, 4.0, 0.0));
        transform.look_at(Vec3::zeros(), Vec3::y());
        let expected = (Vec3::zeros() - Vec3::new(3.0, 4.0, 0.0)).normalize();
        assert_relative_eq!(transform.forward(), expected, epsilon = EPSILON);
        assert!(transform.up().y > 0.0);
    }

    #[test]
    fn test_directions_are_unit_under_scale() {
        let mut transform = Transform::identity();
        transform.set_scale(Vec3::new(3.0, 0.5, 7.0));
        transform.rotate(Vec3::new(1.0, 1.0, 1.0), 0.8, Space::World);

        assert_relative_eq!(transform.forward().norm(), 1.0, epsilon = EPSILON);
        assert_relative_eq!(transform.up().norm(), 1.0, epsilon = EPSILON);
        assert_relative_eq!(transform.right().norm(), 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_from_matrix_roundtrip() {
        let original = Transform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_axis_angle(&Unit::new_normalize(Vec3::new(1.0, 1.0, 1.0)), 0.5),
            Vec3::new(2.0, 1.5, 0.8),
        );
        let rebuilt = Transform::from_matrix(&original.world_matrix());

        assert_relative_eq!(rebuilt.position(), original.position(), epsilon = EPSILON);
        assert_relative_eq!(rebuilt.scale(), original.scale(), epsilon = EPSILON);
        assert!(rebuilt.rotation().angle_to(&original.rotation()) < 1e-3);
    }
}
