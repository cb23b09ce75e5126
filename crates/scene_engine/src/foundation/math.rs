//! Math utilities and types
//!
//! Provides fundamental math types for 3D graphics. All matrices use nalgebra's
//! column-vector convention, so a model matrix is written `T * R * S` and applies
//! scale first, then rotation, then translation. Written in row-vector notation
//! the same matrix reads `S · R · T`.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, UnitQuaternion, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Tolerance used when normalizing vectors that may be degenerate
pub const NORMALIZE_EPSILON: f32 = 1.0e-6;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    #[must_use]
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    #[must_use]
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Build a model matrix from translation, rotation and scale (`T * R * S`)
    fn from_trs(translation: &Vec3, rotation: &Quat, scale: &Vec3) -> Mat4;

    /// Create a perspective projection matrix
    ///
    /// Right-handed, looking down -Z, depth mapped to the `[-1, 1]` clip range.
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Create a right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Translation stored in the fourth column
    fn translation_part(&self) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn from_trs(translation: &Vec3, rotation: &Quat, scale: &Vec3) -> Mat4 {
        Mat4::new_translation(translation)
            * rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(scale)
    }

    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        // P = [1/(a·tan(φ/2))  0            0              0            ]
        //     [0               1/tan(φ/2)   0              0            ]
        //     [0               0            (f+n)/(n-f)    2fn/(n-f)    ]
        //     [0               0            -1             0            ]
        let tan_half_fovy = (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = (far + near) / (near - far);
        result[(2, 3)] = (2.0 * far * near) / (near - far);
        result[(3, 2)] = -1.0;

        result
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let camera_up = right.cross(&forward);

        let translation = Mat4::new(
            1.0, 0.0, 0.0, -eye.x,
            0.0, 1.0, 0.0, -eye.y,
            0.0, 0.0, 1.0, -eye.z,
            0.0, 0.0, 0.0, 1.0,
        );

        let rotation = Mat4::new(
            right.x, right.y, right.z, 0.0,
            camera_up.x, camera_up.y, camera_up.z, 0.0,
            -forward.x, -forward.y, -forward.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );

        rotation * translation
    }

    fn translation_part(&self) -> Vec3 {
        Vec3::new(self.m14, self.m24, self.m34)
    }
}

/// Split an affine matrix into translation, rotation and scale
///
/// Scale is the length of each basis column; the rotation is taken from the
/// columns once that scale is divided out. A mirrored basis (negative
/// determinant) carries the reflection as a negative X scale. Axes with zero
/// scale keep an identity basis vector so the rotation stays well defined.
#[must_use]
pub fn decompose_trs(matrix: &Mat4) -> (Vec3, Quat, Vec3) {
    let position = matrix.translation_part();

    let mut basis = matrix.fixed_view::<3, 3>(0, 0).into_owned();
    let mut scale = Vec3::new(
        basis.column(0).norm(),
        basis.column(1).norm(),
        basis.column(2).norm(),
    );
    if basis.determinant() < 0.0 {
        scale.x = -scale.x;
        let flipped = -basis.column(0);
        basis.set_column(0, &flipped);
    }
    let scale_magnitude = scale.abs();

    let mut rotation_matrix = Mat3::identity();
    for axis in 0..3 {
        if scale_magnitude[axis] > NORMALIZE_EPSILON {
            rotation_matrix.set_column(axis, &(basis.column(axis) / scale_magnitude[axis]));
        }
    }
    let rotation = Quat::from_matrix(&rotation_matrix);

    (position, rotation, scale)
}
