//! Light sources
//!
//! A [`Light`] carries the attributes every light shares (colour, intensity,
//! active flag, transform) plus a [`LightKind`] payload holding what is specific
//! to each variant. Evaluation dispatches on the kind.
//!
//! Only one light is shaded per draw, see [`crate::scene::Scene::draw`].

use crate::foundation::math::{utils, Vec3, NORMALIZE_EPSILON};
use crate::scene::{EntityId, Transform};

/// Contributions below this value are treated as zero
pub const LIGHT_EPSILON: f32 = 0.005;

/// Variant-specific light data
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Parallel rays travelling along the transform's forward axis
    Directional,
    /// Cone of light emitted from the transform's position along its forward axis
    Spot {
        /// Cosine of the inner (full intensity) half-angle
        cos_inner: f32,
        /// Cosine of the outer (zero intensity) half-angle
        cos_outer: f32,
        /// Distance at which the light fades out completely
        range: f32,
    },
}

/// A light source in the scene
#[derive(Debug, Clone)]
pub struct Light {
    id: EntityId,
    name: String,
    kind: LightKind,
    transform: Transform,
    /// Linear RGB colour, each channel in `[0, 1]`
    pub color: Vec3,
    /// Scalar intensity multiplier
    pub intensity: f32,
    /// Inactive lights contribute nothing
    pub active: bool,
}

impl Light {
    /// Create a directional light
    #[must_use]
    pub fn directional(color: Vec3, intensity: f32) -> Self {
        Self::with_kind(LightKind::Directional, color, intensity)
    }

    /// Create a spot light
    ///
    /// Cone angles are half-angles in degrees and are stored as cosines. An
    /// outer angle smaller than the inner angle is raised to match it.
    #[must_use]
    pub fn spot(color: Vec3, intensity: f32, inner_degrees: f32, outer_degrees: f32, range: f32) -> Self {
        let outer_degrees = if outer_degrees < inner_degrees {
            log::debug!(
                "Spot outer angle {outer_degrees}° is smaller than inner angle {inner_degrees}°, clamping"
            );
            inner_degrees
        } else {
            outer_degrees
        };

        Self::with_kind(
            LightKind::Spot {
                cos_inner: utils::deg_to_rad(inner_degrees).cos(),
                cos_outer: utils::deg_to_rad(outer_degrees).cos(),
                range,
            },
            color,
            intensity,
        )
    }

    fn with_kind(kind: LightKind, color: Vec3, intensity: f32) -> Self {
        Self {
            id: EntityId::next(),
            name: String::new(),
            kind,
            transform: Transform::identity(),
            color,
            intensity,
            active: true,
        }
    }

    /// Builder pattern: set the name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Unique identity of this light
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Light name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variant data
    #[must_use]
    pub fn kind(&self) -> LightKind {
        self.kind
    }

    /// Placement of the light
    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Mutable placement
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Unit vector from `point` towards the light
    ///
    /// For a directional light this is the reverse of the direction the rays
    /// travel and does not depend on `point`.
    #[must_use]
    pub fn direction_to_light(&self, point: Vec3) -> Vec3 {
        match self.kind {
            LightKind::Directional => -self.transform.forward(),
            LightKind::Spot { .. } => (self.transform.world_position() - point)
                .try_normalize(NORMALIZE_EPSILON)
                .unwrap_or_else(|| -self.transform.forward()),
        }
    }

    /// Scalar intensity reaching `point` on a surface with `normal`
    #[must_use]
    pub fn intensity_at(&self, point: Vec3, normal: Vec3) -> f32 {
        if !self.active {
            return 0.0;
        }
        match self.kind {
            LightKind::Directional => {
                if normal.dot(&self.direction_to_light(point)) > 0.0 {
                    self.intensity
                } else {
                    0.0
                }
            }
            LightKind::Spot { cos_inner, cos_outer, range } => {
                self.spot_intensity(point, cos_inner, cos_outer, range)
            }
        }
    }

    fn spot_intensity(&self, point: Vec3, cos_inner: f32, cos_outer: f32, range: f32) -> f32 {
        if self.intensity < LIGHT_EPSILON || range <= 0.0 {
            return 0.0;
        }

        let to_light = self.transform.world_position() - point;
        let distance = to_light.norm();
        if distance > range {
            return 0.0;
        }

        let range_attenuation = (1.0 - distance / range).clamp(0.0, 1.0).powi(2);
        if range_attenuation < LIGHT_EPSILON {
            return 0.0;
        }

        let forward = self.transform.forward();
        let direction_to_light = if distance > NORMALIZE_EPSILON {
            to_light / distance
        } else {
            -forward
        };
        let theta = (-direction_to_light).dot(&forward);
        let spot_effect = spot_cone_factor(theta, cos_inner, cos_outer);
        if spot_effect < LIGHT_EPSILON {
            return 0.0;
        }

        let result = self.intensity * range_attenuation * spot_effect;
        if result < LIGHT_EPSILON {
            0.0
        } else {
            result
        }
    }
}

/// Cone falloff: 1 inside the inner cone, 0 on or outside the outer cone,
/// linear in between
#[must_use]
pub fn spot_cone_factor(theta: f32, cos_inner: f32, cos_outer: f32) -> f32 {
    if theta > cos_inner {
        1.0
    } else if theta <= cos_outer {
        0.0
    } else {
        ((theta - cos_outer) / (cos_inner - cos_outer)).clamp(0.0, 1.0)
    }
}
