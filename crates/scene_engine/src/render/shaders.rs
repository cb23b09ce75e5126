//! Built-in GLSL program
//!
//! Vertex inputs follow the packed mesh layout (locations 0..3 = position,
//! normal, colour, uv). The fragment stage evaluates a single light with the
//! same rules as [`crate::scene::Light::intensity_at`]:
//! `uLightType` 0 = none, 1 = directional, 2 = spot.

/// Uniform names written by the renderer
pub mod uniforms {
    /// Model matrix
    pub const MODEL: &str = "uModel";
    /// View matrix
    pub const VIEW: &str = "uView";
    /// Projection matrix
    pub const PROJECTION: &str = "uProjection";
    /// Material tint
    pub const TINT: &str = "uTint";
    /// Albedo sampler unit
    pub const ALBEDO: &str = "uAlbedo";
    /// Ambient term
    pub const AMBIENT: &str = "uAmbient";
    /// Light variant
    pub const LIGHT_TYPE: &str = "uLightType";
    /// Light colour
    pub const LIGHT_COLOR: &str = "uLightColor";
    /// Light intensity
    pub const LIGHT_INTENSITY: &str = "uLightIntensity";
    /// Light forward axis
    pub const LIGHT_DIRECTION: &str = "uLightDirection";
    /// Light world position
    pub const LIGHT_POSITION: &str = "uLightPosition";
    /// Cosine of the spot inner angle
    pub const SPOT_COS_INNER: &str = "uSpotCosInner";
    /// Cosine of the spot outer angle
    pub const SPOT_COS_OUTER: &str = "uSpotCosOuter";
    /// Spot range
    pub const LIGHT_RANGE: &str = "uLightRange";
}

/// Texture unit the albedo texture is bound to
pub const ALBEDO_TEXTURE_UNIT: u32 = 0;

/// Vertex stage
pub const VERTEX_SHADER: &str = r"#version 330 core
layout(location = 0) in vec3 aPosition;
layout(location = 1) in vec3 aNormal;
layout(location = 2) in vec4 aColor;
layout(location = 3) in vec2 aUv;

uniform mat4 uModel;
uniform mat4 uView;
uniform mat4 uProjection;

out vec3 vWorldPosition;
out vec3 vNormal;
out vec4 vColor;
out vec2 vUv;

void main() {
    vec4 world = uModel * vec4(aPosition, 1.0);
    vWorldPosition = world.xyz;
    vNormal = mat3(transpose(inverse(uModel))) * aNormal;
    vColor = aColor;
    vUv = aUv;
    gl_Position = uProjection * uView * world;
}
";

/// Fragment stage
pub const FRAGMENT_SHADER: &str = r"#version 330 core
const float EPSILON = 0.005;

in vec3 vWorldPosition;
in vec3 vNormal;
in vec4 vColor;
in vec2 vUv;

uniform sampler2D uAlbedo;
uniform vec4 uTint;
uniform float uAmbient;
uniform int uLightType;
uniform vec3 uLightColor;
uniform float uLightIntensity;
uniform vec3 uLightDirection;
uniform vec3 uLightPosition;
uniform float uSpotCosInner;
uniform float uSpotCosOuter;
uniform float uLightRange;

out vec4 fragColor;

vec3 directionToLight() {
    if (uLightType == 1) {
        return -normalize(uLightDirection);
    }
    vec3 delta = uLightPosition - vWorldPosition;
    return length(delta) > 0.0 ? normalize(delta) : -normalize(uLightDirection);
}

float directional(vec3 normal, vec3 toLight) {
    return dot(normal, toLight) > 0.0 ? uLightIntensity : 0.0;
}

float spot(vec3 toLight) {
    if (uLightIntensity < EPSILON || uLightRange <= 0.0) {
        return 0.0;
    }
    float distance = length(uLightPosition - vWorldPosition);
    if (distance > uLightRange) {
        return 0.0;
    }
    float falloff = clamp(1.0 - distance / uLightRange, 0.0, 1.0);
    float attenuation = falloff * falloff;
    if (attenuation < EPSILON) {
        return 0.0;
    }
    float theta = dot(-toLight, normalize(uLightDirection));
    float cone = 0.0;
    if (theta > uSpotCosInner) {
        cone = 1.0;
    } else if (theta > uSpotCosOuter) {
        cone = clamp((theta - uSpotCosOuter) / (uSpotCosInner - uSpotCosOuter), 0.0, 1.0);
    }
    if (cone < EPSILON) {
        return 0.0;
    }
    float result = uLightIntensity * attenuation * cone;
    return result < EPSILON ? 0.0 : result;
}

void main() {
    vec3 normal = normalize(vNormal);
    vec3 toLight = directionToLight();
    float lit = 0.0;
    if (uLightType == 1) {
        lit = directional(normal, toLight);
    } else if (uLightType == 2) {
        lit = spot(toLight);
    }
    float diffuse = max(dot(normal, toLight), 0.0);
    vec4 base = texture(uAlbedo, vUv) * uTint * vColor;
    vec3 color = base.rgb * (uAmbient + lit * diffuse * uLightColor);
    fragColor = vec4(color, base.a);
}
";
