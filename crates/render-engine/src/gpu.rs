//! GPU presentation: shading parameters and the GLSL used to draw a BGRA
//! texture letterboxed into the viewport.

use glance_frame_model::EffectSettings;

/// Per-frame uniforms for the shading stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shading {
    pub brightness: f32,
    pub contrast: f32,
    /// Nearest texture filtering (fast mode); linear otherwise.
    pub nearest: bool,
}

impl Shading {
    pub fn from_settings(settings: &EffectSettings) -> Self {
        Self {
            brightness: settings.brightness,
            contrast: settings.contrast,
            nearest: settings.fast_mode,
        }
    }

    /// CPU reference of the fragment stage for one normalised channel.
    pub fn shade(&self, v: f32) -> f32 {
        (((v - 0.5) * self.contrast + 0.5).clamp(0.0, 1.0) * self.brightness).clamp(0.0, 1.0)
    }
}

impl Default for Shading {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            contrast: 1.0,
            nearest: false,
        }
    }
}

pub const VERTEX_SHADER: &str = r#"
const vec2 verts[4] = vec2[4](
    vec2(-1.0, -1.0),
    vec2( 1.0, -1.0),
    vec2(-1.0,  1.0),
    vec2( 1.0,  1.0)
);
out vec2 v_uv;
void main() {
    vec2 p = verts[gl_VertexID];
    v_uv = vec2((p.x + 1.0) * 0.5, 1.0 - (p.y + 1.0) * 0.5);
    gl_Position = vec4(p, 0.0, 1.0);
}
"#;

/// Samples a texture uploaded as BGRA bytes (stored as RGBA), so the
/// channels are swapped back here.
pub const FRAGMENT_SHADER: &str = r#"
precision mediump float;
uniform sampler2D u_tex;
uniform float u_brightness;
uniform float u_contrast;
in vec2 v_uv;
out vec4 out_color;
void main() {
    vec4 c = texture(u_tex, v_uv).bgra;
    vec3 rgb = clamp((c.rgb - 0.5) * u_contrast + 0.5, 0.0, 1.0) * u_brightness;
    out_color = vec4(clamp(rgb, 0.0, 1.0), 1.0);
}
"#;
