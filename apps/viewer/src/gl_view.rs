//! OpenGL texture view for the GPU presentation path.

use eframe::egui_glow;
use eframe::glow::{self, HasContext as _};
use glance_frame_model::letterbox;
use glance_processing_core::GpuFrame;
use glance_render_engine::{Shading, FRAGMENT_SHADER, VERTEX_SHADER};

/// Shader program plus one texture holding the latest BGRA frame.
pub struct GlView {
    program: glow::Program,
    vertex_array: glow::VertexArray,
    texture: glow::Texture,
    texture_size: (u32, u32),
}

impl GlView {
    pub fn new(gl: &glow::Context) -> Result<Self, String> {
        let version = egui_glow::ShaderVersion::get(gl);
        unsafe {
            let program = gl.create_program()?;

            let sources = [
                (glow::VERTEX_SHADER, VERTEX_SHADER),
                (glow::FRAGMENT_SHADER, FRAGMENT_SHADER),
            ];
            let mut shaders = Vec::with_capacity(sources.len());
            for (kind, source) in sources {
                let shader = gl.create_shader(kind)?;
                gl.shader_source(
                    shader,
                    &format!("{}\n{}", version.version_declaration(), source),
                );
                gl.compile_shader(shader);
                if !gl.get_shader_compile_status(shader) {
                    let log = gl.get_shader_info_log(shader);
                    gl.delete_shader(shader);
                    gl.delete_program(program);
                    return Err(format!("shader compile failed: {log}"));
                }
                gl.attach_shader(program, shader);
                shaders.push(shader);
            }

            gl.link_program(program);
            let linked = gl.get_program_link_status(program);
            for shader in shaders {
                gl.detach_shader(program, shader);
                gl.delete_shader(shader);
            }
            if !linked {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(format!("shader link failed: {log}"));
            }

            let vertex_array = gl.create_vertex_array()?;
            let texture = gl.create_texture()?;

            Ok(Self {
                program,
                vertex_array,
                texture,
                texture_size: (0, 0),
            })
        }
    }

    /// Upload a new frame into the texture.
    pub fn upload(&mut self, gl: &glow::Context, frame: &GpuFrame) {
        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(self.texture));
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            // BGRA bytes stored as RGBA; the fragment stage swaps them back.
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                frame.width as i32,
                frame.height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                Some(&frame.data),
            );
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
        }
        self.texture_size = (frame.width, frame.height);
    }

    /// Draw the texture letterboxed into the callback's viewport.
    pub fn paint(&self, gl: &glow::Context, info: &eframe::egui::PaintCallbackInfo, shading: Shading) {
        let (tex_w, tex_h) = self.texture_size;
        if tex_w == 0 || tex_h == 0 {
            return;
        }
        let vp = info.viewport_in_pixels();
        let (vp_w, vp_h) = (vp.width_px as u32, vp.height_px as u32);
        let placement = letterbox(tex_w, tex_h, vp_w, vp_h);
        let filter = if shading.nearest {
            glow::NEAREST
        } else {
            glow::LINEAR
        } as i32;

        unsafe {
            gl.viewport(
                vp.left_px as i32 + placement.x as i32,
                vp.from_bottom_px as i32 + vp_h.saturating_sub(placement.y + placement.height) as i32,
                placement.width as i32,
                placement.height as i32,
            );
            gl.use_program(Some(self.program));
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(self.texture));
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, filter);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, filter);
            gl.uniform_1_i32(gl.get_uniform_location(self.program, "u_tex").as_ref(), 0);
            gl.uniform_1_f32(
                gl.get_uniform_location(self.program, "u_brightness").as_ref(),
                shading.brightness,
            );
            gl.uniform_1_f32(
                gl.get_uniform_location(self.program, "u_contrast").as_ref(),
                shading.contrast,
            );
            gl.bind_vertex_array(Some(self.vertex_array));
            gl.draw_arrays(glow::TRIANGLE_STRIP, 0, 4);
        }
    }

    pub fn destroy(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_program(self.program);
            gl.delete_vertex_array(self.vertex_array);
            gl.delete_texture(self.texture);
        }
    }
}
