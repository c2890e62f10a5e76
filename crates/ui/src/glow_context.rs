//! OpenGL implementation of the flamegraph drawing capability.
#![allow(unsafe_code)]

use std::sync::Arc;

use eframe::glow::{self, HasContext as _};
use flamelens_core::PhysicalSize;
use flamelens_core::render::{GraphicsContext, ShaderStage, UniformValue};
use flamelens_protocol::Color;

#[cfg(not(target_arch = "wasm32"))]
const SHADER_VERSION: &str = "#version 330\n";
#[cfg(target_arch = "wasm32")]
const SHADER_VERSION: &str = "#version 300 es\n";

/// Wraps the glow context egui paints with.
///
/// Uniform locations are kept by name and resolved against the program in
/// use when they are set, so every handle stays a plain GL object id.
pub struct GlowContext {
    gl: Arc<glow::Context>,
    /// Lower-left corner of the canvas in framebuffer pixels.
    origin: (i32, i32),
    program: Option<glow::Program>,
}

impl GlowContext {
    pub fn new(gl: Arc<glow::Context>) -> Self {
        Self {
            gl,
            origin: (0, 0),
            program: None,
        }
    }

    /// A context for drawing inside an egui paint callback, with the
    /// viewport placed where egui laid out the canvas.
    pub fn for_paint(gl: Arc<glow::Context>, info: &egui::PaintCallbackInfo) -> Self {
        let viewport = info.viewport_in_pixels();
        Self {
            gl,
            origin: (viewport.left_px, viewport.from_bottom_px),
            program: None,
        }
    }
}

fn stage_type(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn to_gl_size(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl GraphicsContext for GlowContext {
    type Buffer = glow::Buffer;
    type Shader = glow::Shader;
    type Program = glow::Program;
    type UniformLocation = String;
    type VertexArray = glow::VertexArray;

    fn create_buffer(&mut self) -> Result<glow::Buffer, String> {
        unsafe { self.gl.create_buffer() }
    }

    fn upload_data(&mut self, buffer: &glow::Buffer, data: &[f32]) {
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(*buffer));
            self.gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(data),
                glow::DYNAMIC_DRAW,
            );
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    fn delete_buffer(&mut self, buffer: glow::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) }
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<glow::Shader, String> {
        unsafe {
            let shader = self.gl.create_shader(stage_type(stage))?;
            self.gl.shader_source(shader, &format!("{SHADER_VERSION}{source}"));
            self.gl.compile_shader(shader);
            if self.gl.get_shader_compile_status(shader) {
                Ok(shader)
            } else {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                Err(log)
            }
        }
    }

    fn delete_shader(&mut self, shader: glow::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn link_program(
        &mut self,
        vertex: &glow::Shader,
        fragment: &glow::Shader,
    ) -> Result<glow::Program, String> {
        unsafe {
            let program = self.gl.create_program()?;
            self.gl.attach_shader(program, *vertex);
            self.gl.attach_shader(program, *fragment);
            self.gl.link_program(program);
            self.gl.detach_shader(program, *vertex);
            self.gl.detach_shader(program, *fragment);
            if self.gl.get_program_link_status(program) {
                Ok(program)
            } else {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                Err(log)
            }
        }
    }

    fn delete_program(&mut self, program: glow::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn attribute_location(&mut self, program: &glow::Program, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(*program, name) }
    }

    fn uniform_location(&mut self, program: &glow::Program, name: &str) -> Option<String> {
        unsafe { self.gl.get_uniform_location(*program, name) }.map(|_| name.to_string())
    }

    fn create_vertex_array(&mut self) -> Result<glow::VertexArray, String> {
        unsafe { self.gl.create_vertex_array() }
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<&glow::VertexArray>) {
        unsafe { self.gl.bind_vertex_array(vertex_array.copied()) }
    }

    fn delete_vertex_array(&mut self, vertex_array: glow::VertexArray) {
        unsafe { self.gl.delete_vertex_array(vertex_array) }
    }

    fn set_attribute(&mut self, location: u32, buffer: &glow::Buffer, components: u8) {
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(*buffer));
            self.gl.enable_vertex_attrib_array(location);
            self.gl
                .vertex_attrib_pointer_f32(location, i32::from(components), glow::FLOAT, false, 0, 0);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    fn use_program(&mut self, program: Option<&glow::Program>) {
        self.program = program.copied();
        unsafe { self.gl.use_program(self.program) }
    }

    fn set_uniform(&mut self, location: &String, value: UniformValue) {
        let Some(program) = self.program else {
            log::warn!("uniform {location} set with no program in use");
            return;
        };
        unsafe {
            let location = self.gl.get_uniform_location(program, location);
            let location = location.as_ref();
            match value {
                UniformValue::Mat3(m) => self.gl.uniform_matrix_3_f32_slice(location, false, &m),
                UniformValue::Vec2([x, y]) => self.gl.uniform_2_f32(location, x, y),
                UniformValue::Float(v) => self.gl.uniform_1_f32(location, v),
                UniformValue::Bool(v) => self.gl.uniform_1_i32(location, i32::from(v)),
            }
        }
    }

    fn set_viewport(&mut self, size: PhysicalSize) {
        let (x, y) = self.origin;
        unsafe {
            self.gl
                .viewport(x, y, to_gl_size(size.width), to_gl_size(size.height));
        }
    }

    /// Clears only the canvas area; egui leaves the scissor set to the
    /// callback's clip rect.
    fn clear(&mut self, color: Color) {
        let [r, g, b, a] = color.to_array();
        unsafe {
            self.gl.clear_color(r * a, g * a, b * a, a);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    fn draw_triangles(&mut self, vertex_count: usize) {
        let count = i32::try_from(vertex_count).unwrap_or(i32::MAX);
        unsafe { self.gl.draw_arrays(glow::TRIANGLES, 0, count) }
    }
}
