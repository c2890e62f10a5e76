use flamelens_protocol::Color;

use crate::resize::PhysicalSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// Column-major 3×3 matrix.
    Mat3([f32; 9]),
    Vec2([f32; 2]),
    Float(f32),
    Bool(bool),
}

/// The drawing capability the flamegraph pipeline needs from a GPU API.
///
/// Handles are owned by whoever created them and released through the
/// matching `delete_*` call. Shader sources are given without a `#version`
/// line; backends prepend the one their API expects. Fallible calls return
/// the backend's error log as a string.
pub trait GraphicsContext {
    type Buffer;
    type Shader;
    type Program;
    type UniformLocation;
    type VertexArray;

    fn create_buffer(&mut self) -> Result<Self::Buffer, String>;
    /// Replace the whole contents of `buffer`.
    fn upload_data(&mut self, buffer: &Self::Buffer, data: &[f32]);
    fn delete_buffer(&mut self, buffer: Self::Buffer);

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<Self::Shader, String>;
    fn delete_shader(&mut self, shader: Self::Shader);
    fn link_program(
        &mut self,
        vertex: &Self::Shader,
        fragment: &Self::Shader,
    ) -> Result<Self::Program, String>;
    fn delete_program(&mut self, program: Self::Program);

    fn attribute_location(&mut self, program: &Self::Program, name: &str) -> Option<u32>;
    fn uniform_location(&mut self, program: &Self::Program, name: &str) -> Option<Self::UniformLocation>;

    fn create_vertex_array(&mut self) -> Result<Self::VertexArray, String>;
    fn bind_vertex_array(&mut self, vertex_array: Option<&Self::VertexArray>);
    fn delete_vertex_array(&mut self, vertex_array: Self::VertexArray);
    /// Feed attribute `location` from `buffer`, `components` floats per
    /// vertex, into the bound vertex array.
    fn set_attribute(&mut self, location: u32, buffer: &Self::Buffer, components: u8);

    fn use_program(&mut self, program: Option<&Self::Program>);
    fn set_uniform(&mut self, location: &Self::UniformLocation, value: UniformValue);

    fn set_viewport(&mut self, size: PhysicalSize);
    fn clear(&mut self, color: Color);
    fn draw_triangles(&mut self, vertex_count: usize);
}
