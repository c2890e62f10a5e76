//! In-memory [`GraphicsContext`] that records every call, for tests and
//! headless use.

use std::collections::{HashMap, HashSet};

use flamelens_protocol::Color;

use super::context::{GraphicsContext, ShaderStage, UniformValue};
use crate::resize::PhysicalSize;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateBuffer(u32),
    UploadData { buffer: u32, len: usize },
    DeleteBuffer(u32),
    CompileShader(ShaderStage),
    DeleteShader(u32),
    LinkProgram(u32),
    DeleteProgram(u32),
    CreateVertexArray(u32),
    BindVertexArray(Option<u32>),
    DeleteVertexArray(u32),
    SetAttribute { location: u32, buffer: u32, components: u8 },
    UseProgram(Option<u32>),
    SetUniform { name: String, value: UniformValue },
    SetViewport(PhysicalSize),
    Clear(Color),
    DrawTriangles(usize),
}

#[derive(Debug, Default)]
pub struct RecordingContext {
    calls: Vec<Call>,
    next_id: u32,
    live: HashSet<u32>,
    buffers: HashMap<u32, Vec<f32>>,
    attributes: Vec<String>,
    attribute_buffers: HashMap<u32, u32>,
    fail_compile: Option<ShaderStage>,
    fail_link: bool,
    fail_allocation: bool,
    hidden: HashSet<String>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail compilation of the given stage.
    pub fn with_compile_failure(mut self, stage: ShaderStage) -> Self {
        self.fail_compile = Some(stage);
        self
    }

    pub fn with_link_failure(mut self) -> Self {
        self.fail_link = true;
        self
    }

    pub fn with_allocation_failure(mut self) -> Self {
        self.fail_allocation = true;
        self
    }

    /// Report the attribute or uniform `name` as absent from the program.
    pub fn without_location(mut self, name: &str) -> Self {
        self.hidden.insert(name.to_string());
        self
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    /// Objects created and not yet deleted.
    pub fn live_objects(&self) -> usize {
        self.live.len()
    }

    pub fn buffer_data(&self, buffer: u32) -> Option<&[f32]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    /// Contents of the buffer feeding the named attribute.
    pub fn attribute_data(&self, name: &str) -> Option<&[f32]> {
        let location = self.attributes.iter().position(|a| a == name)?;
        let location = u32::try_from(location).ok()?;
        let buffer = self.attribute_buffers.get(&location)?;
        self.buffer_data(*buffer)
    }

    /// The last value set for the named uniform.
    pub fn last_uniform(&self, name: &str) -> Option<UniformValue> {
        self.calls.iter().rev().find_map(|call| match call {
            Call::SetUniform { name: n, value } if n == name => Some(*value),
            _ => None,
        })
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.live.insert(self.next_id);
        self.next_id
    }

    fn release(&mut self, id: u32) {
        self.live.remove(&id);
    }
}

impl GraphicsContext for RecordingContext {
    type Buffer = u32;
    type Shader = u32;
    type Program = u32;
    type UniformLocation = String;
    type VertexArray = u32;

    fn create_buffer(&mut self) -> Result<u32, String> {
        if self.fail_allocation {
            return Err("out of memory".to_string());
        }
        let id = self.next();
        self.buffers.insert(id, Vec::new());
        self.calls.push(Call::CreateBuffer(id));
        Ok(id)
    }

    fn upload_data(&mut self, buffer: &u32, data: &[f32]) {
        self.buffers.insert(*buffer, data.to_vec());
        self.calls.push(Call::UploadData {
            buffer: *buffer,
            len: data.len(),
        });
    }

    fn delete_buffer(&mut self, buffer: u32) {
        self.buffers.remove(&buffer);
        self.release(buffer);
        self.calls.push(Call::DeleteBuffer(buffer));
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<u32, String> {
        self.calls.push(Call::CompileShader(stage));
        if self.fail_compile == Some(stage) || source.trim().is_empty() {
            return Err(format!("0:1: {stage} shader rejected"));
        }
        Ok(self.next())
    }

    fn delete_shader(&mut self, shader: u32) {
        self.release(shader);
        self.calls.push(Call::DeleteShader(shader));
    }

    fn link_program(&mut self, _vertex: &u32, _fragment: &u32) -> Result<u32, String> {
        if self.fail_link {
            return Err("varying mismatch".to_string());
        }
        let id = self.next();
        self.calls.push(Call::LinkProgram(id));
        Ok(id)
    }

    fn delete_program(&mut self, program: u32) {
        self.release(program);
        self.calls.push(Call::DeleteProgram(program));
    }

    fn attribute_location(&mut self, _program: &u32, name: &str) -> Option<u32> {
        if self.hidden.contains(name) {
            return None;
        }
        let index = match self.attributes.iter().position(|a| a == name) {
            Some(index) => index,
            None => {
                self.attributes.push(name.to_string());
                self.attributes.len() - 1
            }
        };
        u32::try_from(index).ok()
    }

    fn uniform_location(&mut self, _program: &u32, name: &str) -> Option<String> {
        (!self.hidden.contains(name)).then(|| name.to_string())
    }

    fn create_vertex_array(&mut self) -> Result<u32, String> {
        if self.fail_allocation {
            return Err("out of memory".to_string());
        }
        let id = self.next();
        self.calls.push(Call::CreateVertexArray(id));
        Ok(id)
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<&u32>) {
        self.calls.push(Call::BindVertexArray(vertex_array.copied()));
    }

    fn delete_vertex_array(&mut self, vertex_array: u32) {
        self.release(vertex_array);
        self.calls.push(Call::DeleteVertexArray(vertex_array));
    }

    fn set_attribute(&mut self, location: u32, buffer: &u32, components: u8) {
        self.attribute_buffers.insert(location, *buffer);
        self.calls.push(Call::SetAttribute {
            location,
            buffer: *buffer,
            components,
        });
    }

    fn use_program(&mut self, program: Option<&u32>) {
        self.calls.push(Call::UseProgram(program.copied()));
    }

    fn set_uniform(&mut self, location: &String, value: UniformValue) {
        self.calls.push(Call::SetUniform {
            name: location.clone(),
            value,
        });
    }

    fn set_viewport(&mut self, size: PhysicalSize) {
        self.calls.push(Call::SetViewport(size));
    }

    fn clear(&mut self, color: Color) {
        self.calls.push(Call::Clear(color));
    }

    fn draw_triangles(&mut self, vertex_count: usize) {
        self.calls.push(Call::DrawTriangles(vertex_count));
    }
}
