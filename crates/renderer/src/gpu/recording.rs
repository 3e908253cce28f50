//! In-memory backend for unit tests.
//!
//! Mimics the driver behaviour the pipeline depends on: sources without a
//! `main` fail to compile, a program links only with one shader per stage,
//! validation fails with no vertex array bound, and only declared uniforms
//! resolve. Releasing a handle that is not alive panics, so double releases
//! surface as test failures.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::types::ShaderStage;

use super::GraphicsBackend;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    UseProgram(Option<u32>),
    BindVertexArray(Option<u32>),
    UniformMatrix4 { location: u32, columns: [f32; 16] },
    Viewport(i32, i32),
    Clear([f32; 4]),
    Draw { first: i32, count: i32 },
}

#[derive(Debug)]
struct FakeShader {
    stage: ShaderStage,
    source: String,
    compiled: bool,
}

#[derive(Debug, Default)]
struct FakeProgram {
    stages: Vec<ShaderStage>,
    uniforms: Vec<String>,
    linked: bool,
    validated: bool,
}

#[derive(Debug, Default)]
struct State {
    next_id: u32,
    shaders: HashMap<u32, FakeShader>,
    programs: HashMap<u32, FakeProgram>,
    buffers: Vec<u32>,
    vertex_arrays: Vec<u32>,
    bound_vertex_array: Option<u32>,
    buffer_bytes: Vec<u8>,
    attributes: Vec<(u32, i32, i32, i32)>,
    enabled_attributes: Vec<u32>,
    calls: Vec<Call>,
    fail_link: bool,
    fail_validate: bool,
    refuse_programs: bool,
}

impl State {
    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingBackend {
    state: RefCell<State>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_link() -> Self {
        let backend = Self::new();
        backend.state.borrow_mut().fail_link = true;
        backend
    }

    pub fn failing_validation() -> Self {
        let backend = Self::new();
        backend.state.borrow_mut().fail_validate = true;
        backend
    }

    pub fn refusing_programs() -> Self {
        let backend = Self::new();
        backend.state.borrow_mut().refuse_programs = true;
        backend
    }

    /// Shaders, programs, buffers and vertex arrays not yet released.
    pub fn live_objects(&self) -> usize {
        let state = self.state.borrow();
        state.shaders.len() + state.programs.len() + state.buffers.len() + state.vertex_arrays.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn uniform_uploads(&self) -> Vec<[f32; 16]> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::UniformMatrix4 { columns, .. } => Some(*columns),
                _ => None,
            })
            .collect()
    }

    pub fn draw_count(&self) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| matches!(call, Call::Draw { .. }))
            .count()
    }

    pub fn buffer_bytes(&self) -> Vec<u8> {
        self.state.borrow().buffer_bytes.clone()
    }

    pub fn attributes(&self) -> Vec<(u32, i32, i32, i32)> {
        self.state.borrow().attributes.clone()
    }

    pub fn enabled_attributes(&self) -> Vec<u32> {
        self.state.borrow().enabled_attributes.clone()
    }
}

fn declared_uniforms(source: &str) -> impl Iterator<Item = String> + '_ {
    source.lines().filter_map(|line| {
        let rest = line.trim().strip_prefix("uniform ")?;
        let name = rest.split_whitespace().nth(1)?;
        Some(name.trim_end_matches(';').to_string())
    })
}

impl GraphicsBackend for RecordingBackend {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type VertexArray = u32;
    type UniformLocation = u32;

    fn create_shader(&self, stage: ShaderStage) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate();
        state.shaders.insert(
            id,
            FakeShader {
                stage,
                source: String::new(),
                compiled: false,
            },
        );
        Ok(id)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        let mut state = self.state.borrow_mut();
        let entry = state.shaders.get_mut(&shader).expect("live shader");
        entry.source = source.to_string();
    }

    fn compile_shader(&self, shader: u32) {
        let mut state = self.state.borrow_mut();
        let entry = state.shaders.get_mut(&shader).expect("live shader");
        entry.compiled = entry.source.contains("void main");
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        self.state.borrow().shaders[&shader].compiled
    }

    fn shader_info_log(&self, shader: u32) -> String {
        if self.shader_compile_status(shader) {
            String::new()
        } else {
            "0:1(1): error: syntax error, no entry point `main`".to_string()
        }
    }

    fn delete_shader(&self, shader: u32) {
        let removed = self.state.borrow_mut().shaders.remove(&shader);
        assert!(removed.is_some(), "shader {shader} released twice");
    }

    fn create_program(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        if state.refuse_programs {
            return Err("out of program objects".to_string());
        }
        let id = state.allocate();
        state.programs.insert(id, FakeProgram::default());
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state.borrow_mut();
        let (stage, uniforms) = {
            let entry = &state.shaders[&shader];
            (entry.stage, declared_uniforms(&entry.source).collect::<Vec<_>>())
        };
        let entry = state.programs.get_mut(&program).expect("live program");
        entry.stages.push(stage);
        entry.uniforms.extend(uniforms);
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        let state = self.state.borrow();
        assert!(state.programs.contains_key(&program), "live program");
        assert!(state.shaders.contains_key(&shader), "live shader");
    }

    fn link_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        let fail = state.fail_link;
        let entry = state.programs.get_mut(&program).expect("live program");
        let has_both = entry.stages.contains(&ShaderStage::Vertex)
            && entry.stages.contains(&ShaderStage::Fragment)
            && entry.stages.len() == 2;
        entry.linked = has_both && !fail;
    }

    fn program_link_status(&self, program: u32) -> bool {
        self.state.borrow().programs[&program].linked
    }

    fn validate_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        let ok = state.bound_vertex_array.is_some() && !state.fail_validate;
        let entry = state.programs.get_mut(&program).expect("live program");
        entry.validated = entry.linked && ok;
    }

    fn program_validate_status(&self, program: u32) -> bool {
        self.state.borrow().programs[&program].validated
    }

    fn program_info_log(&self, program: u32) -> String {
        let state = self.state.borrow();
        let entry = &state.programs[&program];
        if !entry.linked {
            "error: linking failed, unresolved varyings".to_string()
        } else if !entry.validated {
            "validation failed: no vertex array object bound".to_string()
        } else {
            String::new()
        }
    }

    fn delete_program(&self, program: u32) {
        let removed = self.state.borrow_mut().programs.remove(&program);
        assert!(removed.is_some(), "program {program} released twice");
    }

    fn use_program(&self, program: Option<u32>) {
        self.state.borrow_mut().calls.push(Call::UseProgram(program));
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<u32> {
        let state = self.state.borrow();
        let entry = &state.programs[&program];
        if !entry.linked {
            return None;
        }
        entry
            .uniforms
            .iter()
            .position(|uniform| uniform == name)
            .map(|index| program * 100 + index as u32)
    }

    fn uniform_matrix4(&self, location: &u32, columns: &[f32; 16]) {
        self.state.borrow_mut().calls.push(Call::UniformMatrix4 {
            location: *location,
            columns: *columns,
        });
    }

    fn create_vertex_array(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate();
        state.vertex_arrays.push(id);
        Ok(id)
    }

    fn bind_vertex_array(&self, vertex_array: Option<u32>) {
        let mut state = self.state.borrow_mut();
        state.bound_vertex_array = vertex_array;
        state.calls.push(Call::BindVertexArray(vertex_array));
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        let mut state = self.state.borrow_mut();
        let index = state
            .vertex_arrays
            .iter()
            .position(|&id| id == vertex_array)
            .unwrap_or_else(|| panic!("vertex array {vertex_array} released twice"));
        state.vertex_arrays.remove(index);
    }

    fn create_buffer(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate();
        state.buffers.push(id);
        Ok(id)
    }

    fn bind_array_buffer(&self, _buffer: Option<u32>) {}

    fn array_buffer_static_data(&self, bytes: &[u8]) {
        self.state.borrow_mut().buffer_bytes = bytes.to_vec();
    }

    fn delete_buffer(&self, buffer: u32) {
        let mut state = self.state.borrow_mut();
        let index = state
            .buffers
            .iter()
            .position(|&id| id == buffer)
            .unwrap_or_else(|| panic!("buffer {buffer} released twice"));
        state.buffers.remove(index);
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, components: i32, stride: i32, offset: i32) {
        self.state
            .borrow_mut()
            .attributes
            .push((index, components, stride, offset));
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.state.borrow_mut().enabled_attributes.push(index);
    }

    fn viewport(&self, width: i32, height: i32) {
        self.state
            .borrow_mut()
            .calls
            .push(Call::Viewport(width, height));
    }

    fn clear_color(&self, rgba: [f32; 4]) {
        self.state.borrow_mut().calls.push(Call::Clear(rgba));
    }

    fn draw_triangles(&self, first: i32, count: i32) {
        self.state
            .borrow_mut()
            .calls
            .push(Call::Draw { first, count });
    }
}
