use std::ffi::{c_void, CStr};

use anyhow::{bail, Result};
use glow::HasContext;

use crate::types::ShaderStage;

use super::GraphicsBackend;

type ValidateProgramFn = unsafe extern "system" fn(program: u32);
type GetProgramivFn = unsafe extern "system" fn(program: u32, pname: u32, params: *mut i32);

/// Program validation entry points, which `glow::HasContext` does not wrap.
#[derive(Clone, Copy)]
struct ValidationEntryPoints {
    validate_program: ValidateProgramFn,
    get_programiv: GetProgramivFn,
}

impl ValidationEntryPoints {
    fn load<F>(loader: &mut F) -> Result<Self>
    where
        F: FnMut(&CStr) -> *const c_void,
    {
        let validate_program = loader(c"glValidateProgram");
        let get_programiv = loader(c"glGetProgramiv");
        if validate_program.is_null() {
            bail!("driver does not export glValidateProgram");
        }
        if get_programiv.is_null() {
            bail!("driver does not export glGetProgramiv");
        }
        // SAFETY: both pointers are non-null and were resolved by the context
        // loader for exactly these GL 2.0 symbols, whose C signatures match.
        unsafe {
            Ok(Self {
                validate_program: std::mem::transmute::<*const c_void, ValidateProgramFn>(
                    validate_program,
                ),
                get_programiv: std::mem::transmute::<*const c_void, GetProgramivFn>(
                    get_programiv,
                ),
            })
        }
    }

    /// # Safety
    ///
    /// The context the entry points came from must be current.
    unsafe fn validate(&self, program: u32) {
        (self.validate_program)(program);
    }

    /// # Safety
    ///
    /// As for [`ValidationEntryPoints::validate`].
    unsafe fn validate_status(&self, program: u32) -> bool {
        let mut status = 0;
        (self.get_programiv)(program, glow::VALIDATE_STATUS, &mut status);
        status != 0
    }
}

/// [`GraphicsBackend`] over a loaded `glow` context.
pub struct GlowBackend {
    gl: glow::Context,
    validation: ValidationEntryPoints,
}

impl GlowBackend {
    /// Loads GL entry points through `loader`.
    ///
    /// # Safety
    ///
    /// The GL context `loader` resolves symbols for must be current on the
    /// calling thread, and must stay current for as long as the backend is used.
    pub unsafe fn load<F>(mut loader: F) -> Result<Self>
    where
        F: FnMut(&CStr) -> *const c_void,
    {
        let validation = ValidationEntryPoints::load(&mut loader)?;
        let gl = glow::Context::from_loader_function_cstr(&mut loader);
        Ok(Self { gl, validation })
    }

    /// Driver version string, for diagnostics.
    pub fn version(&self) -> String {
        let version = self.gl.version();
        format!(
            "{}.{}{}",
            version.major,
            version.minor,
            if version.vendor_info.is_empty() {
                String::new()
            } else {
                format!(" ({})", version.vendor_info)
            }
        )
    }
}

fn stage_enum(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

// SAFETY (all blocks below): `GlowBackend::load` requires the context to be
// current on this thread, and every handle passed in was created by the same
// context through this backend.
impl GraphicsBackend for GlowBackend {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type Buffer = glow::Buffer;
    type VertexArray = glow::VertexArray;
    type UniformLocation = glow::UniformLocation;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String> {
        unsafe { self.gl.create_shader(stage_enum(stage)) }
    }

    fn shader_source(&self, shader: Self::Shader, source: &str) {
        unsafe { self.gl.shader_source(shader, source) }
    }

    fn compile_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.compile_shader(shader) }
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { self.gl.get_shader_compile_status(shader) }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.gl.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { self.gl.create_program() }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.attach_shader(program, shader) }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.detach_shader(program, shader) }
    }

    fn link_program(&self, program: Self::Program) {
        unsafe { self.gl.link_program(program) }
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        unsafe { self.gl.get_program_link_status(program) }
    }

    fn validate_program(&self, program: Self::Program) {
        unsafe { self.validation.validate(program.0.get()) }
    }

    fn program_validate_status(&self, program: Self::Program) -> bool {
        unsafe { self.validation.validate_status(program.0.get()) }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.gl.get_program_info_log(program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn uniform_matrix4(&self, location: &Self::UniformLocation, columns: &[f32; 16]) {
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(location), false, columns)
        }
    }

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String> {
        unsafe { self.gl.create_vertex_array() }
    }

    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        unsafe { self.gl.bind_vertex_array(vertex_array) }
    }

    fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        unsafe { self.gl.delete_vertex_array(vertex_array) }
    }

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        unsafe { self.gl.create_buffer() }
    }

    fn bind_array_buffer(&self, buffer: Option<Self::Buffer>) {
        unsafe { self.gl.bind_buffer(glow::ARRAY_BUFFER, buffer) }
    }

    fn array_buffer_static_data(&self, bytes: &[u8]) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, bytes, glow::STATIC_DRAW)
        }
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) }
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, components: i32, stride: i32, offset: i32) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(index, components, glow::FLOAT, false, stride, offset)
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn viewport(&self, width: i32, height: i32) {
        unsafe { self.gl.viewport(0, 0, width, height) }
    }

    fn clear_color(&self, rgba: [f32; 4]) {
        unsafe {
            self.gl.clear_color(rgba[0], rgba[1], rgba[2], rgba[3]);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    fn draw_triangles(&self, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(glow::TRIANGLES, first, count) }
    }
}
