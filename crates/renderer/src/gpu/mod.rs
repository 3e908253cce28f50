//! Narrow seam between the pipeline and the graphics driver.
//!
//! Everything above this module talks to the GPU through [`GraphicsBackend`]:
//! - `native` implements it on top of a live OpenGL 3.3 core context.
//! - `recording` (tests only) implements it in memory, counting live objects
//!   and recording uniform writes and draw calls.
//!
//! Handles are plain copyable ids. Ownership is tracked by the types that hold
//! them (`CompiledUnit`, `LinkedProgram`, `GeometryBuffer`), each of which
//! releases its handles exactly once by consuming itself.
//!
//! Every method must be called on the thread that owns the current context.

mod native;
#[cfg(test)]
pub(crate) mod recording;

pub use native::GlowBackend;

use std::fmt::Debug;
use std::hash::Hash;

use crate::types::ShaderStage;

/// Driver operations used by the compile/link pipeline and the render loop.
///
/// Allocation calls return `Err` with the driver's reason when an object
/// cannot be created; status queries return `true` on success.
pub trait GraphicsBackend {
    type Shader: Copy + Debug + Eq + Hash;
    type Program: Copy + Debug + Eq + Hash;
    type Buffer: Copy + Debug + Eq;
    type VertexArray: Copy + Debug + Eq;
    type UniformLocation: Clone + Debug;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    fn shader_source(&self, shader: Self::Shader, source: &str);
    fn compile_shader(&self, shader: Self::Shader);
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn link_program(&self, program: Self::Program);
    fn program_link_status(&self, program: Self::Program) -> bool;
    fn validate_program(&self, program: Self::Program);
    fn program_validate_status(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&self, program: Self::Program);
    fn use_program(&self, program: Option<Self::Program>);

    fn uniform_location(&self, program: Self::Program, name: &str)
        -> Option<Self::UniformLocation>;
    /// Uploads a column-major 4x4 matrix to the bound program.
    fn uniform_matrix4(&self, location: &Self::UniformLocation, columns: &[f32; 16]);

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String>;
    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);
    fn delete_vertex_array(&self, vertex_array: Self::VertexArray);
    fn create_buffer(&self) -> Result<Self::Buffer, String>;
    fn bind_array_buffer(&self, buffer: Option<Self::Buffer>);
    /// Fills the bound array buffer once; contents are never rewritten.
    fn array_buffer_static_data(&self, bytes: &[u8]);
    fn delete_buffer(&self, buffer: Self::Buffer);
    /// Describes a tightly typed `f32` attribute; `stride` and `offset` are in bytes.
    fn vertex_attrib_pointer_f32(&self, index: u32, components: i32, stride: i32, offset: i32);
    fn enable_vertex_attrib_array(&self, index: u32);

    fn viewport(&self, width: i32, height: i32);
    fn clear_color(&self, rgba: [f32; 4]);
    fn draw_triangles(&self, first: i32, count: i32);
}
