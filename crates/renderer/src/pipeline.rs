use std::fmt;

use tracing::info;

use crate::compile::compile_shader;
use crate::error::PipelineError;
use crate::geometry::GeometryBuffer;
use crate::gpu::GraphicsBackend;
use crate::program::{link_compiled, LinkedProgram, UniformBinding};
use crate::transform::Mat4;
use crate::types::{PipelineDescriptor, ShaderStage};

/// One ready-to-draw program plus the geometry it draws.
///
/// Built in a fixed order: descriptor checks, geometry upload, compile of
/// both stages, link, validation against the bound vertex array, then
/// uniform resolution. A failure at any step releases whatever the earlier
/// steps allocated before the error is returned.
#[must_use = "a pipeline owns GPU objects that must be released"]
pub struct Pipeline<B: GraphicsBackend> {
    program: LinkedProgram<B>,
    geometry: GeometryBuffer<B>,
    transform: UniformBinding<B>,
}

impl<B: GraphicsBackend> Pipeline<B> {
    pub fn build(gl: &B, descriptor: &PipelineDescriptor) -> Result<Self, PipelineError> {
        check_descriptor(descriptor)?;

        let geometry = GeometryBuffer::upload(
            gl,
            descriptor.layout.clone(),
            descriptor.vertex_count,
            &descriptor.vertices,
        )?;
        geometry.bind(gl);

        let vertex = compile_shader(gl, &descriptor.vertex);
        let fragment = compile_shader(gl, &descriptor.fragment);
        let mut program = match link_compiled(gl, vertex, fragment) {
            Ok(program) => program,
            Err(err) => {
                geometry.release(gl);
                return Err(err);
            }
        };

        let transform = program.uniform_binding(gl, &descriptor.transform_uniform);
        info!(
            vertices = geometry.vertex_count(),
            uniform = transform.name(),
            uniform_active = transform.is_active(),
            "pipeline ready"
        );

        Ok(Self {
            program,
            geometry,
            transform,
        })
    }

    pub fn program(&self) -> &LinkedProgram<B> {
        &self.program
    }

    pub fn geometry(&self) -> &GeometryBuffer<B> {
        &self.geometry
    }

    pub fn transform_binding(&self) -> &UniformBinding<B> {
        &self.transform
    }

    /// Makes the program and vertex array current.
    pub fn bind(&self, gl: &B) {
        self.program.bind(gl);
        self.geometry.bind(gl);
    }

    /// Uploads `transform` and draws the full vertex range.
    pub fn draw(&self, gl: &B, transform: &Mat4) {
        self.transform.upload_mat4(gl, transform);
        self.geometry.draw(gl);
    }

    pub fn release(self, gl: &B) {
        self.program.release(gl);
        self.geometry.release(gl);
    }
}

impl<B: GraphicsBackend> fmt::Debug for Pipeline<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("program", &self.program)
            .field("geometry", &self.geometry)
            .field("transform", &self.transform.name())
            .finish()
    }
}

/// Everything that can be rejected without touching the GPU.
fn check_descriptor(descriptor: &PipelineDescriptor) -> Result<(), PipelineError> {
    descriptor
        .layout
        .validate_data(descriptor.vertex_count, &descriptor.vertices)?;

    for (source, expected) in [
        (&descriptor.vertex, ShaderStage::Vertex),
        (&descriptor.fragment, ShaderStage::Fragment),
    ] {
        if source.stage() != expected {
            return Err(PipelineError::config(format!(
                "{expected} slot holds a {} shader",
                source.stage()
            )));
        }
        if source.text().trim().is_empty() {
            return Err(PipelineError::config(format!("{expected} shader source is empty")));
        }
    }

    if descriptor.transform_uniform.trim().is_empty() {
        return Err(PipelineError::config("transform uniform name is empty"));
    }
    Ok(())
}
