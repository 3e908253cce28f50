use std::collections::HashMap;
use std::fmt;

use tracing::{debug, error, trace, warn};

use crate::compile::CompiledUnit;
use crate::error::{PipelineError, UniformNotFound};
use crate::gpu::GraphicsBackend;
use crate::transform::Mat4;
use crate::types::ShaderStage;

/// Progress of a program object through link and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramStatus {
    Unlinked,
    Linked,
    Failed,
    Validated,
}

/// A program that linked and validated.
///
/// Uniform locations are resolved lazily and cached for the lifetime of the
/// program; a new program starts with an empty cache.
#[must_use = "a linked program owns a GPU program object that must be released"]
pub struct LinkedProgram<B: GraphicsBackend> {
    handle: B::Program,
    status: ProgramStatus,
    uniforms: HashMap<String, B::UniformLocation>,
}

impl<B: GraphicsBackend> LinkedProgram<B> {
    pub fn status(&self) -> ProgramStatus {
        self.status
    }

    pub fn bind(&self, gl: &B) {
        gl.use_program(Some(self.handle));
    }

    /// Looks up `name`, caching the location on first success.
    pub fn resolve_uniform(
        &mut self,
        gl: &B,
        name: &str,
    ) -> Result<B::UniformLocation, UniformNotFound> {
        if let Some(location) = self.uniforms.get(name) {
            return Ok(location.clone());
        }
        let location = gl
            .uniform_location(self.handle, name)
            .ok_or_else(|| UniformNotFound {
                name: name.to_string(),
            })?;
        trace!(uniform = name, ?location, "resolved uniform");
        self.uniforms.insert(name.to_string(), location.clone());
        Ok(location)
    }

    /// Resolves `name` into a binding writes can go through unconditionally.
    ///
    /// A uniform the program does not expose yields an inactive binding.
    pub fn uniform_binding(&mut self, gl: &B, name: &str) -> UniformBinding<B> {
        match self.resolve_uniform(gl, name) {
            Ok(location) => UniformBinding {
                name: name.to_string(),
                location: Some(location),
            },
            Err(err) => {
                warn!("{err}; writes to it will be skipped");
                UniformBinding {
                    name: name.to_string(),
                    location: None,
                }
            }
        }
    }

    /// Unbinds and deletes the program object.
    pub fn release(self, gl: &B) {
        gl.use_program(None);
        gl.delete_program(self.handle);
        debug!("program released");
    }
}

impl<B: GraphicsBackend> fmt::Debug for LinkedProgram<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedProgram")
            .field("handle", &self.handle)
            .field("status", &self.status)
            .field("uniforms", &self.uniforms)
            .finish()
    }
}

/// A uniform slot that silently drops writes when the uniform is inactive.
pub struct UniformBinding<B: GraphicsBackend> {
    name: String,
    location: Option<B::UniformLocation>,
}

impl<B: GraphicsBackend> UniformBinding<B> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.location.is_some()
    }

    /// Writes `matrix` to the bound program, or does nothing if inactive.
    pub fn upload_mat4(&self, gl: &B, matrix: &Mat4) {
        if let Some(location) = &self.location {
            gl.uniform_matrix4(location, &matrix.to_cols_array());
        }
    }
}

/// Links the results of two compiles, short-circuiting on a failed one.
///
/// A failed compile is returned as is, the vertex stage's first, and a unit
/// that did compile is released; no program object is created.
pub fn link_compiled<B: GraphicsBackend>(
    gl: &B,
    vertex: Result<CompiledUnit<B>, PipelineError>,
    fragment: Result<CompiledUnit<B>, PipelineError>,
) -> Result<LinkedProgram<B>, PipelineError> {
    match (vertex, fragment) {
        (Ok(vertex), Ok(fragment)) => link_program(gl, vertex, fragment),
        (Err(err), Ok(unit)) | (Ok(unit), Err(err)) => {
            unit.release(gl);
            Err(err)
        }
        (Err(err), Err(_)) => Err(err),
    }
}

/// Attaches both units to a new program, links it, then validates it.
///
/// Validation checks the program against the current GL state, so the vertex
/// array the program will draw from must already be bound. Both units are
/// consumed: after linking, or on any failure, their shader objects are
/// detached and deleted, and a failed program is deleted before returning.
pub fn link_program<B: GraphicsBackend>(
    gl: &B,
    vertex: CompiledUnit<B>,
    fragment: CompiledUnit<B>,
) -> Result<LinkedProgram<B>, PipelineError> {
    if vertex.stage() != ShaderStage::Vertex || fragment.stage() != ShaderStage::Fragment {
        let message = format!(
            "expected vertex and fragment units, got {} and {}",
            vertex.stage(),
            fragment.stage()
        );
        vertex.release(gl);
        fragment.release(gl);
        return Err(PipelineError::config(message));
    }

    let handle = match gl.create_program() {
        Ok(handle) => handle,
        Err(reason) => {
            vertex.release(gl);
            fragment.release(gl);
            return Err(PipelineError::Resource {
                what: "program object",
                reason,
            });
        }
    };
    let units = [vertex, fragment];
    for unit in &units {
        gl.attach_shader(handle, unit.handle());
    }

    let mut status = ProgramStatus::Unlinked;
    trace!(?status, "program created");

    gl.link_program(handle);
    if !gl.program_link_status(handle) {
        status = ProgramStatus::Failed;
        let log = abandon(gl, handle, units);
        error!(?status, diagnostic = %log, "program linking failed");
        return Err(PipelineError::Link { log });
    }
    status = ProgramStatus::Linked;
    trace!(?status, "program linked");

    gl.validate_program(handle);
    if !gl.program_validate_status(handle) {
        status = ProgramStatus::Failed;
        let log = abandon(gl, handle, units);
        error!(?status, diagnostic = %log, "program validation failed");
        return Err(PipelineError::Validation { log });
    }
    status = ProgramStatus::Validated;

    for unit in units {
        gl.detach_shader(handle, unit.handle());
        unit.release(gl);
    }
    debug!(?status, "program ready");

    Ok(LinkedProgram {
        handle,
        status,
        uniforms: HashMap::new(),
    })
}

/// Reads the program log, then frees the program and its units.
fn abandon<B: GraphicsBackend>(gl: &B, handle: B::Program, units: [CompiledUnit<B>; 2]) -> String {
    let log = gl.program_info_log(handle);
    for unit in units {
        gl.detach_shader(handle, unit.handle());
        unit.release(gl);
    }
    gl.delete_program(handle);
    log.trim_end().to_string()
}
