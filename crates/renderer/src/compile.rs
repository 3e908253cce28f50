use std::fmt;

use tracing::{debug, error};

use crate::error::PipelineError;
use crate::gpu::GraphicsBackend;
use crate::types::{ShaderSource, ShaderStage};

/// A shader object that compiled successfully.
///
/// Only [`compile_shader`] produces one, so holding a `CompiledUnit` is proof
/// of a passed compile. The handle is released either by the linker, once it
/// is folded into a program, or by [`CompiledUnit::release`].
#[must_use = "a compiled unit owns a GPU shader object that must be linked or released"]
pub struct CompiledUnit<B: GraphicsBackend> {
    stage: ShaderStage,
    handle: B::Shader,
}

impl<B: GraphicsBackend> CompiledUnit<B> {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub(crate) fn handle(&self) -> B::Shader {
        self.handle
    }

    /// Deletes the shader object without linking it.
    pub fn release(self, gl: &B) {
        gl.delete_shader(self.handle);
    }
}

impl<B: GraphicsBackend> fmt::Debug for CompiledUnit<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledUnit")
            .field("stage", &self.stage)
            .field("handle", &self.handle)
            .finish()
    }
}

/// Compiles one stage of GLSL into a driver shader object.
///
/// On a failed compile the driver's info log is returned in
/// [`PipelineError::Compile`] and the shader object is deleted before
/// returning. An empty source is rejected before anything is allocated.
pub fn compile_shader<B: GraphicsBackend>(
    gl: &B,
    source: &ShaderSource,
) -> Result<CompiledUnit<B>, PipelineError> {
    let stage = source.stage();
    if source.text().trim().is_empty() {
        return Err(PipelineError::config(format!("{stage} shader source is empty")));
    }

    let handle = gl
        .create_shader(stage)
        .map_err(|reason| PipelineError::Resource {
            what: "shader object",
            reason,
        })?;
    gl.shader_source(handle, source.text());
    gl.compile_shader(handle);

    if !gl.shader_compile_status(handle) {
        let log = gl.shader_info_log(handle);
        gl.delete_shader(handle);
        let log = log.trim_end().to_string();
        error!(%stage, diagnostic = %log, "shader compilation failed");
        return Err(PipelineError::Compile { stage, log });
    }

    debug!(%stage, "shader compiled");
    Ok(CompiledUnit { stage, handle })
}
