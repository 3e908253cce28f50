//! Renderer crate for trispin.
//!
//! Compiles and links a GLSL 330 program, uploads the triangle, and spins it
//! in a window on an OpenGL 3.3 core context. The overall flow is:
//!
//! ```text
//!   CLI / trispin
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ GlWindowSurface::create ──▶ RenderLoop::new ──▶ Pipeline::build
//!                                                      │
//!                          poll ◀── swap ◀── draw ◀── frame()
//!                            │                          ▲
//!                            └──── close? ──▶ release   └── AnimationState::transform()
//! ```
//!
//! Pipeline construction is all-or-nothing. Each GPU resource is held by a
//! type that releases it by consuming itself, so a failed build releases what
//! it allocated and a finished loop releases everything exactly once.
//!
//! All drawing goes through [`GraphicsBackend`]; [`GlowBackend`] is the live
//! implementation and the unit tests substitute an in-memory one.

mod animation;
mod compile;
mod error;
mod geometry;
mod gpu;
mod pipeline;
mod program;
mod runtime;
mod transform;
mod types;
mod window;

use anyhow::{Context, Result};
use tracing::info;

pub use animation::{AnimationParams, AnimationState, Direction};
pub use compile::{compile_shader, CompiledUnit};
pub use error::{PipelineError, UniformNotFound};
pub use geometry::{GeometryBuffer, VertexAttribute, VertexLayout, POSITION_ATTRIBUTE};
pub use gpu::{GlowBackend, GraphicsBackend};
pub use pipeline::Pipeline;
pub use program::{link_compiled, link_program, LinkedProgram, ProgramStatus, UniformBinding};
pub use runtime::{DisplaySurface, LoopState, RenderLoop};
pub use transform::Mat4;
pub use types::{
    PipelineDescriptor, RendererConfig, ShaderSource, ShaderStage, WindowSettings,
    DEFAULT_FRAGMENT_SHADER, DEFAULT_TRANSFORM_UNIFORM, DEFAULT_VERTEX_SHADER, TRIANGLE_VERTICES,
};
pub use window::GlWindowSurface;

/// Entry point used by the CLI.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the window and draws until it is closed.
    ///
    /// Window or context failures and pipeline build failures are returned
    /// before the first frame; nothing is drawn with a partial pipeline.
    pub fn run(&mut self) -> Result<()> {
        let config = &self.config;
        let (mut surface, gl) = GlWindowSurface::create(&config.window)?;
        let mut render_loop = RenderLoop::new(
            &gl,
            &config.pipeline,
            config.animation,
            config.clear_color,
        )
        .context("failed to build the render pipeline")?;

        render_loop.run(&gl, &mut surface)?;
        info!(frames = render_loop.frame_count(), "renderer finished");
        Ok(())
    }
}
