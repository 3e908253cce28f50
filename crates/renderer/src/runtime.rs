use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use tracing::{debug, info, trace, warn};

use crate::animation::{AnimationParams, AnimationState};
use crate::error::PipelineError;
use crate::gpu::GraphicsBackend;
use crate::pipeline::Pipeline;
use crate::transform::Mat4;
use crate::types::PipelineDescriptor;

/// Windowing and presentation collaborator driven by [`RenderLoop::run`].
///
/// Implementations must keep the GL context current on the calling thread
/// for as long as the loop runs.
pub trait DisplaySurface {
    /// Drains pending window and input events without blocking.
    fn poll_events(&mut self);
    fn should_close(&self) -> bool;
    /// Presents the back buffer; may block on vertical sync.
    fn swap_buffers(&mut self) -> Result<()>;
    /// Drawable size in physical pixels.
    fn framebuffer_size(&self) -> (u32, u32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Pipeline built, not yet drawing.
    Idle,
    Running,
    /// Close observed; GPU objects released.
    Stopped,
}

/// Owns the pipeline and the animation for one window.
///
/// Construction either yields a fully built pipeline in [`LoopState::Idle`]
/// or fails with the diagnostic; a loop can therefore never run against a
/// partially built program. GPU objects are released exactly once, when the
/// loop stops or through [`RenderLoop::shutdown`].
pub struct RenderLoop<B: GraphicsBackend> {
    pipeline: Option<Pipeline<B>>,
    params: AnimationParams,
    animation: AnimationState,
    clear_color: [f32; 4],
    state: LoopState,
    viewport: Option<(u32, u32)>,
    frame_count: u64,
    stats: FrameStats,
}

impl<B: GraphicsBackend> RenderLoop<B> {
    pub fn new(
        gl: &B,
        descriptor: &PipelineDescriptor,
        params: AnimationParams,
        clear_color: [f32; 4],
    ) -> Result<Self, PipelineError> {
        params.validate()?;
        if clear_color
            .iter()
            .any(|component| !(0.0..=1.0).contains(component))
        {
            return Err(PipelineError::config(format!(
                "clear colour {clear_color:?} has components outside [0, 1]"
            )));
        }
        let pipeline = Pipeline::build(gl, descriptor)?;

        Ok(Self {
            pipeline: Some(pipeline),
            params,
            animation: AnimationState::new(),
            clear_color,
            state: LoopState::Idle,
            viewport: None,
            frame_count: 0,
            stats: FrameStats::new(Instant::now()),
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn animation(&self) -> &AnimationState {
        &self.animation
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn pipeline(&self) -> Option<&Pipeline<B>> {
        self.pipeline.as_ref()
    }

    /// Draws frames until `surface` reports a close, then releases the pipeline.
    ///
    /// Only an idle loop can run. A presentation failure also stops the loop;
    /// the pipeline is released before the error is returned.
    pub fn run<S: DisplaySurface>(&mut self, gl: &B, surface: &mut S) -> Result<()> {
        if self.state != LoopState::Idle {
            bail!("render loop cannot start from {:?}", self.state);
        }
        let Some(pipeline) = self.pipeline.as_ref() else {
            bail!("render loop has no pipeline");
        };
        pipeline.bind(gl);
        self.state = LoopState::Running;
        info!("render loop running");

        let result = loop {
            surface.poll_events();
            if surface.should_close() {
                debug!("close requested");
                break Ok(());
            }
            self.frame(gl, surface.framebuffer_size());
            if let Err(err) = surface.swap_buffers() {
                break Err(err.context("failed to present frame"));
            }
        };

        self.state = LoopState::Stopped;
        self.release(gl);
        info!(frames = self.frame_count, "render loop stopped");
        result
    }

    /// Releases the pipeline of a loop that never ran.
    pub fn shutdown(mut self, gl: &B) {
        self.state = LoopState::Stopped;
        self.release(gl);
    }

    /// One iteration between polling and presentation.
    ///
    /// The frame is drawn with the transform of the state it starts from; the
    /// animation then advances for the next frame. Returns the transform used.
    pub(crate) fn frame(&mut self, gl: &B, framebuffer: (u32, u32)) -> Mat4 {
        if self.viewport != Some(framebuffer) {
            let (width, height) = framebuffer;
            gl.viewport(
                i32::try_from(width).unwrap_or(i32::MAX),
                i32::try_from(height).unwrap_or(i32::MAX),
            );
            debug!(width, height, "viewport updated");
            self.viewport = Some(framebuffer);
        }

        let transform = self.animation.transform(&self.params);
        self.animation.advance(&self.params);

        gl.clear_color(self.clear_color);
        if let Some(pipeline) = &self.pipeline {
            pipeline.draw(gl, &transform);
        }

        self.frame_count += 1;
        trace!(
            frame = self.frame_count,
            angle = self.animation.angle(),
            offset = self.animation.offset(),
            "frame drawn"
        );
        if let Some(fps) = self.stats.tick(Instant::now()) {
            debug!(
                fps = fps.round(),
                frame_count = self.frame_count,
                angle = self.animation.angle(),
                offset = self.animation.offset(),
                "render stats"
            );
        }
        transform
    }

    fn release(&mut self, gl: &B) {
        if let Some(pipeline) = self.pipeline.take() {
            gl.bind_vertex_array(None);
            pipeline.release(gl);
        }
    }
}

impl<B: GraphicsBackend> Drop for RenderLoop<B> {
    fn drop(&mut self) {
        if self.pipeline.is_some() {
            warn!("render loop dropped without shutdown; its GPU objects die with the context");
        }
    }
}

/// Frame counter reporting the rate about once per second.
struct FrameStats {
    window_start: Instant,
    frames: u32,
}

impl FrameStats {
    fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
        }
    }

    fn tick(&mut self, now: Instant) -> Option<f32> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < Duration::from_secs(1) {
            return None;
        }
        let fps = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.window_start = now;
        Some(fps)
    }
}
