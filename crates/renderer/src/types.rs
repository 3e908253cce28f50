use std::fmt;
use std::sync::Arc;

use crate::animation::AnimationParams;
use crate::geometry::VertexLayout;

/// Programmable pipeline stages the compiler accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// GLSL text tagged with the stage it is meant for.
///
/// The text is opaque to the renderer; only the driver parses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    stage: ShaderStage,
    text: Arc<str>,
}

impl ShaderSource {
    pub fn new(stage: ShaderStage, text: impl Into<Arc<str>>) -> Self {
        Self {
            stage,
            text: text.into(),
        }
    }

    pub fn vertex(text: impl Into<Arc<str>>) -> Self {
        Self::new(ShaderStage::Vertex, text)
    }

    pub fn fragment(text: impl Into<Arc<str>>) -> Self {
        Self::new(ShaderStage::Fragment, text)
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Name the transform uniform is looked up by unless configured otherwise.
pub const DEFAULT_TRANSFORM_UNIFORM: &str = "model";

/// Window geometry and presentation preferences handed to the display surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSettings {
    /// Inner size in physical pixels.
    pub size: (u32, u32),
    pub title: String,
    /// Block on vertical sync when presenting.
    pub vsync: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            size: (800, 600),
            title: "Uniform Variable".to_string(),
            vsync: true,
        }
    }
}

/// Everything a single pipeline instance needs to be built.
#[derive(Debug, Clone)]
pub struct PipelineDescriptor {
    pub vertex: ShaderSource,
    pub fragment: ShaderSource,
    pub layout: VertexLayout,
    pub vertex_count: usize,
    pub vertices: Vec<f32>,
    /// Uniform receiving the per-frame transform.
    pub transform_uniform: String,
}

impl Default for PipelineDescriptor {
    /// The built-in colour-from-position triangle.
    fn default() -> Self {
        Self {
            vertex: ShaderSource::vertex(DEFAULT_VERTEX_SHADER),
            fragment: ShaderSource::fragment(DEFAULT_FRAGMENT_SHADER),
            layout: VertexLayout::positions(2),
            vertex_count: 3,
            vertices: TRIANGLE_VERTICES.to_vec(),
            transform_uniform: DEFAULT_TRANSFORM_UNIFORM.to_string(),
        }
    }
}

/// Immutable configuration handed to [`crate::Renderer`].
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub window: WindowSettings,
    pub pipeline: PipelineDescriptor,
    pub animation: AnimationParams,
    /// RGBA colour the frame is cleared to before drawing.
    pub clear_color: [f32; 4],
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            window: WindowSettings::default(),
            pipeline: PipelineDescriptor::default(),
            animation: AnimationParams::default(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Three 2D positions spanning clip space.
pub const TRIANGLE_VERTICES: [f32; 6] = [-1.0, -1.0, 1.0, -1.0, 0.0, 1.0];

pub const DEFAULT_VERTEX_SHADER: &str = r"#version 330
layout (location = 0) in vec2 pos;
uniform mat4 model;
out vec4 vColor;
void main()
{
    gl_Position = model * vec4(pos.x, pos.y, 1.0f, 1.0f);
    vColor = vec4(clamp(pos, 0.0f, 1.0f), 0.0f, 1.0f);
}
";

pub const DEFAULT_FRAGMENT_SHADER: &str = r"#version 330
layout (location = 0) out vec4 color;
in vec4 vColor;
void main()
{
    color = vColor;
}
";
