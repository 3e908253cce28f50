use std::f32::consts::TAU;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SpinConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub window: WindowSection,
    #[serde(default)]
    pub animation: AnimationSection,
    #[serde(default)]
    pub render: RenderSection,
    #[serde(default)]
    pub shaders: ShaderSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowSection {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub vsync: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnimationSection {
    /// Radians per frame.
    pub angular_increment: f32,
    pub linear_increment: f32,
    pub max_offset: f32,
    pub scale: [f32; 3],
    pub apply_offset: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderSection {
    pub clear_color: [f32; 4],
    /// Name of the `mat4` uniform receiving the model transform.
    pub uniform: String,
}

/// Optional GLSL files replacing the built-in sources.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ShaderSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment: Option<PathBuf>,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            window: WindowSection::default(),
            animation: AnimationSection::default(),
            render: RenderSection::default(),
            shaders: ShaderSection::default(),
        }
    }
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "Uniform Variable".to_string(),
            vsync: true,
        }
    }
}

impl Default for AnimationSection {
    fn default() -> Self {
        Self {
            angular_increment: 0.01,
            linear_increment: 0.00058,
            max_offset: 0.7,
            scale: [0.4, 0.4, 0.0],
            apply_offset: false,
        }
    }
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            uniform: "model".to_string(),
        }
    }
}

impl SpinConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: SpinConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|err| ConfigError::Invalid(format!("failed to render configuration: {err}")))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected {CONFIG_VERSION}",
                self.version
            )));
        }

        let window = &self.window;
        if window.width == 0 || window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size {}x{} must be non-zero",
                window.width, window.height
            )));
        }
        if window.title.trim().is_empty() {
            return Err(ConfigError::Invalid("window title may not be empty".into()));
        }

        let animation = &self.animation;
        if !animation.angular_increment.is_finite()
            || !(0.0..TAU).contains(&animation.angular_increment)
        {
            return Err(ConfigError::Invalid(format!(
                "animation.angular_increment {} must be within [0, 2π)",
                animation.angular_increment
            )));
        }
        if !animation.linear_increment.is_finite() || animation.linear_increment <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "animation.linear_increment {} must be > 0",
                animation.linear_increment
            )));
        }
        if !animation.max_offset.is_finite() || animation.max_offset <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "animation.max_offset {} must be > 0",
                animation.max_offset
            )));
        }
        if animation.scale.iter().any(|value| !value.is_finite()) {
            return Err(ConfigError::Invalid(
                "animation.scale components must be finite".into(),
            ));
        }

        if self
            .render
            .clear_color
            .iter()
            .any(|value| !(0.0..=1.0).contains(value))
        {
            return Err(ConfigError::Invalid(format!(
                "render.clear_color {:?} components must be within [0, 1]",
                self.render.clear_color
            )));
        }
        if self.render.uniform.trim().is_empty() {
            return Err(ConfigError::Invalid("render.uniform may not be empty".into()));
        }

        for (stage, path) in [
            ("vertex", &self.shaders.vertex),
            ("fragment", &self.shaders.fragment),
        ] {
            if path.as_ref().is_some_and(|path| path.as_os_str().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "shaders.{stage} path may not be empty"
                )));
            }
        }

        Ok(())
    }
}
