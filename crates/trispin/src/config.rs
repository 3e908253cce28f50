//! Loads a `SpinConfig` and maps it onto the renderer's configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use renderer::{AnimationParams, PipelineDescriptor, RendererConfig, ShaderSource, WindowSettings};
use spinconfig::SpinConfig;

/// A parsed configuration plus the directory its relative paths resolve against.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: SpinConfig,
    pub base_dir: PathBuf,
}

pub fn load(path: Option<&Path>) -> Result<LoadedConfig> {
    let Some(path) = path else {
        return Ok(LoadedConfig {
            config: SpinConfig::default(),
            base_dir: PathBuf::from("."),
        });
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = SpinConfig::from_toml_str(&text)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    let base_dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    tracing::debug!(config = %path.display(), "loaded configuration");

    Ok(LoadedConfig { config, base_dir })
}

pub fn to_renderer_config(loaded: &LoadedConfig) -> Result<RendererConfig> {
    let config = &loaded.config;
    let mut pipeline = PipelineDescriptor {
        transform_uniform: config.render.uniform.clone(),
        ..PipelineDescriptor::default()
    };
    if let Some(path) = &config.shaders.vertex {
        pipeline.vertex = ShaderSource::vertex(read_shader(&loaded.base_dir, path)?);
    }
    if let Some(path) = &config.shaders.fragment {
        pipeline.fragment = ShaderSource::fragment(read_shader(&loaded.base_dir, path)?);
    }

    let animation = &config.animation;
    Ok(RendererConfig {
        window: WindowSettings {
            size: (config.window.width, config.window.height),
            title: config.window.title.clone(),
            vsync: config.window.vsync,
        },
        pipeline,
        animation: AnimationParams {
            angular_increment: animation.angular_increment,
            linear_increment: animation.linear_increment,
            max_offset: animation.max_offset,
            scale: animation.scale,
            apply_offset: animation.apply_offset,
        },
        clear_color: config.render.clear_color,
    })
}

pub fn describe_shader(path: Option<&Path>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "built-in".to_string(),
    }
}

fn read_shader(base_dir: &Path, path: &Path) -> Result<String> {
    let resolved = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    };
    let text = fs::read_to_string(&resolved)
        .with_context(|| format!("failed to read shader {}", resolved.display()))?;
    tracing::debug!(shader = %resolved.display(), bytes = text.len(), "loaded shader source");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::ShaderStage;

    #[test]
    fn no_file_means_default_renderer_config() {
        let loaded = load(None).unwrap();
        let renderer_config = to_renderer_config(&loaded).unwrap();
        let defaults = RendererConfig::default();
        assert_eq!(renderer_config.window.size, defaults.window.size);
        assert_eq!(renderer_config.window.title, defaults.window.title);
        assert_eq!(renderer_config.animation, defaults.animation);
        assert_eq!(renderer_config.pipeline.transform_uniform, "model");
    }

    #[test]
    fn shader_paths_resolve_next_to_the_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("flat.frag"), "#version 330\nvoid main() {}\n").unwrap();
        let config_path = dir.path().join("spin.toml");
        fs::write(&config_path, "[shaders]\nfragment = \"flat.frag\"\n").unwrap();

        let loaded = load(Some(&config_path)).unwrap();
        assert_eq!(loaded.base_dir, dir.path());
        let renderer_config = to_renderer_config(&loaded).unwrap();
        let fragment = &renderer_config.pipeline.fragment;
        assert_eq!(fragment.stage(), ShaderStage::Fragment);
        assert!(fragment.text().contains("void main"));
        assert_eq!(
            renderer_config.pipeline.vertex.text(),
            renderer::DEFAULT_VERTEX_SHADER
        );
    }

    #[test]
    fn missing_shader_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("spin.toml");
        fs::write(&config_path, "[shaders]\nvertex = \"missing.vert\"\n").unwrap();

        let loaded = load(Some(&config_path)).unwrap();
        let err = to_renderer_config(&loaded).unwrap_err();
        assert!(format!("{err:#}").contains("missing.vert"));
    }

    #[test]
    fn invalid_file_is_rejected_with_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("spin.toml");
        fs::write(&config_path, "version = 7\n").unwrap();

        let err = load(Some(&config_path)).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("spin.toml"));
        assert!(message.contains("version 7"));
    }
}
