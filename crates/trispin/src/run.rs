use anyhow::{Context, Result};
use renderer::Renderer;
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::config;

pub fn run(args: RunArgs) -> Result<()> {
    let mut loaded = config::load(args.config.as_deref())?;
    apply_overrides(&mut loaded.config, &args);
    loaded
        .config
        .validate()
        .context("command-line overrides produced an invalid configuration")?;

    let renderer_config = config::to_renderer_config(&loaded)?;
    tracing::info!(
        width = renderer_config.window.size.0,
        height = renderer_config.window.size.1,
        vsync = renderer_config.window.vsync,
        "starting trispin"
    );
    Renderer::new(renderer_config).run()
}

fn apply_overrides(config: &mut spinconfig::SpinConfig, args: &RunArgs) {
    if let Some((width, height)) = args.size {
        config.window.width = width;
        config.window.height = height;
    }
    if let Some(title) = &args.title {
        config.window.title = title.clone();
    }
    if args.no_vsync {
        config.window.vsync = false;
    }
}

pub fn initialise_tracing() {
    let default_filter = "warn,trispin=info,renderer=info,winit=error,glutin=error,glutin_winit=error";
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
