//! Entry point wiring that parses the CLI, initialises tracing, and either opens the
//! spinning-triangle window or runs one of the display-free utility commands.
//!
//! Functions:
//!
//! - `main` parses CLI input, initialises tracing, and dispatches to modes.
//! - `print_defaults` and `check_config` back the `defaults` and `check` subcommands.

mod cli;
mod config;
mod run;

use std::path::Path;

use anyhow::Result;
use cli::Command;
use spinconfig::SpinConfig;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Defaults) => print_defaults(),
        Some(Command::Check { file }) => check_config(&file),
        None => run::run(cli.run),
    }
}

fn print_defaults() -> Result<()> {
    print!("{}", SpinConfig::default().to_toml_string()?);
    Ok(())
}

fn check_config(file: &Path) -> Result<()> {
    let loaded = config::load(Some(file))?;
    let renderer_config = config::to_renderer_config(&loaded)?;
    println!("{}: ok", file.display());
    println!(
        "  window:   {}x{} \"{}\"{}",
        renderer_config.window.size.0,
        renderer_config.window.size.1,
        renderer_config.window.title,
        if renderer_config.window.vsync { "" } else { " (no vsync)" }
    );
    println!(
        "  uniform:  {}",
        renderer_config.pipeline.transform_uniform
    );
    println!(
        "  shaders:  vertex {}, fragment {}",
        config::describe_shader(loaded.config.shaders.vertex.as_deref()),
        config::describe_shader(loaded.config.shaders.fragment.as_deref())
    );
    Ok(())
}
