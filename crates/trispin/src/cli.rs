use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "trispin",
    author,
    version,
    about = "Spins a shaded triangle through a validated GLSL 330 program",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// TOML configuration file; built-in defaults apply when omitted.
    #[arg(long, value_name = "FILE", env = "TRISPIN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Override the window title.
    #[arg(long, value_name = "TITLE")]
    pub title: Option<String>,

    /// Present frames without waiting for vertical sync.
    #[arg(long)]
    pub no_vsync: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the default configuration as TOML.
    Defaults,
    /// Parse and validate a configuration file without opening a window.
    Check {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let trimmed = value.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| "expected WxH format, e.g. 800x600".to_string())?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| "invalid width in size argument".to_string())?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| "invalid height in size argument".to_string())?;

    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".to_string());
    }

    Ok((width, height))
}
