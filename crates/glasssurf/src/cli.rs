use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use surfconfig::parse_duration;

#[derive(Parser, Debug)]
#[command(
    name = "glasssurf",
    author,
    version,
    about = "Keeps a page background in sync with the GlassSurf companion",
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
    /// Configuration file (defaults to `glasssurf.toml` in the config directory).
    #[arg(long, value_name = "FILE", env = "GLASSSURF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port the companion listens on; selects both the state and image endpoints.
    #[arg(long, value_name = "PORT", env = "GLASSSURF_PORT")]
    pub port: Option<u16>,

    /// Host the companion listens on.
    #[arg(long, value_name = "HOST", env = "GLASSSURF_HOST")]
    pub host: Option<String>,

    /// How often to ask the companion for changes (e.g. `100ms`, `0.5`).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub poll_interval: Option<Duration>,

    /// How often to log a status summary (`0` disables it).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub status_interval: Option<Duration>,

    /// Give up on a single request after this long.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub request_timeout: Option<Duration>,

    /// Directory receiving the background stylesheet and spooled images.
    #[arg(long, value_name = "DIR", env = "GLASSSURF_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Skip writing the cosmetic style overrides.
    #[arg(long)]
    pub no_styles: bool,

    /// Keep backgrounds in memory and only log swaps; writes nothing to disk.
    #[arg(long)]
    pub dry_run: bool,

    /// Stop after this many poll ticks, once in-flight work has drained.
    #[arg(long, value_name = "N", conflicts_with = "once")]
    pub ticks: Option<u64>,

    /// Poll exactly once, apply any change, then exit.
    #[arg(long)]
    pub once: bool,
}

impl RunArgs {
    /// Number of poll ticks to run before exiting, if bounded.
    pub fn tick_limit(&self) -> Option<u64> {
        if self.once {
            Some(1)
        } else {
            self.ticks
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print resolved directories for config, data, and surface output.
    Paths(PathsArgs),
}

#[derive(Parser, Debug)]
pub struct PathsArgs {
    /// Emit the paths as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}
