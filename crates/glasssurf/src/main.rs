mod bootstrap;
mod cli;
mod paths;
mod run;
mod style;

use anyhow::Result;
use bootstrap::Settings;
use cli::{Command, RunArgs};
use paths::AppPaths;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Paths(args)) => print_paths(&cli.run, args.json),
        None => run::run(cli.run),
    }
}

fn print_paths(run: &RunArgs, json: bool) -> Result<()> {
    let paths = AppPaths::discover()?;
    let settings = Settings::resolve(run, &paths)?;
    let overview = paths.overview(&settings.config_file, &settings.output_dir);
    if json {
        println!("{}", serde_json::to_string_pretty(&overview)?);
        return Ok(());
    }
    println!("GlassSurf directories:");
    println!("  config:     {}", overview.config_dir.display());
    println!("  file:       {}", overview.config_file.display());
    println!("  data:       {}", overview.data_dir.display());
    println!("  surface:    {}", overview.output_dir.display());
    Ok(())
}
