use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use surfconfig::SurfConfig;
use tracing::{debug, info};

use crate::cli::RunArgs;
use crate::paths::AppPaths;

/// Effective configuration after layering file and command-line values.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: SurfConfig,
    /// File consulted for configuration, whether or not it exists.
    pub config_file: PathBuf,
    /// File the configuration was read from, if one existed.
    pub source: Option<PathBuf>,
    pub output_dir: PathBuf,
}

impl Settings {
    pub fn resolve(args: &RunArgs, paths: &AppPaths) -> Result<Self> {
        let (path, explicit) = match &args.config {
            Some(path) => (path.clone(), true),
            None => (paths.config_file(), false),
        };
        if explicit && !path.exists() {
            bail!("configuration file {} does not exist", path.display());
        }
        let source = path.exists().then(|| path.clone());
        let mut config = SurfConfig::load_or_default(&path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?;

        apply_overrides(&mut config, args);
        config
            .validate()
            .context("invalid configuration after applying command-line overrides")?;

        let output_dir = config
            .surface
            .output_dir
            .clone()
            .unwrap_or_else(|| paths.default_output_dir());

        Ok(Self {
            config,
            config_file: path,
            source,
            output_dir,
        })
    }
}

fn apply_overrides(config: &mut SurfConfig, args: &RunArgs) {
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(interval) = args.poll_interval {
        config.poll_interval = interval;
    }
    if let Some(interval) = args.status_interval {
        config.status_interval = interval;
    }
    if let Some(timeout) = args.request_timeout {
        config.request_timeout = timeout;
    }
    if let Some(dir) = &args.output_dir {
        config.surface.output_dir = Some(dir.clone());
    }
    if args.no_styles {
        config.surface.styles = false;
    }
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    if path.exists() {
        if path.is_dir() {
            debug!(path = %path.display(), "reusing existing directory");
            Ok(())
        } else {
            bail!("filesystem entry at {} is not a directory", path.display());
        }
    } else {
        fs::create_dir_all(path).with_context(|| {
            format!("failed to create glasssurf directory at {}", path.display())
        })?;
        info!(path = %path.display(), "created glasssurf directory");
        Ok(())
    }
}
