use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories_next::ProjectDirs;
use serde::Serialize;

pub const ENV_CONFIG_DIR: &str = "GLASSSURF_CONFIG_DIR";
pub const ENV_DATA_DIR: &str = "GLASSSURF_DATA_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "GlassSurf";
const APPLICATION: &str = "glasssurf";

pub const CONFIG_FILE: &str = "glasssurf.toml";
const SURFACE_DIR: &str = "surface";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct PathsOverview {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;

        let config_dir = resolve_dir(ENV_CONFIG_DIR, project_dirs.config_dir())
            .context("failed to resolve glasssurf config directory")?;
        let data_dir = resolve_dir(ENV_DATA_DIR, project_dirs.data_dir())
            .context("failed to resolve glasssurf data directory")?;

        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// Where the stylesheet and spooled images go unless configured otherwise.
    pub fn default_output_dir(&self) -> PathBuf {
        self.data_dir.join(SURFACE_DIR)
    }

    /// Directories as a run would use them, given the config file and output
    /// directory it resolved.
    pub fn overview(&self, config_file: &Path, output_dir: &Path) -> PathsOverview {
        PathsOverview {
            config_dir: self.config_dir.clone(),
            config_file: config_file.to_path_buf(),
            data_dir: self.data_dir.clone(),
            output_dir: output_dir.to_path_buf(),
        }
    }
}

#[cfg(test)]
impl AppPaths {
    pub fn from_raw(config_dir: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            config_dir,
            data_dir,
        }
    }
}

fn resolve_dir(env_var: &str, default: &Path) -> Result<PathBuf> {
    if let Some(value) = env_override(env_var) {
        return Ok(value);
    }
    Ok(default.to_path_buf())
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}
