use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;

pub const DEFAULT_PORT: u16 = 3040;
pub const DEFAULT_HOST: &str = "localhost";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Agent configuration as read from `glasssurf.toml`.
///
/// Every key is optional; absent keys fall back to the built-in defaults so an
/// empty file is a valid configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SurfConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(
        default = "default_poll_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub poll_interval: Duration,
    #[serde(
        default = "default_status_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub status_interval: Duration,
    #[serde(
        default = "default_request_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub request_timeout: Duration,
    #[serde(default)]
    pub surface: SurfaceSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SurfaceSection {
    /// Directory holding the stylesheet and spooled background images.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Apply the fixed cosmetic overrides at startup.
    #[serde(default = "default_styles")]
    pub styles: bool,
}

impl Default for SurfaceSection {
    fn default() -> Self {
        Self {
            output_dir: None,
            styles: default_styles(),
        }
    }
}

impl Default for SurfConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            port: default_port(),
            host: default_host(),
            poll_interval: default_poll_interval(),
            status_interval: default_status_interval(),
            request_timeout: default_request_timeout(),
            surface: SurfaceSection::default(),
        }
    }
}

fn default_version() -> u32 {
    1
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_status_interval() -> Duration {
    Duration::from_secs(3600)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_styles() -> bool {
    true
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            parse_duration(v).map_err(E::custom)
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Duration::try_from_secs_f64(v)
                .map_err(|err| E::custom(format!("invalid duration {v}: {err}")))
        }
    }

    deserializer.deserialize_any(Visitor)
}

/// Parses a duration the same way the config file does (`"250ms"`, `"1h"`, `"2"`).
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("duration must not be empty".into());
    }
    if let Ok(secs) = trimmed.parse::<f64>() {
        return Duration::try_from_secs_f64(secs)
            .map_err(|err| format!("invalid duration '{trimmed}': {err}"));
    }
    humantime::parse_duration(trimmed).map_err(|err| format!("invalid duration '{trimmed}': {err}"))
}

impl SurfConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: SurfConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Whether the periodic status report is enabled (`status_interval = 0` disables it).
    pub fn status_enabled(&self) -> bool {
        !self.status_interval.is_zero()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be in 1..=65535".into()));
        }

        validate_host(&self.host)?;

        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "poll_interval must be greater than zero".into(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "request_timeout must be greater than zero".into(),
            ));
        }

        if let Some(dir) = &self.surface.output_dir {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(
                    "surface.output_dir may not be empty".into(),
                ));
            }
        }

        Ok(())
    }
}

fn validate_host(host: &str) -> Result<(), ConfigError> {
    let trimmed = host.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid("host may not be empty".into()));
    }
    if trimmed.contains("://") || trimmed.contains('/') {
        return Err(ConfigError::Invalid(format!(
            "host '{host}' must be a bare hostname or address, not a URL"
        )));
    }
    if trimmed != host {
        return Err(ConfigError::Invalid(format!(
            "host '{host}' has surrounding whitespace"
        )));
    }
    Ok(())
}
