use std::fs;
use std::path::PathBuf;

use crate::surface::{RenderedSurface, SurfaceError};

/// Surface backed by a user stylesheet holding a single `body` background rule.
///
/// Writes go to a sibling temporary file that is renamed over the target, so
/// a reader sees either the old rule or the new one.
#[derive(Debug)]
pub struct StylesheetSurface {
    path: PathBuf,
    current: Option<String>,
}

impl StylesheetSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: None,
        }
    }

    fn write_rule(&self, rule: &str) -> Result<(), SurfaceError> {
        let wrap = |source| SurfaceError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(wrap)?;
        }
        let staging = self.path.with_extension("css.tmp");
        fs::write(&staging, rule).map_err(wrap)?;
        fs::rename(&staging, &self.path).map_err(wrap)
    }
}

/// Renders the background rule for `url`, or a rule with no image.
pub fn background_rule(url: Option<&str>) -> String {
    let image = match url {
        Some(url) => format!("url(\"{}\")", escape_css_string(url)),
        None => "none".to_string(),
    };
    format!("body {{\n  background-image: {image};\n  background-attachment: fixed;\n}}\n")
}

fn escape_css_string(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '"' | '\\' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            '\n' | '\r' => {}
            _ => escaped.push(ch),
        }
    }
    escaped
}

impl RenderedSurface for StylesheetSurface {
    fn set_background(&mut self, url: &str) -> Result<(), SurfaceError> {
        self.write_rule(&background_rule(Some(url)))?;
        self.current = Some(url.to_string());
        Ok(())
    }

    fn clear_background(&mut self) -> Result<(), SurfaceError> {
        self.write_rule(&background_rule(None))?;
        self.current = None;
        Ok(())
    }

    fn background(&self) -> Option<&str> {
        self.current.as_deref()
    }
}
