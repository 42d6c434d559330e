use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("failed to write surface stylesheet {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The host's single mutable "background image" property.
pub trait RenderedSurface {
    /// Points the background at `url`. Visible as soon as this returns `Ok`.
    fn set_background(&mut self, url: &str) -> Result<(), SurfaceError>;

    /// Detaches whatever background is shown.
    fn clear_background(&mut self) -> Result<(), SurfaceError>;

    fn background(&self) -> Option<&str>;
}

/// Surface that only remembers what it was asked to show.
#[derive(Debug, Default)]
pub struct MemorySurface {
    current: Option<String>,
    history: Vec<String>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every URL ever attached, in order.
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl RenderedSurface for MemorySurface {
    fn set_background(&mut self, url: &str) -> Result<(), SurfaceError> {
        self.current = Some(url.to_string());
        self.history.push(url.to_string());
        Ok(())
    }

    fn clear_background(&mut self) -> Result<(), SurfaceError> {
        self.current = None;
        Ok(())
    }

    fn background(&self) -> Option<&str> {
        self.current.as_deref()
    }
}
