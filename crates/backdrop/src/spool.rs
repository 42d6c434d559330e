use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use companion::Url;
use tracing::debug;

use crate::payload::ImagePayload;
use crate::resource::{DisplayResource, ResourceError, ResourceStore};

const SPOOL_PREFIX: &str = "bg-";

/// Stores each display resource as an image file addressed by a `file://` URL.
#[derive(Debug)]
pub struct FileResources {
    dir: PathBuf,
    live: BTreeMap<String, PathBuf>,
}

impl FileResources {
    /// Opens (creating if needed) the spool directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, ResourceError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| ResourceError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
        let dir = fs::canonicalize(dir).map_err(|source| ResourceError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir,
            live: BTreeMap::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Removes spooled images this store does not own, e.g. left behind by a
    /// process that was killed. Returns how many files were removed.
    pub fn sweep(&self) -> Result<usize, ResourceError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| ResourceError::Release {
            path: self.dir.clone(),
            source,
        })?;
        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_spooled = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(SPOOL_PREFIX));
            if !is_spooled || !path.is_file() || self.live.values().any(|live| *live == path) {
                continue;
            }
            fs::remove_file(&path).map_err(|source| ResourceError::Release {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "removed orphaned background");
            removed += 1;
        }
        Ok(removed)
    }
}

impl ResourceStore for FileResources {
    fn materialize(
        &mut self,
        seq: u64,
        payload: &ImagePayload,
    ) -> Result<DisplayResource, ResourceError> {
        let path = self
            .dir
            .join(format!("{SPOOL_PREFIX}{seq:08}.{}", payload.extension()));
        fs::write(&path, payload.as_bytes()).map_err(|source| ResourceError::Write {
            path: path.clone(),
            source,
        })?;
        let url = match Url::from_file_path(&path) {
            Ok(url) => url.to_string(),
            Err(()) => {
                let _ = fs::remove_file(&path);
                return Err(ResourceError::Unaddressable(path));
            }
        };
        self.live.insert(url.clone(), path);
        Ok(DisplayResource::new(url))
    }

    fn release(&mut self, resource: DisplayResource) -> Result<(), ResourceError> {
        let path = self
            .live
            .remove(resource.url())
            .ok_or_else(|| ResourceError::Unknown(resource.url().to_string()))?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ResourceError::Release { path, source }),
        }
    }

    fn outstanding(&self) -> usize {
        self.live.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preload::fixtures;
    use tempfile::TempDir;

    #[test]
    fn spools_and_removes_files() {
        let root = TempDir::new().unwrap();
        let mut store = FileResources::open(root.path().join("spool")).unwrap();
        let resource = store
            .materialize(3, &ImagePayload::new(fixtures::png(1, 1, 0)))
            .unwrap();
        assert!(resource.url().starts_with("file://"));
        assert!(resource.url().ends_with("bg-00000003.png"));
        let path = store.dir().join("bg-00000003.png");
        assert!(path.exists());
        assert_eq!(store.outstanding(), 1);

        store.release(resource).unwrap();
        assert!(!path.exists());
        assert_eq!(store.outstanding(), 0);
    }

    #[test]
    fn sweep_spares_live_and_unrelated_files() {
        let root = TempDir::new().unwrap();
        let mut store = FileResources::open(root.path()).unwrap();
        fs::write(store.dir().join("bg-00000099.png"), b"old").unwrap();
        fs::write(store.dir().join("background.css"), b"body {}").unwrap();
        let live = store
            .materialize(1, &ImagePayload::new(fixtures::png(1, 1, 0)))
            .unwrap();

        assert_eq!(store.sweep().unwrap(), 1);
        assert!(!store.dir().join("bg-00000099.png").exists());
        assert!(store.dir().join("background.css").exists());
        assert!(store.dir().join("bg-00000001.png").exists());
        store.release(live).unwrap();
    }
}
