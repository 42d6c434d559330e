use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::payload::ImagePayload;

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("failed to materialise background resource at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to release background resource at {path}: {source}")]
    Release {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot address background resource at {0} by URL")]
    Unaddressable(PathBuf),
    #[error("resource {0} is not owned by this store")]
    Unknown(String),
}

/// Handle to a materialised background image.
///
/// Deliberately neither `Clone` nor `Copy`: the only way to get rid of one is
/// to hand it back to its [`ResourceStore`] for release.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "display resources must be released through their store"]
pub struct DisplayResource {
    url: String,
}

impl DisplayResource {
    pub(crate) fn new(url: String) -> Self {
        Self { url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Creates and releases display resources for a host surface.
pub trait ResourceStore {
    fn materialize(
        &mut self,
        seq: u64,
        payload: &ImagePayload,
    ) -> Result<DisplayResource, ResourceError>;

    fn release(&mut self, resource: DisplayResource) -> Result<(), ResourceError>;

    /// Number of resources created and not yet released.
    fn outstanding(&self) -> usize;
}

/// In-memory store handing out `blob:` style URLs. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryResources {
    live: BTreeMap<String, Vec<u8>>,
    released: Vec<String>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_live(&self, url: &str) -> bool {
        self.live.contains_key(url)
    }

    pub fn bytes(&self, url: &str) -> Option<&[u8]> {
        self.live.get(url).map(Vec::as_slice)
    }

    /// URLs released so far, oldest first.
    pub fn released(&self) -> &[String] {
        &self.released
    }
}

impl ResourceStore for MemoryResources {
    fn materialize(
        &mut self,
        seq: u64,
        payload: &ImagePayload,
    ) -> Result<DisplayResource, ResourceError> {
        let url = format!("blob:glasssurf/{seq}");
        self.live.insert(url.clone(), payload.as_bytes().to_vec());
        Ok(DisplayResource::new(url))
    }

    fn release(&mut self, resource: DisplayResource) -> Result<(), ResourceError> {
        if self.live.remove(resource.url()).is_none() {
            return Err(ResourceError::Unknown(resource.url));
        }
        self.released.push(resource.url);
        Ok(())
    }

    fn outstanding(&self) -> usize {
        self.live.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_live_and_released_handles() {
        let mut store = MemoryResources::new();
        let first = store
            .materialize(1, &ImagePayload::new(vec![1, 2, 3]))
            .unwrap();
        let second = store.materialize(2, &ImagePayload::new(vec![4])).unwrap();
        assert_eq!(store.outstanding(), 2);
        assert_eq!(store.bytes(first.url()), Some(&[1u8, 2, 3][..]));

        let first_url = first.url().to_string();
        store.release(first).unwrap();
        assert_eq!(store.outstanding(), 1);
        assert!(!store.is_live(&first_url));
        assert!(store.is_live(second.url()));
        assert_eq!(store.released(), &[first_url]);
    }

    #[test]
    fn releasing_foreign_handle_fails() {
        let mut store = MemoryResources::new();
        let foreign = DisplayResource::new("blob:elsewhere/9".into());
        assert!(matches!(
            store.release(foreign),
            Err(ResourceError::Unknown(_))
        ));
    }
}
