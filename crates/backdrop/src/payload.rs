use std::fmt;

use image::ImageFormat;

/// Raw background bytes as served by the companion.
///
/// Owned by a single update cycle: it is either materialised into a
/// [`DisplayResource`](crate::DisplayResource) and handed to the preloader,
/// or dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Format sniffed from the leading magic bytes, if recognised.
    pub fn sniff_format(&self) -> Option<ImageFormat> {
        image::guess_format(&self.bytes).ok()
    }

    /// File extension matching the sniffed format, `img` when unknown.
    pub fn extension(&self) -> &'static str {
        self.sniff_format()
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("img")
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("len", &self.bytes.len())
            .field("format", &self.sniff_format())
            .finish()
    }
}
