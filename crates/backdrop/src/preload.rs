use image::{GenericImageView, ImageFormat};

use crate::payload::ImagePayload;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("background payload is empty")]
    Empty,
    #[error("background payload is not a recognised image format")]
    UnknownFormat,
    #[error("failed to decode {format:?} background: {source}")]
    Image {
        format: ImageFormat,
        #[source]
        source: image::ImageError,
    },
}

/// Result of a successful preload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preloaded {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// Fully decodes `payload` so a swap never exposes a broken or half-loaded image.
pub fn preload(payload: &ImagePayload) -> Result<Preloaded, DecodeError> {
    if payload.is_empty() {
        return Err(DecodeError::Empty);
    }
    let format = payload.sniff_format().ok_or(DecodeError::UnknownFormat)?;
    let image = image::load_from_memory_with_format(payload.as_bytes(), format)
        .map_err(|source| DecodeError::Image { format, source })?;
    let (width, height) = image.dimensions();
    Ok(Preloaded {
        format,
        width,
        height,
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png_dimensions() {
        let payload = ImagePayload::new(fixtures::png(3, 2, 10));
        let preloaded = preload(&payload).unwrap();
        assert_eq!(preloaded.format, ImageFormat::Png);
        assert_eq!((preloaded.width, preloaded.height), (3, 2));
        assert_eq!(payload.extension(), "png");
    }

    #[test]
    fn rejects_empty_payload() {
        assert!(matches!(
            preload(&ImagePayload::new(Vec::new())),
            Err(DecodeError::Empty)
        ));
    }

    #[test]
    fn rejects_unknown_bytes() {
        let payload = ImagePayload::new(b"<html>not an image</html>".to_vec());
        assert!(matches!(preload(&payload), Err(DecodeError::UnknownFormat)));
        assert_eq!(payload.extension(), "img");
    }

    #[test]
    fn rejects_truncated_png() {
        let mut bytes = fixtures::png(16, 16, 200);
        bytes.truncate(bytes.len() / 2);
        assert!(matches!(
            preload(&ImagePayload::new(bytes)),
            Err(DecodeError::Image { .. })
        ));
    }
}
