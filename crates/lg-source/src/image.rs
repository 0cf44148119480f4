use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use lg_core::frame::FrameBuffer;
use lg_core::traits::Source;

/// Source d'image statique. Retourne toujours la même frame.
///
/// # Example
/// ```no_run
/// use lg_source::image::ImageSource;
/// use std::path::Path;
/// let source = ImageSource::new(Path::new("photo.png")).unwrap();
/// ```
pub struct ImageSource {
    frame: Arc<FrameBuffer>,
}

impl ImageSource {
    /// Load an image from disk and create a source.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or decoded.
    pub fn new(path: &Path) -> Result<Self> {
        Ok(Self::from_frame(load_image(path)?))
    }

    /// Wrap an already decoded frame.
    #[must_use]
    pub fn from_frame(frame: FrameBuffer) -> Self {
        Self {
            frame: Arc::new(frame),
        }
    }
}

impl Source for ImageSource {
    fn next_frame(&mut self) -> Option<Arc<FrameBuffer>> {
        Some(Arc::clone(&self.frame))
    }

    fn native_size(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    fn is_live(&self) -> bool {
        false
    }
}

/// Décode une image (PNG, JPEG, BMP, GIF) en RGBA 8 bits.
///
/// # Errors
/// Returns an error if the file cannot be read or decoded.
///
/// # Example
/// ```no_run
/// use lg_source::image::load_image;
/// use std::path::Path;
/// let frame = load_image(Path::new("photo.png")).unwrap();
/// ```
pub fn load_image(path: &Path) -> Result<FrameBuffer> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    let frame = decode_image(&bytes)
        .with_context(|| format!("Impossible de charger {}", path.display()))?;
    log::info!(
        "Image chargée : {}×{} — {}",
        frame.width,
        frame.height,
        path.display()
    );
    Ok(frame)
}

/// Décode une image depuis un buffer mémoire (format deviné).
///
/// # Errors
/// Returns an error if the bytes are not a supported image.
pub fn decode_image(bytes: &[u8]) -> Result<FrameBuffer> {
    let img = image::load_from_memory(bytes).context("Image illisible")?;
    Ok(into_frame(img))
}

fn into_frame(img: image::DynamicImage) -> FrameBuffer {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    FrameBuffer {
        data: rgba.into_raw(),
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn png_roundtrips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("two.png");
        let mut img = RgbImage::from_pixel(3, 2, Rgb([10, 20, 30]));
        img.put_pixel(2, 1, Rgb([200, 0, 0]));
        img.save(&path).unwrap();

        let frame = load_image(&path).unwrap();
        assert_eq!((frame.width, frame.height), (3, 2));
        assert_eq!(frame.pixel(0, 0), (10, 20, 30, 255));
        assert_eq!(frame.pixel(2, 1), (200, 0, 0, 255));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_image(&dir.path().join("absent.png")).unwrap_err();
        assert!(err.to_string().contains("absent.png"));
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(decode_image(b"not an image").is_err());
    }

    #[test]
    fn garbage_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();
        let err = load_image(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.png"));
        assert!(format!("{err:#}").contains("Image illisible"));
    }

    #[test]
    fn image_source_repeats_its_frame() {
        let mut source = ImageSource::from_frame(FrameBuffer::filled(4, 3, (1, 2, 3)));
        assert_eq!(source.native_size(), (4, 3));
        assert!(!source.is_live());
        let a = source.next_frame().unwrap();
        let b = source.next_frame().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
