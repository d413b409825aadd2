//! Texture decoding.
//!
//! Materials name their texture by file path. A [`TextureLoader`] turns that
//! path into RGBA8 pixels owned by the material entry, so dropping the entry
//! releases the pixels.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    width: u32,
    height: u32,
    rgba: Box<[u8]>,
}

impl Texture {
    /// Wrap already-decoded pixels.
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::Dimensions`] if `rgba` is not exactly
    /// `width * height * 4` bytes.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, TextureError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(TextureError::Dimensions {
                width,
                height,
                expected,
                len: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba: rgba.into_boxed_slice(),
        })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major RGBA8 pixels.
    #[must_use]
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

/// Errors from loading a texture.
#[derive(Debug, Error)]
pub enum TextureError {
    /// The file could not be read.
    #[error("cannot read texture {}: {source}", .path.display())]
    Io {
        /// Path as resolved by the loader.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file was read but is not a decodable image.
    #[error("cannot decode texture {}: {source}", .path.display())]
    Decode {
        /// Path as resolved by the loader.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: image::ImageError,
    },

    /// Pixel buffer length disagrees with the dimensions.
    #[error("{width}x{height} texture needs {expected} bytes, got {len}")]
    Dimensions {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
        /// `width * height * 4`.
        expected: usize,
        /// Actual buffer length.
        len: usize,
    },
}

/// Turns a material's texture path into pixels.
pub trait TextureLoader {
    /// Load and decode the texture at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`TextureError`] if the file is missing or undecodable. The
    /// caller treats this as non-fatal.
    fn load(&mut self, path: &str) -> Result<Texture, TextureError>;
}

impl<L: TextureLoader + ?Sized> TextureLoader for Box<L> {
    fn load(&mut self, path: &str) -> Result<Texture, TextureError> {
        (**self).load(path)
    }
}

/// Loads textures from disk with the `image` crate.
///
/// Relative paths resolve against an optional root directory.
#[derive(Debug, Clone, Default)]
pub struct ImageTextureLoader {
    root: Option<PathBuf>,
}

impl ImageTextureLoader {
    /// A loader that resolves relative paths against the working directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `root`.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl TextureLoader for ImageTextureLoader {
    fn load(&mut self, path: &str) -> Result<Texture, TextureError> {
        let path = self.resolve(path);
        let bytes = std::fs::read(&path).map_err(|source| TextureError::Io {
            path: path.clone(),
            source,
        })?;
        let image = image::load_from_memory(&bytes)
            .map_err(|source| TextureError::Decode {
                path: path.clone(),
                source,
            })?
            .to_rgba8();
        let (width, height) = image.dimensions();
        debug!(path = %path.display(), width, height, "decoded texture");
        Texture::from_rgba(width, height, image.into_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba_checks_length() {
        let texture = Texture::from_rgba(2, 1, vec![255; 8]).unwrap();
        assert_eq!(texture.width(), 2);
        assert_eq!(texture.height(), 1);
        assert_eq!(texture.rgba().len(), 8);

        let err = Texture::from_rgba(2, 2, vec![0; 8]).unwrap_err();
        assert_eq!(err.to_string(), "2x2 texture needs 16 bytes, got 8");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut loader = ImageTextureLoader::new();
        let err = loader.load("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, TextureError::Io { .. }));
    }

    #[test]
    fn test_relative_path_uses_root() {
        let loader = ImageTextureLoader::new().with_root("/assets");
        assert_eq!(loader.resolve("brick.png"), PathBuf::from("/assets/brick.png"));
        assert_eq!(loader.resolve("/abs/brick.png"), PathBuf::from("/abs/brick.png"));
    }

    #[test]
    fn test_png_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();

        let mut loader = ImageTextureLoader::new().with_root(dir.path());
        let texture = loader.load("red.png").unwrap();
        assert_eq!((texture.width(), texture.height()), (3, 2));
        assert_eq!(&texture.rgba()[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();

        let err = ImageTextureLoader::new()
            .load(path.to_str().unwrap())
            .unwrap_err();
        assert!(matches!(err, TextureError::Decode { .. }));
    }
}
