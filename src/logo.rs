//! Decoding of uploaded logo images.
//!
//! Any format the `image` crate can read is accepted and no size limits are applied;
//! the compositor scales the logo to its overlay box anyway.

use std::fs;
use std::path::Path;

use image::RgbaImage;
use tracing::debug;

use crate::error::{Error, Result};

/// A decoded logo bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoAsset {
    image: RgbaImage,
}

impl LogoAsset {
    /// Decodes an uploaded image file held in memory.
    ///
    /// # Errors
    ///
    /// [`Error::LogoDecodeFailed`] if the bytes are not a decodable image.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(Error::LogoDecodeFailed)?
            .to_rgba8();
        debug!(width = image.width(), height = image.height(), "logo decoded");
        Ok(Self { image })
    }

    /// Reads and decodes an image file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::decode(&bytes)
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}
