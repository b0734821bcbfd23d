//! Image loading
//!
//! Resolves an image reference to a decoded bitmap.

use image::imageops::FilterType;
use image::ImageReader;
use tracing::{debug, info};

use super::bitmap::Bitmap;
use crate::error::LoadError;
use crate::picker::ImageReference;

/// Resolves image references to decoded bitmaps
pub trait ImageLoader: Send {
    fn load(&self, reference: &ImageReference) -> Result<Bitmap, LoadError>;
}

/// Loads images from the local filesystem
#[derive(Debug, Clone)]
pub struct FileImageLoader {
    /// Longest side after loading; larger images are downscaled
    max_dimension: u32,
}

impl FileImageLoader {
    pub fn new(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }
}

impl Default for FileImageLoader {
    fn default() -> Self {
        Self::new(crate::config::RecognitionSettings::default().max_image_dimension)
    }
}

impl ImageLoader for FileImageLoader {
    fn load(&self, reference: &ImageReference) -> Result<Bitmap, LoadError> {
        let path = reference.path();

        let reader = ImageReader::open(path)
            .map_err(|e| LoadError::from_io(path.to_path_buf(), e))?
            .with_guessed_format()
            .map_err(|e| LoadError::from_io(path.to_path_buf(), e))?;

        let mut image = reader.decode().map_err(|source| LoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        let (width, height) = (image.width(), image.height());
        if width.max(height) > self.max_dimension {
            info!(
                "Downscaling {} from {}x{} to fit {}px",
                reference.display_name(),
                width,
                height,
                self.max_dimension
            );
            image = image.resize(self.max_dimension, self.max_dimension, FilterType::Triangle);
        }

        debug!(
            "Loaded {} ({}x{})",
            reference.display_name(),
            image.width(),
            image.height()
        );

        Ok(Bitmap::new(image.to_rgba8()))
    }
}
