//! Decoded in-memory images

use image::{imageops, RgbImage, RgbaImage};
use std::sync::Arc;

/// Rotation hint passed along with a recognition request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl Rotation {
    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 90,
            Rotation::Clockwise180 => 180,
            Rotation::Clockwise270 => 270,
        }
    }
}

/// A decoded RGBA raster image
///
/// Cloning is cheap; the pixel buffer is shared.
#[derive(Debug, Clone)]
pub struct Bitmap {
    pixels: Arc<RgbaImage>,
}

impl Bitmap {
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Get bitmap dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Convert to packed RGB, applying a rotation
    pub fn to_rgb8(&self, rotation: Rotation) -> RgbImage {
        let rotated = match rotation {
            Rotation::None => None,
            Rotation::Clockwise90 => Some(imageops::rotate90(&*self.pixels)),
            Rotation::Clockwise180 => Some(imageops::rotate180(&*self.pixels)),
            Rotation::Clockwise270 => Some(imageops::rotate270(&*self.pixels)),
        };
        let source = rotated.as_ref().unwrap_or(&*self.pixels);

        image::DynamicImage::ImageRgba8(source.clone()).to_rgb8()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_dimensions() {
        let bitmap = Bitmap::new(RgbaImage::new(30, 10));
        assert_eq!(bitmap.dimensions(), (30, 10));
        assert_eq!(bitmap.width(), 30);
        assert_eq!(bitmap.height(), 10);
    }

    #[test]
    fn test_to_rgb8_drops_alpha() {
        let bitmap = Bitmap::new(RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 40])));
        let rgb = bitmap.to_rgb8(Rotation::None);

        assert_eq!(rgb.dimensions(), (2, 2));
        assert_eq!(rgb.get_pixel(1, 1).0, [10, 20, 30]);
    }

    #[test]
    fn test_rotation_swaps_dimensions() {
        let bitmap = Bitmap::new(RgbaImage::new(30, 10));

        assert_eq!(bitmap.to_rgb8(Rotation::Clockwise90).dimensions(), (10, 30));
        assert_eq!(bitmap.to_rgb8(Rotation::Clockwise180).dimensions(), (30, 10));
        assert_eq!(bitmap.to_rgb8(Rotation::Clockwise270).dimensions(), (10, 30));
        assert_eq!(Rotation::default().degrees(), 0);
    }
}
