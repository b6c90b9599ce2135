use chrono::{DateTime, Utc};
use image::{DynamicImage, RgbImage};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;

/// One captured display image, normalised to RGB.
#[derive(Clone)]
pub struct Frame {
    image: Arc<DynamicImage>,
    captured_at: DateTime<Utc>,
    frame_id: Uuid,
}

impl Frame {
    pub fn new(image: DynamicImage, captured_at: DateTime<Utc>) -> Self {
        Self {
            image: Arc::new(image),
            captured_at,
            frame_id: Uuid::new_v4(),
        }
    }

    /// Wraps a tightly packed RGB buffer. Fails when the buffer length does not
    /// match `width * height * 3`.
    pub fn from_rgb_buffer(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, AppError> {
        let expected = width as usize * height as usize * 3;
        let actual = pixels.len();
        let rgb_image = RgbImage::from_raw(width, height, pixels).ok_or_else(|| {
            AppError::Capture(format!(
                "Pixel buffer of {} bytes does not fit a {}x{} RGB frame ({} bytes)",
                actual, width, height, expected
            ))
        })?;
        Ok(Self::new(DynamicImage::ImageRgb8(rgb_image), Utc::now()))
    }

    /// Converts a BGRA/BGRX buffer (the usual screen grab layout) to RGB.
    pub fn from_bgra_buffer(width: u32, height: u32, buffer: &[u8]) -> Result<Self, AppError> {
        let mut pixels: Vec<u8> = Vec::with_capacity(buffer.len() / 4 * 3);
        // -- pixel order is B G R A; convert to R G B
        for chunk in buffer.chunks_exact(4) {
            pixels.extend_from_slice(&[chunk[2], chunk[1], chunk[0]]);
        }
        Self::from_rgb_buffer(width, height, pixels)
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn frame_id(&self) -> Uuid {
        self.frame_id
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    #[test]
    fn cloning_frame_shares_image_buffer() {
        let img: DynamicImage = DynamicImage::ImageRgb8(
            ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(16, 16, Rgb([1, 2, 3])),
        );
        let f1 = Frame::new(img, Utc::now());
        let f2 = f1.clone();
        assert!(Arc::ptr_eq(&f1.image, &f2.image));
        assert_eq!(f1.frame_id(), f2.frame_id());
    }

    #[test]
    fn rgb_buffer_with_wrong_length_is_a_capture_error() {
        let result = Frame::from_rgb_buffer(4, 4, vec![0; 10]);
        assert!(matches!(result, Err(AppError::Capture(_))));
    }

    #[test]
    fn bgra_buffer_is_swizzled_to_rgb() {
        let buffer = [10u8, 20, 30, 255, 10, 20, 30, 255];
        let frame = Frame::from_bgra_buffer(2, 1, &buffer).unwrap();
        let rgb = frame.image().to_rgb8();
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([30, 20, 10]));
        assert_eq!(frame.dimensions(), (2, 1));
    }
}
