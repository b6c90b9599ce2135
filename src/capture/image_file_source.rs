use chrono::Utc;
use std::path::{Path, PathBuf};

use crate::capture::FrameSource;
use crate::common::Frame;
use crate::error::AppError;

/// Reads the frame from an image file on every capture, so an external
/// screenshot tool can keep overwriting it.
pub struct ImageFileSource {
    path: PathBuf,
}

impl ImageFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for ImageFileSource {
    fn capture(&mut self) -> Result<Frame, AppError> {
        let image = image::open(&self.path).map_err(|e| {
            AppError::Capture(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        let rgb = image::DynamicImage::ImageRgb8(image.to_rgb8());
        Ok(Frame::new(rgb, Utc::now()))
    }

    fn name(&self) -> &'static str {
        "image_file"
    }
}
