use chrono::Utc;
use image::DynamicImage;
use xcap::Monitor;

use crate::capture::FrameSource;
use crate::common::Frame;
use crate::error::AppError;

/// Grabs the whole of one monitor.
pub struct ScreenCapture {
    prefer_extended_display: bool,
}

impl ScreenCapture {
    pub fn new(prefer_extended_display: bool) -> Self {
        Self {
            prefer_extended_display,
        }
    }

    /// An extended display is any monitor whose origin is right of or below
    /// the primary one.
    fn select_monitor(&self) -> Result<Monitor, AppError> {
        let monitors = Monitor::all().map_err(|e| AppError::Capture(e.to_string()))?;

        let extended = if self.prefer_extended_display {
            monitors.iter().position(|m| m.x() > 0 || m.y() > 0)
        } else {
            None
        };
        let index = extended
            .or_else(|| monitors.iter().position(|m| m.is_primary()))
            .unwrap_or(0);

        monitors
            .into_iter()
            .nth(index)
            .ok_or_else(|| AppError::Capture("No display available".to_string()))
    }
}

impl FrameSource for ScreenCapture {
    fn capture(&mut self) -> Result<Frame, AppError> {
        let monitor = self.select_monitor()?;
        let rgba = monitor
            .capture_image()
            .map_err(|e| AppError::Capture(e.to_string()))?;
        let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();
        Ok(Frame::new(DynamicImage::ImageRgb8(rgb), Utc::now()))
    }

    fn name(&self) -> &'static str {
        "screen"
    }
}
