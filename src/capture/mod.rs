mod frame_source;
mod image_file_source;
#[cfg(feature = "screen")]
mod screen_capture;

pub use frame_source::FrameSource;
pub use image_file_source::ImageFileSource;
#[cfg(feature = "screen")]
pub use screen_capture::ScreenCapture;

use crate::config::{CaptureConfiguration, CaptureSourceKind};
use crate::error::AppError;

/// Builds the frame source named by the configuration.
pub fn from_configuration(
    configuration: &CaptureConfiguration,
) -> Result<Box<dyn FrameSource>, AppError> {
    match configuration.source {
        CaptureSourceKind::ImageFile => {
            let path = configuration.image_path.clone().ok_or_else(|| {
                AppError::Configuration("capture.image_path is required".to_string())
            })?;
            Ok(Box::new(ImageFileSource::new(path)))
        }
        #[cfg(feature = "screen")]
        CaptureSourceKind::Screen => Ok(Box::new(ScreenCapture::new(
            configuration.prefer_extended_display,
        ))),
        #[cfg(not(feature = "screen"))]
        CaptureSourceKind::Screen => Err(AppError::Configuration(
            "screen capture needs the `screen` feature; use the image_file source instead"
                .to_string(),
        )),
    }
}
