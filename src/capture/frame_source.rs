use crate::common::Frame;
use crate::error::AppError;

/// Anything that can hand the pipeline a fresh display image on demand.
///
/// Capture is synchronous; an unavailable display is reported as
/// [`AppError::Capture`].
pub trait FrameSource: Send {
    fn capture(&mut self) -> Result<Frame, AppError>;
    fn name(&self) -> &'static str;
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn capture(&mut self) -> Result<Frame, AppError> {
        (**self).capture()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
