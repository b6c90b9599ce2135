mod capture_rate_limiter;
mod frame_color_extractor;

pub use capture_rate_limiter::{CaptureRateLimiter, Captured};
pub use frame_color_extractor::FrameColorExtractor;
