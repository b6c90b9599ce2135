use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::common::Frame;
use crate::error::AppError;
use crate::pipeline::types::ColorSample;

#[derive(Debug, Default)]
struct RateLimitState {
    last_capture_time: Option<Instant>,
    last_sample: Option<ColorSample>,
}

/// Result of asking the limiter for a frame.
pub enum Captured {
    Fresh(Frame),
    /// Capture was skipped; the previous sample is handed back unchanged.
    Reused(ColorSample),
}

/// Bounds how often the display is actually grabbed, independent of the loop
/// cadence. Skipping a capture only saves work; returning the previous sample
/// does not change what the pipeline would decide.
#[derive(Debug)]
pub struct CaptureRateLimiter {
    capture_interval: Duration,
    state: Mutex<RateLimitState>,
}

impl CaptureRateLimiter {
    pub fn new(capture_interval: Duration) -> Self {
        Self {
            capture_interval,
            state: Mutex::new(RateLimitState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RateLimitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `capture` unless the last real capture is younger than the capture
    /// interval. The check, the capture and the timestamp update happen under
    /// one lock.
    pub fn capture<F>(&self, now: Instant, capture: F) -> Result<Captured, AppError>
    where
        F: FnOnce() -> Result<Frame, AppError>,
    {
        let mut state = self.lock();
        if let (Some(last), Some(sample)) = (state.last_capture_time, state.last_sample) {
            if now.saturating_duration_since(last) < self.capture_interval {
                return Ok(Captured::Reused(sample));
            }
        }

        let frame = capture()?;
        state.last_capture_time = Some(now);
        Ok(Captured::Fresh(frame))
    }

    /// Stores the sample extracted from the most recent fresh frame.
    pub fn remember(&self, sample: ColorSample) {
        self.lock().last_sample = Some(sample);
    }

    pub fn last_capture_time(&self) -> Option<Instant> {
        self.lock().last_capture_time
    }

    pub fn last_sample(&self) -> Option<ColorSample> {
        self.lock().last_sample
    }

    pub fn capture_interval(&self) -> Duration {
        self.capture_interval
    }
}
