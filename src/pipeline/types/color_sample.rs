use chrono::{DateTime, Utc};

use crate::common::Color;

/// A color read from one frame, stamped with the frame's capture time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorSample {
    pub color: Color,
    pub captured_at: DateTime<Utc>,
}

impl ColorSample {
    pub fn new(color: Color, captured_at: DateTime<Utc>) -> Self {
        Self { color, captured_at }
    }

    pub fn now(color: Color) -> Self {
        Self::new(color, Utc::now())
    }
}
