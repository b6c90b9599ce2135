use std::collections::VecDeque;

use crate::common::Color;
use crate::pipeline::services::classification::ColorClassifier;

/// Exponential moving average over raw color samples, plus a short window of
/// recent averages used to decide whether the color has settled.
pub struct TemporalSmoother {
    ema_color: Option<Color>,
    alpha: f64,
    history: VecDeque<Color>,
    history_window_size: usize,
    classifier: ColorClassifier,
}

impl TemporalSmoother {
    pub const ALPHA: f64 = 0.3;
    pub const HISTORY_WINDOW: usize = 5;

    pub fn new() -> Self {
        Self {
            ema_color: None,
            alpha: Self::ALPHA,
            history: VecDeque::with_capacity(Self::HISTORY_WINDOW),
            history_window_size: Self::HISTORY_WINDOW,
            classifier: ColorClassifier::new(),
        }
    }

    /// Folds a raw sample into the running average and records the result.
    ///
    /// The first sample seeds the average directly; afterwards each channel
    /// moves `alpha` of the way toward the raw value, truncated to an integer.
    pub fn update(&mut self, raw: Color) -> Color {
        let smoothed = match self.ema_color {
            None => raw,
            Some(previous) => {
                let [pr, pg, pb] = previous.channels().map(f64::from);
                let [r, g, b] = raw.channels().map(f64::from);
                Color::from_channels_truncated([
                    pr + self.alpha * (r - pr),
                    pg + self.alpha * (g - pg),
                    pb + self.alpha * (b - pb),
                ])
            }
        };
        self.ema_color = Some(smoothed);

        if self.history.len() >= self.history_window_size {
            self.history.pop_front();
        }
        self.history.push_back(smoothed);

        smoothed
    }

    /// True once the window is full and every entry carries the same color
    /// name as `color`.
    pub fn is_stable(&self, color: Color) -> bool {
        if self.history.len() != self.history_window_size {
            return false;
        }
        let category = self.classifier.classify(color);
        self.history
            .iter()
            .all(|entry| self.classifier.classify(*entry) == category)
    }

    pub fn ema_color(&self) -> Option<Color> {
        self.ema_color
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn history(&self) -> impl Iterator<Item = &Color> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

impl Default for TemporalSmoother {
    fn default() -> Self {
        Self::new()
    }
}
