use futures::Stream;
use std::time::Duration;
use tokio::time::Instant;

use crate::common::Color;

/// Linear interpolation between two colors, per channel, truncated.
/// `progress` is clamped into [0, 1].
pub fn interpolate(from: Color, to: Color, progress: f64) -> Color {
    let p = progress.clamp(0.0, 1.0);
    let [fr, fg, fb] = from.channels().map(f64::from);
    let [tr, tg, tb] = to.channels().map(f64::from);
    Color::from_channels_truncated([
        fr + (tr - fr) * p,
        fg + (tg - fg) * p,
        fb + (tb - fb) * p,
    ])
}

/// Produces timed color ramps between two colors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transitioner {
    duration: Duration,
    step: Duration,
}

impl Transitioner {
    pub const DEFAULT_DURATION: Duration = Duration::from_millis(500);
    pub const DEFAULT_STEP: Duration = Duration::from_millis(10);

    pub fn new(duration: Duration, step: Duration) -> Self {
        Self { duration, step }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Rough number of frames a ramp yields.
    pub fn expected_frames(&self) -> usize {
        if self.step.is_zero() {
            return 0;
        }
        self.duration.as_nanos().div_ceil(self.step.as_nanos()) as usize
    }

    /// Lazily yields `from + (to - from) * t / duration` for elapsed `t` in
    /// `[0, duration)`, one element per step. The clock starts on first poll;
    /// the ramp ends at the duration boundary without an extra `to` frame.
    pub fn run(&self, from: Color, to: Color) -> impl Stream<Item = Color> + Send + 'static {
        let duration = self.duration;
        let step = self.step;
        futures::stream::unfold(None, move |started: Option<Instant>| async move {
            let start = match started {
                Some(start) => {
                    tokio::time::sleep(step).await;
                    start
                }
                None => Instant::now(),
            };
            let elapsed = start.elapsed();
            if elapsed >= duration {
                return None;
            }
            let progress = elapsed.as_secs_f64() / duration.as_secs_f64();
            Some((interpolate(from, to, progress), Some(start)))
        })
    }
}

impl Default for Transitioner {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DURATION, Self::DEFAULT_STEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn interpolate_midpoint() {
        let mid = interpolate(Color::new(0, 0, 0), Color::new(100, 200, 50), 0.5);
        assert_eq!(mid, Color::new(50, 100, 25));
    }

    #[test]
    fn interpolate_downward_and_clamped() {
        let from = Color::new(200, 100, 0);
        let to = Color::new(0, 100, 255);
        assert_eq!(interpolate(from, to, 0.0), from);
        assert_eq!(interpolate(from, to, 1.0), to);
        assert_eq!(interpolate(from, to, 2.0), to);
        assert_eq!(interpolate(from, to, -1.0), from);
        assert_eq!(interpolate(from, to, 0.25), Color::new(150, 100, 63));
    }

    #[tokio::test(start_paused = true)]
    async fn ramp_is_paced_and_stops_before_duration() {
        let transitioner = Transitioner::default();
        let from = Color::new(0, 0, 0);
        let to = Color::new(100, 200, 50);

        let started = Instant::now();
        let frames: Vec<Color> = transitioner.run(from, to).collect().await;

        assert_eq!(frames.len(), 50);
        assert_eq!(frames.len(), transitioner.expected_frames());
        assert_eq!(frames[0], from);
        assert_eq!(frames[25], Color::new(50, 100, 25));
        assert_eq!(*frames.last().unwrap(), Color::new(98, 196, 49));
        assert_ne!(*frames.last().unwrap(), to);
        assert!(started.elapsed() >= transitioner.duration());
    }

    #[tokio::test(start_paused = true)]
    async fn ramp_channels_move_monotonically() {
        let transitioner = Transitioner::default();
        let frames: Vec<Color> = transitioner
            .run(Color::new(255, 0, 128), Color::new(0, 255, 128))
            .collect()
            .await;
        for pair in frames.windows(2) {
            assert!(pair[1].r <= pair[0].r);
            assert!(pair[1].g >= pair[0].g);
            assert_eq!(pair[1].b, 128);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_yields_nothing() {
        let transitioner = Transitioner::new(Duration::ZERO, Duration::from_millis(10));
        let frames: Vec<Color> = transitioner
            .run(Color::BLACK, Color::new(1, 2, 3))
            .collect()
            .await;
        assert!(frames.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn ramp_does_not_start_until_polled() {
        let transitioner = Transitioner::default();
        let ramp = transitioner.run(Color::BLACK, Color::new(100, 100, 100));
        tokio::time::sleep(Duration::from_secs(2)).await;
        let frames: Vec<Color> = ramp.collect().await;
        assert_eq!(frames.len(), 50);
    }
}
