use std::time::Duration;
use tokio::time::Instant;

use crate::common::Color;
use crate::pipeline::services::classification::ColorClassifier;
use crate::pipeline::services::smoothing::TemporalSmoother;
use crate::pipeline::types::{AcceptedChange, GateDecision, GateRejection};

/// Thresholds and timers for the change gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateThresholds {
    /// Minimum euclidean RGB distance from the current target.
    pub color_difference_threshold: f64,
    /// After this long without a significant change, the next sample is
    /// published regardless of distance or stability.
    pub force_update_interval: Duration,
    /// Window during which re-publishing the same color name is suppressed.
    pub cooldown_period: Duration,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            color_difference_threshold: 30.0,
            force_update_interval: Duration::from_secs(5),
            cooldown_period: Duration::from_secs_f64(1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateState {
    /// Last color accepted as the live target.
    pub target_color: Color,
    /// Last color fully transitioned to.
    pub prev_color: Color,
    pub last_significant_change: Instant,
    pub last_published_color: Option<Color>,
    pub last_published_time: Option<Instant>,
}

impl GateState {
    pub fn new(started_at: Instant) -> Self {
        Self {
            target_color: Color::BLACK,
            prev_color: Color::BLACK,
            last_significant_change: started_at,
            last_published_color: None,
            last_published_time: None,
        }
    }
}

/// Debounce, stability and cooldown checks deciding whether a smoothed color
/// becomes the new published target.
pub struct ChangeGate {
    thresholds: GateThresholds,
    state: GateState,
    classifier: ColorClassifier,
}

impl ChangeGate {
    pub fn new(thresholds: GateThresholds, started_at: Instant) -> Self {
        Self {
            thresholds,
            state: GateState::new(started_at),
            classifier: ColorClassifier::new(),
        }
    }

    pub fn thresholds(&self) -> &GateThresholds {
        &self.thresholds
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn target_color(&self) -> Color {
        self.state.target_color
    }

    pub fn prev_color(&self) -> Color {
        self.state.prev_color
    }

    fn force_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.state.last_significant_change)
            > self.thresholds.force_update_interval
    }

    /// Evaluates `smoothed` without touching any state.
    pub fn evaluate(
        &self,
        smoothed: Color,
        smoother: &TemporalSmoother,
        now: Instant,
    ) -> GateDecision {
        let forced = self.force_due(now);
        let distant = smoothed.distance(&self.state.target_color)
            > self.thresholds.color_difference_threshold;

        if !distant && !forced {
            return GateDecision::Reject(GateRejection::Insignificant);
        }

        let stable = smoother.is_stable(smoothed);
        if !forced && !stable {
            return GateDecision::Reject(GateRejection::Unstable);
        }

        let category = self.classifier.classify(smoothed);
        let name_changed = self
            .state
            .last_published_color
            .map_or(true, |last| !self.classifier.same_category(last, smoothed));
        let cooled_down = match self.state.last_published_time {
            None => true,
            Some(at) => now.saturating_duration_since(at) > self.thresholds.cooldown_period,
        };

        if !name_changed && !cooled_down {
            return GateDecision::Reject(GateRejection::Cooldown);
        }

        GateDecision::Accept(AcceptedChange {
            from: self.state.prev_color,
            to: smoothed,
            category,
            forced: forced && !(distant && stable),
        })
    }

    /// Commits an accepted change: the new target and all timers.
    pub fn accept(&mut self, change: &AcceptedChange, now: Instant) {
        self.state.target_color = change.to;
        self.state.last_significant_change = now;
        self.state.last_published_color = Some(change.to);
        self.state.last_published_time = Some(now);
    }

    /// Marks the ramp toward the current target as finished.
    pub fn complete_transition(&mut self) {
        self.state.prev_color = self.state.target_color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::new(200, 10, 10);
    const GREEN: Color = Color::new(10, 200, 10);

    fn stable_smoother(color: Color) -> TemporalSmoother {
        let mut smoother = TemporalSmoother::new();
        for _ in 0..TemporalSmoother::HISTORY_WINDOW {
            smoother.update(color);
        }
        smoother
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn close_colors_are_insignificant() {
        let start = Instant::now();
        let gate = ChangeGate::new(GateThresholds::default(), start);
        let near_black = Color::new(10, 10, 10);
        let smoother = stable_smoother(near_black);
        assert_eq!(
            gate.evaluate(near_black, &smoother, start + ms(100)),
            GateDecision::Reject(GateRejection::Insignificant)
        );
    }

    #[test]
    fn distant_but_unsettled_color_is_unstable() {
        let start = Instant::now();
        let gate = ChangeGate::new(GateThresholds::default(), start);
        let mut smoother = TemporalSmoother::new();
        let smoothed = smoother.update(RED);
        assert_eq!(
            gate.evaluate(smoothed, &smoother, start + ms(100)),
            GateDecision::Reject(GateRejection::Unstable)
        );
    }

    #[test]
    fn distant_and_stable_color_is_accepted() {
        let start = Instant::now();
        let gate = ChangeGate::new(GateThresholds::default(), start);
        let smoother = stable_smoother(RED);
        let decision = gate.evaluate(RED, &smoother, start + ms(400));
        let change = decision.accepted().copied().unwrap();
        assert_eq!(change.from, Color::BLACK);
        assert_eq!(change.to, RED);
        assert_eq!(change.category.label(), "Red");
        assert!(!change.forced);
    }

    #[test]
    fn force_interval_bypasses_distance_and_stability() {
        let start = Instant::now();
        let gate = ChangeGate::new(GateThresholds::default(), start);
        let mut smoother = TemporalSmoother::new();
        let smoothed = smoother.update(Color::new(5, 5, 5));
        let decision = gate.evaluate(smoothed, &smoother, start + ms(5_001));
        let change = decision.accepted().copied().unwrap();
        assert!(change.forced);
        assert_eq!(change.to, Color::new(5, 5, 5));
    }

    #[test]
    fn force_interval_must_be_strictly_exceeded() {
        let start = Instant::now();
        let gate = ChangeGate::new(GateThresholds::default(), start);
        let smoother = stable_smoother(Color::new(5, 5, 5));
        assert!(!gate
            .evaluate(Color::new(5, 5, 5), &smoother, start + ms(5_000))
            .is_accept());
    }

    #[test]
    fn same_name_within_cooldown_is_suppressed() {
        let start = Instant::now();
        let mut gate = ChangeGate::new(GateThresholds::default(), start);

        let smoother = stable_smoother(RED);
        let first = gate.evaluate(RED, &smoother, start + ms(500));
        let change = first.accepted().copied().unwrap();
        gate.accept(&change, start + ms(500));
        gate.complete_transition();

        // far from the new target, settled, and still red
        let far_red = Color::new(255, 60, 60);
        assert!(far_red.distance(&RED) > 30.0);
        let smoother = stable_smoother(far_red);
        assert_eq!(
            gate.evaluate(far_red, &smoother, start + ms(1_200)),
            GateDecision::Reject(GateRejection::Cooldown)
        );
        assert!(gate.evaluate(far_red, &smoother, start + ms(1_501)).is_accept());
    }

    #[test]
    fn different_name_ignores_cooldown() {
        let start = Instant::now();
        let mut gate = ChangeGate::new(GateThresholds::default(), start);
        let change = gate
            .evaluate(RED, &stable_smoother(RED), start + ms(500))
            .accepted()
            .copied()
            .unwrap();
        gate.accept(&change, start + ms(500));
        gate.complete_transition();

        let decision = gate.evaluate(GREEN, &stable_smoother(GREEN), start + ms(600));
        let change = decision.accepted().copied().unwrap();
        assert_eq!(change.from, RED);
        assert_eq!(change.category.label(), "Green");
    }

    #[test]
    fn accept_updates_target_before_transition_completes() {
        let start = Instant::now();
        let mut gate = ChangeGate::new(GateThresholds::default(), start);
        let change = gate
            .evaluate(RED, &stable_smoother(RED), start + ms(500))
            .accepted()
            .copied()
            .unwrap();
        gate.accept(&change, start + ms(500));
        assert_eq!(gate.target_color(), RED);
        assert_eq!(gate.prev_color(), Color::BLACK);
        gate.complete_transition();
        assert_eq!(gate.prev_color(), RED);
        assert_eq!(gate.state().last_published_color, Some(RED));
        assert_eq!(gate.state().last_significant_change, start + ms(500));
    }

    #[test]
    fn accepted_change_resets_force_timer() {
        let start = Instant::now();
        let mut gate = ChangeGate::new(GateThresholds::default(), start);
        let gray = Color::new(5, 5, 5);
        let smoother = stable_smoother(gray);
        let change = gate
            .evaluate(gray, &smoother, start + ms(6_000))
            .accepted()
            .copied()
            .unwrap();
        gate.accept(&change, start + ms(6_000));
        gate.complete_transition();
        assert_eq!(
            gate.evaluate(gray, &smoother, start + ms(7_000)),
            GateDecision::Reject(GateRejection::Insignificant)
        );
        assert!(gate.evaluate(gray, &smoother, start + ms(11_001)).is_accept());
    }
}
