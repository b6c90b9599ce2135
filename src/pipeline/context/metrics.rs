use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::pipeline::types::GateRejection;

/// Counters collected by the sampling loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineStats {
    pub iterations: u64,
    pub frames_captured: u64,
    pub frames_reused: u64,
    pub capture_failures: u64,
    pub iteration_failures: u64,
    pub changes_accepted: u64,
    pub forced_changes: u64,
    pub rejected_insignificant: u64,
    pub rejected_unstable: u64,
    pub rejected_cooldown: u64,
    pub frames_published: u64,
    pub publish_failures: u64,
    pub last_extraction_duration: Option<Duration>,
}

/// Shared handle to the pipeline counters; cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct PipelineMetrics {
    stats: Arc<Mutex<PipelineStats>>,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn stats(&self) -> MutexGuard<'_, PipelineStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> PipelineStats {
        self.stats().clone()
    }

    pub fn record_iteration(&self) {
        self.stats().iterations += 1;
    }

    pub fn record_capture(&self, extraction: Duration) {
        let mut stats = self.stats();
        stats.frames_captured += 1;
        stats.last_extraction_duration = Some(extraction);
    }

    pub fn record_reuse(&self) {
        self.stats().frames_reused += 1;
    }

    pub fn record_capture_failure(&self) {
        self.stats().capture_failures += 1;
    }

    pub fn record_iteration_failure(&self) {
        self.stats().iteration_failures += 1;
    }

    pub fn record_accept(&self, forced: bool) {
        let mut stats = self.stats();
        stats.changes_accepted += 1;
        if forced {
            stats.forced_changes += 1;
        }
    }

    pub fn record_rejection(&self, rejection: GateRejection) {
        let mut stats = self.stats();
        match rejection {
            GateRejection::Insignificant => stats.rejected_insignificant += 1,
            GateRejection::Unstable => stats.rejected_unstable += 1,
            GateRejection::Cooldown => stats.rejected_cooldown += 1,
        }
    }

    pub fn record_publish(&self, success: bool) {
        let mut stats = self.stats();
        if success {
            stats.frames_published += 1;
        } else {
            stats.publish_failures += 1;
        }
    }
}
