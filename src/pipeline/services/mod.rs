pub mod classification;
pub mod extraction;
pub mod gating;
pub mod publish;
pub mod smoothing;
pub mod transition;

pub use classification::ColorClassifier;
pub use extraction::{CaptureRateLimiter, FrameColorExtractor};
pub use gating::{ChangeGate, GateThresholds};
pub use publish::{BroadcastPublisher, MqttPublisher, PublishRequest, SetRgbCommand};
pub use smoothing::TemporalSmoother;
pub use transition::Transitioner;
