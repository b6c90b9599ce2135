use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AppError;
use crate::pipeline::services::gating::GateThresholds;

/// Environment variables with this prefix override file and default values,
/// e.g. `SCREENCOLOR__PIPELINE__COOLDOWN_PERIOD_SECS=2`.
pub const ENV_PREFIX: &str = "SCREENCOLOR";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub broker: BrokerConfiguration,
    pub pipeline: PipelineConfiguration,
    pub capture: CaptureConfiguration,
    pub logging: LoggingConfiguration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfiguration {
    pub host: String,
    pub port: u16,
    pub topic: String,
    /// Empty means a random `screencolor-<uuid>` id.
    pub client_id: String,
    pub keep_alive_secs: u64,
    pub reconnect_delay_ms: u64,
}

impl Default for BrokerConfiguration {
    fn default() -> Self {
        Self {
            host: "192.168.1.200".to_string(),
            port: 1883,
            topic: "myhome".to_string(),
            client_id: String::new(),
            keep_alive_secs: 30,
            reconnect_delay_ms: 1000,
        }
    }
}

/// Tuning for the sampling loop, the smoothing gate and the color ramps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfiguration {
    pub transition_duration_secs: f64,
    pub transition_step_ms: u64,
    pub update_interval_secs: f64,
    pub capture_interval_secs: f64,
    pub color_difference_threshold: f64,
    pub force_update_interval_secs: f64,
    pub cooldown_period_secs: f64,
    pub vividness_threshold: f64,
    pub downsample_size: u32,
    /// Unset means publishes are never timed out.
    pub publish_timeout_ms: Option<u64>,
}

impl Default for PipelineConfiguration {
    fn default() -> Self {
        Self {
            transition_duration_secs: 0.5,
            transition_step_ms: 10,
            update_interval_secs: 0.1,
            capture_interval_secs: 0.1,
            color_difference_threshold: 30.0,
            force_update_interval_secs: 5.0,
            cooldown_period_secs: 1.0,
            vividness_threshold: 0.15,
            downsample_size: 50,
            publish_timeout_ms: None,
        }
    }
}

impl PipelineConfiguration {
    pub fn transition_duration(&self) -> Duration {
        Duration::from_secs_f64(self.transition_duration_secs)
    }

    pub fn transition_step(&self) -> Duration {
        Duration::from_millis(self.transition_step_ms)
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs_f64(self.update_interval_secs)
    }

    pub fn capture_interval(&self) -> Duration {
        Duration::from_secs_f64(self.capture_interval_secs)
    }

    pub fn publish_timeout(&self) -> Option<Duration> {
        self.publish_timeout_ms.map(Duration::from_millis)
    }

    pub fn gate_thresholds(&self) -> GateThresholds {
        GateThresholds {
            color_difference_threshold: self.color_difference_threshold,
            force_update_interval: Duration::from_secs_f64(self.force_update_interval_secs),
            cooldown_period: Duration::from_secs_f64(self.cooldown_period_secs),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), AppError> {
        let durations = [
            ("transition_duration_secs", self.transition_duration_secs),
            ("update_interval_secs", self.update_interval_secs),
            ("capture_interval_secs", self.capture_interval_secs),
            ("force_update_interval_secs", self.force_update_interval_secs),
            ("cooldown_period_secs", self.cooldown_period_secs),
        ];
        for (name, value) in durations {
            // also catches values too large for a Duration
            if Duration::try_from_secs_f64(value).is_err() {
                return Err(invalid(format!(
                    "{} must be a finite, non-negative number of seconds (got {})",
                    name, value
                )));
            }
        }

        if self.update_interval_secs == 0.0 {
            return Err(invalid("update_interval_secs must be greater than 0"));
        }

        if self.transition_step_ms == 0 {
            return Err(invalid("transition_step_ms must be greater than 0"));
        }

        if self.downsample_size == 0 {
            return Err(invalid("downsample_size must be greater than 0"));
        }

        if !self.color_difference_threshold.is_finite() || self.color_difference_threshold < 0.0 {
            return Err(invalid("color_difference_threshold must be a non-negative number"));
        }

        if !(0.0..=1.0).contains(&self.vividness_threshold) {
            return Err(invalid("vividness_threshold must be between 0.0 and 1.0"));
        }

        if self.cooldown_period_secs > self.force_update_interval_secs {
            return Err(invalid(
                "cooldown_period_secs must not exceed force_update_interval_secs",
            ));
        }

        if self.publish_timeout_ms == Some(0) {
            return Err(invalid("publish_timeout_ms must be greater than 0 when set"));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureSourceKind {
    Screen,
    ImageFile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfiguration {
    pub source: CaptureSourceKind,
    pub image_path: Option<PathBuf>,
    /// Grab a secondary display when one is attached, else the primary.
    pub prefer_extended_display: bool,
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            source: CaptureSourceKind::Screen,
            image_path: None,
            prefer_extended_display: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfiguration {
    pub level: String,
    /// Plain-text copy of the log, truncated at startup.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfiguration {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some(PathBuf::from("color_detection.log")),
        }
    }
}

impl Configuration {
    /// Defaults, then the optional file, then `SCREENCOLOR__*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let configuration: Configuration = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(configuration)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.pipeline.validate()?;

        if self.broker.host.trim().is_empty() {
            return Err(invalid("broker.host must not be empty"));
        }
        if self.broker.port == 0 {
            return Err(invalid("broker.port must be greater than 0"));
        }
        if self.broker.topic.trim().is_empty() {
            return Err(invalid("broker.topic must not be empty"));
        }
        if self.broker.keep_alive_secs < 5 {
            return Err(invalid("broker.keep_alive_secs must be at least 5"));
        }

        if self.capture.source == CaptureSourceKind::ImageFile && self.capture.image_path.is_none()
        {
            return Err(invalid("capture.image_path is required for the image_file source"));
        }

        self.logging.level_filter()?;
        Ok(())
    }
}

impl LoggingConfiguration {
    pub fn level_filter(&self) -> Result<tracing::level_filters::LevelFilter, AppError> {
        self.level
            .parse::<tracing::level_filters::LevelFilter>()
            .map_err(|_| invalid(format!("unknown log level '{}'", self.level)))
    }
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::Configuration(message.into())
}
