use futures::{FutureExt, StreamExt};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tower::{BoxError, Service, ServiceExt};
use tracing::{debug, error, info, trace, warn};

use crate::capture::FrameSource;
use crate::common::Color;
use crate::config::{Configuration, PipelineConfiguration};
use crate::error::AppError;
use crate::pipeline::context::{PipelineMetrics, PipelineStats};
use crate::pipeline::services::extraction::{CaptureRateLimiter, Captured, FrameColorExtractor};
use crate::pipeline::services::gating::ChangeGate;
use crate::pipeline::services::publish::{boxed_publisher, PublishRequest, PublisherService};
use crate::pipeline::services::smoothing::TemporalSmoother;
use crate::pipeline::services::transition::Transitioner;
use crate::pipeline::types::{ColorSample, GateDecision};

/// What one pass of the sampling loop saw and did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub sample: ColorSample,
    pub smoothed: Color,
    pub decision: GateDecision,
    pub frames_published: usize,
}

/// Owns every piece of sampling state: capture, smoothing, gating and the
/// publisher. Built once, driven by a single task.
pub struct ColorPipeline {
    source: Box<dyn FrameSource>,
    rate_limiter: Arc<CaptureRateLimiter>,
    extractor: FrameColorExtractor,
    smoother: TemporalSmoother,
    gate: ChangeGate,
    transitioner: Transitioner,
    publisher: PublisherService,
    topic: String,
    update_interval: Duration,
    metrics: PipelineMetrics,
}

impl ColorPipeline {
    pub fn builder() -> ColorPipelineBuilder {
        ColorPipelineBuilder::new()
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    pub fn rate_limiter(&self) -> Arc<CaptureRateLimiter> {
        self.rate_limiter.clone()
    }

    pub fn gate(&self) -> &ChangeGate {
        &self.gate
    }

    pub fn smoother(&self) -> &TemporalSmoother {
        &self.smoother
    }

    pub fn transitioner(&self) -> &Transitioner {
        &self.transitioner
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    /// One sample, smooth, gate pass. An accepted change streams its whole
    /// ramp to the publisher before this returns.
    pub async fn tick(&mut self) -> Result<TickReport, AppError> {
        self.metrics.record_iteration();
        let now = Instant::now();

        let sample = self.sample(now)?;
        let smoothed = self.smoother.update(sample.color);
        let decision = self.gate.evaluate(smoothed, &self.smoother, now);

        let mut frames_published = 0;
        match decision {
            GateDecision::Accept(change) => {
                info!(
                    "Color change: {} -> {} ({})",
                    change.from, change.to, change.category
                );
                self.metrics.record_accept(change.forced);
                self.gate.accept(&change, now);
                frames_published = self.transition(change.from, change.to).await;
                self.gate.complete_transition();
            }
            GateDecision::Reject(rejection) => {
                trace!("Holding {} ({})", smoothed, rejection.reason());
                self.metrics.record_rejection(rejection);
            }
        }

        Ok(TickReport {
            sample,
            smoothed,
            decision,
            frames_published,
        })
    }

    fn sample(&mut self, now: Instant) -> Result<ColorSample, AppError> {
        let source = &mut self.source;
        let captured = match self.rate_limiter.capture(now, || source.capture()) {
            Ok(captured) => captured,
            Err(e) => {
                self.metrics.record_capture_failure();
                return Err(e);
            }
        };

        match captured {
            Captured::Reused(sample) => {
                self.metrics.record_reuse();
                Ok(sample)
            }
            Captured::Fresh(frame) => {
                let started = std::time::Instant::now();
                let color = self.extractor.extract(frame.image());
                self.metrics.record_capture(started.elapsed());
                trace!("Frame {} dominant color {}", frame.frame_id(), color);

                let sample = ColorSample::new(color, frame.captured_at());
                self.rate_limiter.remember(sample);
                Ok(sample)
            }
        }
    }

    /// Streams the ramp to the publisher; failed publishes are logged and
    /// skipped. Returns how many frames went out.
    async fn transition(&mut self, from: Color, to: Color) -> usize {
        let mut ramp = std::pin::pin!(self.transitioner.run(from, to));
        let mut published = 0;
        while let Some(color) = ramp.next().await {
            let request = PublishRequest::set_rgb(self.topic.as_str(), color);
            debug!("Sending: {}", request.command.payload);
            match Self::publish(&mut self.publisher, request).await {
                Ok(()) => {
                    published += 1;
                    self.metrics.record_publish(true);
                }
                Err(e) => {
                    warn!("Failed to publish color {}: {}", color, e);
                    self.metrics.record_publish(false);
                }
            }
        }
        published
    }

    async fn publish(publisher: &mut PublisherService, request: PublishRequest) -> Result<(), BoxError> {
        ServiceExt::<PublishRequest>::ready(publisher)
            .await?
            .call(request)
            .await
    }

    /// Runs until `cancel_token` fires. Shutdown is only observed between
    /// iterations, never in the middle of a ramp. Errors and panics from one
    /// iteration are logged and the loop carries on.
    pub async fn run(mut self, cancel_token: CancellationToken) -> PipelineStats {
        info!(
            "Color pipeline started, sampling every {:?}",
            self.update_interval
        );

        while !cancel_token.is_cancelled() {
            match AssertUnwindSafe(self.tick()).catch_unwind().await {
                Ok(Ok(report)) => {
                    trace!("Tick: {:?}", report.decision);
                }
                Ok(Err(e)) => {
                    error!("Pipeline error: {}", e);
                }
                Err(panic) => {
                    self.metrics.record_iteration_failure();
                    error!("Pipeline iteration panicked: {}", panic_message(&*panic));
                }
            }

            tokio::select! {
                _ = cancel_token.cancelled() => break,
                _ = tokio::time::sleep(self.update_interval) => {}
            }
        }

        let stats = self.metrics.snapshot();
        info!("Color pipeline stopped: {:?}", stats);
        stats
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

type PublisherFactory = Box<dyn FnOnce(Option<Duration>) -> PublisherService + Send>;

pub struct ColorPipelineBuilder {
    source: Option<Box<dyn FrameSource>>,
    publisher: Option<PublisherFactory>,
    topic: String,
    configuration: PipelineConfiguration,
    metrics: Option<PipelineMetrics>,
    started_at: Option<Instant>,
}

impl ColorPipelineBuilder {
    pub fn new() -> Self {
        let configuration = Configuration::default();
        Self {
            source: None,
            publisher: None,
            topic: configuration.broker.topic,
            configuration: configuration.pipeline,
            metrics: None,
            started_at: None,
        }
    }

    /// Takes the topic and pipeline tuning from a full configuration.
    pub fn from_configuration(mut self, configuration: &Configuration) -> Self {
        self.topic = configuration.broker.topic.clone();
        self.configuration = configuration.pipeline.clone();
        self
    }

    pub fn configuration(mut self, configuration: PipelineConfiguration) -> Self {
        self.configuration = configuration;
        self
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn frame_source<S>(mut self, source: S) -> Self
    where
        S: FrameSource + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Any publishing service; wrapped in the configured timeout, if one is
    /// set, when the pipeline is built.
    pub fn publisher<S>(mut self, publisher: S) -> Self
    where
        S: Service<PublishRequest, Response = (), Error = AppError> + Send + 'static,
        S::Future: Send + 'static,
    {
        self.publisher = Some(Box::new(move |timeout| boxed_publisher(publisher, timeout)));
        self
    }

    pub fn metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Reference point for the force-update timer; defaults to build time.
    pub fn started_at(mut self, started_at: Instant) -> Self {
        self.started_at = Some(started_at);
        self
    }

    pub fn build(self) -> Result<ColorPipeline, AppError> {
        self.configuration.validate()?;
        if self.topic.trim().is_empty() {
            return Err(AppError::Configuration("topic must not be empty".to_string()));
        }
        let source = self
            .source
            .ok_or(AppError::Pipeline("Frame source not set".to_string()))?;
        let publisher_factory = self
            .publisher
            .ok_or(AppError::Pipeline("Publisher not set".to_string()))?;

        let configuration = self.configuration;
        let extractor = FrameColorExtractor::new()
            .with_downsample_size(configuration.downsample_size)
            .with_vividness_threshold(configuration.vividness_threshold);

        Ok(ColorPipeline {
            source,
            rate_limiter: Arc::new(CaptureRateLimiter::new(configuration.capture_interval())),
            extractor,
            smoother: TemporalSmoother::new(),
            gate: ChangeGate::new(
                configuration.gate_thresholds(),
                self.started_at.unwrap_or_else(Instant::now),
            ),
            transitioner: Transitioner::new(
                configuration.transition_duration(),
                configuration.transition_step(),
            ),
            publisher: publisher_factory(configuration.publish_timeout()),
            topic: self.topic,
            update_interval: configuration.update_interval(),
            metrics: self.metrics.unwrap_or_default(),
        })
    }
}

impl Default for ColorPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
