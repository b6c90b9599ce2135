use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tower::Service;

use crate::{
    capture::FrameSource,
    config::Configuration,
    error::AppError,
    pipeline::{
        color_pipeline::ColorPipeline,
        context::{PipelineMetrics, PipelineStats},
        services::{extraction::CaptureRateLimiter, publish::PublishRequest},
    },
};

/// Runs the color pipeline on its own task and stops it on request.
pub struct Coordinator {
    pipeline_task: Option<JoinHandle<PipelineStats>>,
    cancel_token: CancellationToken,
    metrics: PipelineMetrics,
    rate_limiter: Arc<CaptureRateLimiter>,
    shutdown_grace: Duration,
}

impl Coordinator {
    fn new(pipeline: ColorPipeline, cancel_token: CancellationToken) -> Self {
        let metrics = pipeline.metrics().clone();
        let rate_limiter = pipeline.rate_limiter();
        // A running ramp always finishes, so give it room before aborting.
        let shutdown_grace = pipeline
            .transitioner()
            .duration()
            .saturating_add(pipeline.update_interval())
            .saturating_add(Duration::from_secs(1));

        Self {
            pipeline_task: Some(Self::start_pipeline_task(pipeline, cancel_token.clone())),
            cancel_token,
            metrics,
            rate_limiter,
            shutdown_grace,
        }
    }

    fn start_pipeline_task(
        pipeline: ColorPipeline,
        cancel_token: CancellationToken,
    ) -> JoinHandle<PipelineStats> {
        tokio::spawn(pipeline.run(cancel_token))
    }

    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.pipeline_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Time since the display was last actually captured.
    pub fn last_capture_age(&self) -> Option<Duration> {
        self.rate_limiter
            .last_capture_time()
            .map(|captured| Instant::now().saturating_duration_since(captured))
    }

    /// Cancels the pipeline and waits for it to wind down. A task that is
    /// still busy after the grace period is aborted.
    pub async fn shutdown(mut self) -> Option<PipelineStats> {
        self.stop();
        let mut task = self.pipeline_task.take()?;

        match tokio::time::timeout(self.shutdown_grace, &mut task).await {
            Ok(Ok(stats)) => Some(stats),
            Ok(Err(e)) => {
                tracing::error!("Pipeline task failed: {}", e);
                None
            }
            Err(_) => {
                tracing::warn!(
                    "Pipeline did not stop within {:?}, aborting",
                    self.shutdown_grace
                );
                task.abort();
                None
            }
        }
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.stop();
        if let Some(task) = self.pipeline_task.take() {
            task.abort();
        }
    }
}

pub struct CoordinatorBuilder {
    configuration: Configuration,
    source: Option<Box<dyn FrameSource>>,
    pipeline: Option<crate::pipeline::ColorPipelineBuilder>,
    cancel_token: Option<CancellationToken>,
    metrics: Option<PipelineMetrics>,
    started_at: Option<Instant>,
}

impl CoordinatorBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            source: None,
            pipeline: None,
            cancel_token: None,
            metrics: None,
            started_at: None,
        }
    }

    // Sets the MQTT topic, this will override the default configuration.
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.configuration.broker.topic = topic.into();
        self
    }

    // Adjusts the ramp length, this will override the default configuration.
    pub fn transition_duration(mut self, duration: Duration) -> Self {
        self.configuration.pipeline.transition_duration_secs = duration.as_secs_f64();
        self
    }

    // Adjusts the sampling period, this will override the default configuration.
    pub fn update_interval(mut self, interval: Duration) -> Self {
        self.configuration.pipeline.update_interval_secs = interval.as_secs_f64();
        self
    }

    // Adjusts the capture rate limit, this will override the default configuration.
    pub fn capture_interval(mut self, interval: Duration) -> Self {
        self.configuration.pipeline.capture_interval_secs = interval.as_secs_f64();
        self
    }

    pub fn color_difference_threshold(mut self, threshold: f64) -> Self {
        self.configuration.pipeline.color_difference_threshold = threshold;
        self
    }

    pub fn force_update_interval(mut self, interval: Duration) -> Self {
        self.configuration.pipeline.force_update_interval_secs = interval.as_secs_f64();
        self
    }

    pub fn cooldown_period(mut self, period: Duration) -> Self {
        self.configuration.pipeline.cooldown_period_secs = period.as_secs_f64();
        self
    }

    pub fn frame_source<S>(mut self, source: S) -> Self
    where
        S: FrameSource + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn publisher<S>(mut self, publisher: S) -> Self
    where
        S: Service<PublishRequest, Response = (), Error = AppError> + Send + 'static,
        S::Future: Send + 'static,
    {
        self.pipeline = Some(ColorPipeline::builder().publisher(publisher));
        self
    }

    pub fn cancel_token(mut self, cancel_token: CancellationToken) -> Self {
        self.cancel_token = Some(cancel_token);
        self
    }

    pub fn metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn started_at(mut self, started_at: Instant) -> Self {
        self.started_at = Some(started_at);
        self
    }

    /// Validates the configuration and starts the pipeline task. Must be
    /// called from within a tokio runtime.
    pub fn build(self) -> Result<Coordinator, AppError> {
        self.configuration.validate()?;
        let source = self
            .source
            .ok_or(AppError::Pipeline("Frame source not set".to_string()))?;
        let mut builder = self
            .pipeline
            .ok_or(AppError::Pipeline("Publisher not set".to_string()))?
            .from_configuration(&self.configuration)
            .frame_source(source);
        if let Some(metrics) = self.metrics {
            builder = builder.metrics(metrics);
        }
        if let Some(started_at) = self.started_at {
            builder = builder.started_at(started_at);
        }

        let pipeline = builder.build()?;
        Ok(Coordinator::new(
            pipeline,
            self.cancel_token.unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Color, Frame};
    use crate::pipeline::services::publish::BroadcastPublisher;
    use image::{DynamicImage, ImageBuffer, Rgb};

    struct SolidSource(Color);

    impl FrameSource for SolidSource {
        fn capture(&mut self) -> Result<Frame, AppError> {
            let image = ImageBuffer::from_pixel(16, 16, Rgb::from(self.0));
            Ok(Frame::new(DynamicImage::ImageRgb8(image), chrono::Utc::now()))
        }

        fn name(&self) -> &'static str {
            "solid"
        }
    }

    fn configuration() -> Configuration {
        let mut configuration = Configuration::default();
        configuration.capture.source = crate::config::CaptureSourceKind::ImageFile;
        configuration.capture.image_path = Some("unused.png".into());
        configuration
    }

    #[tokio::test]
    async fn build_requires_source_and_publisher() {
        let (publisher, _rx) = BroadcastPublisher::new(16);
        let missing_source = CoordinatorBuilder::new(configuration())
            .publisher(publisher)
            .build();
        assert!(matches!(missing_source, Err(AppError::Pipeline(_))));

        let missing_publisher = CoordinatorBuilder::new(configuration())
            .frame_source(SolidSource(Color::BLACK))
            .build();
        assert!(matches!(missing_publisher, Err(AppError::Pipeline(_))));
    }

    #[tokio::test]
    async fn invalid_overrides_are_rejected() {
        let (publisher, _rx) = BroadcastPublisher::new(16);
        let result = CoordinatorBuilder::new(configuration())
            .cooldown_period(Duration::from_secs(10))
            .frame_source(SolidSource(Color::BLACK))
            .publisher(publisher)
            .build();
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[tokio::test]
    async fn oversized_interval_is_rejected_not_panicking() {
        let (publisher, _rx) = BroadcastPublisher::new(16);
        let mut configuration = configuration();
        configuration.pipeline.force_update_interval_secs = 1e20;
        let result = CoordinatorBuilder::new(configuration)
            .frame_source(SolidSource(Color::BLACK))
            .publisher(publisher)
            .build();
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_ramp_and_shuts_down() {
        let (publisher, mut rx) = BroadcastPublisher::new(1024);
        let coordinator = CoordinatorBuilder::new(configuration())
            .topic("test/leds")
            .frame_source(SolidSource(Color::new(200, 10, 10)))
            .publisher(publisher)
            .started_at(Instant::now())
            .build()
            .expect("Failed to build coordinator");
        assert!(coordinator.is_running());

        tokio::time::sleep(Duration::from_secs(2)).await;
        let stats = coordinator.shutdown().await.expect("pipeline stats");

        assert_eq!(stats.changes_accepted, 1);
        assert_eq!(stats.frames_published, 50);

        let mut last = None;
        while let Ok(request) = rx.try_recv() {
            assert_eq!(request.topic, "test/leds");
            last = request.command.color();
        }
        let last = last.expect("at least one frame");
        assert!(last.distance(&Color::new(200, 10, 10)) < 8.0);
    }

    #[tokio::test]
    async fn stop_cancels_the_shared_token() {
        let token = CancellationToken::new();
        let (publisher, _rx) = BroadcastPublisher::new(16);
        let coordinator = CoordinatorBuilder::new(configuration())
            .frame_source(SolidSource(Color::BLACK))
            .publisher(publisher)
            .cancel_token(token.clone())
            .build()
            .unwrap();

        coordinator.stop();
        assert!(token.is_cancelled());
        assert!(coordinator.shutdown().await.is_some());
    }
}
