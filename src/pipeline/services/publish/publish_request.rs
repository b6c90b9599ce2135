use std::time::Duration;
use tower::util::BoxService;
use tower::{BoxError, Service, ServiceBuilder, ServiceExt};

use crate::common::Color;
use crate::error::AppError;
use crate::pipeline::services::publish::SetRgbCommand;

/// One message for the broker: a topic and the actuator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub topic: String,
    pub command: SetRgbCommand,
}

impl PublishRequest {
    pub fn new(topic: impl Into<String>, command: SetRgbCommand) -> Self {
        Self {
            topic: topic.into(),
            command,
        }
    }

    pub fn set_rgb(topic: impl Into<String>, color: Color) -> Self {
        Self::new(topic, SetRgbCommand::new(color))
    }
}

/// Type-erased publisher the pipeline talks to.
pub type PublisherService = BoxService<PublishRequest, (), BoxError>;

/// Boxes a publisher, optionally bounding every call with a timeout.
pub fn boxed_publisher<S>(publisher: S, timeout: Option<Duration>) -> PublisherService
where
    S: Service<PublishRequest, Response = (), Error = AppError> + Send + 'static,
    S::Future: Send + 'static,
{
    match timeout {
        Some(timeout) => BoxService::new(ServiceBuilder::new().timeout(timeout).service(publisher)),
        None => BoxService::new(publisher.map_err(BoxError::from)),
    }
}
