mod broadcast_publisher;
mod mqtt_publisher;
mod publish_request;
mod set_rgb_command;

pub use broadcast_publisher::BroadcastPublisher;
pub use mqtt_publisher::{MqttConnection, MqttPublisher};
pub use publish_request::{boxed_publisher, PublishRequest, PublisherService};
pub use set_rgb_command::SetRgbCommand;
