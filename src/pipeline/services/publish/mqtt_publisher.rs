use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
use tokio_util::sync::CancellationToken;
use tower::Service;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::BrokerConfiguration;
use crate::error::AppError;
use crate::pipeline::services::publish::PublishRequest;

const REQUEST_CHANNEL_CAPACITY: usize = 64;
const DISCONNECT_GRACE: Duration = Duration::from_secs(1);

/// Publishes actuator commands to an MQTT broker, at most once, without
/// waiting on the network.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
}

/// Owns the background task driving the broker connection.
pub struct MqttConnection {
    client: AsyncClient,
    cancel_token: CancellationToken,
    event_task: tokio::task::JoinHandle<()>,
}

impl MqttPublisher {
    /// Starts the connection task and returns the publisher plus the handle
    /// used to tear the connection down.
    pub fn connect(
        configuration: &BrokerConfiguration,
        cancel_token: CancellationToken,
    ) -> (Self, MqttConnection) {
        let client_id = if configuration.client_id.is_empty() {
            format!("screencolor-{}", Uuid::new_v4())
        } else {
            configuration.client_id.clone()
        };

        let mut options = MqttOptions::new(client_id, configuration.host.clone(), configuration.port);
        options.set_keep_alive(Duration::from_secs(configuration.keep_alive_secs));

        let (client, event_loop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);
        let reconnect_delay = Duration::from_millis(configuration.reconnect_delay_ms);
        let event_task = tokio::spawn(Self::drive_event_loop(
            event_loop,
            reconnect_delay,
            cancel_token.clone(),
        ));

        info!(
            "Connecting to MQTT broker at {}:{}",
            configuration.host, configuration.port
        );

        (
            Self {
                client: client.clone(),
            },
            MqttConnection {
                client,
                cancel_token,
                event_task,
            },
        )
    }

    async fn drive_event_loop(
        mut event_loop: EventLoop,
        reconnect_delay: Duration,
        cancel_token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                event = event_loop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        info!("Connected to MQTT broker with result code {:?}", ack.code);
                    }
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        error!("MQTT connection error: {}", e);
                        tokio::select! {
                            _ = cancel_token.cancelled() => break,
                            _ = tokio::time::sleep(reconnect_delay) => {}
                        }
                    }
                },
            }
        }
        debug!("MQTT event loop stopped");
    }
}

impl MqttConnection {
    /// Sends a disconnect and waits for the event loop to flush it. The loop
    /// is cancelled if the broker is unreachable.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.client.try_disconnect() {
            warn!("Failed to request MQTT disconnect: {}", e);
        }
        let joined = match tokio::time::timeout(DISCONNECT_GRACE, &mut self.event_task).await {
            Ok(joined) => joined,
            Err(_) => {
                self.cancel_token.cancel();
                (&mut self.event_task).await
            }
        };
        if let Err(e) = joined {
            error!("MQTT event loop task failed: {}", e);
        }
    }
}

impl Service<PublishRequest> for MqttPublisher {
    type Response = ();
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: PublishRequest) -> Self::Future {
        let result = request.command.to_json_bytes().and_then(|payload| {
            self.client
                .try_publish(request.topic, QoS::AtMostOnce, false, payload)
                .map_err(|e| AppError::Publish(e.to_string()))
        });
        Box::pin(async move { result })
    }
}
