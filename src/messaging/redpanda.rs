use std::time::Duration;

use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    message::{Header, OwnedHeaders},
    producer::{FutureProducer, FutureRecord},
    util::Timeout,
};
use uuid::Uuid;

use super::{EventPublisher, PublishError};
use crate::domain::order::OrderEvent;

/// Kafka-compatible producer for order events.
///
/// `FutureProducer` is internally synchronized, so one client is shared by
/// every in-flight order.
pub struct RedpandaClient {
    producer: FutureProducer,
    topic: String,
    send_timeout: Duration,
}

impl RedpandaClient {
    pub fn new(brokers: &str, topic: &str, message_timeout: Duration) -> Result<Self, PublishError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", message_timeout.as_millis().to_string())
            .create()
            .map_err(|e| PublishError::Producer(e.to_string()))?;

        Ok(Self {
            producer,
            topic: topic.to_string(),
            send_timeout: message_timeout,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl EventPublisher for RedpandaClient {
    async fn publish(&self, event: &OrderEvent) -> Result<(), PublishError> {
        let event_id = Uuid::now_v7().to_string();
        let headers = OwnedHeaders::new()
            .insert(Header {
                key: "event_id",
                value: Some(event_id.as_str()),
            })
            .insert(Header {
                key: "transition",
                value: Some(event.transition.keyword()),
            });

        let record = FutureRecord::to(&self.topic)
            .key(event.key.as_str())
            .payload(event.payload.as_slice())
            .headers(headers);

        match self.producer.send(record, Timeout::After(self.send_timeout)).await {
            Ok(_) => {
                tracing::info!(
                    topic = %self.topic,
                    order_id = event.order_id,
                    key = %event.key,
                    event_id = %event_id,
                    "Published to Redpanda"
                );
                Ok(())
            }
            Err((e, _)) => {
                tracing::error!(
                    error = %e,
                    topic = %self.topic,
                    order_id = event.order_id,
                    key = %event.key,
                    "Failed to publish to Redpanda"
                );
                Err(PublishError::Kafka {
                    key: event.key.clone(),
                    message: e.to_string(),
                })
            }
        }
    }
}
