mod redpanda;

use async_trait::async_trait;

use crate::domain::order::OrderEvent;

pub use redpanda::RedpandaClient;

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("failed to serialize order event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to create producer: {0}")]
    Producer(String),

    #[error("failed to publish {key}: {message}")]
    Kafka { key: String, message: String },
}

/// Sink for order lifecycle events. Shared across concurrent orchestrations.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &OrderEvent) -> Result<(), PublishError>;
}
