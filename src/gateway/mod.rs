// ============================================================================
// Gateways - stock and pricing services
// ============================================================================
//
// Narrow request/response seams over the two external product services.
// The HTTP clients translate transport, status and decoding failures into
// `GatewayError`; nothing here retries.
//
// ============================================================================

mod client;
mod pricing;
mod stock;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::domain::order::PricingQuote;

pub use client::HttpGateway;
pub use pricing::PricingClient;
pub use stock::StockClient;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{gateway} service request failed: {source}")]
    Transport {
        gateway: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{gateway} service returned status code {status}: {body}")]
    Status {
        gateway: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("failed to decode {gateway} service response: {source}")]
    Decode {
        gateway: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("stock information not found for product ID {product_id}")]
    MissingStock { product_id: i64 },
}

impl GatewayError {
    pub fn gateway(&self) -> &'static str {
        match self {
            GatewayError::Transport { gateway, .. }
            | GatewayError::Status { gateway, .. }
            | GatewayError::Decode { gateway, .. } => gateway,
            GatewayError::MissingStock { .. } => stock::GATEWAY_NAME,
        }
    }
}

#[async_trait]
pub trait StockGateway: Send + Sync {
    /// Whether at least `quantity` units of the product are in stock
    async fn check_stock(&self, product_id: i64, quantity: i64) -> Result<bool, GatewayError>;
}

#[async_trait]
pub trait PricingGateway: Send + Sync {
    async fn get_pricing(&self, product_id: i64) -> Result<PricingQuote, GatewayError>;
}
