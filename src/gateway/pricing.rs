use std::time::Duration;

use async_trait::async_trait;

use super::{GatewayError, HttpGateway, PricingGateway};
use crate::domain::order::PricingQuote;

const GATEWAY_NAME: &str = "pricing";

/// Client for `GET <base>/product/<id>/price`
#[derive(Debug)]
pub struct PricingClient {
    http: HttpGateway,
}

impl PricingClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        Ok(Self {
            http: HttpGateway::new(GATEWAY_NAME, base_url, timeout)?,
        })
    }
}

#[async_trait]
impl PricingGateway for PricingClient {
    async fn get_pricing(&self, product_id: i64) -> Result<PricingQuote, GatewayError> {
        self.http
            .get(&format!("/product/{product_id}/price"))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, product_id, "Failed to get product pricing");
                e
            })
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_get_pricing_success() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/product/10/price");
            then.status(200).json_body(json!({
                "product_id": 10,
                "markup": 12.5,
                "discount": 2.5,
                "final_price": 50
            }));
        });

        let client = PricingClient::new(&server.base_url(), Duration::from_secs(2)).unwrap();
        let quote = client.get_pricing(10).await.unwrap();

        mock.assert();
        assert_eq!(quote.product_id, 10);
        assert_eq!(quote.markup, dec!(12.5));
        assert_eq!(quote.discount, dec!(2.5));
        assert_eq!(quote.final_price, dec!(50));
    }

    #[tokio::test]
    async fn test_get_pricing_server_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/product/10/price");
            then.status(503).body("maintenance");
        });

        let client = PricingClient::new(&server.base_url(), Duration::from_secs(2)).unwrap();
        let err = client.get_pricing(10).await.unwrap_err();

        assert!(matches!(
            err,
            GatewayError::Status { gateway: "pricing", status, .. } if status.as_u16() == 503
        ));
    }

    #[tokio::test]
    async fn test_get_pricing_incomplete_body_is_decode_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/product/10/price");
            then.status(200).json_body(json!({ "product_id": 10, "markup": 1 }));
        });

        let client = PricingClient::new(&server.base_url(), Duration::from_secs(2)).unwrap();
        let err = client.get_pricing(10).await.unwrap_err();

        assert!(matches!(err, GatewayError::Decode { gateway: "pricing", .. }));
        assert_eq!(err.gateway(), "pricing");
    }
}
