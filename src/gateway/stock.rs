use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{GatewayError, HttpGateway, StockGateway};

pub(super) const GATEWAY_NAME: &str = "stock";

#[derive(Debug, Deserialize)]
struct StockResponse {
    stock: Option<i64>,
}

/// Client for `GET <base>/product/<id>/stock`
#[derive(Debug)]
pub struct StockClient {
    http: HttpGateway,
}

impl StockClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        Ok(Self {
            http: HttpGateway::new(GATEWAY_NAME, base_url, timeout)?,
        })
    }

    pub async fn get_stock(&self, product_id: i64) -> Result<i64, GatewayError> {
        let response: StockResponse = self
            .http
            .get(&format!("/product/{product_id}/stock"))
            .await?;

        response.stock.ok_or(GatewayError::MissingStock { product_id })
    }
}

#[async_trait]
impl StockGateway for StockClient {
    async fn check_stock(&self, product_id: i64, quantity: i64) -> Result<bool, GatewayError> {
        let stock = self.get_stock(product_id).await.map_err(|e| {
            tracing::error!(error = %e, product_id, "Failed to check product stock");
            e
        })?;

        Ok(stock >= quantity)
    }
}
