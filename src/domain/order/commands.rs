use serde::Deserialize;

use super::aggregate::{Order, OrderRequest};
use super::value_objects::OrderStatus;

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LineItem {
    pub product_id: i64,
    pub quantity: i64,
}

/// Place a new order. Identity and pricing are never taken from the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrder {
    pub user_id: i64,
    pub product_requests: Vec<LineItem>,
}

impl CreateOrder {
    pub fn into_order(self) -> Order {
        let items = self
            .product_requests
            .into_iter()
            .map(|item| OrderRequest::new(item.product_id, item.quantity))
            .collect();

        Order::new(self.user_id, items)
    }
}

/// Replace the header of an existing order.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrder {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub status: OrderStatus,
}
