use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::OrderError;

// ============================================================================
// Order Value Objects
// ============================================================================

/// Lifecycle status of an order.
///
/// `Cancelled` is terminal: nothing in the service moves an order out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[serde(alias = "Created")]
    Created,
    #[serde(alias = "Updated")]
    Updated,
    #[serde(alias = "Paid")]
    Paid,
    #[serde(alias = "Cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::Updated => "updated",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "created" => Ok(OrderStatus::Created),
            "updated" => Ok(OrderStatus::Updated),
            "paid" => Ok(OrderStatus::Paid),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(OrderError::UnknownStatus(s.to_string())),
        }
    }
}

/// Price quote returned by the pricing service for one product.
///
/// `final_price` is the unit price with markup and discount already applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingQuote {
    pub product_id: i64,
    pub markup: Decimal,
    pub discount: Decimal,
    pub final_price: Decimal,
}

// ============================================================================
// Unit Tests
// ============================================================================
