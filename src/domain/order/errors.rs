use super::value_objects::OrderStatus;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("order with ID {0} is already cancelled")]
    AlreadyCancelled(i64),

    #[error("order with ID {order_id} cannot move to status {to} through an update")]
    InvalidTransition { order_id: i64, to: OrderStatus },

    #[error("order must contain at least one product request")]
    EmptyItems,

    #[error("invalid quantity {quantity} for product ID {product_id}")]
    InvalidQuantity { product_id: i64, quantity: i64 },

    #[error("unknown order status: {0}")]
    UnknownStatus(String),
}

/// A line or order amount left the range the store can hold
/// (`NUMERIC(18, 4)`), or the decimal arithmetic itself overflowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("price for product ID {product_id} exceeds the supported range")]
pub struct PriceOverflow {
    pub product_id: i64,
}
