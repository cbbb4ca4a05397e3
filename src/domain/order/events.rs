use std::fmt;

use super::aggregate::Order;

// ============================================================================
// Order Events - one message per lifecycle transition
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Created,
    Updated,
    Cancelled,
}

impl Transition {
    /// Keyword embedded in the event key
    pub fn keyword(&self) -> &'static str {
        match self {
            Transition::Created => "created",
            Transition::Updated => "updated",
            Transition::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Key/payload pair handed to the event bus.
#[derive(Debug, Clone)]
pub struct OrderEvent {
    pub order_id: i64,
    pub transition: Transition,
    pub key: String,
    pub payload: Vec<u8>,
}

impl OrderEvent {
    pub fn new(order: &Order, transition: Transition) -> Result<Self, serde_json::Error> {
        Ok(Self {
            order_id: order.id,
            transition,
            key: event_key(transition, order.id),
            payload: serde_json::to_vec(order)?,
        })
    }
}

pub fn event_key(transition: Transition, order_id: i64) -> String {
    format!("order.{}.{}", transition.keyword(), order_id)
}
