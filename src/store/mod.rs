// ============================================================================
// Order Store - transactional persistence of orders and their line items
// ============================================================================
//
// `create_order` writes the header and every line item as one atomic unit
// and is the only place an order identity is assigned. `update_order` is a
// single-row upsert of the header keyed by identity; line items are never
// rewritten after creation.
//
// ============================================================================

mod memory;
mod postgres;

use async_trait::async_trait;

use crate::domain::order::{Order, OrderError};

pub use memory::InMemoryOrderStore;
pub use postgres::PgOrderStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored order {order_id} is unreadable: {source}")]
    Corrupt {
        order_id: i64,
        #[source]
        source: OrderError,
    },
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist header and line items atomically, assigning identities.
    /// On error nothing is visible and `order` is left unchanged.
    async fn create_order(&self, order: &mut Order) -> Result<(), StoreError>;

    /// Header and line items for `id`, if the order exists
    async fn get_order(&self, id: i64) -> Result<Option<Order>, StoreError>;

    /// Upsert the order header by identity and refresh its timestamps.
    async fn update_order(&self, order: &mut Order) -> Result<(), StoreError>;
}
