use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{OrderStore, StoreError};
use crate::domain::order::Order;
use crate::sharding::{ShardRouter, ShardingError};

/// Process-local store, partitioned by order identity with a `ShardRouter`.
///
/// Used when no database is configured. Each shard sits behind its own
/// lock, so orders on different shards never contend.
pub struct InMemoryOrderStore {
    router: ShardRouter,
    shards: Vec<RwLock<HashMap<i64, Order>>>,
    next_order_id: AtomicI64,
    next_request_id: AtomicI64,
}

impl InMemoryOrderStore {
    pub fn new(num_shards: usize) -> Result<Self, ShardingError> {
        let router = ShardRouter::new(num_shards)?;
        let shards = (0..router.num_shards())
            .map(|_| RwLock::new(HashMap::new()))
            .collect();

        Ok(Self {
            router,
            shards,
            next_order_id: AtomicI64::new(1),
            next_request_id: AtomicI64::new(1),
        })
    }

    fn shard(&self, id: i64) -> &RwLock<HashMap<i64, Order>> {
        &self.shards[self.router.shard_for(id)]
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        let mut total = 0;
        for shard in &self.shards {
            total += shard.read().await.len();
        }
        total
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create_order(&self, order: &mut Order) -> Result<(), StoreError> {
        let id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();

        let mut stored = order.clone();
        stored.id = id;
        stored.created_at = Some(now);
        stored.updated_at = Some(now);
        for item in stored.product_requests.iter_mut() {
            item.id = self.next_request_id.fetch_add(1, Ordering::SeqCst);
            item.order_id = id;
        }

        self.shard(id).write().await.insert(id, stored.clone());
        *order = stored;

        tracing::debug!(order_id = id, shard = self.router.shard_for(id), "Stored order in memory");
        Ok(())
    }

    async fn get_order(&self, id: i64) -> Result<Option<Order>, StoreError> {
        Ok(self.shard(id).read().await.get(&id).cloned())
    }

    async fn update_order(&self, order: &mut Order) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut shard = self.shard(order.id).write().await;

        match shard.get_mut(&order.id) {
            Some(existing) => {
                existing.user_id = order.user_id;
                existing.status = order.status;
                existing.total_price = order.total_price;
                existing.total_markup = order.total_markup;
                existing.total_discount = order.total_discount;
                existing.updated_at = Some(now);
                order.created_at = existing.created_at;
            }
            None => {
                let mut stored = order.clone();
                stored.created_at = Some(now);
                stored.updated_at = Some(now);
                order.created_at = stored.created_at;
                shard.insert(order.id, stored);
            }
        }
        order.updated_at = Some(now);

        Ok(())
    }
}
