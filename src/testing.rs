//! In-process doubles for the gateway, store and bus seams.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;

use crate::domain::order::{Order, OrderEvent, PricingQuote};
use crate::gateway::{GatewayError, PricingGateway, StockGateway};
use crate::messaging::{EventPublisher, PublishError};
use crate::store::{InMemoryOrderStore, OrderStore, StoreError};

/// Let spawned tasks that are still in flight run to completion.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

fn unavailable(gateway: &'static str) -> GatewayError {
    GatewayError::Status {
        gateway,
        status: StatusCode::SERVICE_UNAVAILABLE,
        body: "unavailable".to_string(),
    }
}

#[derive(Default)]
pub struct FakeStockGateway {
    stock: Mutex<HashMap<i64, i64>>,
    failing: HashSet<i64>,
    delays: HashMap<i64, Duration>,
    calls: AtomicUsize,
}

impl FakeStockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stock(self, product_id: i64, stock: i64) -> Self {
        self.set_stock(product_id, stock);
        self
    }

    pub fn failing(mut self, product_id: i64) -> Self {
        self.failing.insert(product_id);
        self
    }

    pub fn with_delay(mut self, product_id: i64, delay: Duration) -> Self {
        self.delays.insert(product_id, delay);
        self
    }

    pub fn set_stock(&self, product_id: i64, stock: i64) {
        self.stock.lock().unwrap().insert(product_id, stock);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StockGateway for FakeStockGateway {
    async fn check_stock(&self, product_id: i64, quantity: i64) -> Result<bool, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&product_id) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(&product_id) {
            return Err(unavailable("stock"));
        }

        let stock = self.stock.lock().unwrap().get(&product_id).copied();
        stock
            .map(|stock| stock >= quantity)
            .ok_or(GatewayError::MissingStock { product_id })
    }
}

#[derive(Default)]
pub struct FakePricingGateway {
    prices: HashMap<i64, Decimal>,
    failing: HashSet<i64>,
    delays: HashMap<i64, Duration>,
    calls: AtomicUsize,
}

impl FakePricingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, product_id: i64, final_price: Decimal) -> Self {
        self.prices.insert(product_id, final_price);
        self
    }

    pub fn failing(mut self, product_id: i64) -> Self {
        self.failing.insert(product_id);
        self
    }

    pub fn with_delay(mut self, product_id: i64, delay: Duration) -> Self {
        self.delays.insert(product_id, delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PricingGateway for FakePricingGateway {
    async fn get_pricing(&self, product_id: i64) -> Result<PricingQuote, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&product_id) {
            tokio::time::sleep(*delay).await;
        }
        match self.prices.get(&product_id) {
            Some(final_price) if !self.failing.contains(&product_id) => Ok(PricingQuote {
                product_id,
                markup: Decimal::ZERO,
                discount: Decimal::ZERO,
                final_price: *final_price,
            }),
            _ => Err(unavailable("pricing")),
        }
    }
}

/// Captures published events; can be switched to fail every publish.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<OrderEvent>>,
    fail: AtomicBool,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let publisher = Self::default();
        publisher.fail.store(true, Ordering::SeqCst);
        publisher
    }

    pub fn keys(&self) -> Vec<String> {
        self.events.lock().unwrap().iter().map(|e| e.key.clone()).collect()
    }

    pub fn events(&self) -> Vec<OrderEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &OrderEvent) -> Result<(), PublishError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PublishError::Kafka {
                key: event.key.clone(),
                message: "broker unavailable".to_string(),
            });
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// In-memory store that counts writes and can refuse them.
pub struct CountingStore {
    inner: InMemoryOrderStore,
    creates: AtomicUsize,
    updates: AtomicUsize,
    fail_writes: AtomicBool,
}

impl CountingStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryOrderStore::new(2).unwrap(),
            creates: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.creates() + self.updates()
    }

    pub async fn len(&self) -> usize {
        self.inner.len().await
    }

    fn refused(&self) -> Option<StoreError> {
        self.fail_writes
            .load(Ordering::SeqCst)
            .then(|| StoreError::Database(sqlx::Error::PoolTimedOut))
    }
}

#[async_trait]
impl OrderStore for CountingStore {
    async fn create_order(&self, order: &mut Order) -> Result<(), StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.refused() {
            return Err(err);
        }
        self.inner.create_order(order).await
    }

    async fn get_order(&self, id: i64) -> Result<Option<Order>, StoreError> {
        self.inner.get_order(id).await
    }

    async fn update_order(&self, order: &mut Order) -> Result<(), StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.refused() {
            return Err(err);
        }
        self.inner.update_order(order).await
    }
}
