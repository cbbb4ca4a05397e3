use std::sync::Arc;
use std::time::Instant;

use crate::domain::order::{CreateOrder, Order, OrderEvent, OrderStatus, Transition, UpdateOrder};
use crate::enrichment::{EnrichmentEngine, EnrichmentError};
use crate::gateway::{PricingGateway, StockGateway};
use crate::messaging::{EventPublisher, PublishError};
use crate::metrics::Metrics;
use crate::store::OrderStore;

use super::errors::OrderServiceError;

// ============================================================================
// Order Service - orchestrates enrichment, persistence and publication
// ============================================================================
//
// Every operation runs its stages strictly in order and stops at the first
// failure:
//
//   create: enrich → create_order (one transaction) → publish `created`
//   update: load → [paid: stock re-check] → update_order → publish `updated`
//   cancel: load → mark cancelled → update_order → publish `cancelled`
//
// Publishing is not part of the write. A publish failure is reported to the
// caller but the persisted order stays as written.
//
// ============================================================================

pub struct OrderService {
    enrichment: EnrichmentEngine,
    store: Arc<dyn OrderStore>,
    publisher: Arc<dyn EventPublisher>,
    metrics: Arc<Metrics>,
}

impl OrderService {
    pub fn new(
        stock: Arc<dyn StockGateway>,
        pricing: Arc<dyn PricingGateway>,
        store: Arc<dyn OrderStore>,
        publisher: Arc<dyn EventPublisher>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            enrichment: EnrichmentEngine::new(stock, pricing),
            store,
            publisher,
            metrics,
        }
    }

    /// Create a new order with status `created`.
    pub async fn create_order(&self, command: CreateOrder) -> Result<Order, OrderServiceError> {
        let result = self.create(command).await;
        self.record("create", &result);
        result
    }

    /// Update the header of an existing order. Moving into `paid`
    /// re-checks stock for every line item first.
    pub async fn update_order(&self, command: UpdateOrder) -> Result<Order, OrderServiceError> {
        let result = self.update(command).await;
        self.record("update", &result);
        result
    }

    /// Cancel an existing order. Cancellation is terminal.
    pub async fn cancel_order(&self, order_id: i64) -> Result<Order, OrderServiceError> {
        let result = self.cancel(order_id).await;
        self.record("cancel", &result);
        result
    }

    async fn create(&self, command: CreateOrder) -> Result<Order, OrderServiceError> {
        let mut order = command.into_order();
        order.validate_items()?;

        tracing::info!(
            user_id = order.user_id,
            item_count = order.product_requests.len(),
            "Creating new order"
        );

        let started = Instant::now();
        let enriched = self.enrichment.enrich(&mut order).await;
        self.metrics.observe_enrichment(started.elapsed().as_secs_f64());
        enriched?;

        self.store.create_order(&mut order).await.map_err(|e| {
            tracing::error!(error = %e, user_id = order.user_id, "Failed to create order in transaction");
            OrderServiceError::Persistence { order_id: None, source: e }
        })?;

        self.publish(&order, Transition::Created).await?;

        tracing::info!(
            order_id = order.id,
            total_price = %order.total_price,
            "✅ Order created"
        );
        Ok(order)
    }

    async fn update(&self, command: UpdateOrder) -> Result<Order, OrderServiceError> {
        let mut order = self.load(command.id).await?;
        order.apply_update(command.user_id, command.status)?;

        tracing::info!(order_id = order.id, status = %order.status, "Updating order");

        if order.status == OrderStatus::Paid {
            self.enrichment.recheck_stock(&order.product_requests).await?;
        }

        self.store.update_order(&mut order).await.map_err(|e| {
            tracing::error!(error = %e, order_id = order.id, "Failed to update order");
            OrderServiceError::Persistence { order_id: Some(order.id), source: e }
        })?;

        self.publish(&order, Transition::Updated).await?;

        tracing::info!(order_id = order.id, status = %order.status, "✅ Order updated");
        Ok(order)
    }

    async fn cancel(&self, order_id: i64) -> Result<Order, OrderServiceError> {
        let mut order = self.load(order_id).await?;
        order.cancel()?;

        tracing::info!(order_id, "Cancelling order");

        self.store.update_order(&mut order).await.map_err(|e| {
            tracing::error!(error = %e, order_id, "Failed to cancel order");
            OrderServiceError::Persistence { order_id: Some(order_id), source: e }
        })?;

        self.publish(&order, Transition::Cancelled).await?;

        tracing::info!(order_id, "✅ Order cancelled");
        Ok(order)
    }

    async fn load(&self, order_id: i64) -> Result<Order, OrderServiceError> {
        let order = self.store.get_order(order_id).await.map_err(|e| {
            tracing::error!(error = %e, order_id, "Failed to retrieve order");
            OrderServiceError::Persistence { order_id: Some(order_id), source: e }
        })?;

        order.ok_or_else(|| {
            tracing::warn!(order_id, "Order not found");
            OrderServiceError::NotFound(order_id)
        })
    }

    async fn publish(&self, order: &Order, transition: Transition) -> Result<(), OrderServiceError> {
        let published = match OrderEvent::new(order, transition) {
            Ok(event) => self.publisher.publish(&event).await,
            Err(e) => Err(PublishError::from(e)),
        };

        self.metrics.record_event(transition.keyword(), published.is_ok());

        published.map_err(|source| {
            tracing::error!(
                error = %source,
                order_id = order.id,
                transition = %transition,
                "Failed to publish order event"
            );
            OrderServiceError::Publish {
                order_id: order.id,
                transition,
                source,
            }
        })
    }

    fn record(&self, operation: &str, result: &Result<Order, OrderServiceError>) {
        match result {
            Ok(_) => self.metrics.record_order(operation, "success"),
            Err(e) => {
                if let OrderServiceError::Enrichment(err) = e {
                    if let EnrichmentError::StockCheck { source, .. }
                    | EnrichmentError::Pricing { source, .. } = err
                    {
                        self.metrics.record_gateway_failure(source.gateway());
                    }
                    tracing::debug!(operation, product_id = ?err.product_id(), "Enrichment rejected order");
                }
                self.metrics.record_order(operation, e.kind());
            }
        }
    }
}
