use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::domain::order::{Order, OrderRequest, PriceOverflow, PricingQuote};
use crate::gateway::{GatewayError, PricingGateway, StockGateway};

// ============================================================================
// Enrichment Engine - concurrent stock validation and pricing
// ============================================================================
//
// For an order with N line items the engine spawns 2N tasks (one stock
// check and one pricing lookup per item) before awaiting anything. Results
// come back over two channels buffered to N, so late senders never block
// after an early exit.
//
// Arrival order on the two channels is unrelated, so quotes are matched to
// line items by product identity, never by position. Quotes are staged and
// only copied into the order once every item has validated: a failed
// enrichment leaves the order untouched.
//
// ============================================================================

/// Outcome of one stock check
#[derive(Debug)]
pub struct AvailabilityResult {
    pub product_id: i64,
    pub available: Result<bool, GatewayError>,
}

/// Outcome of one pricing lookup
#[derive(Debug)]
pub struct PricingResult {
    pub product_id: i64,
    pub quote: Result<PricingQuote, GatewayError>,
}

#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    #[error("failed to check product stock for product ID {product_id}: {source}")]
    StockCheck {
        product_id: i64,
        #[source]
        source: GatewayError,
    },

    #[error("insufficient stock for product ID {product_id}")]
    InsufficientStock { product_id: i64 },

    #[error("failed to get pricing for product ID {product_id}: {source}")]
    Pricing {
        product_id: i64,
        #[source]
        source: GatewayError,
    },

    #[error(transparent)]
    PriceOverflow(#[from] PriceOverflow),

    #[error("enrichment worker exited without reporting a result")]
    Dispatch,
}

impl EnrichmentError {
    pub fn product_id(&self) -> Option<i64> {
        match self {
            EnrichmentError::StockCheck { product_id, .. }
            | EnrichmentError::InsufficientStock { product_id }
            | EnrichmentError::Pricing { product_id, .. } => Some(*product_id),
            EnrichmentError::PriceOverflow(overflow) => Some(overflow.product_id),
            EnrichmentError::Dispatch => None,
        }
    }
}

#[derive(Clone)]
pub struct EnrichmentEngine {
    stock: Arc<dyn StockGateway>,
    pricing: Arc<dyn PricingGateway>,
}

impl EnrichmentEngine {
    pub fn new(stock: Arc<dyn StockGateway>, pricing: Arc<dyn PricingGateway>) -> Self {
        Self { stock, pricing }
    }

    /// Validate stock and price every line item of `order`.
    ///
    /// On success each line carries its quote and the order totals are
    /// recomputed. On failure the first failing item, in arrival order,
    /// decides the error and the order is not modified.
    pub async fn enrich(&self, order: &mut Order) -> Result<(), EnrichmentError> {
        let n = order.product_requests.len();
        if n == 0 {
            order.recalculate_totals()?;
            return Ok(());
        }

        let (availability_tx, mut availability_rx) = mpsc::channel::<AvailabilityResult>(n);
        let (pricing_tx, mut pricing_rx) = mpsc::channel::<PricingResult>(n);

        for item in &order.product_requests {
            let product_id = item.product_id;
            let quantity = item.quantity;

            let stock = Arc::clone(&self.stock);
            let tx = availability_tx.clone();
            tokio::spawn(async move {
                let available = stock.check_stock(product_id, quantity).await;
                // The receiver is gone if enrichment already failed
                let _ = tx.send(AvailabilityResult { product_id, available }).await;
            });

            let pricing = Arc::clone(&self.pricing);
            let tx = pricing_tx.clone();
            tokio::spawn(async move {
                let quote = pricing.get_pricing(product_id).await;
                let _ = tx.send(PricingResult { product_id, quote }).await;
            });
        }

        // Only the workers hold senders now, so a vanished worker shows up as a closed channel
        drop(availability_tx);
        drop(pricing_tx);

        let mut quotes: HashMap<i64, PricingQuote> = HashMap::with_capacity(n);

        for _ in 0..n {
            let availability = availability_rx.recv().await.ok_or(EnrichmentError::Dispatch)?;
            let pricing = pricing_rx.recv().await.ok_or(EnrichmentError::Dispatch)?;

            match availability.available {
                Err(source) => {
                    tracing::error!(
                        error = %source,
                        product_id = availability.product_id,
                        "Failed to check product stock"
                    );
                    return Err(EnrichmentError::StockCheck {
                        product_id: availability.product_id,
                        source,
                    });
                }
                Ok(false) => {
                    tracing::warn!(
                        product_id = availability.product_id,
                        "Insufficient stock for product"
                    );
                    return Err(EnrichmentError::InsufficientStock {
                        product_id: availability.product_id,
                    });
                }
                Ok(true) => {}
            }

            match pricing.quote {
                Err(source) => {
                    tracing::error!(
                        error = %source,
                        product_id = pricing.product_id,
                        "Failed to get pricing for product"
                    );
                    return Err(EnrichmentError::Pricing {
                        product_id: pricing.product_id,
                        source,
                    });
                }
                Ok(quote) => {
                    quotes.insert(pricing.product_id, quote);
                }
            }
        }

        // Every line whose product matches a quote gets it, duplicates included.
        // Priced on a copy so an overflow leaves the order untouched.
        let mut priced = order.clone();
        for item in priced.product_requests.iter_mut() {
            if let Some(quote) = quotes.get(&item.product_id) {
                item.apply_quote(quote).map_err(|overflow| {
                    tracing::warn!(product_id = overflow.product_id, "Line price exceeds the supported range");
                    overflow
                })?;
            }
        }
        priced.recalculate_totals().map_err(|overflow| {
            tracing::warn!(product_id = overflow.product_id, "Order total exceeds the supported range");
            overflow
        })?;
        *order = priced;

        tracing::debug!(
            item_count = n,
            total_price = %order.total_price,
            "Enriched order"
        );

        Ok(())
    }

    /// Re-run the stock check, without pricing, for every item in turn.
    pub async fn recheck_stock(&self, items: &[OrderRequest]) -> Result<(), EnrichmentError> {
        for item in items {
            let available = self
                .stock
                .check_stock(item.product_id, item.quantity)
                .await
                .map_err(|source| {
                    tracing::error!(
                        error = %source,
                        product_id = item.product_id,
                        "Failed to check product stock during order update"
                    );
                    EnrichmentError::StockCheck {
                        product_id: item.product_id,
                        source,
                    }
                })?;

            if !available {
                tracing::warn!(
                    product_id = item.product_id,
                    "Insufficient stock for product during order update"
                );
                return Err(EnrichmentError::InsufficientStock {
                    product_id: item.product_id,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::testing::{settle, FakePricingGateway, FakeStockGateway};

    fn engine(stock: &Arc<FakeStockGateway>, pricing: &Arc<FakePricingGateway>) -> EnrichmentEngine {
        EnrichmentEngine::new(stock.clone(), pricing.clone())
    }

    fn two_item_order() -> Order {
        Order::new(1, vec![OrderRequest::new(10, 2), OrderRequest::new(20, 1)])
    }

    #[tokio::test]
    async fn test_enrich_prices_every_item() {
        let stock = Arc::new(FakeStockGateway::new().with_stock(10, 5).with_stock(20, 1));
        let pricing = Arc::new(FakePricingGateway::new().with_price(10, dec!(50)).with_price(20, dec!(30)));
        let mut order = two_item_order();

        engine(&stock, &pricing).enrich(&mut order).await.unwrap();

        assert_eq!(order.product_requests[0].final_price, dec!(100));
        assert_eq!(order.product_requests[1].final_price, dec!(30));
        assert_eq!(order.total_price, dec!(130));
        assert_eq!(stock.calls(), 2);
        assert_eq!(pricing.calls(), 2);
    }

    #[tokio::test]
    async fn test_quotes_are_matched_by_product_not_arrival_order() {
        // Product 10 is priced last and checked first, product 30 the other way round
        let stock = Arc::new(
            FakeStockGateway::new()
                .with_stock(10, 9)
                .with_stock(20, 9)
                .with_stock(30, 9)
                .with_delay(30, Duration::from_millis(40)),
        );
        let pricing = Arc::new(
            FakePricingGateway::new()
                .with_price(10, dec!(1))
                .with_price(20, dec!(2))
                .with_price(30, dec!(3))
                .with_delay(10, Duration::from_millis(40)),
        );
        let mut order = Order::new(
            1,
            vec![OrderRequest::new(10, 1), OrderRequest::new(20, 1), OrderRequest::new(30, 1)],
        );

        engine(&stock, &pricing).enrich(&mut order).await.unwrap();

        let prices: Vec<Decimal> = order.product_requests.iter().map(|r| r.final_price).collect();
        assert_eq!(prices, vec![dec!(1), dec!(2), dec!(3)]);
        assert_eq!(order.total_price, dec!(6));
    }

    #[tokio::test]
    async fn test_insufficient_stock_aborts_without_touching_order() {
        let stock = Arc::new(FakeStockGateway::new().with_stock(10, 5).with_stock(20, 0));
        let pricing = Arc::new(FakePricingGateway::new().with_price(10, dec!(50)).with_price(20, dec!(30)));
        let mut order = two_item_order();

        let err = engine(&stock, &pricing).enrich(&mut order).await.unwrap_err();

        assert!(matches!(err, EnrichmentError::InsufficientStock { product_id: 20 }));
        assert_eq!(err.to_string(), "insufficient stock for product ID 20");
        assert_eq!(order, two_item_order());
    }

    #[tokio::test]
    async fn test_all_calls_are_issued_even_on_failure() {
        let stock = Arc::new(
            FakeStockGateway::new()
                .with_stock(10, 0)
                .with_stock(20, 5)
                .with_stock(30, 5)
                .with_stock(40, 5),
        );
        let pricing = Arc::new(
            FakePricingGateway::new()
                .with_price(10, dec!(1))
                .with_price(20, dec!(1))
                .with_price(30, dec!(1))
                .with_price(40, dec!(1)),
        );
        let mut order = Order::new(
            1,
            vec![
                OrderRequest::new(10, 1),
                OrderRequest::new(20, 1),
                OrderRequest::new(30, 1),
                OrderRequest::new(40, 1),
            ],
        );

        let result = engine(&stock, &pricing).enrich(&mut order).await;
        settle().await;

        assert!(result.is_err());
        assert_eq!(stock.calls(), 4);
        assert_eq!(pricing.calls(), 4);
    }

    #[tokio::test]
    async fn test_stock_error_carries_product_id() {
        let stock = Arc::new(FakeStockGateway::new().failing(10));
        let pricing = Arc::new(FakePricingGateway::new().with_price(10, dec!(5)));
        let mut order = Order::new(1, vec![OrderRequest::new(10, 1)]);

        let err = engine(&stock, &pricing).enrich(&mut order).await.unwrap_err();

        assert!(matches!(err, EnrichmentError::StockCheck { product_id: 10, .. }));
        assert_eq!(err.product_id(), Some(10));
    }

    #[tokio::test]
    async fn test_stock_error_wins_over_pricing_error() {
        let stock = Arc::new(FakeStockGateway::new().failing(10));
        let pricing = Arc::new(FakePricingGateway::new().failing(10));
        let mut order = Order::new(1, vec![OrderRequest::new(10, 1)]);

        let err = engine(&stock, &pricing).enrich(&mut order).await.unwrap_err();
        assert!(matches!(err, EnrichmentError::StockCheck { .. }));
    }

    #[tokio::test]
    async fn test_insufficient_stock_wins_over_pricing_error() {
        let stock = Arc::new(FakeStockGateway::new().with_stock(10, 0));
        let pricing = Arc::new(FakePricingGateway::new().failing(10));
        let mut order = Order::new(1, vec![OrderRequest::new(10, 1)]);

        let err = engine(&stock, &pricing).enrich(&mut order).await.unwrap_err();
        assert!(matches!(err, EnrichmentError::InsufficientStock { product_id: 10 }));
    }

    #[tokio::test]
    async fn test_pricing_error_aborts() {
        let stock = Arc::new(FakeStockGateway::new().with_stock(10, 3));
        let pricing = Arc::new(FakePricingGateway::new().failing(10));
        let mut order = Order::new(1, vec![OrderRequest::new(10, 1)]);

        let err = engine(&stock, &pricing).enrich(&mut order).await.unwrap_err();

        assert!(matches!(err, EnrichmentError::Pricing { product_id: 10, .. }));
        assert!(err.to_string().starts_with("failed to get pricing for product ID 10"));
    }

    #[tokio::test]
    async fn test_overflowing_quote_is_rejected() {
        let stock = Arc::new(FakeStockGateway::new().with_stock(10, 2_000_000_000));
        let pricing = Arc::new(
            FakePricingGateway::new().with_price(10, dec!(100000000000000000000)),
        );
        let mut order = Order::new(1, vec![OrderRequest::new(10, 1_000_000_000)]);

        let err = engine(&stock, &pricing).enrich(&mut order).await.unwrap_err();

        assert!(matches!(
            err,
            EnrichmentError::PriceOverflow(PriceOverflow { product_id: 10 })
        ));
        assert_eq!(err.product_id(), Some(10));
        assert_eq!(order, Order::new(1, vec![OrderRequest::new(10, 1_000_000_000)]));
    }

    #[tokio::test]
    async fn test_overflowing_total_leaves_order_untouched() {
        let stock = Arc::new(FakeStockGateway::new().with_stock(10, 5).with_stock(20, 5));
        let pricing = Arc::new(
            FakePricingGateway::new()
                .with_price(10, dec!(90000000000000))
                .with_price(20, dec!(90000000000000)),
        );
        let mut order = Order::new(1, vec![OrderRequest::new(10, 1), OrderRequest::new(20, 1)]);

        let err = engine(&stock, &pricing).enrich(&mut order).await.unwrap_err();

        assert!(matches!(err, EnrichmentError::PriceOverflow(_)));
        assert_eq!(order.product_requests[0].final_price, Decimal::ZERO);
        assert_eq!(order.total_price, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_duplicate_products_all_receive_the_quote() {
        let stock = Arc::new(FakeStockGateway::new().with_stock(10, 10));
        let pricing = Arc::new(FakePricingGateway::new().with_price(10, dec!(4)));
        let mut order = Order::new(1, vec![OrderRequest::new(10, 1), OrderRequest::new(10, 3)]);

        engine(&stock, &pricing).enrich(&mut order).await.unwrap();

        assert_eq!(order.product_requests[0].final_price, dec!(4));
        assert_eq!(order.product_requests[1].final_price, dec!(12));
        assert_eq!(order.total_price, dec!(16));
        assert_eq!(stock.calls(), 2);
        assert_eq!(pricing.calls(), 2);
    }

    #[tokio::test]
    async fn test_recheck_stock_is_sequential_and_skips_pricing() {
        let stock = Arc::new(FakeStockGateway::new().with_stock(10, 1).with_stock(20, 0).with_stock(30, 1));
        let pricing = Arc::new(FakePricingGateway::new());
        let items = vec![OrderRequest::new(10, 1), OrderRequest::new(20, 1), OrderRequest::new(30, 1)];

        let err = engine(&stock, &pricing).recheck_stock(&items).await.unwrap_err();

        assert!(matches!(err, EnrichmentError::InsufficientStock { product_id: 20 }));
        // Stops at the first rejection
        assert_eq!(stock.calls(), 2);
        assert_eq!(pricing.calls(), 0);
    }

    #[tokio::test]
    async fn test_recheck_stock_passes() {
        let stock = Arc::new(FakeStockGateway::new().with_stock(10, 4));
        let pricing = Arc::new(FakePricingGateway::new());

        engine(&stock, &pricing)
            .recheck_stock(&[OrderRequest::new(10, 4)])
            .await
            .unwrap();
    }
}
