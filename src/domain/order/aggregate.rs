use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::errors::{OrderError, PriceOverflow};
use super::value_objects::{OrderStatus, PricingQuote};

// ============================================================================
// Order Aggregate
// ============================================================================

/// Fractional digits kept for money, matching the `NUMERIC(18, 4)` columns
pub const MONEY_SCALE: u32 = 4;

/// Largest magnitude a `NUMERIC(18, 4)` column holds
fn money_limit() -> Decimal {
    Decimal::new(999_999_999_999_999_999, MONEY_SCALE)
}

/// Round to the stored scale the way Postgres does (half away from zero)
/// and reject amounts the column cannot hold.
fn to_money(value: Decimal, product_id: i64) -> Result<Decimal, PriceOverflow> {
    let value = value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    if value.abs() > money_limit() {
        return Err(PriceOverflow { product_id });
    }
    Ok(value)
}

/// One product/quantity request within an order.
///
/// Pricing fields stay zero until enrichment copies a quote into the line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    #[serde(default)]
    pub markup: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub final_price: Decimal,
}

impl OrderRequest {
    pub fn new(product_id: i64, quantity: i64) -> Self {
        Self {
            id: 0,
            order_id: 0,
            product_id,
            quantity,
            markup: Decimal::ZERO,
            discount: Decimal::ZERO,
            final_price: Decimal::ZERO,
        }
    }

    /// Copy a unit quote into this line, pricing it for the requested quantity.
    ///
    /// Amounts are rounded to `MONEY_SCALE` so the stored line equals the
    /// in-memory one. On overflow the line is left unchanged.
    pub fn apply_quote(&mut self, quote: &PricingQuote) -> Result<(), PriceOverflow> {
        let overflow = PriceOverflow { product_id: self.product_id };

        let final_price = quote
            .final_price
            .checked_mul(Decimal::from(self.quantity))
            .ok_or(overflow)?;

        let final_price = to_money(final_price, self.product_id)?;
        let markup = to_money(quote.markup, self.product_id)?;
        let discount = to_money(quote.discount, self.product_id)?;

        self.markup = markup;
        self.discount = discount;
        self.final_price = final_price;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    // Identity, assigned by the store on first persistence
    pub id: i64,
    pub user_id: i64,

    pub product_requests: Vec<OrderRequest>,
    pub status: OrderStatus,

    // Derived from the line items
    pub total_price: Decimal,
    pub total_markup: Decimal,
    pub total_discount: Decimal,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn new(user_id: i64, product_requests: Vec<OrderRequest>) -> Self {
        Self {
            id: 0,
            user_id,
            product_requests,
            status: OrderStatus::Created,
            total_price: Decimal::ZERO,
            total_markup: Decimal::ZERO,
            total_discount: Decimal::ZERO,
            created_at: None,
            updated_at: None,
        }
    }

    #[cfg(test)]
    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }

    /// Validate line items before any gateway is consulted
    pub fn validate_items(&self) -> Result<(), OrderError> {
        if self.product_requests.is_empty() {
            return Err(OrderError::EmptyItems);
        }

        for item in &self.product_requests {
            if item.quantity <= 0 {
                return Err(OrderError::InvalidQuantity {
                    product_id: item.product_id,
                    quantity: item.quantity,
                });
            }
        }

        Ok(())
    }

    /// Recompute the aggregate totals from the line items.
    ///
    /// Fails with the product whose line pushed a total out of range; the
    /// totals are left unchanged in that case.
    pub fn recalculate_totals(&mut self) -> Result<(), PriceOverflow> {
        let mut price = Decimal::ZERO;
        let mut markup = Decimal::ZERO;
        let mut discount = Decimal::ZERO;

        for item in &self.product_requests {
            let overflow = PriceOverflow { product_id: item.product_id };
            price = price.checked_add(item.final_price).ok_or(overflow)?;
            markup = markup.checked_add(item.markup).ok_or(overflow)?;
            discount = discount.checked_add(item.discount).ok_or(overflow)?;

            if price.abs() > money_limit()
                || markup.abs() > money_limit()
                || discount.abs() > money_limit()
            {
                return Err(overflow);
            }
        }

        self.total_price = price;
        self.total_markup = markup;
        self.total_discount = discount;
        Ok(())
    }

    /// Apply a header update. Any requested status other than `paid`
    /// records the order as `updated`; cancellation has its own path.
    pub fn apply_update(
        &mut self,
        user_id: Option<i64>,
        requested: OrderStatus,
    ) -> Result<(), OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::AlreadyCancelled(self.id));
        }

        self.status = match requested {
            OrderStatus::Paid => OrderStatus::Paid,
            OrderStatus::Created | OrderStatus::Updated => OrderStatus::Updated,
            OrderStatus::Cancelled => {
                return Err(OrderError::InvalidTransition {
                    order_id: self.id,
                    to: requested,
                })
            }
        };

        if let Some(user_id) = user_id {
            self.user_id = user_id;
        }

        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::AlreadyCancelled(self.id));
        }

        self.status = OrderStatus::Cancelled;
        Ok(())
    }
}
