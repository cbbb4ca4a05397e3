use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::{OrderStore, StoreError};
use crate::domain::order::{Order, OrderRequest, OrderStatus};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    total_price: Decimal,
    total_markup: Decimal,
    total_discount: Decimal,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRequestRow {
    id: i64,
    order_id: i64,
    product_id: i64,
    quantity: i64,
    markup: Decimal,
    discount: Decimal,
    final_price: Decimal,
}

impl From<OrderRequestRow> for OrderRequest {
    fn from(row: OrderRequestRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: row.quantity,
            markup: row.markup,
            discount: row.discount,
            final_price: row.final_price,
        }
    }
}

impl OrderRow {
    fn into_order(self, product_requests: Vec<OrderRequest>) -> Result<Order, StoreError> {
        let status: OrderStatus = self.status.parse().map_err(|source| StoreError::Corrupt {
            order_id: self.id,
            source,
        })?;

        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            product_requests,
            status,
            total_price: self.total_price,
            total_markup: self.total_markup,
            total_discount: self.total_discount,
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        })
    }
}

/// Postgres-backed store over the `orders` / `order_requests` tables
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create_order(&self, order: &mut Order) -> Result<(), StoreError> {
        // Dropping `tx` before commit rolls both inserts back
        let mut tx = self.pool.begin().await?;

        let (order_id, created_at, updated_at): (i64, DateTime<Utc>, DateTime<Utc>) =
            sqlx::query_as(
                r#"
                INSERT INTO orders (user_id, total_price, total_markup, total_discount, status)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, created_at, updated_at
                "#,
            )
            .bind(order.user_id)
            .bind(order.total_price)
            .bind(order.total_markup)
            .bind(order.total_discount)
            .bind(order.status.as_str())
            .fetch_one(&mut *tx)
            .await?;

        let mut request_ids = Vec::with_capacity(order.product_requests.len());
        for item in &order.product_requests {
            let (request_id,): (i64,) = sqlx::query_as(
                r#"
                INSERT INTO order_requests (order_id, product_id, quantity, markup, discount, final_price)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
                "#,
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.markup)
            .bind(item.discount)
            .bind(item.final_price)
            .fetch_one(&mut *tx)
            .await?;

            request_ids.push(request_id);
        }

        tx.commit().await?;

        order.id = order_id;
        order.created_at = Some(created_at);
        order.updated_at = Some(updated_at);
        for (item, request_id) in order.product_requests.iter_mut().zip(request_ids) {
            item.id = request_id;
            item.order_id = order_id;
        }

        tracing::info!(
            order_id,
            item_count = order.product_requests.len(),
            "✅ Committed order and line items"
        );

        Ok(())
    }

    async fn get_order(&self, id: i64) -> Result<Option<Order>, StoreError> {
        let row: Option<OrderRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, total_price, total_markup, total_discount, status, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let requests: Vec<OrderRequestRow> = sqlx::query_as(
            r#"
            SELECT id, order_id, product_id, quantity, markup, discount, final_price
            FROM order_requests
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let order = row.into_order(requests.into_iter().map(OrderRequest::from).collect())?;
        Ok(Some(order))
    }

    async fn update_order(&self, order: &mut Order) -> Result<(), StoreError> {
        let (created_at, updated_at): (DateTime<Utc>, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO orders (id, user_id, total_price, total_markup, total_discount, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                total_price = EXCLUDED.total_price,
                total_markup = EXCLUDED.total_markup,
                total_discount = EXCLUDED.total_discount,
                status = EXCLUDED.status,
                updated_at = now()
            RETURNING created_at, updated_at
            "#,
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(order.total_price)
        .bind(order.total_markup)
        .bind(order.total_discount)
        .bind(order.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        order.created_at = Some(created_at);
        order.updated_at = Some(updated_at);

        tracing::debug!(order_id = order.id, status = %order.status, "Upserted order header");
        Ok(())
    }
}
