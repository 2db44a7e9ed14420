use sqlx::{PgPool, Row};
use anyhow::{Context, Result};
use rust_decimal::Decimal;

use crate::domains::swap::models::{Order, OrderStatus, OrderType};

pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 주문 ID로 조회
    /// Get order by ID
    pub async fn get_by_id(&self, order_id: u64) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, order_type, token_in, token_out, amount_in,
                   slippage, status, retry_count, failure_reason, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id as i64)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch order by id")?;

        row.map(|r| Self::row_to_order(&r)).transpose()
    }

    /// 상태로 주문 조회 (생성 시각 오름차순)
    /// Get orders by status (ascending by creation time)
    pub async fn get_by_status(&self, status: OrderStatus, limit: i64) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, order_type, token_in, token_out, amount_in,
                   slippage, status, retry_count, failure_reason, created_at, updated_at
            FROM orders
            WHERE status = $1
            ORDER BY created_at ASC
            LIMIT $2
            "#,
        )
        .bind(status.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch orders by status")?;

        rows.iter().map(Self::row_to_order).collect()
    }

    /// 마지막 주문 ID 조회 (ID 생성기 초기화용)
    /// Get max order ID (for seeding the ID generator)
    pub async fn max_id(&self) -> Result<u64> {
        let max: Option<i64> = sqlx::query_scalar(r#"SELECT MAX(id) FROM orders"#)
            .fetch_one(&self.pool)
            .await
            .context("Failed to fetch max order id")?;

        Ok(max.unwrap_or(0) as u64)
    }

    /// Row를 Order로 변환하는 헬퍼 메서드
    /// Helper method to convert Row to Order
    pub fn row_to_order(row: &sqlx::postgres::PgRow) -> Result<Order> {
        let order_type: String = row.get("order_type");
        let status: String = row.get("status");
        Ok(Order {
            id: row.get::<i64, _>("id") as u64,
            user_id: row.get::<Option<i64>, _>("user_id").map(|v| v as u64),
            order_type: OrderType::parse(&order_type)?,
            token_in: row.get("token_in"),
            token_out: row.get("token_out"),
            amount_in: row.get::<Decimal, _>("amount_in"),
            slippage: row.get::<Decimal, _>("slippage"),
            status: OrderStatus::parse(&status)?,
            retry_count: row.get::<i32, _>("retry_count") as u32,
            failure_reason: row.get("failure_reason"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}
