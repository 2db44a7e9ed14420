use sqlx::{PgPool, Row};
use anyhow::{Context, Result};
use serde_json::Value;

use crate::domains::swap::models::{OrderStatus, OrderStatusHistory};

pub struct HistoryRepository {
    pool: PgPool,
}

impl HistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 주문의 상태 전이 이력 조회 (생성 시각 오름차순)
    /// Get status history for an order (ascending by creation time)
    pub async fn get_for_order(&self, order_id: u64) -> Result<Vec<OrderStatusHistory>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, status, message, metadata, created_at
            FROM order_status_history
            WHERE order_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(order_id as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch order status history")?;

        rows.iter().map(Self::row_to_history).collect()
    }

    /// Row를 OrderStatusHistory로 변환하는 헬퍼 메서드
    /// Helper method to convert Row to OrderStatusHistory
    pub fn row_to_history(row: &sqlx::postgres::PgRow) -> Result<OrderStatusHistory> {
        let status: String = row.get("status");
        Ok(OrderStatusHistory {
            id: row.get::<i64, _>("id") as u64,
            order_id: row.get::<i64, _>("order_id") as u64,
            status: OrderStatus::parse(&status)?,
            message: row.get("message"),
            metadata: row.get::<Option<Value>, _>("metadata"),
            created_at: row.get("created_at"),
        })
    }
}
