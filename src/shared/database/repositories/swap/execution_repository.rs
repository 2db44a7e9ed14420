use sqlx::{PgPool, Row};
use anyhow::{Context, Result};
use rust_decimal::Decimal;

use crate::domains::swap::models::OrderExecution;

pub struct ExecutionRepository {
    pool: PgPool,
}

impl ExecutionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 주문의 체결 정보 조회
    /// Get execution record for an order
    pub async fn get_for_order(&self, order_id: u64) -> Result<Option<OrderExecution>> {
        let row = sqlx::query(
            r#"
            SELECT id, order_id, venue, tx_hash, executed_price, amount_in,
                   output_amount, fee_amount, realized_slippage, duration_ms, created_at
            FROM order_executions
            WHERE order_id = $1
            "#,
        )
        .bind(order_id as i64)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch order execution")?;

        Ok(row.map(|r| Self::row_to_execution(&r)))
    }

    /// Row를 OrderExecution으로 변환하는 헬퍼 메서드
    /// Helper method to convert Row to OrderExecution
    pub fn row_to_execution(row: &sqlx::postgres::PgRow) -> OrderExecution {
        OrderExecution {
            id: row.get::<i64, _>("id") as u64,
            order_id: row.get::<i64, _>("order_id") as u64,
            venue: row.get("venue"),
            tx_hash: row.get("tx_hash"),
            executed_price: row.get::<Decimal, _>("executed_price"),
            amount_in: row.get::<Decimal, _>("amount_in"),
            output_amount: row.get::<Decimal, _>("output_amount"),
            fee_amount: row.get::<Decimal, _>("fee_amount"),
            realized_slippage: row.get::<Decimal, _>("realized_slippage"),
            duration_ms: row.get::<i64, _>("duration_ms") as u64,
            created_at: row.get("created_at"),
        }
    }
}
