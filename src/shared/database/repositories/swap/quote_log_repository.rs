use sqlx::{PgPool, Row};
use anyhow::{Context, Result};
use rust_decimal::Decimal;

use crate::domains::swap::models::{DexQuoteLog, QuoteLogCreate};

pub struct QuoteLogRepository {
    pool: PgPool,
}

impl QuoteLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 견적 로그 일괄 기록 (write-once)
    /// Insert quote log records (write-once)
    pub async fn insert_all(&self, order_id: u64, entries: &[QuoteLogCreate]) -> Result<()> {
        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO dex_quote_logs (
                    order_id, venue, price, fee_rate, estimated_out,
                    latency_ms, selected_for_execution
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(order_id as i64)
            .bind(&entry.venue)
            .bind(entry.price)
            .bind(entry.fee_rate)
            .bind(entry.estimated_out)
            .bind(entry.latency_ms as i64)
            .bind(entry.selected_for_execution)
            .execute(&self.pool)
            .await
            .context("Failed to insert dex quote log")?;
        }
        Ok(())
    }

    /// 주문의 견적 로그 조회
    /// Get quote logs for an order
    pub async fn get_for_order(&self, order_id: u64) -> Result<Vec<DexQuoteLog>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, venue, price, fee_rate, estimated_out,
                   latency_ms, selected_for_execution, created_at
            FROM dex_quote_logs
            WHERE order_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(order_id as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch dex quote logs")?;

        Ok(rows.iter().map(Self::row_to_quote_log).collect())
    }

    /// Row를 DexQuoteLog로 변환하는 헬퍼 메서드
    /// Helper method to convert Row to DexQuoteLog
    pub fn row_to_quote_log(row: &sqlx::postgres::PgRow) -> DexQuoteLog {
        DexQuoteLog {
            id: row.get::<i64, _>("id") as u64,
            order_id: row.get::<i64, _>("order_id") as u64,
            venue: row.get("venue"),
            price: row.get::<Decimal, _>("price"),
            fee_rate: row.get::<Decimal, _>("fee_rate"),
            estimated_out: row.get::<Decimal, _>("estimated_out"),
            latency_ms: row.get::<i64, _>("latency_ms") as u64,
            selected_for_execution: row.get("selected_for_execution"),
            created_at: row.get("created_at"),
        }
    }
}
