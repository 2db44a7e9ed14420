use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::Row;

use crate::shared::database::{
    Database, ExecutionRepository, HistoryRepository, OrderRepository, QuoteLogRepository,
};
use crate::shared::errors::SwapError;
use crate::shared::utils::id_generator::OrderIdGenerator;
use crate::domains::swap::models::{
    DexQuoteLog, ExecutionCreate, Order, OrderCreate, OrderExecution, OrderStatus,
    OrderStatusHistory, QuoteLogCreate,
};

use super::OrderStore;

// =====================================================
// PostgresStore - PostgreSQL 기반 주문 스토어
// =====================================================
// 역할: OrderStore의 운영용 구현
// 설명: 단건 조회는 리포지토리로 위임하고,
//       여러 행을 묶는 연산(생성 + 초기 이력, 상태 전이 + 이력,
//       체결 확정)은 sqlx 트랜잭션으로 원자성을 보장함
// =====================================================

/// PostgreSQL 주문 스토어
/// PostgreSQL-backed order store
#[derive(Clone)]
pub struct PostgresStore {
    db: Database,
}

impl PostgresStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.db.pool().clone())
    }

    fn history(&self) -> HistoryRepository {
        HistoryRepository::new(self.db.pool().clone())
    }

    fn executions(&self) -> ExecutionRepository {
        ExecutionRepository::new(self.db.pool().clone())
    }

    fn quote_logs(&self) -> QuoteLogRepository {
        QuoteLogRepository::new(self.db.pool().clone())
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn create_order(&self, create: OrderCreate) -> Result<Order> {
        let mut tx = self.db.pool().begin().await.context("Failed to begin transaction")?;
        let now = Utc::now();
        let order_id = OrderIdGenerator::next();

        let row = sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, order_type, token_in, token_out, amount_in,
                slippage, status, retry_count, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, user_id, order_type, token_in, token_out, amount_in,
                      slippage, status, retry_count, failure_reason, created_at, updated_at
            "#,
        )
        .bind(order_id as i64)
        .bind(create.user_id.map(|v| v as i64))
        .bind(create.order_type.as_str())
        .bind(&create.token_in)
        .bind(&create.token_out)
        .bind(create.amount_in)
        .bind(create.slippage)
        .bind(OrderStatus::Pending.as_str())
        .bind(0_i32)
        .bind(now)
        .bind(now)
        .fetch_one(&mut tx)
        .await
        .context("Failed to create order")?;

        // 초기 PENDING 이력 행 (같은 트랜잭션 안에서)
        sqlx::query(
            r#"
            INSERT INTO order_status_history (order_id, status, message, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(order_id as i64)
        .bind(OrderStatus::Pending.as_str())
        .bind("Order received")
        .bind(now)
        .execute(&mut tx)
        .await
        .context("Failed to append initial status history")?;

        tx.commit().await.context("Failed to commit order creation")?;
        OrderRepository::row_to_order(&row)
    }

    async fn get_order(&self, order_id: u64) -> Result<Option<Order>> {
        self.orders().get_by_id(order_id).await
    }

    async fn get_orders_by_status(&self, status: OrderStatus, limit: i64) -> Result<Vec<Order>> {
        self.orders().get_by_status(status, limit).await
    }

    async fn max_order_id(&self) -> Result<u64> {
        self.orders().max_id().await
    }

    async fn record_transition(
        &self,
        order_id: u64,
        to: OrderStatus,
        message: Option<String>,
        metadata: Option<Value>,
    ) -> Result<Order> {
        let mut tx = self.db.pool().begin().await.context("Failed to begin transaction")?;

        // 현재 상태를 잠그고 전이 검증
        let current_row = sqlx::query(r#"SELECT status FROM orders WHERE id = $1 FOR UPDATE"#)
            .bind(order_id as i64)
            .fetch_optional(&mut tx)
            .await
            .context("Failed to lock order row")?;

        let current = match current_row {
            Some(row) => OrderStatus::parse(&row.get::<String, _>("status"))?,
            None => bail!(SwapError::OrderNotFound { id: order_id }),
        };
        current.validate_transition(to)?;

        let now = Utc::now();
        let row = match to {
            // 실패 전이는 사유를 함께 기록
            OrderStatus::Failed => sqlx::query(
                r#"
                UPDATE orders
                SET status = $1, failure_reason = $2, updated_at = $3
                WHERE id = $4
                RETURNING id, user_id, order_type, token_in, token_out, amount_in,
                          slippage, status, retry_count, failure_reason, created_at, updated_at
                "#,
            )
            .bind(to.as_str())
            .bind(&message)
            .bind(now)
            .bind(order_id as i64)
            .fetch_one(&mut tx)
            .await,
            // 수동 재시도는 이전 실패 사유를 제거
            OrderStatus::Pending => sqlx::query(
                r#"
                UPDATE orders
                SET status = $1, failure_reason = NULL, updated_at = $2
                WHERE id = $3
                RETURNING id, user_id, order_type, token_in, token_out, amount_in,
                          slippage, status, retry_count, failure_reason, created_at, updated_at
                "#,
            )
            .bind(to.as_str())
            .bind(now)
            .bind(order_id as i64)
            .fetch_one(&mut tx)
            .await,
            _ => sqlx::query(
                r#"
                UPDATE orders
                SET status = $1, updated_at = $2
                WHERE id = $3
                RETURNING id, user_id, order_type, token_in, token_out, amount_in,
                          slippage, status, retry_count, failure_reason, created_at, updated_at
                "#,
            )
            .bind(to.as_str())
            .bind(now)
            .bind(order_id as i64)
            .fetch_one(&mut tx)
            .await,
        }
        .context("Failed to update order status")?;

        sqlx::query(
            r#"
            INSERT INTO order_status_history (order_id, status, message, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order_id as i64)
        .bind(to.as_str())
        .bind(&message)
        .bind(&metadata)
        .bind(now)
        .execute(&mut tx)
        .await
        .context("Failed to append status history")?;

        tx.commit().await.context("Failed to commit status transition")?;
        OrderRepository::row_to_order(&row)
    }

    async fn increment_retry_count(&self, order_id: u64) -> Result<u32> {
        let retry_count: i32 = sqlx::query_scalar(
            r#"
            UPDATE orders
            SET retry_count = retry_count + 1, updated_at = $1
            WHERE id = $2
            RETURNING retry_count
            "#,
        )
        .bind(Utc::now())
        .bind(order_id as i64)
        .fetch_one(self.db.pool())
        .await
        .context("Failed to increment retry count")?;

        Ok(retry_count as u32)
    }

    async fn record_confirmation(
        &self,
        order_id: u64,
        execution: ExecutionCreate,
        message: Option<String>,
        metadata: Option<Value>,
    ) -> Result<(Order, OrderExecution)> {
        let mut tx = self.db.pool().begin().await.context("Failed to begin transaction")?;

        let current_row = sqlx::query(r#"SELECT status FROM orders WHERE id = $1 FOR UPDATE"#)
            .bind(order_id as i64)
            .fetch_optional(&mut tx)
            .await
            .context("Failed to lock order row")?;

        let current = match current_row {
            Some(row) => OrderStatus::parse(&row.get::<String, _>("status"))?,
            None => bail!(SwapError::OrderNotFound { id: order_id }),
        };
        current.validate_transition(OrderStatus::Confirmed)?;

        let now = Utc::now();
        let order_row = sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, updated_at = $2
            WHERE id = $3
            RETURNING id, user_id, order_type, token_in, token_out, amount_in,
                      slippage, status, retry_count, failure_reason, created_at, updated_at
            "#,
        )
        .bind(OrderStatus::Confirmed.as_str())
        .bind(now)
        .bind(order_id as i64)
        .fetch_one(&mut tx)
        .await
        .context("Failed to confirm order")?;

        sqlx::query(
            r#"
            INSERT INTO order_status_history (order_id, status, message, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order_id as i64)
        .bind(OrderStatus::Confirmed.as_str())
        .bind(&message)
        .bind(&metadata)
        .bind(now)
        .execute(&mut tx)
        .await
        .context("Failed to append status history")?;

        // 체결 행은 CONFIRMED 전이와 같은 트랜잭션에서 정확히 한 번 생성됨
        let execution_row = sqlx::query(
            r#"
            INSERT INTO order_executions (
                order_id, venue, tx_hash, executed_price, amount_in,
                output_amount, fee_amount, realized_slippage, duration_ms, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, order_id, venue, tx_hash, executed_price, amount_in,
                      output_amount, fee_amount, realized_slippage, duration_ms, created_at
            "#,
        )
        .bind(order_id as i64)
        .bind(&execution.venue)
        .bind(&execution.tx_hash)
        .bind(execution.executed_price)
        .bind(execution.amount_in)
        .bind(execution.output_amount)
        .bind(execution.fee_amount)
        .bind(execution.realized_slippage)
        .bind(execution.duration_ms as i64)
        .bind(now)
        .fetch_one(&mut tx)
        .await
        .context("Failed to insert order execution")?;

        tx.commit().await.context("Failed to commit confirmation")?;

        let order = OrderRepository::row_to_order(&order_row)?;
        let execution = ExecutionRepository::row_to_execution(&execution_row);
        Ok((order, execution))
    }

    async fn get_history(&self, order_id: u64) -> Result<Vec<OrderStatusHistory>> {
        self.history().get_for_order(order_id).await
    }

    async fn get_execution(&self, order_id: u64) -> Result<Option<OrderExecution>> {
        self.executions().get_for_order(order_id).await
    }

    async fn log_quotes(&self, order_id: u64, entries: Vec<QuoteLogCreate>) -> Result<()> {
        self.quote_logs().insert_all(order_id, &entries).await
    }

    async fn get_quote_logs(&self, order_id: u64) -> Result<Vec<DexQuoteLog>> {
        self.quote_logs().get_for_order(order_id).await
    }
}
