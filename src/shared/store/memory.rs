use std::collections::HashMap;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;

use crate::shared::errors::SwapError;
use crate::shared::utils::id_generator::OrderIdGenerator;
use crate::domains::swap::models::{
    DexQuoteLog, ExecutionCreate, Order, OrderCreate, OrderExecution, OrderStatus,
    OrderStatusHistory, QuoteLogCreate,
};

use super::OrderStore;

// =====================================================
// MemoryStore - 인메모리 스토어 (테스트 / DB 없는 실행용)
// =====================================================
// 역할: OrderStore의 인메모리 구현
// 설명: 단일 뮤텍스로 모든 테이블을 보호하므로
//       전이의 원자성이 자연스럽게 보장됨.
//       lock을 잡은 채로 await하지 않음
// =====================================================

#[derive(Default)]
struct MemoryInner {
    orders: HashMap<u64, Order>,
    history: Vec<OrderStatusHistory>,
    executions: HashMap<u64, OrderExecution>,
    quote_logs: Vec<DexQuoteLog>,
    next_history_id: u64,
    next_execution_id: u64,
    next_quote_log_id: u64,
}

/// 인메모리 주문 스토어
/// In-memory order store
///
/// 테스트와 DATABASE_URL 없는 로컬 실행에서 사용됩니다.
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                next_history_id: 1,
                next_execution_id: 1,
                next_quote_log_id: 1,
                ..Default::default()
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryInner {
    /// 이력 행 추가 (lock 보유 상태에서 호출)
    fn append_history(
        &mut self,
        order_id: u64,
        status: OrderStatus,
        message: Option<String>,
        metadata: Option<Value>,
    ) {
        let row = OrderStatusHistory {
            id: self.next_history_id,
            order_id,
            status,
            message,
            metadata,
            created_at: Utc::now(),
        };
        self.next_history_id += 1;
        self.history.push(row);
    }

    /// 주문 행 전이 적용 (검증 포함, lock 보유 상태에서 호출)
    fn apply_transition(
        &mut self,
        order_id: u64,
        to: OrderStatus,
        message: &Option<String>,
    ) -> Result<Order> {
        let order = match self.orders.get_mut(&order_id) {
            Some(order) => order,
            None => bail!(SwapError::OrderNotFound { id: order_id }),
        };
        order.status.validate_transition(to)?;

        order.status = to;
        order.updated_at = Utc::now();
        match to {
            // 실패 전이는 사유를 함께 기록
            OrderStatus::Failed => order.failure_reason = message.clone(),
            // 수동 재시도는 이전 실패 사유를 제거
            OrderStatus::Pending => order.failure_reason = None,
            _ => {}
        }
        Ok(order.clone())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(&self, create: OrderCreate) -> Result<Order> {
        let mut inner = self.inner.lock();
        let now = Utc::now();
        let order = Order {
            id: OrderIdGenerator::next(),
            user_id: create.user_id,
            order_type: create.order_type,
            token_in: create.token_in,
            token_out: create.token_out,
            amount_in: create.amount_in,
            slippage: create.slippage,
            status: OrderStatus::Pending,
            retry_count: 0,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        };
        inner.orders.insert(order.id, order.clone());
        // 초기 PENDING 이력 행 (감사 추적은 접수 시점부터)
        inner.append_history(order.id, OrderStatus::Pending, Some("Order received".to_string()), None);
        Ok(order)
    }

    async fn get_order(&self, order_id: u64) -> Result<Option<Order>> {
        Ok(self.inner.lock().orders.get(&order_id).cloned())
    }

    async fn get_orders_by_status(&self, status: OrderStatus, limit: i64) -> Result<Vec<Order>> {
        let inner = self.inner.lock();
        let mut orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| o.status == status)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at);
        orders.truncate(limit.max(0) as usize);
        Ok(orders)
    }

    async fn max_order_id(&self) -> Result<u64> {
        Ok(self.inner.lock().orders.keys().copied().max().unwrap_or(0))
    }

    async fn record_transition(
        &self,
        order_id: u64,
        to: OrderStatus,
        message: Option<String>,
        metadata: Option<Value>,
    ) -> Result<Order> {
        let mut inner = self.inner.lock();
        // 주문 갱신과 이력 추가가 같은 critical section에서 수행됨
        let order = inner.apply_transition(order_id, to, &message)?;
        inner.append_history(order_id, to, message, metadata);
        Ok(order)
    }

    async fn increment_retry_count(&self, order_id: u64) -> Result<u32> {
        let mut inner = self.inner.lock();
        let order = match inner.orders.get_mut(&order_id) {
            Some(order) => order,
            None => bail!(SwapError::OrderNotFound { id: order_id }),
        };
        order.retry_count += 1;
        order.updated_at = Utc::now();
        Ok(order.retry_count)
    }

    async fn record_confirmation(
        &self,
        order_id: u64,
        execution: ExecutionCreate,
        message: Option<String>,
        metadata: Option<Value>,
    ) -> Result<(Order, OrderExecution)> {
        let mut inner = self.inner.lock();
        if inner.executions.contains_key(&order_id) {
            bail!("Execution already recorded for order {}", order_id);
        }
        // CONFIRMED 전이가 거부되면 체결 행도 남지 않음
        let order = inner.apply_transition(order_id, OrderStatus::Confirmed, &message)?;
        inner.append_history(order_id, OrderStatus::Confirmed, message, metadata);

        let row = OrderExecution {
            id: inner.next_execution_id,
            order_id,
            venue: execution.venue,
            tx_hash: execution.tx_hash,
            executed_price: execution.executed_price,
            amount_in: execution.amount_in,
            output_amount: execution.output_amount,
            fee_amount: execution.fee_amount,
            realized_slippage: execution.realized_slippage,
            duration_ms: execution.duration_ms,
            created_at: Utc::now(),
        };
        inner.next_execution_id += 1;
        inner.executions.insert(order_id, row.clone());
        Ok((order, row))
    }

    async fn get_history(&self, order_id: u64) -> Result<Vec<OrderStatusHistory>> {
        let inner = self.inner.lock();
        Ok(inner
            .history
            .iter()
            .filter(|h| h.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn get_execution(&self, order_id: u64) -> Result<Option<OrderExecution>> {
        Ok(self.inner.lock().executions.get(&order_id).cloned())
    }

    async fn log_quotes(&self, order_id: u64, entries: Vec<QuoteLogCreate>) -> Result<()> {
        let mut inner = self.inner.lock();
        let now = Utc::now();
        for entry in entries {
            let row = DexQuoteLog {
                id: inner.next_quote_log_id,
                order_id,
                venue: entry.venue,
                price: entry.price,
                fee_rate: entry.fee_rate,
                estimated_out: entry.estimated_out,
                latency_ms: entry.latency_ms,
                selected_for_execution: entry.selected_for_execution,
                created_at: now,
            };
            inner.next_quote_log_id += 1;
            inner.quote_logs.push(row);
        }
        Ok(())
    }

    async fn get_quote_logs(&self, order_id: u64) -> Result<Vec<DexQuoteLog>> {
        let inner = self.inner.lock();
        Ok(inner
            .quote_logs
            .iter()
            .filter(|q| q.order_id == order_id)
            .cloned()
            .collect())
    }
}
