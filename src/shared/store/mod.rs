// =====================================================
// 주문 스토어 모듈
// Order Store Module
// =====================================================
// 코어 파이프라인이 요구하는 영속화 연산을 제공합니다.
//
// 구조:
// - OrderStore trait: 스토어 인터페이스 (구현체와 분리)
// - PostgresStore: sqlx 기반 실제 구현
// - MemoryStore: 테스트 / DB 없는 실행용 구현
//
// 설계 철학:
// - 인터페이스와 구현 분리 (Dependency Inversion)
// - Worker/Service는 trait만 참조 (구체적 구현 몰라도 됨)
// - 상태 전이는 원자적 단위: 주문 행 갱신 + 이력 행 추가가
//   함께 반영되거나 둘 다 반영되지 않음
// =====================================================

pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::domains::swap::models::{
    DexQuoteLog, ExecutionCreate, Order, OrderCreate, OrderExecution, OrderStatus,
    OrderStatusHistory, QuoteLogCreate,
};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// 주문 스토어 인터페이스
/// Order store interface
///
/// 코어가 네 엔티티에 대해 요구하는 create/read/update/append 연산만 정의합니다.
/// 스토리지 엔진 내부는 이 경계 밖의 관심사입니다.
///
/// # 구현체
/// - `PostgresStore`: sqlx + migrations (운영)
/// - `MemoryStore`: 단일 뮤텍스 (테스트)
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// 주문 생성 (초기 PENDING 이력 행과 함께 원자적으로)
    /// Create an order, atomically with its initial PENDING history row
    async fn create_order(&self, create: OrderCreate) -> Result<Order>;

    /// 주문 ID로 조회
    /// Get order by ID
    async fn get_order(&self, order_id: u64) -> Result<Option<Order>>;

    /// 상태로 주문 조회 (생성 시각 오름차순)
    /// Get orders by status (ascending by creation time)
    async fn get_orders_by_status(&self, status: OrderStatus, limit: i64) -> Result<Vec<Order>>;

    /// 마지막 주문 ID 조회 (ID 생성기 초기화용)
    /// Get max order ID (for seeding the ID generator)
    async fn max_order_id(&self) -> Result<u64>;

    /// 상태 전이 기록 (원자적: 주문 행 갱신 + 이력 행 추가)
    /// Record a status transition (atomic: order row update + history append)
    ///
    /// - 허용되지 않는 엣지는 거부됨 (`SwapError::InvalidTransition`)
    /// - `to == FAILED`이면 `failure_reason = message`
    /// - `FAILED -> PENDING` 수동 재시도 시 `failure_reason`이 제거됨
    async fn record_transition(
        &self,
        order_id: u64,
        to: OrderStatus,
        message: Option<String>,
        metadata: Option<Value>,
    ) -> Result<Order>;

    /// 재시도 횟수 증가
    /// Increment retry count, returning the new value
    async fn increment_retry_count(&self, order_id: u64) -> Result<u32>;

    /// 체결 확정 기록 (원자적: 체결 행 생성 + CONFIRMED 전이 + 이력 행 추가)
    /// Record confirmation (atomic: execution row + CONFIRMED transition + history)
    async fn record_confirmation(
        &self,
        order_id: u64,
        execution: ExecutionCreate,
        message: Option<String>,
        metadata: Option<Value>,
    ) -> Result<(Order, OrderExecution)>;

    /// 상태 전이 이력 조회 (생성 시각 오름차순)
    /// Get status history (ascending by creation time)
    async fn get_history(&self, order_id: u64) -> Result<Vec<OrderStatusHistory>>;

    /// 체결 정보 조회
    /// Get execution record
    async fn get_execution(&self, order_id: u64) -> Result<Option<OrderExecution>>;

    /// 견적 로그 일괄 기록 (write-once)
    /// Append quote log records (write-once)
    async fn log_quotes(&self, order_id: u64, entries: Vec<QuoteLogCreate>) -> Result<()>;

    /// 견적 로그 조회
    /// Get quote logs
    async fn get_quote_logs(&self, order_id: u64) -> Result<Vec<DexQuoteLog>>;
}
