use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domains::swap::models::{Order, OrderType};

// =====================================================
// 큐 작업 타입 (Queue Job Types)
// =====================================================

/// 작업 페이로드 (실행에 필요한 주문 스냅샷)
/// Job payload (order snapshot needed for execution)
///
/// 큐는 주문 테이블을 다시 읽지 않고 이 페이로드만으로
/// 파이프라인을 시작할 수 있어야 합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    pub order_id: u64,
    pub order_type: OrderType,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: Decimal,
    pub slippage: Decimal,
    pub user_id: Option<u64>,
    pub created_at: DateTime<Utc>,
}

impl JobPayload {
    pub fn for_order(order: &Order) -> Self {
        Self {
            order_id: order.id,
            order_type: order.order_type,
            token_in: order.token_in.clone(),
            token_out: order.token_out.clone(),
            amount_in: order.amount_in,
            slippage: order.slippage,
            user_id: order.user_id,
            created_at: order.created_at,
        }
    }
}

/// 작업 실행 결과
/// Job result (produced by the worker on completion)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub order_id: u64,
    pub success: bool,
    pub tx_hash: Option<String>,
    pub executed_price: Option<Decimal>,
    pub output_amount: Option<Decimal>,
    pub error: Option<String>,
}

/// 큐에 머무는 작업
/// A job sitting in the queue
#[derive(Debug, Clone)]
pub struct Job {
    pub id: u64,
    pub order_id: u64,
    pub payload: JobPayload,

    /// 현재 시도 횟수 (1부터 시작)
    pub attempt: u32,

    pub enqueued_at: DateTime<Utc>,
}

/// 종료된 작업의 최종 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Failed,
}

/// 종료 작업 이력 (바운디드 히스토리)
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub job_id: u64,
    pub order_id: u64,
    pub payload: JobPayload,
    pub outcome: JobOutcome,
    pub attempts: u32,
    pub finished_at: DateTime<Utc>,
}

/// 큐 상태 스냅샷
/// Queue stats snapshot
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub waiting: usize,
    pub active: usize,
    pub completed: u64,
    pub failed: u64,
    pub delayed: usize,
}
