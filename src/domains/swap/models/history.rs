use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domains::swap::models::order::{
    OrderStatus, serialize_u64_as_string, deserialize_string_to_u64,
};

// =====================================================
// OrderStatusHistory 모델
// =====================================================
// 역할: 주문 상태 전이 이력 (append-only)
// 설명: 전이 1건당 1행. 절대 수정/삭제되지 않으며,
//       생성 시각 순서가 상태 머신 경로와 일치해야 함
// =====================================================

/// 주문 상태 전이 이력 1건
/// One order status transition record
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrderStatusHistory {
    /// History ID
    #[serde(serialize_with = "serialize_u64_as_string", deserialize_with = "deserialize_string_to_u64")]
    pub id: u64,

    /// 주문 ID
    /// Order ID
    #[serde(serialize_with = "serialize_u64_as_string", deserialize_with = "deserialize_string_to_u64")]
    pub order_id: u64,

    /// 전이된 상태
    /// Status transitioned to
    pub status: OrderStatus,

    /// 사람이 읽을 수 있는 메시지 (선택)
    /// Human-readable message (optional)
    pub message: Option<String>,

    /// 전이별 구조화 메타데이터 (선택된 베뉴, 예상/체결 출력 등)
    /// Structured per-transition metadata (selected venue, outputs, tx ref, ...)
    pub metadata: Option<Value>,

    /// 전이 기록 시간
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}
