use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domains::swap::models::order::{serialize_u64_as_string, deserialize_string_to_u64};

// =====================================================
// DexQuoteLog 모델
// =====================================================
// 역할: 라우팅 중 관찰된 베뉴별 견적 로그
// 설명: 주문당 0개 이상, 견적을 반환한 베뉴당 1행.
//       라우팅 성공 시 정확히 1행의 selected_for_execution이 true.
//       write-once / best-effort (기록 실패가 주문 처리를 중단시키지 않음)
// =====================================================

/// 베뉴별 견적 로그 1건
/// One per-venue quote log record
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DexQuoteLog {
    /// Log ID
    #[serde(serialize_with = "serialize_u64_as_string", deserialize_with = "deserialize_string_to_u64")]
    pub id: u64,

    /// 주문 ID
    /// Order ID
    #[serde(serialize_with = "serialize_u64_as_string", deserialize_with = "deserialize_string_to_u64")]
    pub order_id: u64,

    /// 견적을 반환한 베뉴
    /// Quoting venue
    pub venue: String,

    /// 견적 가격
    /// Quoted price
    pub price: Decimal,

    /// 수수료율 (분수)
    /// Fee rate (fraction)
    pub fee_rate: Decimal,

    /// 예상 출력: amount_in * price * (1 - fee_rate)
    /// Estimated output
    pub estimated_out: Decimal,

    /// 관찰된 견적 지연 시간 (ms)
    /// Observed quote latency (ms)
    pub latency_ms: u64,

    /// 이 견적이 실행에 선택되었는지 여부
    /// Whether this quote was selected for execution
    pub selected_for_execution: bool,

    /// 기록 시간
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

/// 견적 로그 생성용 (스토어 저장용)
/// Internal model for creating quote log records
#[derive(Debug, Clone)]
pub struct QuoteLogCreate {
    pub venue: String,
    pub price: Decimal,
    pub fee_rate: Decimal,
    pub estimated_out: Decimal,
    pub latency_ms: u64,
    pub selected_for_execution: bool,
}
