use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domains::swap::models::order::{serialize_u64_as_string, deserialize_string_to_u64};

// =====================================================
// OrderExecution 모델
// =====================================================
// 역할: 체결 결과. 주문당 최대 1행
// 설명: 주문이 CONFIRMED에 도달하는 순간, CONFIRMED 전이와
//       같은 원자적 단위로 정확히 한 번 생성됨.
//       실패/미확정 주문에는 존재하지 않음
// =====================================================

/// 체결 결과
/// Order execution record
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrderExecution {
    /// Execution ID
    #[serde(serialize_with = "serialize_u64_as_string", deserialize_with = "deserialize_string_to_u64")]
    pub id: u64,

    /// 주문 ID (CONFIRMED 주문과 1:1)
    /// Order ID (1:1 with a confirmed order)
    #[serde(serialize_with = "serialize_u64_as_string", deserialize_with = "deserialize_string_to_u64")]
    pub order_id: u64,

    /// 체결 베뉴
    /// Executing venue
    pub venue: String,

    /// 트랜잭션 참조 (합성 해시)
    /// Transaction reference (synthetic hash)
    pub tx_hash: String,

    /// 체결 가격
    /// Executed price
    pub executed_price: Decimal,

    /// 입력 수량
    /// Input amount
    pub amount_in: Decimal,

    /// 실현 출력 수량
    /// Realized output amount
    pub output_amount: Decimal,

    /// 수수료 (출력 토큰 기준)
    /// Fee amount (in output token)
    pub fee_amount: Decimal,

    /// 실현 슬리피지: (expected - actual) / expected
    /// Realized slippage: (expected - actual) / expected
    pub realized_slippage: Decimal,

    /// 실행 소요 시간 (ms)
    /// Execution duration (ms)
    pub duration_ms: u64,

    /// 기록 시간
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

/// 체결 결과 생성용 (스토어 저장용)
/// Internal model for creating an execution record
#[derive(Debug, Clone)]
pub struct ExecutionCreate {
    pub venue: String,
    pub tx_hash: String,
    pub executed_price: Decimal,
    pub amount_in: Decimal,
    pub output_amount: Decimal,
    pub fee_amount: Decimal,
    pub realized_slippage: Decimal,
    pub duration_ms: u64,
}
