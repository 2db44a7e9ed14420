use serde::{Deserialize, Serialize, Deserializer, Serializer};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::shared::errors::SwapError;
use crate::domains::swap::models::history::OrderStatusHistory;
use crate::domains::swap::models::execution::OrderExecution;
use crate::domains::swap::models::quote_log::DexQuoteLog;

// =====================================================
// ID 직렬화 헬퍼 함수 (JavaScript 정밀도 손실 방지)
// =====================================================
/// u64를 문자열로 직렬화 (JavaScript 정밀도 손실 방지)
/// Serialize u64 as string to avoid precision loss in JavaScript
pub fn serialize_u64_as_string<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

/// 문자열을 u64로 역직렬화
/// Deserialize string to u64
pub fn deserialize_string_to_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<u64>().map_err(serde::de::Error::custom)
}

// =====================================================
// 주문 타입 / 주문 상태
// =====================================================
// 역할: 문자열 상태 대신 닫힌 enum으로 표현
// 모든 전이 지점에서 exhaustive matching으로 잘못된 전이를 차단

/// 주문 타입
/// Order type
///
/// MARKET만 구현됨. LIMIT / SNIPER는 예약만 되어 있고 접수 단계에서 거부됨.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
    Limit,
    Sniper,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
            OrderType::Sniper => "SNIPER",
        }
    }

    /// DB 문자열을 OrderType으로 변환
    /// Parse database string into OrderType
    pub fn parse(s: &str) -> Result<Self, SwapError> {
        match s {
            "MARKET" => Ok(OrderType::Market),
            "LIMIT" => Ok(OrderType::Limit),
            "SNIPER" => Ok(OrderType::Sniper),
            other => Err(SwapError::Validation(format!("Unknown order type: {}", other))),
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 주문 상태
/// Order status
///
/// 상태 그래프:
/// ```text
/// PENDING → ROUTING → BUILDING → SUBMITTED → CONFIRMED (종료: 성공)
///    │         │          │          │
///    └─────────┴──────────┴──────────┴──→ FAILED (종료: 실패)
///
/// FAILED → PENDING              (수동 재시도, 서비스 레벨)
/// ROUTING/BUILDING/SUBMITTED → ROUTING  (잡 재시도 시 파이프라인 재진입)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Routing,
    Building,
    Submitted,
    Confirmed,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Routing => "ROUTING",
            OrderStatus::Building => "BUILDING",
            OrderStatus::Submitted => "SUBMITTED",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Failed => "FAILED",
        }
    }

    /// DB 문자열을 OrderStatus로 변환
    /// Parse database string into OrderStatus
    pub fn parse(s: &str) -> Result<Self, SwapError> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "ROUTING" => Ok(OrderStatus::Routing),
            "BUILDING" => Ok(OrderStatus::Building),
            "SUBMITTED" => Ok(OrderStatus::Submitted),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "FAILED" => Ok(OrderStatus::Failed),
            other => Err(SwapError::Validation(format!("Unknown order status: {}", other))),
        }
    }

    /// 종료 상태 여부
    /// Whether this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Confirmed | OrderStatus::Failed)
    }

    /// 상태 전이 허용 여부
    /// Whether the transition `self -> to` is allowed
    ///
    /// 허용 엣지:
    /// - 정방향: PENDING→ROUTING→BUILDING→SUBMITTED→CONFIRMED
    /// - 실패: 모든 비종료 상태 → FAILED
    /// - 수동 재시도: FAILED → PENDING
    /// - 잡 재시도 재진입: ROUTING/BUILDING/SUBMITTED → ROUTING
    pub fn can_transition(&self, to: OrderStatus) -> bool {
        match (self, to) {
            (OrderStatus::Pending, OrderStatus::Routing) => true,
            (OrderStatus::Routing, OrderStatus::Building) => true,
            (OrderStatus::Building, OrderStatus::Submitted) => true,
            (OrderStatus::Submitted, OrderStatus::Confirmed) => true,

            // 실패는 비종료 상태 어디서든 가능
            (OrderStatus::Pending, OrderStatus::Failed) => true,
            (OrderStatus::Routing, OrderStatus::Failed) => true,
            (OrderStatus::Building, OrderStatus::Failed) => true,
            (OrderStatus::Submitted, OrderStatus::Failed) => true,

            // 수동 재시도 (외부 협력자 경로)
            (OrderStatus::Failed, OrderStatus::Pending) => true,

            // 잡 재시도 시 파이프라인은 항상 라우팅부터 다시 시작
            (OrderStatus::Routing, OrderStatus::Routing) => true,
            (OrderStatus::Building, OrderStatus::Routing) => true,
            (OrderStatus::Submitted, OrderStatus::Routing) => true,

            _ => false,
        }
    }

    /// 전이 검증 (에러 반환 버전)
    /// Validate transition, returning an error on a disallowed edge
    pub fn validate_transition(&self, to: OrderStatus) -> Result<(), SwapError> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(SwapError::InvalidTransition { from: *self, to })
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =====================================================
// Order 모델
// =====================================================
// 역할: 스왑 주문을 나타내는 aggregate root
// 설명: 접수 시 한 번 생성되며, status / retry_count / failure_reason /
//       updated_at은 ExecutionWorker가 주도하는 전이로만 변경됨
//       (수동 재시도 FAILED→PENDING 제외). 코어는 주문을 삭제하지 않음.
// =====================================================

/// 스왑 주문
/// Swap order
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Order {
    /// Order ID
    /// 주문 ID
    /// JavaScript 정밀도 손실 방지를 위해 문자열로 직렬화
    #[serde(serialize_with = "serialize_u64_as_string", deserialize_with = "deserialize_string_to_u64")]
    pub id: u64,

    /// User ID (주문 생성자, 선택)
    /// Owning user reference (optional)
    pub user_id: Option<u64>,

    /// 주문 타입 (MARKET만 구현됨)
    /// Order type (only MARKET is implemented)
    pub order_type: OrderType,

    /// 입력 토큰 심볼 (예: 'SOL')
    /// Input token symbol
    pub token_in: String,

    /// 출력 토큰 심볼 (예: 'USDC')
    /// Output token symbol
    pub token_out: String,

    /// 입력 수량
    /// Input amount
    pub amount_in: Decimal,

    /// 슬리피지 허용치 (분수, 기본 0.01)
    /// Slippage tolerance (fraction, default 0.01)
    pub slippage: Decimal,

    /// 주문 상태
    /// Order status
    pub status: OrderStatus,

    /// 재시도 횟수 (잡 실패 시마다 증가)
    /// Retry count (incremented on each failed attempt)
    pub retry_count: u32,

    /// 실패 사유 (FAILED 상태일 때만 존재)
    /// Failure reason (present only for FAILED orders)
    pub failure_reason: Option<String>,

    /// 주문 생성 시간
    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// 주문 정보 마지막 업데이트 시간
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

// =====================================================
// Order 생성용 (Store에서 사용)
// =====================================================
/// 주문 생성 시 사용하는 내부 모델 (스토어 저장용)
/// Internal model for creating orders (for store persistence)
#[derive(Debug, Clone)]
pub struct OrderCreate {
    /// User ID (선택)
    pub user_id: Option<u64>,

    /// 주문 타입
    pub order_type: OrderType,

    /// 입력 토큰 심볼
    pub token_in: String,

    /// 출력 토큰 심볼
    pub token_out: String,

    /// 입력 수량
    pub amount_in: Decimal,

    /// 슬리피지 허용치
    pub slippage: Decimal,
}

// =====================================================
// 주문 생성 요청 (Create Swap Order Request)
// =====================================================
/// 주문 생성 요청 모델
/// Request model for creating a new swap order
///
/// 검증 규칙은 OrderService::validate에서 적용됨 (큐 진입 전)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSwapOrderRequest {
    /// 주문 타입 (생략 시 MARKET)
    /// Order type (defaults to MARKET)
    pub order_type: Option<OrderType>,

    /// 입력 토큰 심볼
    pub token_in: String,

    /// 출력 토큰 심볼
    pub token_out: String,

    /// 입력 수량
    pub amount_in: Decimal,

    /// 슬리피지 허용치 (생략 시 0.01)
    /// Slippage tolerance (defaults to 0.01)
    pub slippage: Option<Decimal>,

    /// User ID (선택)
    pub user_id: Option<u64>,
}

// =====================================================
// 주문 상세 응답 (Order Detail)
// =====================================================
/// 주문 상세 (주문 + 전이 이력 + 체결 + 견적 로그)
/// Order detail (order + status history + execution + quote logs)
#[derive(Debug, Serialize, Clone)]
pub struct OrderDetail {
    /// 주문 정보
    pub order: Order,

    /// 상태 전이 이력 (생성 시각 오름차순)
    pub history: Vec<OrderStatusHistory>,

    /// 체결 정보 (CONFIRMED 주문만 존재)
    pub execution: Option<OrderExecution>,

    /// 라우팅 중 수집된 베뉴별 견적 로그
    pub quote_logs: Vec<DexQuoteLog>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_path_is_valid() {
        assert!(OrderStatus::Pending.can_transition(OrderStatus::Routing));
        assert!(OrderStatus::Routing.can_transition(OrderStatus::Building));
        assert!(OrderStatus::Building.can_transition(OrderStatus::Submitted));
        assert!(OrderStatus::Submitted.can_transition(OrderStatus::Confirmed));
    }

    #[test]
    fn test_no_skipping_or_backward() {
        // 순서 건너뛰기 불가
        assert!(!OrderStatus::Pending.can_transition(OrderStatus::Building));
        assert!(!OrderStatus::Pending.can_transition(OrderStatus::Confirmed));
        assert!(!OrderStatus::Routing.can_transition(OrderStatus::Confirmed));
        // 역방향 불가 (재시도 재진입 제외)
        assert!(!OrderStatus::Building.can_transition(OrderStatus::Pending));
        assert!(!OrderStatus::Submitted.can_transition(OrderStatus::Building));
    }

    #[test]
    fn test_failed_reachable_from_non_terminal() {
        assert!(OrderStatus::Pending.can_transition(OrderStatus::Failed));
        assert!(OrderStatus::Routing.can_transition(OrderStatus::Failed));
        assert!(OrderStatus::Building.can_transition(OrderStatus::Failed));
        assert!(OrderStatus::Submitted.can_transition(OrderStatus::Failed));
        // 종료 상태에서는 불가
        assert!(!OrderStatus::Confirmed.can_transition(OrderStatus::Failed));
        assert!(!OrderStatus::Failed.can_transition(OrderStatus::Failed));
    }

    #[test]
    fn test_manual_retry_edge() {
        assert!(OrderStatus::Failed.can_transition(OrderStatus::Pending));
        assert!(!OrderStatus::Confirmed.can_transition(OrderStatus::Pending));
    }

    #[test]
    fn test_retry_reentry_edges() {
        // 잡 재시도 시 파이프라인은 라우팅부터 다시 시작
        assert!(OrderStatus::Routing.can_transition(OrderStatus::Routing));
        assert!(OrderStatus::Building.can_transition(OrderStatus::Routing));
        assert!(OrderStatus::Submitted.can_transition(OrderStatus::Routing));
        assert!(!OrderStatus::Confirmed.can_transition(OrderStatus::Routing));
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Confirmed.is_terminal());
        assert!(OrderStatus::Failed.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Submitted.is_terminal());
    }

    #[test]
    fn test_status_parse_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Routing,
            OrderStatus::Building,
            OrderStatus::Submitted,
            OrderStatus::Confirmed,
            OrderStatus::Failed,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(OrderStatus::parse("UNKNOWN").is_err());
    }

    #[test]
    fn test_validate_transition_error() {
        let err = OrderStatus::Pending
            .validate_transition(OrderStatus::Confirmed)
            .unwrap_err();
        assert!(err.to_string().contains("Invalid status transition"));
    }
}
