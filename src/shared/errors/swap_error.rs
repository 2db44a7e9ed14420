use thiserror::Error;
use crate::domains::swap::models::order::OrderStatus;

/// 스왑 주문 관련 에러
/// Swap order-related errors
#[derive(Error, Debug)]
pub enum SwapError {
    /// 잘못된 스왑 파라미터 (큐에 들어가기 전에 거부됨)
    /// Invalid swap parameters (rejected before enqueue)
    #[error("Validation error: {0}")]
    Validation(String),

    /// 주문을 찾을 수 없음
    /// Order not found
    #[error("Order not found: id={id}")]
    OrderNotFound { id: u64 },

    /// 허용되지 않는 상태 전이
    /// Disallowed status transition
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// 데이터베이스 에러
    /// Database error
    #[error("Database error: {0}")]
    Database(String),
}
