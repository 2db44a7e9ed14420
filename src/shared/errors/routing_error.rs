use thiserror::Error;

/// 라우팅/베뉴 관련 에러
/// Routing / venue-related errors
///
/// 전파 정책:
/// - VenueUnavailable은 개별 베뉴 실패 → 배치 전체를 중단하지 않음
/// - NoQuotesAvailable / ExecutionFailed는 잡 레벨 재시도 대상
/// - UnknownVenue는 프로그래밍 불변식 위반 (실제로는 발생하면 안 됨)
#[derive(Error, Debug)]
pub enum RoutingError {
    /// 베뉴가 견적을 반환하지 못함 (해당 베뉴만 제외됨)
    /// Venue failed to quote (only that venue is dropped)
    #[error("Venue unavailable: {venue} - {reason}")]
    VenueUnavailable { venue: String, reason: String },

    /// 모든 베뉴가 견적 실패
    /// All venues failed to quote
    #[error("No valid quotes available from any venue")]
    NoQuotesAvailable,

    /// 선택된 베뉴에서 스왑 실행 실패
    /// Selected venue failed to execute the swap
    #[error("Execution failed on {venue}: {reason}")]
    ExecutionFailed { venue: String, reason: String },

    /// 선택된 베뉴 ID와 일치하는 어댑터가 없음
    /// No adapter matches the selected venue id
    #[error("Unknown venue: {venue}")]
    UnknownVenue { venue: String },
}
