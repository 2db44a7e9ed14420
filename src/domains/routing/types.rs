use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =====================================================
// 라우팅 도메인 타입
// =====================================================
// 역할: 베뉴 어댑터와 라우팅 엔진이 주고받는 값 타입 정의
// =====================================================

/// 스왑 파라미터 (견적/실행 공통 입력)
/// Swap parameters (shared input for quote and execute)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapParams {
    /// 입력 토큰 심볼
    pub token_in: String,

    /// 출력 토큰 심볼
    pub token_out: String,

    /// 입력 수량
    pub amount_in: Decimal,

    /// 슬리피지 허용치 (분수)
    pub slippage: Decimal,
}

/// 베뉴 견적
/// Venue quote
///
/// 생성된 순간에만 유효한 가격/수수료/예상 출력 제안
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueQuote {
    /// 베뉴 식별자
    pub venue: String,

    /// 견적 가격 (token_out per token_in)
    pub price: Decimal,

    /// 수수료율 (분수)
    pub fee_rate: Decimal,

    /// 예상 출력: amount_in * price * (1 - fee_rate)
    pub estimated_out: Decimal,

    /// 관찰된 견적 지연 시간 (ms)
    pub latency_ms: u64,

    /// 견적 생성 시간
    pub quoted_at: DateTime<Utc>,
}

/// 베뉴 실행 결과 (어댑터 반환값)
/// Venue execution facts (adapter return value)
#[derive(Debug, Clone)]
pub struct VenueExecution {
    /// 실행 베뉴
    pub venue: String,

    /// 합성 트랜잭션 참조
    pub tx_hash: String,

    /// 실현 가격 (실행 시 추가 슬리피지 반영)
    pub executed_price: Decimal,

    /// 실현 출력 수량
    pub output_amount: Decimal,

    /// 수수료 (출력 토큰 기준)
    pub fee_amount: Decimal,

    /// 실행 소요 시간 (ms)
    pub duration_ms: u64,
}

/// 라우팅 결정 (최적 견적 + 선정 근거)
/// Route decision (best quote + human-readable rationale)
#[derive(Debug, Clone)]
pub struct RouteDecision {
    /// 선택된 견적
    pub selected: VenueQuote,

    /// 선정 근거 (차순위 대비 개선율 포함)
    /// e.g. "Selected Raydium: estimated output 297.61 USDC (+0.42% vs Meteora)"
    pub rationale: String,

    /// 이번 라우팅에서 관찰된 모든 견적 (선택된 것 포함, 출력 내림차순)
    pub all_quotes: Vec<VenueQuote>,
}

/// 체결된 스왑 (라우팅 엔진 반환값, 실현 슬리피지 포함)
/// Executed swap (routing engine return value, with realized slippage)
#[derive(Debug, Clone)]
pub struct ExecutedSwap {
    pub venue: String,
    pub tx_hash: String,
    pub executed_price: Decimal,
    pub output_amount: Decimal,
    pub fee_amount: Decimal,
    /// 실현 슬리피지: (expected - actual) / expected
    pub realized_slippage: Decimal,
    pub duration_ms: u64,
}

/// 토큰 기준 가격표 (USD 기준)
/// Reference price table (USD denominated)
///
/// 시뮬레이션 베뉴가 페어 가격을 만들 때 사용합니다.
/// 모르는 심볼은 None → 해당 베뉴 견적 실패로 처리됨
pub fn reference_price(token: &str) -> Option<Decimal> {
    match token {
        "SOL" => Some(Decimal::new(150, 0)),        // 150.0
        "USDC" => Some(Decimal::ONE),               // 1.0
        "USDT" => Some(Decimal::ONE),               // 1.0
        "BONK" => Some(Decimal::new(25, 6)),        // 0.000025
        "JUP" => Some(Decimal::new(8, 1)),          // 0.8
        "RAY" => Some(Decimal::new(25, 1)),         // 2.5
        _ => None,
    }
}

/// 페어 기준 가격: reference(token_in) / reference(token_out)
/// Pair price from the reference table
pub fn pair_price(token_in: &str, token_out: &str) -> Option<Decimal> {
    let base = reference_price(token_in)?;
    let quote = reference_price(token_out)?;
    if quote.is_zero() {
        return None;
    }
    Some(base / quote)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_price_sol_usdc() {
        let price = pair_price("SOL", "USDC").unwrap();
        assert_eq!(price, Decimal::new(150, 0));
    }

    #[test]
    fn test_pair_price_unknown_token() {
        assert!(pair_price("SOL", "WAT").is_none());
        assert!(pair_price("WAT", "USDC").is_none());
    }
}
