pub mod meteora;
pub mod raydium;

pub use meteora::MeteoraAdapter;
pub use raydium::RaydiumAdapter;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domains::routing::types::{pair_price, SwapParams, VenueExecution, VenueQuote};
use crate::shared::errors::RoutingError;

// =====================================================
// 베뉴 어댑터 (Venue Adapter)
// =====================================================
// 역할: DEX 베뉴별 견적/실행 인터페이스
//
// NestJS의 provider 인터페이스처럼 라우팅 엔진은 이
// trait만 알고, 실제 베뉴는 뒤에서 갈아끼울 수 있습니다.
// =====================================================

/// 베뉴 어댑터 trait
///
/// 구현체는 시뮬레이션이지만 실제 DEX 연동과 같은 형태를 유지합니다.
#[async_trait]
pub trait VenueAdapter: Send + Sync {
    /// 베뉴 식별자 (e.g. "Raydium")
    fn venue(&self) -> &str;

    /// 현재 시장 견적 조회
    async fn quote(&self, params: &SwapParams) -> Result<VenueQuote, RoutingError>;

    /// 견적 기반 스왑 실행
    async fn execute(
        &self,
        params: &SwapParams,
        quote: &VenueQuote,
    ) -> Result<VenueExecution, RoutingError>;
}

/// 베뉴 시뮬레이션 설정
/// Per-venue simulation config
#[derive(Debug, Clone)]
pub struct VenueConfig {
    /// 수수료율 (분수)
    pub fee_rate: Decimal,

    /// 견적/실행 지연 범위 (ms, inclusive)
    pub latency_ms: (u64, u64),

    /// 기준 가격 대비 가격 변동폭 (± 분수)
    pub price_variance: f64,

    /// 실행 시 추가 슬리피지 최대폭 (분수)
    pub execution_slippage: f64,

    /// 견적 실패 확률 [0, 1)
    pub quote_failure_rate: f64,

    /// 실행 실패 확률 [0, 1)
    pub execution_failure_rate: f64,
}

/// 공용 견적 시뮬레이션
///
/// 기준 가격에 베뉴별 변동폭을 적용하고 수수료를 차감한
/// 예상 출력을 계산합니다.
pub(super) async fn simulate_quote(
    venue: &str,
    config: &VenueConfig,
    params: &SwapParams,
) -> Result<VenueQuote, RoutingError> {
    let (latency, jitter, failed) = {
        let mut rng = rand::thread_rng();
        (
            rng.gen_range(config.latency_ms.0..=config.latency_ms.1),
            rng.gen_range(-config.price_variance..=config.price_variance),
            rng.gen_range(0.0..1.0) < config.quote_failure_rate,
        )
    };

    tokio::time::sleep(std::time::Duration::from_millis(latency)).await;

    if failed {
        return Err(RoutingError::VenueUnavailable {
            venue: venue.to_string(),
            reason: "quote request timed out".to_string(),
        });
    }

    let base_price = pair_price(&params.token_in, &params.token_out).ok_or_else(|| {
        RoutingError::VenueUnavailable {
            venue: venue.to_string(),
            reason: format!(
                "no market for pair {}/{}",
                params.token_in, params.token_out
            ),
        }
    })?;

    let variance =
        Decimal::from_f64_retain(1.0 + jitter).unwrap_or(Decimal::ONE);
    let price = base_price * variance;
    let estimated_out = params.amount_in * price * (Decimal::ONE - config.fee_rate);

    Ok(VenueQuote {
        venue: venue.to_string(),
        price,
        fee_rate: config.fee_rate,
        estimated_out,
        latency_ms: latency,
        quoted_at: Utc::now(),
    })
}

/// 공용 실행 시뮬레이션
///
/// 견적 가격에 추가 슬리피지를 적용해 실현 출력을 계산합니다.
pub(super) async fn simulate_execution(
    venue: &str,
    config: &VenueConfig,
    params: &SwapParams,
    quote: &VenueQuote,
) -> Result<VenueExecution, RoutingError> {
    let (latency, slip, failed) = {
        let mut rng = rand::thread_rng();
        (
            rng.gen_range(config.latency_ms.0..=config.latency_ms.1),
            rng.gen_range(0.0..=config.execution_slippage),
            rng.gen_range(0.0..1.0) < config.execution_failure_rate,
        )
    };

    let started = std::time::Instant::now();
    tokio::time::sleep(std::time::Duration::from_millis(latency)).await;

    if failed {
        return Err(RoutingError::ExecutionFailed {
            venue: venue.to_string(),
            reason: "transaction dropped by cluster".to_string(),
        });
    }

    let slip_factor = Decimal::from_f64_retain(1.0 - slip).unwrap_or(Decimal::ONE);
    let executed_price = quote.price * slip_factor;
    let gross_out = params.amount_in * executed_price;
    let fee_amount = gross_out * quote.fee_rate;
    let output_amount = gross_out - fee_amount;

    Ok(VenueExecution {
        venue: venue.to_string(),
        tx_hash: Uuid::new_v4().to_string(),
        executed_price,
        output_amount,
        fee_amount,
        duration_ms: started.elapsed().as_millis() as u64,
    })
}
